//! Import graph traversal
//!
//! Resolution is a single depth-first walk from the root file that builds
//! the import graph and sorts it topologically at the same time. Every file
//! is reachable from the root through import edges, so one walk visits the
//! whole graph.
//!
//! A vertex is marked `InProgress` before its imports are visited and
//! `Done` after, at which point its module is appended to the output. The
//! output therefore lists every module after all the modules it imports.
//! Meeting an `InProgress` vertex again means the walk went around a cycle.

use super::errors::ResolveError;
use super::loader::FileLoader;
use super::{ModuleId, Program, ResolveOptions};
use crate::parser::ast::File;
use crate::parser::parse::parse_with;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

/// State of a visited vertex. Names missing from the graph are unvisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitMark {
    InProgress,
    Done(ModuleId),
}

/// Walks the import graph of one root file.
pub struct Resolver<'a, L: FileLoader + ?Sized> {
    loader: &'a L,
    options: ResolveOptions,
    marks: FxHashMap<String, VisitMark>,
    /// Finished modules in topological order; a module's id is its index.
    modules: Vec<File>,
}

impl<'a, L: FileLoader + ?Sized> Resolver<'a, L> {
    pub fn new(loader: &'a L, options: ResolveOptions) -> Self {
        Resolver {
            loader,
            options,
            marks: FxHashMap::default(),
            modules: Vec::new(),
        }
    }

    /// Resolve `root` and everything it imports.
    ///
    /// Any failure drops the modules loaded so far and returns only the error.
    pub fn resolve(mut self, root: &str) -> Result<Program, ResolveError> {
        let root = self.loader.canonical_name(root);
        info!(root = %root, "resolving imports");

        self.visit(&root, None)?;

        info!(modules = self.modules.len(), "imports resolved");
        Ok(Program {
            modules: self.modules,
        })
    }

    pub fn mark(&self, name: &str) -> Option<VisitMark> {
        self.marks.get(name).copied()
    }

    fn visit(&mut self, name: &str, importer: Option<&str>) -> Result<ModuleId, ResolveError> {
        match self.marks.get(name) {
            Some(VisitMark::Done(id)) => {
                debug!(file = name, "already resolved");
                return Ok(*id);
            }
            Some(VisitMark::InProgress) => {
                return Err(ResolveError::Cycle {
                    importer: importer.unwrap_or(name).to_string(),
                    imported: name.to_string(),
                });
            }
            None => {}
        }

        let source = self.loader.load(name).map_err(|source| ResolveError::Io {
            name: name.to_string(),
            source,
        })?;

        let (mut file, errors) = parse_with(&source, name, &self.options.scan);
        if errors > 0 {
            return Err(ResolveError::Parse {
                name: name.to_string(),
                diagnostics: std::mem::take(&mut file.diagnostics),
            });
        }

        // Marked before recursing so a file importing itself is caught
        self.marks.insert(name.to_string(), VisitMark::InProgress);
        debug!(file = name, imports = file.imports.len(), "visiting");

        let mut dependencies = Vec::with_capacity(file.imports.len());
        for import in &file.imports {
            let child = self.loader.canonical_name(&import.alias);
            dependencies.push(self.visit(&child, Some(name))?);
        }
        file.dependencies = dependencies;

        let id = ModuleId(self.modules.len());
        self.marks.insert(name.to_string(), VisitMark::Done(id));
        self.modules.push(file);
        debug!(file = name, id = id.0, "resolved");

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::errors::ErrorCategory;
    use crate::resolver::loader::MemoryLoader;
    use std::cell::RefCell;
    use std::io;

    /// Records every load so tests can tell how often a file was parsed.
    struct CountingLoader {
        inner: MemoryLoader,
        loads: RefCell<Vec<String>>,
    }

    impl FileLoader for CountingLoader {
        fn load(&self, name: &str) -> io::Result<String> {
            self.loads.borrow_mut().push(name.to_string());
            self.inner.load(name)
        }
    }

    fn names(program: &Program) -> Vec<&str> {
        program.modules.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_chain_resolves_dependencies_first() {
        let loader = MemoryLoader::new()
            .with("a", "import \"b\";")
            .with("b", "import \"c\";")
            .with("c", "let x: int32 = 1;");

        let program = Resolver::new(&loader, ResolveOptions::default())
            .resolve("a")
            .unwrap();

        assert_eq!(names(&program), vec!["c.lem", "b.lem", "a.lem"]);
        assert_eq!(program.modules[2].dependencies, vec![ModuleId(1)]);
        assert!(program.modules[0].dependencies.is_empty());
    }

    #[test]
    fn test_mutual_import_is_cycle() {
        let loader = MemoryLoader::new()
            .with("a", "import \"b\";")
            .with("b", "import \"a\";");

        let err = Resolver::new(&loader, ResolveOptions::default())
            .resolve("a")
            .unwrap_err();

        match &err {
            ResolveError::Cycle { importer, imported } => {
                assert_eq!(importer, "b.lem");
                assert_eq!(imported, "a.lem");
            }
            other => panic!("Expected cycle, got {:?}", other),
        }
        assert_eq!(err.category(), ErrorCategory::Cycle);
    }

    #[test]
    fn test_self_import_is_cycle() {
        let loader = MemoryLoader::new().with("a", "import \"a.lem\";");

        let err = Resolver::new(&loader, ResolveOptions::default())
            .resolve("a")
            .unwrap_err();

        assert!(matches!(err, ResolveError::Cycle { ref importer, ref imported }
            if importer == "a.lem" && imported == "a.lem"));
    }

    #[test]
    fn test_diamond_parses_shared_file_once() {
        let loader = CountingLoader {
            inner: MemoryLoader::new()
                .with("top", "import \"left\";\nimport \"right\";")
                .with("left", "import \"base\";")
                .with("right", "import \"base\";")
                .with("base", "struct Base { }"),
            loads: RefCell::new(Vec::new()),
        };

        let program = Resolver::new(&loader, ResolveOptions::default())
            .resolve("top")
            .unwrap();

        assert_eq!(
            names(&program),
            vec!["base.lem", "left.lem", "right.lem", "top.lem"]
        );
        let base_loads = loader
            .loads
            .borrow()
            .iter()
            .filter(|n| n.as_str() == "base.lem")
            .count();
        assert_eq!(base_loads, 1);
        assert_eq!(program.modules[1].dependencies, program.modules[2].dependencies);
        assert_eq!(program.modules[3].dependencies, vec![ModuleId(1), ModuleId(2)]);
    }

    #[test]
    fn test_missing_import_is_io_error() {
        let loader = MemoryLoader::new().with("a", "import \"gone\";");

        let err = Resolver::new(&loader, ResolveOptions::default())
            .resolve("a")
            .unwrap_err();

        assert!(matches!(err, ResolveError::Io { ref name, .. } if name == "gone.lem"));
        assert_eq!(err.category(), ErrorCategory::File);
    }

    #[test]
    fn test_syntax_error_aborts_resolution() {
        let loader = MemoryLoader::new()
            .with("a", "import \"b\";")
            .with("b", "let x: int32 = ;");

        let err = Resolver::new(&loader, ResolveOptions::default())
            .resolve("a")
            .unwrap_err();

        match err {
            ResolveError::Parse { name, diagnostics } => {
                assert_eq!(name, "b.lem");
                assert_eq!(diagnostics.len(), 1);
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_marks_after_failure() {
        let loader = MemoryLoader::new()
            .with("a", "import \"b\";")
            .with("b", "import \"missing\";");
        let mut resolver = Resolver::new(&loader, ResolveOptions::default());

        assert!(resolver.visit("a.lem", None).is_err());
        assert_eq!(resolver.mark("a.lem"), Some(VisitMark::InProgress));
        assert_eq!(resolver.mark("missing.lem"), None);
    }
}
