//! Import dependency resolver
//!
//! This module turns a root file name into the list of every module the
//! program needs, ordered so that each module comes after all the modules it
//! imports:
//! - [`loader`]: Where source text comes from ([`FileLoader`])
//! - [`graph`]: The depth-first walk that builds and sorts the import graph
//! - [`errors`]: [`ResolveError`] and its categories
//!
//! Diamond imports are loaded and parsed once; both importers refer to the
//! same [`ModuleId`]. A cycle, a missing file or a file with syntax errors
//! aborts the whole resolution.

pub mod errors;
pub mod graph;
pub mod loader;

pub use errors::{ErrorCategory, ResolveError};
pub use graph::{Resolver, VisitMark};
pub use loader::{FileLoader, FsLoader, MemoryLoader};

use crate::parser::ast::File;
use crate::parser::source::ScanOptions;
use serde::Serialize;

/// Position of a module in [`Program::modules`].
///
/// Stored in [`File::dependencies`] as a non-owning reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ModuleId(pub usize);

impl ModuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Settings threaded through one resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    pub scan: ScanOptions,
}

/// Resolved modules, dependencies before dependents. Never empty; the root
/// file is last.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub modules: Vec<File>,
}

impl Program {
    pub fn root(&self) -> Option<&File> {
        self.modules.last()
    }

    pub fn get(&self, id: ModuleId) -> Option<&File> {
        self.modules.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules imported by `file`, in import order.
    pub fn dependencies_of<'p>(&'p self, file: &'p File) -> impl Iterator<Item = &'p File> + 'p {
        file.dependencies.iter().filter_map(move |id| self.get(*id))
    }
}

/// Resolve `root` through `loader`.
pub fn resolve<L: FileLoader + ?Sized>(
    loader: &L,
    root: &str,
    options: &ResolveOptions,
) -> Result<Program, ResolveError> {
    Resolver::new(loader, *options).resolve(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_lookup() {
        let loader = MemoryLoader::new()
            .with("main", "import \"util\";\nfunc main(void) return void { }")
            .with("util", "pub func help(void) return void { }");

        let program = resolve(&loader, "main", &ResolveOptions::default()).unwrap();

        assert_eq!(program.len(), 2);
        let root = program.root().unwrap();
        assert_eq!(root.name, "main.lem");
        let deps: Vec<&str> = program
            .dependencies_of(root)
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(deps, vec!["util.lem"]);
    }

    #[test]
    fn test_threaded_scan_resolves_identically() {
        let loader = MemoryLoader::new()
            .with("a", "import \"b\";\nlet x: int32 = 1 + 2;")
            .with("b", "struct Point { x: int32; y: int32; }");
        let threaded = ResolveOptions {
            scan: ScanOptions {
                threaded: true,
                ..ScanOptions::default()
            },
        };

        let direct = resolve(&loader, "a", &ResolveOptions::default()).unwrap();
        let scanned = resolve(&loader, "a", &threaded).unwrap();

        assert_eq!(direct, scanned);
    }
}
