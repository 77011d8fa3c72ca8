// Integration tests for import resolution on disk

use lemonc::parser::source::ScanOptions;
use lemonc::resolver::{resolve, ErrorCategory, FsLoader, ModuleId, ResolveError, ResolveOptions};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, source: &str) {
    fs::write(dir.join(name), source).unwrap();
}

fn module_names(dir: &TempDir, root: &str) -> Result<Vec<String>, ResolveError> {
    let loader = FsLoader::new(dir.path());
    let program = resolve(&loader, root, &ResolveOptions::default())?;
    Ok(program.modules.into_iter().map(|m| m.name).collect())
}

#[test]
fn test_chain_on_disk() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.lem", "import \"b\";\nfunc main(void) return void { }");
    write(dir.path(), "b.lem", "import \"c\";");
    write(dir.path(), "c.lem", "pub let answer: int32 = 42;");

    assert_eq!(
        module_names(&dir, "a.lem").unwrap(),
        vec!["c.lem", "b.lem", "a.lem"]
    );
}

#[test]
fn test_cycle_on_disk_names_both_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.lem", "import \"b\";");
    write(dir.path(), "b.lem", "import \"a\";");

    let err = module_names(&dir, "a").unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Cycle);
    let message = err.to_string();
    assert!(message.contains("a.lem"));
    assert!(message.contains("b.lem"));
}

#[test]
fn test_missing_root_is_file_error() {
    let dir = TempDir::new().unwrap();

    let err = module_names(&dir, "nothing").unwrap_err();

    assert_eq!(err.category(), ErrorCategory::File);
    assert!(err.to_string().starts_with("nothing.lem: "));
}

#[test]
fn test_extension_is_canonicalized() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.lem", "import \"util\";\nimport \"util.lem\";");
    write(dir.path(), "util.lem", "struct Empty { }");

    let loader = FsLoader::new(dir.path());
    let program = resolve(&loader, "main", &ResolveOptions::default()).unwrap();

    assert_eq!(program.len(), 2);
    assert_eq!(
        program.root().unwrap().dependencies,
        vec![ModuleId(0), ModuleId(0)]
    );
}

#[test]
fn test_topological_order_on_wider_graph() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "app.lem", "import \"net\";\nimport \"log\";\nimport \"core\";");
    write(dir.path(), "net.lem", "import \"core\";\nimport \"log\";");
    write(dir.path(), "log.lem", "import \"core\";");
    write(dir.path(), "core.lem", "");

    let options = ResolveOptions {
        scan: ScanOptions {
            threaded: true,
            channel_capacity: 4,
            ..ScanOptions::default()
        },
    };
    let loader = FsLoader::new(dir.path());
    let program = resolve(&loader, "app", &options).unwrap();

    // Every dependency sits strictly before its importer
    for (position, module) in program.modules.iter().enumerate() {
        for dep in &module.dependencies {
            assert!(dep.index() < position, "{} imports a later module", module.name);
        }
    }
    let names: Vec<&str> = program.modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["core.lem", "log.lem", "net.lem", "app.lem"]);
}
