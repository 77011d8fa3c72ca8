//! Source file loading
//!
//! The resolver never touches the filesystem itself. It asks a [`FileLoader`]
//! for the canonical form of each import name and then for its contents.

use rustc_hash::FxHashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension appended to import names that do not carry one.
pub const DEFAULT_EXTENSION: &str = ".lem";

/// Supplies source text for import names.
pub trait FileLoader {
    /// Normalize `name`; two names with the same canonical form are the same
    /// module.
    fn canonical_name(&self, name: &str) -> String {
        if name.ends_with(DEFAULT_EXTENSION) {
            name.to_string()
        } else {
            format!("{name}{DEFAULT_EXTENSION}")
        }
    }

    /// Full contents of the file with the given canonical name.
    fn load(&self, name: &str) -> io::Result<String>;
}

/// Loads files relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsLoader { root: root.into() }
    }

    /// Loader rooted at the directory holding `file`, and the file's own
    /// name relative to it.
    pub fn for_file(file: &Path) -> (Self, String) {
        let root = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (FsLoader::new(root), name)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileLoader for FsLoader {
    fn load(&self, name: &str) -> io::Result<String> {
        let path = self.root.join(name);
        debug!(path = %path.display(), "loading");
        fs::read_to_string(path)
    }
}

/// Serves files from memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: FxHashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file; `name` is canonicalized first.
    pub fn insert(&mut self, name: &str, source: impl Into<String>) {
        let name = self.canonical_name(name);
        self.files.insert(name, source.into());
    }

    pub fn with(mut self, name: &str, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }
}

impl FileLoader for MemoryLoader {
    fn load(&self, name: &str) -> io::Result<String> {
        self.files.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory")
        })
    }
}
