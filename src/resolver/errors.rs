//! Resolution error types
//!
//! This module defines [`ResolveError`], the failure of a whole dependency
//! resolution. Unlike syntax errors, which the parser recovers from, every
//! resolve error aborts the resolution it occurred in and no partial module
//! list is returned.

use crate::parser::parse::ParseError;
use std::io;
use thiserror::Error;

/// Errors that abort dependency resolution
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A file could not be loaded
    #[error("{name}: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },

    /// A file parsed with syntax errors
    #[error("{name}: {} syntax error(s)", .diagnostics.len())]
    Parse {
        name: String,
        diagnostics: Vec<ParseError>,
    },

    /// `importer` imports `imported`, which is still being resolved
    #[error("{importer}, {imported}: circular dependency detected")]
    Cycle { importer: String, imported: String },
}

/// Coarse failure class, used for process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    File,
    Parse,
    Cycle,
}

impl ResolveError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ResolveError::Io { .. } => ErrorCategory::File,
            ResolveError::Parse { .. } => ErrorCategory::Parse,
            ResolveError::Cycle { .. } => ErrorCategory::Cycle,
        }
    }
}
