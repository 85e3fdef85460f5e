//! Load and parse failures.

use std::path::PathBuf;

use thiserror::Error;

/// The persisted table could not be parsed into well-formed entries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed search index at line {line}, column {column}: {reason}")]
pub struct MalformedIndexError {
    /// 1-based line where parsing stopped.
    pub line: usize,
    /// 1-based column (in characters) where parsing stopped.
    pub column: usize,
    pub reason: String,
}

impl MalformedIndexError {
    pub fn new(line: usize, column: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            column,
            reason: reason.into(),
        }
    }
}

/// Errors from loading an index off disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read search index {path}: {error}")]
    Io { path: PathBuf, error: std::io::Error },

    #[error("{path}: {error}")]
    Malformed {
        path: PathBuf,
        error: MalformedIndexError,
    },

    #[error(transparent)]
    Parse(#[from] MalformedIndexError),

    #[error("No search index files found in {0}")]
    EmptyDirectory(PathBuf),
}

impl LoadError {
    /// The underlying parse failure, if this is one.
    pub fn as_malformed(&self) -> Option<&MalformedIndexError> {
        match self {
            Self::Malformed { error, .. } => Some(error),
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}
