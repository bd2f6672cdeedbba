//! Error type for the leech library.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building the namespace or walking a module.
#[derive(Error, Debug)]
pub enum LeechError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {0}")]
    Parse(String),
    #[error("tree-sitter language error: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    #[error("tree-sitter query error: {0}")]
    Query(#[from] tree_sitter::QueryError),
    #[error("namespace has no source root ({0} does not resolve to a directory)")]
    NoRoot(String),
    #[error("module {0} not found in namespace")]
    ModuleNotFound(String),
    #[error("invalid go.mod at {path}: {reason}")]
    GoMod { path: PathBuf, reason: String },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LeechError {
    /// Wrap an i/o error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LeechError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LeechError>;
