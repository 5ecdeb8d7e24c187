//! Error types for the indexing and analysis pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by [`crate::service::QueryService`] and the pieces it drives.
///
/// Per-file read failures during extraction or context validation never show
/// up here; they are logged and skipped where they happen.
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("invalid project path: {}", .0.display())]
    InvalidRoot(PathBuf),

    #[error("query text is empty")]
    EmptyQuery,

    #[error("no SQL-related code found under {}", .0.display())]
    NoCandidates(PathBuf),

    #[error("codebase not indexed yet, run `nexus-sql index` first")]
    IndexNotReady,

    #[error("index contains no entries")]
    EmptyIndex,

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding backend failed: {0}")]
    Embedding(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ForgeResult<T> = std::result::Result<T, ForgeError>;

impl From<serde_json::Error> for ForgeError {
    fn from(err: serde_json::Error) -> Self {
        ForgeError::Snapshot(err.to_string())
    }
}

impl From<reqwest::Error> for ForgeError {
    fn from(err: reqwest::Error) -> Self {
        ForgeError::Embedding(err.to_string())
    }
}
