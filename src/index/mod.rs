//! Codebase indexing
//!
//! Extracts SQL-shaped source lines from a Laravel project, embeds them and
//! keeps them in a searchable [`SemanticIndex`].

pub mod extract;
pub mod semantic;
pub mod snapshot;

use serde::{Deserialize, Serialize};

pub use extract::extract_candidates;
pub use semantic::{SemanticIndex, VectorSearch};
pub use snapshot::{FileSnapshotStore, SnapshotStore};

/// A source line flagged as SQL-relevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLine {
    pub file_path: String,
    /// 1-based
    pub line_number: usize,
    pub text: String,
}

/// A candidate line paired with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedEntry {
    #[serde(flatten)]
    pub line: CandidateLine,
    pub embedding: Vec<f32>,
}
