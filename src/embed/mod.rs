//! Embedding generators
//!
//! The index treats the embedder as a pure function from text to a
//! fixed-length vector. Two backends ship: a local Ollama server and a
//! deterministic feature-hashing embedder that needs no model at all.

pub mod hashed;
pub mod ollama;

use async_trait::async_trait;

use crate::config::{EmbeddingBackendKind, EmbeddingConfig};
use crate::error::{ForgeError, ForgeResult};

pub use hashed::HashedEmbedder;
pub use ollama::OllamaEmbedder;

/// Maps text to a vector of [`Embedder::dimension`] floats.
///
/// Implementations must be deterministic for a fixed model and must return
/// batch results in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier recorded in snapshots
    fn model(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> ForgeResult<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> ForgeResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        if vectors.len() != 1 {
            return Err(ForgeError::Embedding(format!(
                "expected 1 embedding, backend returned {}",
                vectors.len()
            )));
        }
        Ok(vectors.remove(0))
    }
}

/// Backend selected from configuration
pub enum EmbeddingBackend {
    Ollama(OllamaEmbedder),
    Hashed(HashedEmbedder),
}

impl EmbeddingBackend {
    pub fn from_config(config: &EmbeddingConfig) -> ForgeResult<Self> {
        match config.backend {
            EmbeddingBackendKind::Ollama => Ok(Self::Ollama(OllamaEmbedder::from_config(config)?)),
            EmbeddingBackendKind::Hashed => Ok(Self::Hashed(HashedEmbedder::new(config.dimension))),
        }
    }

    /// Human-readable backend name for the CLI
    pub fn describe(&self) -> String {
        match self {
            Self::Ollama(e) => format!("Ollama ({})", e.model()),
            Self::Hashed(e) => format!("Feature hashing ({} dims)", e.dimension()),
        }
    }
}

#[async_trait]
impl Embedder for EmbeddingBackend {
    fn model(&self) -> &str {
        match self {
            Self::Ollama(e) => e.model(),
            Self::Hashed(e) => e.model(),
        }
    }

    fn dimension(&self) -> usize {
        match self {
            Self::Ollama(e) => e.dimension(),
            Self::Hashed(e) => e.dimension(),
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> ForgeResult<Vec<Vec<f32>>> {
        match self {
            Self::Ollama(e) => e.embed_batch(texts).await,
            Self::Hashed(e) => e.embed_batch(texts).await,
        }
    }
}
