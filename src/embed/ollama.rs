//! Ollama embedding client
//!
//! Talks to a local Ollama server through `/api/embed`.
//! No API key needed - runs completely offline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Embedder;
use crate::config::EmbeddingConfig;
use crate::error::{ForgeError, ForgeResult};

/// Default Ollama server URL
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama's build of all-MiniLM-L6-v2
pub const DEFAULT_MODEL: &str = "all-minilm";

pub const DEFAULT_DIMENSION: usize = 384;

/// Request for batch embedding
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Embedding response
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Ollama client for local embedding inference
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    dimension: usize,
    client: reqwest::Client,
}

impl OllamaEmbedder {
    pub fn from_config(config: &EmbeddingConfig) -> ForgeResult<Self> {
        Self::build(
            &config.endpoint,
            &config.model,
            config.dimension,
            config.timeout_secs,
        )
    }

    fn build(url: &str, model: &str, dimension: usize, timeout_secs: u64) -> ForgeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(format!("NEXUS-SQL-Forge/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimension,
            client,
        })
    }

    /// Check if Ollama is running
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        self.client.get(&url).send().await.is_ok()
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> ForgeResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        debug!("Requesting {} embeddings from {}", texts.len(), url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ForgeError::Embedding(format!("Failed to connect to Ollama. Is it running? ({})", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ForgeError::Embedding(format!(
                "Ollama request failed ({}): {}",
                status, body
            )));
        }

        let body: EmbedResponse = response.json().await?;

        if body.embeddings.len() != texts.len() {
            return Err(ForgeError::Embedding(format!(
                "Ollama returned {} embeddings for {} inputs",
                body.embeddings.len(),
                texts.len()
            )));
        }

        if let Some(bad) = body.embeddings.iter().find(|v| v.len() != self.dimension) {
            return Err(ForgeError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }

        Ok(body.embeddings)
    }
}
