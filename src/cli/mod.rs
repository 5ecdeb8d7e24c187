//! CLI command implementations

pub mod analyze;
pub mod index;
pub mod info;
mod style;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::embed::EmbeddingBackend;
use crate::index::FileSnapshotStore;
use crate::service::QueryService;

pub(crate) type CliService = QueryService<EmbeddingBackend, FileSnapshotStore>;

/// Wire the configured embedder and snapshot file into a service
pub(crate) fn build_service(config: &Config) -> Result<CliService> {
    let embedder = EmbeddingBackend::from_config(&config.embedding)
        .context("Failed to initialize embedding backend")?;
    let store = FileSnapshotStore::new(config.snapshot_path());
    Ok(QueryService::new(embedder, store, config))
}
