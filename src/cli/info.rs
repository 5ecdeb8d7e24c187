//! Info command - show system, backend and index information

use anyhow::Result;

use super::style::print_warning;
use crate::config::{self, Config};
use crate::embed::{Embedder, EmbeddingBackend};
use crate::index::{snapshot, SnapshotStore};

pub async fn run(config: Config) -> Result<()> {
    println!("NEXUS SQL Forge v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("System Information:");
    println!("  OS: {} {}", std::env::consts::OS, std::env::consts::ARCH);

    println!();
    println!("Configuration:");
    let config_file = config::config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    println!("  Config file: {}", config_file);
    println!("  Scan subdir: {}", config.index.scan_subdir.as_deref().unwrap_or("(project root)"));
    println!("  File limit: {}", config.index.max_files);

    let service = super::build_service(&config)?;
    let embedder = service.embedder();

    println!();
    println!("Embeddings:");
    println!("  Backend: {}", embedder.describe());
    println!("  Dimension: {}", embedder.dimension());
    let mut ollama_down = false;
    if let EmbeddingBackend::Ollama(ollama) = embedder {
        let status = if ollama.is_available().await {
            "reachable"
        } else {
            ollama_down = true;
            "not reachable"
        };
        println!("  Endpoint: {} ({})", config.embedding.endpoint, status);
    }

    println!();
    println!("Index:");
    println!("  Snapshot: {}", service.store().location());
    match service.store().load() {
        Ok(Some(blob)) => match snapshot::decode(&blob) {
            Ok(index) => {
                println!("  Entries: {}", index.len());
                let usable = index.model() == embedder.model() && index.dimension() == embedder.dimension();
                println!(
                    "  Model: {}{}",
                    index.model(),
                    if usable { "" } else { " (differs from active backend, re-index)" }
                );
            }
            Err(e) => println!("  Status: unreadable ({})", e),
        },
        Ok(None) => println!("  Status: not indexed"),
        Err(e) => println!("  Status: unreadable ({})", e),
    }

    if ollama_down {
        print_warning("Ollama is not running. Start it with `ollama serve` or set embedding.backend = \"hashed\"");
    }

    Ok(())
}
