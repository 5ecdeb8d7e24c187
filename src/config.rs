//! Configuration management for NEXUS SQL Forge

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::embed::ollama;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub analysis: AnalysisConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Laravel project used when `index` is run without a path
    pub project_path: Option<String>,
}

/// Which embedding generator backs the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackendKind {
    /// Local Ollama server (`/api/embed`)
    Ollama,
    /// Deterministic feature hashing, no model required
    Hashed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackendKind,
    pub model: String,
    pub endpoint: String,
    pub dimension: usize,
    pub batch_size: usize,
    pub timeout_secs: u64,
}

/// Line filter used by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Raw DB calls, query builder and ORM method calls, bare SQL keywords
    Broad,
    /// Only lines containing `select`
    Narrow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub scan_subdir: Option<String>,
    pub extensions: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub max_files: usize,
    pub filter: FilterMode,
    /// Overrides the patterns implied by `filter` when non-empty
    pub patterns: Vec<String>,
    pub respect_gitignore: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Lines inspected on each side of the matched line
    pub context_window: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Snapshot file; defaults to the user cache directory
    pub snapshot_path: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackendKind::Ollama,
            model: ollama::DEFAULT_MODEL.to_string(),
            endpoint: ollama::DEFAULT_OLLAMA_URL.to_string(),
            dimension: ollama::DEFAULT_DIMENSION,
            batch_size: crate::index::semantic::DEFAULT_BATCH_SIZE,
            timeout_secs: 120,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            scan_subdir: Some("app".to_string()),
            extensions: vec!["php".to_string()],
            exclude_dirs: vec![
                "vendor".to_string(),
                "node_modules".to_string(),
                ".git".to_string(),
                "storage".to_string(),
                "bootstrap/cache".to_string(),
            ],
            max_files: 100,
            filter: FilterMode::Broad,
            patterns: Vec::new(),
            respect_gitignore: true,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            context_window: crate::analysis::context::DEFAULT_WINDOW,
        }
    }
}

impl Config {
    /// Apply `OLLAMA_HOST` / `OLLAMA_MODEL` overrides
    fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            self.embedding.endpoint = host;
        }
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            self.embedding.model = model;
        }
    }

    /// Resolve where the index snapshot lives
    pub fn snapshot_path(&self) -> PathBuf {
        if let Some(p) = &self.storage.snapshot_path {
            return PathBuf::from(p);
        }
        directories::ProjectDirs::from("com", "nexus", "sql-forge")
            .map(|p| p.cache_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".nexus-sql-cache"))
            .join("embedding_cache.json")
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let config_dir = directories::ProjectDirs::from("com", "nexus", "sql-forge")
        .context("Failed to determine config directory")?
        .config_dir()
        .to_path_buf();

    Ok(config_dir.join("config.toml"))
}

/// Load configuration from file or use defaults
pub fn load_config(custom_path: Option<&str>) -> Result<Config> {
    let path = if let Some(p) = custom_path {
        PathBuf::from(p)
    } else {
        config_path()?
    };

    let mut config = if path.exists() {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {:?}", path))?
    } else {
        Config::default()
    };

    config.apply_env();
    Ok(config)
}

/// Initialize configuration file with defaults
pub fn init_config(custom_path: Option<&str>) -> Result<()> {
    let path = match custom_path {
        Some(p) => PathBuf::from(p),
        None => config_path()?,
    };

    if path.exists() {
        println!("Configuration file already exists at {:?}", path);
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {:?}", parent))?;
    }

    let content = toml::to_string_pretty(&Config::default())
        .context("Failed to serialize default config")?;

    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write config to {:?}", path))?;

    println!("Configuration initialized at {:?}", path);
    Ok(())
}

/// Show current configuration
pub fn show_config(config: &Config) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .context("Failed to serialize config")?;
    println!("{}", content);
    Ok(())
}
