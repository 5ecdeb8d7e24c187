//! Query service
//!
//! Owns the current index and runs the two user-facing operations: building
//! the index from a project and analyzing a SQL query against it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwapOption;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analysis::{classify, context, recommend, sql, AnalysisResult, MatchedLine, PerformanceRating};
use crate::config::{Config, IndexConfig};
use crate::embed::Embedder;
use crate::error::{ForgeError, ForgeResult};
use crate::index::{extract_candidates, snapshot, SemanticIndex, SnapshotStore, VectorSearch};

/// Statistics from one index build
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub scan_root: PathBuf,
    pub indexed: usize,
    pub files_scanned: usize,
    pub files_failed: usize,
    pub cap_reached: bool,
    pub batches: usize,
    pub elapsed_ms: u64,
    pub snapshot_saved: bool,
}

pub struct QueryService<E, S> {
    embedder: E,
    store: S,
    index: ArcSwapOption<SemanticIndex>,
    index_config: IndexConfig,
    batch_size: usize,
    context_window: usize,
}

impl<E: Embedder, S: SnapshotStore> QueryService<E, S> {
    pub fn new(embedder: E, store: S, config: &Config) -> Self {
        Self {
            embedder,
            store,
            index: ArcSwapOption::empty(),
            index_config: config.index.clone(),
            batch_size: config.embedding.batch_size,
            context_window: config.analysis.context_window,
        }
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Index currently being served, if any
    #[cfg(test)]
    pub fn current_index(&self) -> Option<Arc<SemanticIndex>> {
        self.index.load_full()
    }

    pub async fn build_index(&self, root: &Path) -> ForgeResult<BuildReport> {
        self.build_index_with_progress(root, |_, _| {}).await
    }

    /// Extract, embed and swap in a new index.
    ///
    /// The previous index keeps serving until the new one is complete; on
    /// any error it stays in place untouched.
    pub async fn build_index_with_progress<F>(&self, root: &Path, mut on_batch: F) -> ForgeResult<BuildReport>
    where
        F: FnMut(usize, usize),
    {
        let started = Instant::now();
        info!("Starting codebase indexing for: {}", root.display());

        let owned_root = root.to_path_buf();
        let config = self.index_config.clone();
        let extraction = tokio::task::spawn_blocking(move || extract_candidates(&owned_root, &config))
            .await
            .map_err(|e| ForgeError::Io(std::io::Error::other(e)))??;

        if extraction.lines.is_empty() {
            return Err(ForgeError::NoCandidates(root.to_path_buf()));
        }

        info!("Starting embedding generation for {} lines", extraction.lines.len());
        let mut batches = 0;
        let index = SemanticIndex::build(extraction.lines, &self.embedder, self.batch_size, |done, total| {
            batches = done;
            on_batch(done, total);
        })
        .await?;

        let snapshot_saved = match snapshot::encode(&index).and_then(|blob| self.store.save(&blob)) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save index snapshot to {}: {}", self.store.location(), e);
                false
            }
        };

        let indexed = index.len();
        self.index.store(Some(Arc::new(index)));

        Ok(BuildReport {
            scan_root: extraction.scan_root,
            indexed,
            files_scanned: extraction.files_scanned,
            files_failed: extraction.files_failed,
            cap_reached: extraction.cap_reached,
            batches,
            elapsed_ms: started.elapsed().as_millis() as u64,
            snapshot_saved,
        })
    }

    /// Find the closest indexed line to `query` and report on the query.
    pub async fn analyze_query(&self, query: &str) -> ForgeResult<AnalysisResult> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ForgeError::EmptyQuery);
        }

        let index = match self.index.load_full() {
            Some(index) => index,
            None => self.restore_snapshot()?,
        };

        let vector = index.query(query, &self.embedder).await?;
        let (line, similarity) = {
            let hit = index.nearest(&vector)?;
            debug!("Best match at position {} with score {:.4}", hit.position, hit.score);
            (hit.entry.line.clone(), hit.score)
        };

        let file_path = PathBuf::from(&line.file_path);
        let line_number = line.line_number;
        let window = self.context_window;
        let validation = tokio::task::spawn_blocking(move || context::validate(&file_path, line_number, window))
            .await
            .map_err(|e| ForgeError::Io(std::io::Error::other(e)))?;

        let issues = sql::analyze(query);
        let performance_score = sql::score(query, &issues, validation.validated);
        let suggestions = recommend::compose(
            query,
            validation.validated,
            &issues,
            &validation.validation_methods,
            &validation.security_issues,
        );

        Ok(AnalysisResult {
            matched: MatchedLine {
                query_type: classify::classify(&line.text),
                similarity: similarity.clamp(0.0, 1.0),
                line,
            },
            validated: validation.validated,
            validation_methods: validation.validation_methods,
            security_issues: validation.security_issues,
            issues,
            suggestions,
            performance_score,
            performance_rating: PerformanceRating::from_score(performance_score),
        })
    }

    /// Load the persisted index when nothing is in memory yet
    fn restore_snapshot(&self) -> ForgeResult<Arc<SemanticIndex>> {
        let blob = self.store.load()?.ok_or(ForgeError::IndexNotReady)?;
        let index = snapshot::decode(&blob)?;

        if index.model() != self.embedder.model() || index.dimension() != self.embedder.dimension() {
            warn!(
                "Snapshot at {} was built with {} ({} dims), active embedder is {} ({} dims); ignoring it",
                self.store.location(),
                index.model(),
                index.dimension(),
                self.embedder.model(),
                self.embedder.dimension()
            );
            return Err(ForgeError::IndexNotReady);
        }

        if index.is_empty() {
            warn!("Snapshot at {} holds no entries; ignoring it", self.store.location());
            return Err(ForgeError::IndexNotReady);
        }

        // a build that finished meanwhile wins over the older snapshot
        let restored = Arc::new(index);
        let previous = self
            .index
            .compare_and_swap(&None::<Arc<SemanticIndex>>, Some(Arc::clone(&restored)));
        match &*previous {
            Some(current) => Ok(Arc::clone(current)),
            None => {
                info!("Restored {} indexed lines from {}", restored.len(), self.store.location());
                Ok(restored)
            }
        }
    }
}
