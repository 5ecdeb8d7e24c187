//! Semantic index over candidate lines
//!
//! Holds the embedded lines in extraction order and answers nearest-neighbor
//! queries with a full cosine scan.

use std::cmp::Ordering;

use tracing::{debug, info};

use super::{CandidateLine, IndexedEntry};
use crate::embed::Embedder;
use crate::error::{ForgeError, ForgeResult};

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Immutable, ordered collection of embedded candidate lines
#[derive(Debug, Clone)]
pub struct SemanticIndex {
    model: String,
    dimension: usize,
    entries: Vec<IndexedEntry>,
}

/// One scored entry
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    /// Position in index order
    pub position: usize,
    pub entry: &'a IndexedEntry,
    pub score: f32,
}

/// Nearest-neighbor lookup over embedded lines.
///
/// `nearest` is what the analyzer uses; an approximate structure can
/// implement this trait without the caller noticing.
pub trait VectorSearch {
    /// Up to `k` hits, best first. Equal scores keep index order.
    fn top_k(&self, query: &[f32], k: usize) -> Vec<SearchHit<'_>>;

    fn nearest(&self, query: &[f32]) -> ForgeResult<SearchHit<'_>> {
        self.top_k(query, 1)
            .into_iter()
            .next()
            .ok_or(ForgeError::EmptyIndex)
    }
}

impl SemanticIndex {
    /// Embed `lines` in batches of `batch_size`, preserving input order.
    pub async fn build<E, F>(
        lines: Vec<CandidateLine>,
        embedder: &E,
        batch_size: usize,
        mut on_batch: F,
    ) -> ForgeResult<Self>
    where
        E: Embedder + ?Sized,
        F: FnMut(usize, usize),
    {
        if lines.is_empty() {
            return Err(ForgeError::EmptyIndex);
        }

        let batch_size = batch_size.max(1);
        let dimension = embedder.dimension();
        let total_batches = lines.len().div_ceil(batch_size);
        let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(lines.len());

        for (i, chunk) in lines.chunks(batch_size).enumerate() {
            debug!("Processing embedding batch {}/{}", i + 1, total_batches);
            let texts: Vec<String> = chunk.iter().map(|l| l.text.clone()).collect();
            let batch = embedder.embed_batch(&texts).await?;

            if batch.len() != chunk.len() {
                return Err(ForgeError::Embedding(format!(
                    "batch {} returned {} vectors for {} lines",
                    i + 1,
                    batch.len(),
                    chunk.len()
                )));
            }
            if let Some(bad) = batch.iter().find(|v| v.len() != dimension) {
                return Err(ForgeError::DimensionMismatch {
                    expected: dimension,
                    actual: bad.len(),
                });
            }

            embeddings.extend(batch);
            on_batch(i + 1, total_batches);
        }

        let entries: Vec<IndexedEntry> = lines
            .into_iter()
            .zip(embeddings)
            .map(|(line, embedding)| IndexedEntry { line, embedding })
            .collect();

        info!("Embedding complete: {} lines indexed", entries.len());

        Ok(Self {
            model: embedder.model().to_string(),
            dimension,
            entries,
        })
    }

    /// Reassemble an index from already-embedded entries
    pub fn from_entries(model: String, dimension: usize, entries: Vec<IndexedEntry>) -> ForgeResult<Self> {
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimension) {
            return Err(ForgeError::DimensionMismatch {
                expected: dimension,
                actual: bad.embedding.len(),
            });
        }
        Ok(Self { model, dimension, entries })
    }

    /// Embed ad-hoc query text with the same backend used for the index
    pub async fn query<E: Embedder + ?Sized>(&self, text: &str, embedder: &E) -> ForgeResult<Vec<f32>> {
        let vector = embedder.embed(text).await?;
        if vector.len() != self.dimension {
            return Err(ForgeError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn entries(&self) -> &[IndexedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl VectorSearch for SemanticIndex {
    fn top_k(&self, query: &[f32], k: usize) -> Vec<SearchHit<'_>> {
        let mut hits: Vec<SearchHit<'_>> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| SearchHit {
                position,
                entry,
                score: cosine_similarity(query, &entry.embedding),
            })
            .collect();

        // stable sort keeps lower positions first on ties
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(k);
        hits
    }

    fn nearest(&self, query: &[f32]) -> ForgeResult<SearchHit<'_>> {
        let mut best: Option<SearchHit<'_>> = None;
        for (position, entry) in self.entries.iter().enumerate() {
            let score = cosine_similarity(query, &entry.embedding);
            if best.map_or(true, |b| score > b.score) {
                best = Some(SearchHit { position, entry, score });
            }
        }
        best.ok_or(ForgeError::EmptyIndex)
    }
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashedEmbedder;

    fn line(n: usize, text: &str) -> CandidateLine {
        CandidateLine {
            file_path: "app/Repo.php".to_string(),
            line_number: n,
            text: text.to_string(),
        }
    }

    fn entry(n: usize, embedding: Vec<f32>) -> IndexedEntry {
        IndexedEntry { line: line(n, "x"), embedding }
    }

    #[test]
    fn test_cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_build_preserves_order_across_batches() {
        let embedder = HashedEmbedder::new(64);
        let lines: Vec<CandidateLine> = (1..=7)
            .map(|n| line(n, &format!("DB::table('t{}')->get();", n)))
            .collect();

        let mut progress = Vec::new();
        let index = SemanticIndex::build(lines.clone(), &embedder, 3, |done, total| {
            progress.push((done, total));
        })
        .await
        .unwrap();

        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(index.len(), 7);
        for (i, e) in index.entries().iter().enumerate() {
            assert_eq!(e.line, lines[i]);
            assert_eq!(e.embedding, embedder.embed_text(&lines[i].text));
        }
    }

    #[tokio::test]
    async fn test_build_rejects_empty_input() {
        let embedder = HashedEmbedder::new(16);
        let err = SemanticIndex::build(Vec::new(), &embedder, 50, |_, _| {}).await.unwrap_err();
        assert!(matches!(err, ForgeError::EmptyIndex));
    }

    #[tokio::test]
    async fn test_query_own_text_round_trips() {
        let embedder = HashedEmbedder::new(384);
        let lines = vec![
            line(10, "$users = DB::table('users')->where('active', 1)->get();"),
            line(20, "$orders = Order::with('items')->paginate(20);"),
            line(30, "DB::statement('DELETE FROM sessions WHERE last_activity < ?');"),
        ];
        let index = SemanticIndex::build(lines.clone(), &embedder, 50, |_, _| {}).await.unwrap();

        for l in &lines {
            let q = index.query(&l.text, &embedder).await.unwrap();
            let hit = index.nearest(&q).unwrap();
            assert_eq!(hit.entry.line, *l);
            assert!((hit.score - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_ties_go_to_first_position() {
        let index = SemanticIndex::from_entries(
            "m".to_string(),
            2,
            vec![entry(1, vec![0.0, 1.0]), entry(2, vec![1.0, 0.0]), entry(3, vec![2.0, 0.0])],
        )
        .unwrap();

        let hit = index.nearest(&[1.0, 0.0]).unwrap();
        assert_eq!(hit.position, 1);

        let top = index.top_k(&[1.0, 0.0], 3);
        assert_eq!(top.iter().map(|h| h.position).collect::<Vec<_>>(), vec![1, 2, 0]);
    }

    #[test]
    fn test_empty_index_has_no_nearest() {
        let index = SemanticIndex::from_entries("m".to_string(), 2, Vec::new()).unwrap();
        assert!(matches!(index.nearest(&[1.0, 0.0]), Err(ForgeError::EmptyIndex)));
        assert!(index.top_k(&[1.0, 0.0], 5).is_empty());
    }

    #[test]
    fn test_from_entries_checks_dimension() {
        let err = SemanticIndex::from_entries("m".to_string(), 3, vec![entry(1, vec![1.0])]).unwrap_err();
        assert!(matches!(err, ForgeError::DimensionMismatch { expected: 3, actual: 1 }));
    }

    #[tokio::test]
    async fn test_query_rejects_foreign_dimension() {
        let index = SemanticIndex::from_entries("m".to_string(), 2, vec![entry(1, vec![1.0, 0.0])]).unwrap();
        let embedder = HashedEmbedder::new(8);
        let err = index.query("select 1", &embedder).await.unwrap_err();
        assert!(matches!(err, ForgeError::DimensionMismatch { expected: 2, actual: 8 }));
    }
}
