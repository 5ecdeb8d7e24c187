//! Feature-hashing embedder
//!
//! Projects word tokens and character trigrams into a fixed number of
//! buckets with xxh3, then L2-normalizes. Identical text always yields the
//! identical vector, which makes it usable offline and in tests.

use async_trait::async_trait;
use xxhash_rust::xxh3::xxh3_64_with_seed;

use super::Embedder;
use crate::error::ForgeResult;

const TOKEN_SEED: u64 = 0x6e65_7875_7331;
const TRIGRAM_SEED: u64 = 0x7371_6c66_6f72;

/// Trigrams weigh less than whole tokens
const TRIGRAM_WEIGHT: f32 = 0.5;

pub struct HashedEmbedder {
    dimension: usize,
    model: String,
}

impl HashedEmbedder {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model: format!("hashed-{}", dimension),
        }
    }

    /// Embed synchronously; the trait methods wrap this.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let lower = text.to_lowercase();

        for token in lower
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| !t.is_empty())
        {
            self.accumulate(&mut vector, token.as_bytes(), TOKEN_SEED, 1.0);

            let chars: Vec<char> = token.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                self.accumulate(&mut vector, trigram.as_bytes(), TRIGRAM_SEED, TRIGRAM_WEIGHT);
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }

    fn accumulate(&self, vector: &mut [f32], feature: &[u8], seed: u64, weight: f32) {
        let hash = xxh3_64_with_seed(feature, seed);
        let bucket = (hash % self.dimension as u64) as usize;
        // top bit picks the sign so collisions tend to cancel
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

#[async_trait]
impl Embedder for HashedEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> ForgeResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
