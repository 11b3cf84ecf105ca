//! Text embedding for semantic search
//!
//! Defines the [`Embedder`] trait consumed by the vector index, plus the
//! default local implementation: a deterministic hashed bag-of-tokens
//! embedding. Tokens are hashed into a fixed-dimension vector and the
//! result is l2-normalized, so cosine similarity between two embeddings
//! reflects token overlap. No network or model files required.

use crate::error::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Produces embedding vectors for text.
///
/// Implementations must be deterministic: the same text always maps to
/// the same vector, so re-indexing a corpus yields identical records.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds one text into a vector of `dimensions()` components.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Number of components in each embedding vector.
    fn dimensions(&self) -> usize;
}

/// Default embedding dimension for [`HashEmbedder`].
pub const DEFAULT_DIMENSIONS: usize = 256;

/// Minimum token length considered meaningful; shorter tokens are mostly
/// function words and would inflate similarity between unrelated texts.
const MIN_TOKEN_LEN: usize = 3;

/// Deterministic hashed bag-of-tokens embedder.
///
/// Lowercases the text, splits on non-alphanumeric characters, hashes
/// each token into a bucket, and l2-normalizes the bucket counts. All
/// components are non-negative, so cosine similarity lies in `[0, 1]`
/// and `1 - cosine` is a normalized distance.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    /// Creates an embedder with the given vector dimension.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&digest[..8]);
        (u64::from_be_bytes(raw) % self.dimensions as u64) as usize
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() >= MIN_TOKEN_LEN)
        {
            vector[self.bucket(token)] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for component in &mut vector {
                *component /= norm;
            }
        }

        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Cosine similarity between two vectors of equal length.
///
/// Returns 0.0 for mismatched lengths or zero-magnitude inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
