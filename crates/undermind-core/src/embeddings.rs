//! Embeddings
//!
//! Text → vector mapping for the semantic store. The store does not depend
//! on a specific model: any [`Embedder`] works, and an empty vector is a
//! legal output meaning "no embedding available" (searches then degrade to
//! empty results instead of failing).
//!
//! Two embedders ship with the crate:
//! - [`HashEmbedder`]: deterministic local feature hashing, always available
//! - [`ProviderEmbedder`]: delegates to the LLM provider's `embed` endpoint

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::provider::LlmProvider;

/// Default dimensionality of locally hashed embeddings
pub const EMBEDDING_DIMENSIONS: usize = 256;

// ============================================================================
// SIMILARITY
// ============================================================================

/// Cosine similarity between two vectors; 0.0 on dimension mismatch or
/// zero-magnitude input
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

// ============================================================================
// EMBEDDER CONTRACT
// ============================================================================

/// Text → vector function used by the semantic store
///
/// Returning an empty vector signals that no embedding is available for the
/// input; the store treats that as "this text cannot participate in vector
/// search" rather than as an error.
pub trait Embedder: Send + Sync {
    /// Convert text to an embedding vector (possibly empty)
    fn embed(&self, text: &str) -> Vec<f32>;

    /// Dimensionality of produced vectors
    fn dimensions(&self) -> usize;
}

// ============================================================================
// HASH EMBEDDER
// ============================================================================

/// Deterministic feature-hashing embedder
///
/// Tokenizes into lowercase alphanumeric runs and hashes each token into a
/// signed bucket, then L2-normalizes. No vocabulary, no model files, stable
/// across runs, good enough for token-overlap similarity when no provider
/// embedding endpoint is available.
pub struct HashEmbedder {
    dimensions: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIMENSIONS)
    }
}

impl HashEmbedder {
    /// Create an embedder with a specific dimensionality
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }

    fn hash_token(token: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        hasher.finish()
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let mut any = false;

        for token in tokenize(text) {
            let h = Self::hash_token(&token);
            let bucket = (h % self.dimensions as u64) as usize;
            // Second hash bit picks the sign to reduce collision bias
            let sign = if (h >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
            any = true;
        }
        if !any {
            return vec![];
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Lowercase alphanumeric runs of the input
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// PROVIDER EMBEDDER
// ============================================================================

/// Embedder backed by the LLM provider's `embed` endpoint
///
/// Provider failures are logged and degrade to an empty vector; the
/// semantic store then returns no vector hits rather than erroring.
pub struct ProviderEmbedder {
    provider: Arc<dyn LlmProvider>,
    dimensions: usize,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider, dimensions: 0 }
    }
}

impl Embedder for ProviderEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        match self.provider.embed(text) {
            Ok(vector) => vector,
            Err(e) => {
                tracing::warn!("Provider embedding failed, degrading to empty: {}", e);
                vec![]
            }
        }
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ============================================================================
// TESTS
// ============================================================================
