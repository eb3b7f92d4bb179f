//! Deterministic collaborators for offline mode and tests.
//!
//! [`HashEmbeddingProvider`] derives vectors from hashed word tokens, and
//! [`CannedAnswerGenerator`] answers every question with a fixed string.
//! Neither makes a network call.

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::generation::AnswerGenerator;

/// Answer returned by [`CannedAnswerGenerator::default`].
pub const DEFAULT_CANNED_ANSWER: &str =
    "This is an offline answer based on the project knowledge base.";

/// Embeddings built with the hashing trick over lowercase word tokens.
///
/// Each token is hashed to a bucket and a sign, so texts sharing words point
/// in similar directions. Identical text always yields the identical
/// L2-normalised vector; text without word characters yields the zero vector.
#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    dimensions: usize,
}

impl HashEmbeddingProvider {
    /// Create a provider producing vectors of the given width.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn hashed_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return embedding;
        }

        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let hash = fnv1a(&token.to_lowercase());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        embedding
    }
}

/// 64-bit FNV-1a; stable across platforms and toolchain versions.
fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.hashed_embedding(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.hashed_embedding(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// An [`AnswerGenerator`] that ignores its input and returns a fixed answer.
#[derive(Debug, Clone)]
pub struct CannedAnswerGenerator {
    answer: String,
}

impl CannedAnswerGenerator {
    /// Create a generator that always answers with `answer`.
    pub fn new(answer: impl Into<String>) -> Self {
        Self { answer: answer.into() }
    }
}

impl Default for CannedAnswerGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CANNED_ANSWER)
    }
}

#[async_trait]
impl AnswerGenerator for CannedAnswerGenerator {
    async fn generate_answer(&self, _question: &str, _context: &str) -> Result<String> {
        Ok(self.answer.clone())
    }

    fn name(&self) -> &str {
        "canned"
    }
}
