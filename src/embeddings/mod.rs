//! Embedding collaborators: the [`Embedder`] trait and its OpenAI-compatible client.

pub mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Turns page text into a fixed-length vector and compares two vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed the text of one page
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Higher is more similar. Must never return NaN.
    fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        cosine_similarity(a, b)
    }
}

/// Cosine similarity of two vectors.
///
/// Returns 0.0 for zero-magnitude or mismatched vectors instead of NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    let score = dot / (mag_a * mag_b);
    if score.is_nan() {
        0.0
    } else {
        score
    }
}
