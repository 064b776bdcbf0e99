#[cfg(test)]
mod tests;

use thiserror::Error;

use crate::embeddings::vector::{dot, l2_norm};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimilarityError {
    #[error("Vector length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("Cannot score a vector with zero norm")]
    DegenerateVector,
}

/// Cosine similarity of two equal-length vectors.
///
/// Norms are always recomputed, so raw and normalized inputs give the same
/// answer. The result is clamped to `[-1, 1]`.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let denominator = l2_norm(a) * l2_norm(b);
    if denominator <= 0.0 || !denominator.is_finite() {
        return Err(SimilarityError::DegenerateVector);
    }

    Ok((dot(a, b) / denominator).clamp(-1.0, 1.0) as f32)
}

/// Pluggable scoring backend used by the search service
pub trait SimilarityProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn score(&self, query: &[f32], candidate: &[f32]) -> Result<f32, SimilarityError>;
}

/// In-process cosine similarity
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCosine;

impl SimilarityProvider for LocalCosine {
    #[inline]
    fn name(&self) -> &'static str {
        "local-cosine"
    }

    #[inline]
    fn score(&self, query: &[f32], candidate: &[f32]) -> Result<f32, SimilarityError> {
        cosine_similarity(query, candidate)
    }
}
