//! Biometric Matcher
//!
//! Cosine-similarity search of a live face embedding over every enrolled
//! template. The embeddings themselves come from an external extractor.

use crate::domain::DomainError;
use crate::store::EnrolledTemplate;

/// Similarity a match must strictly exceed
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.9;

/// `dot(a, b) / (|a| * |b|)`, computed in f64.
///
/// `None` when the vectors differ in length, are empty, or either has zero
/// norm; such pairs can never match.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return None;
    }
    Some(dot / denominator)
}

/// Enrollment check: the core stores any non-empty, finite vector
pub fn validate_embedding(embedding: &[f32]) -> Result<(), DomainError> {
    if embedding.is_empty() {
        return Err(DomainError::InvalidEmbedding("embedding is empty".to_string()));
    }
    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(DomainError::InvalidEmbedding(
            "embedding contains non-finite values".to_string(),
        ));
    }
    if embedding.iter().all(|v| *v == 0.0) {
        return Err(DomainError::InvalidEmbedding("embedding has zero norm".to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaceMatch {
    pub account_id: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiometricMatcher {
    threshold: f64,
}

impl BiometricMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Closest template whose similarity is strictly above the threshold.
    /// Equal scores keep the earlier template.
    pub fn best_match(&self, live: &[f32], templates: &[EnrolledTemplate]) -> Option<FaceMatch> {
        let mut best: Option<FaceMatch> = None;

        for enrolled in templates {
            let Some(similarity) = cosine_similarity(live, &enrolled.template) else {
                continue;
            };
            if similarity <= self.threshold {
                continue;
            }
            if best.as_ref().map_or(true, |b| similarity > b.similarity) {
                best = Some(FaceMatch {
                    account_id: enrolled.account_id.clone(),
                    similarity,
                });
            }
        }

        best
    }
}

impl Default for BiometricMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}
