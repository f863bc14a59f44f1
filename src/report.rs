// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report types returned by a similarity comparison.
//!
//! `SimilarityReport` is the single fixed-shape payload every consumer
//! agrees on. Field names are stable and serialized as-is; downstream
//! renderers depend on them.

use serde::{Deserialize, Serialize};

/// A matched sentence pair extracted by the sentence matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityMatch {
    /// Sentence from the candidate document.
    pub source_text: String,
    /// Best-matching sentence from the comparison document.
    pub target_text: String,
    /// Embedding cosine similarity for the pair (0.0-1.0).
    pub semantic_similarity: f32,
    /// Normalized edit-distance similarity, computed only for pairs that
    /// already passed the semantic threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexical_similarity: Option<f32>,
    /// Index of the sentence in the source document (0-indexed).
    pub source_index: usize,
    /// Index of the sentence in the target document (0-indexed).
    pub target_index: usize,
}

/// Counts of source sentences per severity bucket.
///
/// Each source sentence's best-match score falls into exactly one bucket,
/// so the four counts sum to the number of source sentences considered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityBreakdown {
    /// Best-match score above 0.9.
    pub exact: usize,
    /// Best-match score in (0.7, 0.9].
    pub high: usize,
    /// Best-match score in (0.5, 0.7].
    pub moderate: usize,
    /// Best-match score at or below 0.5.
    pub low: usize,
}

impl SimilarityBreakdown {
    /// Buckets each per-sentence best-match score.
    pub fn from_scores(scores: &[f32]) -> Self {
        let mut breakdown = Self::default();
        for &score in scores {
            if score > 0.9 {
                breakdown.exact += 1;
            } else if score > 0.7 {
                breakdown.high += 1;
            } else if score > 0.5 {
                breakdown.moderate += 1;
            } else {
                breakdown.low += 1;
            }
        }
        breakdown
    }

    /// Total number of sentences bucketed.
    pub fn total(&self) -> usize {
        self.exact + self.high + self.moderate + self.low
    }
}

/// Complete result of one document comparison.
///
/// Constructed once by the aggregator and never mutated afterward. All
/// similarity fields are in [0,1]; `similarity_score` is the same value
/// as `overall_similarity` scaled to a percentage for renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityReport {
    /// Mean of per-source-sentence best-match scores.
    pub sentence_similarity: f32,
    /// TF-IDF centroid cosine similarity over the shared vocabulary.
    pub tfidf_similarity: f32,
    /// Cosine similarity of the document-level embedding vectors.
    pub document_similarity: f32,
    /// Weighted combination of the three metrics above.
    pub overall_similarity: f32,
    /// `overall_similarity` scaled to 0-100.
    pub similarity_score: f32,
    /// Highest-similarity sentence pairs, descending, at most 10.
    /// Empty when `overall_similarity` is below the relevance threshold.
    pub matched_segments: Vec<SimilarityMatch>,
    /// Severity distribution of per-sentence best-match scores.
    pub similarity_breakdown: SimilarityBreakdown,
}
