// SPDX-License-Identifier: MIT OR Apache-2.0

//! Combines per-metric scores into the final report.

use serde::Deserialize;

use crate::report::{SimilarityBreakdown, SimilarityMatch, SimilarityReport};

/// Overall score below which matched segments are dropped from the
/// report; the document is presumptively unrelated.
pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.3;

/// Weights combining the three metrics into the overall score.
///
/// Policy values, not derived constants: adjust through configuration,
/// the aggregation algorithm does not change.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScoringWeights {
    /// Weight of the averaged per-sentence best-match score.
    pub sentence: f32,
    /// Weight of the TF-IDF centroid similarity.
    pub tfidf: f32,
    /// Weight of the document-level embedding similarity.
    pub document: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            sentence: 0.4,
            tfidf: 0.3,
            document: 0.3,
        }
    }
}

impl ScoringWeights {
    /// Weighted combination, clamped to [0,1].
    pub fn combine(&self, sentence: f32, tfidf: f32, document: f32) -> f32 {
        (self.sentence * sentence + self.tfidf * tfidf + self.document * document).clamp(0.0, 1.0)
    }
}

/// Builds the final report from the individual metric results.
///
/// `sentence_scores` are the per-source-sentence best-match scores from
/// the matcher; `matches` are dropped when the overall score stays below
/// `relevance_threshold`.
pub fn aggregate(
    weights: &ScoringWeights,
    relevance_threshold: f32,
    document_similarity: f32,
    sentence_scores: &[f32],
    tfidf_similarity: f32,
    matches: Vec<SimilarityMatch>,
) -> SimilarityReport {
    let sentence_similarity = mean(sentence_scores);
    let document_similarity = document_similarity.clamp(0.0, 1.0);
    let tfidf_similarity = tfidf_similarity.clamp(0.0, 1.0);

    let overall_similarity =
        weights.combine(sentence_similarity, tfidf_similarity, document_similarity);

    let matched_segments = if overall_similarity > relevance_threshold {
        matches
    } else {
        Vec::new()
    };

    SimilarityReport {
        sentence_similarity,
        tfidf_similarity,
        document_similarity,
        overall_similarity,
        similarity_score: overall_similarity * 100.0,
        matched_segments,
        similarity_breakdown: SimilarityBreakdown::from_scores(sentence_scores),
    }
}

fn mean(scores: &[f32]) -> f32 {
    if scores.is_empty() {
        return 0.0;
    }
    (scores.iter().sum::<f32>() / scores.len() as f32).clamp(0.0, 1.0)
}
