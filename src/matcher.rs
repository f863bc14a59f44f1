// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sentence-level all-pairs matching.
//!
//! The dominant cost of the engine: every source sentence is compared
//! against every target sentence in one batched cosine matrix (unit
//! vectors make dot product equal cosine), with rayon parallelism across
//! source rows rather than scalar pair loops.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::debug;

use crate::embedding::Embedder;
use crate::errors::{Result, SimilarityError};
use crate::metrics::edit_similarity;
use crate::report::SimilarityMatch;
use crate::segment::SentenceSegmenter;

/// Semantic similarity above which a sentence pair becomes a match.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.8;

/// Maximum number of matched segments retained per comparison.
pub const MAX_MATCHED_SEGMENTS: usize = 10;

/// Wall-clock budget for one comparison.
///
/// Checked between pipeline stages; a comparison either completes or
/// fails with [`SimilarityError::Timeout`], never partially.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    pub fn check(&self) -> Result<()> {
        if Instant::now() > self.at {
            Err(SimilarityError::Timeout(self.budget))
        } else {
            Ok(())
        }
    }
}

/// Configuration for sentence matching.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Pairs above this cosine similarity become matches.
    pub match_threshold: f32,
    /// Cap on retained matches.
    pub max_matches: usize,
    /// Whether retained matches get the edit-distance corroboration.
    pub lexical_signal: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            max_matches: MAX_MATCHED_SEGMENTS,
            lexical_signal: true,
        }
    }
}

/// Result of matching one document pair.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Per-source-sentence best-match score (row max), clamped to [0,1].
    pub sentence_scores: Vec<f32>,
    /// Retained matches, descending by semantic similarity, at most
    /// `max_matches`.
    pub matches: Vec<SimilarityMatch>,
    /// Source sentences as segmented, for reuse by lexical metrics.
    pub source_sentences: Vec<String>,
    /// Target sentences as segmented.
    pub target_sentences: Vec<String>,
}

/// All-pairs sentence comparison over embedding vectors.
pub struct SentenceMatcher {
    config: MatcherConfig,
}

impl SentenceMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(MatcherConfig::default())
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Segments, embeds, and matches both documents.
    pub fn match_sentences(
        &self,
        embedder: &Embedder,
        segmenter: &dyn SentenceSegmenter,
        source_text: &str,
        target_text: &str,
        deadline: Option<&Deadline>,
    ) -> Result<MatchOutcome> {
        let source_sentences = segment_or_whole(segmenter, source_text)?;
        let target_sentences = segment_or_whole(segmenter, target_text)?;

        let source_vectors = embedder.embed(&source_sentences)?;
        let target_vectors = embedder.embed(&target_sentences)?;
        if let Some(deadline) = deadline {
            deadline.check()?;
        }

        let matrix = similarity_matrix(&source_vectors, &target_vectors);
        debug!(
            source = source_sentences.len(),
            target = target_sentences.len(),
            "computed sentence similarity matrix"
        );

        let sentence_scores: Vec<f32> = matrix
            .iter()
            .map(|row| {
                row.iter()
                    .copied()
                    .fold(f32::NEG_INFINITY, f32::max)
                    .clamp(0.0, 1.0)
            })
            .collect();

        let mut candidates: Vec<(usize, usize, f32)> = Vec::new();
        for (i, row) in matrix.iter().enumerate() {
            for (j, &similarity) in row.iter().enumerate() {
                if similarity > self.config.match_threshold {
                    candidates.push((i, j, similarity.clamp(0.0, 1.0)));
                }
            }
        }

        candidates.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
                .then_with(|| a.1.cmp(&b.1))
        });
        candidates.truncate(self.config.max_matches);
        if let Some(deadline) = deadline {
            deadline.check()?;
        }

        let matches: Vec<SimilarityMatch> = candidates
            .into_iter()
            .map(|(i, j, similarity)| {
                // Edit distance only for pairs that already passed the
                // semantic threshold, to bound cost.
                let lexical = self
                    .config
                    .lexical_signal
                    .then(|| edit_similarity(&source_sentences[i], &target_sentences[j]));
                SimilarityMatch {
                    source_text: source_sentences[i].clone(),
                    target_text: target_sentences[j].clone(),
                    semantic_similarity: similarity,
                    lexical_similarity: lexical,
                    source_index: i,
                    target_index: j,
                }
            })
            .collect();

        Ok(MatchOutcome {
            sentence_scores,
            matches,
            source_sentences,
            target_sentences,
        })
    }
}

/// Full pairwise cosine matrix between two sets of unit vectors,
/// parallelized across source rows.
pub fn similarity_matrix(source: &[Vec<f32>], target: &[Vec<f32>]) -> Vec<Vec<f32>> {
    source
        .par_iter()
        .map(|row| target.iter().map(|col| dot(row, col)).collect())
        .collect()
}

/// Computes cosine similarity between two vectors of any norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = dot(a, b);
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn segment_or_whole(segmenter: &dyn SentenceSegmenter, text: &str) -> Result<Vec<String>> {
    if text.trim().is_empty() {
        return Err(SimilarityError::EmptyInput);
    }
    let mut sentences = segmenter.segment(text);
    if sentences.is_empty() {
        sentences.push(text.trim().to_string());
    }
    Ok(sentences)
}
