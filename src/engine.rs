// SPDX-License-Identifier: MIT OR Apache-2.0

//! The similarity detection engine.
//!
//! One long-lived engine instance owns the pipeline: document vectors,
//! sentence matching, lexical metrics, aggregation. The embedder and
//! sentence segmenter are injected at construction and shared across
//! concurrent comparisons; a comparison either returns a complete report
//! or a typed error.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::aggregator::{aggregate, ScoringWeights, DEFAULT_RELEVANCE_THRESHOLD};
use crate::config::Config;
use crate::embedding::Embedder;
use crate::errors::{Result, SimilarityError};
use crate::matcher::{cosine_similarity, Deadline, MatcherConfig, SentenceMatcher};
use crate::metrics::tfidf_similarity;
use crate::report::SimilarityReport;
use crate::search::{NearestNeighbors, SearchConfig, DEFAULT_SEARCH_K, DEFAULT_SEARCH_THRESHOLD};
use crate::segment::{RuleSegmenter, SentenceSegmenter};
use crate::store::{CorpusDocument, DocumentStore, ScoredDocument};

/// Engine-level configuration assembled from the config file or defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Metric combination weights.
    pub weights: ScoringWeights,
    /// Overall score below which matched segments are dropped.
    pub relevance_threshold: f32,
    /// Sentence matcher settings.
    pub matcher: MatcherConfig,
    /// Nearest-neighbor search settings.
    pub search: SearchConfig,
    /// Neighbors requested by `check_document`.
    pub default_k: usize,
    /// Minimum similarity for a neighbor to be considered.
    pub search_threshold: f32,
    /// Optional wall-clock budget per comparison.
    pub timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            matcher: MatcherConfig::default(),
            search: SearchConfig::default(),
            default_k: DEFAULT_SEARCH_K,
            search_threshold: DEFAULT_SEARCH_THRESHOLD,
            timeout: None,
        }
    }
}

impl EngineConfig {
    /// Builds engine settings from a loaded configuration file.
    pub fn from_config(config: &Config) -> Self {
        Self {
            weights: config.scoring().weights(),
            relevance_threshold: config.scoring().relevance_threshold(),
            matcher: config.matching().matcher_config(),
            search: config.search().search_config(),
            default_k: config.search().default_k(),
            search_threshold: config.search().threshold(),
            timeout: config.matching().timeout(),
        }
    }
}

/// Comparison of a stored document against its best corpus match.
#[derive(Debug, Clone)]
pub struct DocumentComparison {
    /// Identifier of the best-matching corpus document.
    pub doc_id: String,
    /// Origin filename of the best match.
    pub filename: String,
    /// Document-vector similarity from the neighbor search.
    pub score: f32,
    /// Full comparison report against the best match.
    pub report: SimilarityReport,
}

/// Result of checking a stored document against the corpus.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// Ranked neighbors, query document excluded.
    pub neighbors: Vec<ScoredDocument>,
    /// Report against the top neighbor; `None` when the corpus holds no
    /// document above the search threshold.
    pub best_match: Option<DocumentComparison>,
}

/// Similarity detection engine.
pub struct SimilarityEngine {
    embedder: Arc<Embedder>,
    segmenter: Box<dyn SentenceSegmenter>,
    matcher: SentenceMatcher,
    config: EngineConfig,
}

impl SimilarityEngine {
    pub fn new(
        embedder: Arc<Embedder>,
        segmenter: Box<dyn SentenceSegmenter>,
        config: EngineConfig,
    ) -> Self {
        let matcher = SentenceMatcher::new(config.matcher.clone());
        Self {
            embedder,
            segmenter,
            matcher,
            config,
        }
    }

    /// Engine with the rule-based segmenter and default settings.
    pub fn with_defaults(embedder: Arc<Embedder>) -> Self {
        Self::new(
            embedder,
            Box::new(RuleSegmenter::new()),
            EngineConfig::default(),
        )
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compares two documents and produces the full report.
    ///
    /// Embedding failures (including empty input) are fatal and
    /// propagate; the TF-IDF metric degrades to 0.0 on degenerate input
    /// and never aborts the comparison.
    pub fn compare(&self, source_text: &str, target_text: &str) -> Result<SimilarityReport> {
        let deadline = self.config.timeout.map(Deadline::after);

        let source_vector = self
            .embedder
            .embed_document(source_text, self.segmenter.as_ref())?;
        let target_vector = self
            .embedder
            .embed_document(target_text, self.segmenter.as_ref())?;
        let document_similarity = cosine_similarity(&source_vector, &target_vector);
        if let Some(deadline) = &deadline {
            deadline.check()?;
        }

        let outcome = self.matcher.match_sentences(
            self.embedder.as_ref(),
            self.segmenter.as_ref(),
            source_text,
            target_text,
            deadline.as_ref(),
        )?;

        let tfidf = tfidf_similarity(&outcome.source_sentences, &outcome.target_sentences);
        if let Some(deadline) = &deadline {
            deadline.check()?;
        }

        debug!(
            document_similarity,
            tfidf,
            sentences = outcome.sentence_scores.len(),
            matches = outcome.matches.len(),
            "comparison metrics computed"
        );

        Ok(aggregate(
            &self.config.weights,
            self.config.relevance_threshold,
            document_similarity,
            &outcome.sentence_scores,
            tfidf,
            outcome.matches,
        ))
    }

    /// Embeds and persists a newly submitted document.
    pub fn submit_document(
        &self,
        store: &dyn DocumentStore,
        doc_id: &str,
        filename: &str,
        content: &str,
    ) -> Result<CorpusDocument> {
        let vector = self
            .embedder
            .embed_document(content, self.segmenter.as_ref())?;

        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();

        let document = CorpusDocument {
            doc_id: doc_id.to_string(),
            content: content.to_string(),
            vector,
            filename: filename.to_string(),
            created_at,
        };
        store.store(&document).map_err(SimilarityError::Store)?;

        Ok(document)
    }

    /// Checks a stored document against the rest of the corpus.
    ///
    /// Finds the nearest neighbors (excluding the document itself) and
    /// runs the full comparison against the best one.
    pub fn check_document(&self, store: &dyn DocumentStore, doc_id: &str) -> Result<CheckOutcome> {
        let document = store
            .get(doc_id)
            .map_err(SimilarityError::Store)?
            .ok_or_else(|| SimilarityError::DocumentNotFound(doc_id.to_string()))?;

        let search = NearestNeighbors::with_config(store, self.config.search.clone());
        let neighbors = search.find_similar(
            &document.vector,
            self.config.default_k,
            self.config.search_threshold,
            Some(doc_id),
        )?;

        let best_match = match neighbors.first() {
            Some(best) => {
                let report = self.compare(&document.content, &best.document.content)?;
                Some(DocumentComparison {
                    doc_id: best.document.doc_id.clone(),
                    filename: best.document.filename.clone(),
                    score: best.score,
                    report,
                })
            }
            None => None,
        };

        Ok(CheckOutcome {
            neighbors,
            best_match,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingProvider;

    fn engine() -> SimilarityEngine {
        let embedder = Arc::new(Embedder::new(Box::new(HashingProvider::new(128))));
        SimilarityEngine::with_defaults(embedder)
    }

    #[test]
    fn test_identical_documents_score_near_one() {
        let text = "The quick brown fox jumps over the lazy dog.";
        let report = engine().compare(text, text).unwrap();

        assert!((report.document_similarity - 1.0).abs() < 1e-4);
        assert!((report.overall_similarity - 1.0).abs() < 1e-4);
        assert_eq!(report.matched_segments.len(), 1);
        assert!((report.matched_segments[0].semantic_similarity - 1.0).abs() < 1e-4);
        assert!((report.similarity_score - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_unrelated_documents_below_relevance() {
        let report = engine()
            .compare(
                "Quantum computing uses qubits.",
                "Bananas are a good source of potassium.",
            )
            .unwrap();

        assert!(report.overall_similarity < 0.3);
        assert!(report.matched_segments.is_empty());
    }

    #[test]
    fn test_overall_always_in_unit_range() {
        let report = engine()
            .compare(
                "Some document with several words in it. And a second sentence.",
                "Another document sharing several words. And a different close.",
            )
            .unwrap();

        assert!(report.overall_similarity >= 0.0 && report.overall_similarity <= 1.0);
        assert_eq!(report.similarity_breakdown.total(), 2);
    }

    #[test]
    fn test_empty_input_propagates() {
        let err = engine().compare("   ", "fine text.").unwrap_err();
        assert!(matches!(err, SimilarityError::EmptyInput));
    }

    #[test]
    fn test_degenerate_lexical_input_still_completes() {
        // Tokenization leaves no TF-IDF vocabulary; the metric degrades
        // to 0.0 and the comparison still produces a complete report.
        let report = engine().compare("!!! ???", "??? !!!").unwrap();
        assert_eq!(report.tfidf_similarity, 0.0);
        assert!(report.overall_similarity >= 0.0 && report.overall_similarity <= 1.0);
    }

    #[test]
    fn test_timeout_surfaces() {
        let embedder = Arc::new(Embedder::new(Box::new(HashingProvider::new(128))));
        let engine = SimilarityEngine::new(
            embedder,
            Box::new(RuleSegmenter::new()),
            EngineConfig {
                timeout: Some(Duration::ZERO),
                ..Default::default()
            },
        );
        std::thread::sleep(Duration::from_millis(5));

        let err = engine.compare("Some text.", "Other text.").unwrap_err();
        assert!(matches!(err, SimilarityError::Timeout(_)));
    }

    #[test]
    fn test_breakdown_sums_to_source_sentences() {
        let source = "First sentence here. Second sentence there. Third one closes.";
        let report = engine().compare(source, "First sentence here.").unwrap();
        assert_eq!(report.similarity_breakdown.total(), 3);
    }
}
