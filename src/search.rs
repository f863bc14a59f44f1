// SPDX-License-Identifier: MIT OR Apache-2.0

//! Nearest-neighbor retrieval over the document corpus.
//!
//! Two-tier strategy: the index-backed path asks the store for ranked
//! candidates when it advertises one, the brute-force path scans the most
//! recent documents in-process. Both paths score with the same cosine
//! definition and share one post-filtering step, so degrading to the scan
//! changes cost, never results.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::errors::{Result, SimilarityError};
use crate::matcher::cosine_similarity;
use crate::store::{CorpusDocument, DocumentStore, ScoredDocument};

/// Default number of neighbors returned.
pub const DEFAULT_SEARCH_K: usize = 5;

/// Default minimum similarity for a neighbor to be reported.
pub const DEFAULT_SEARCH_THRESHOLD: f32 = 0.3;

/// Bound on documents scanned by the brute-force fallback.
pub const DEFAULT_SCAN_LIMIT: usize = 100;

/// Configuration for nearest-neighbor search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum documents fetched by the fallback scan.
    pub scan_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            scan_limit: DEFAULT_SCAN_LIMIT,
        }
    }
}

/// Nearest-neighbor search over a document store.
pub struct NearestNeighbors<'a> {
    store: &'a dyn DocumentStore,
    config: SearchConfig,
}

impl<'a> NearestNeighbors<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self::with_config(store, SearchConfig::default())
    }

    pub fn with_config(store: &'a dyn DocumentStore, config: SearchConfig) -> Self {
        Self { store, config }
    }

    /// Ranks corpus documents by cosine similarity to `query`.
    ///
    /// Results are descending by score, deduplicated by document id,
    /// exclude `exclude_doc` (the query document itself), and contain at
    /// most `k` entries at or above `threshold`.
    pub fn find_similar(
        &self,
        query: &[f32],
        k: usize,
        threshold: f32,
        exclude_doc: Option<&str>,
    ) -> Result<Vec<ScoredDocument>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let index_error = if self.store.supports_index() {
            // Ask for 2k candidates: headroom for dedup and self-exclusion.
            match self.store.search_nearest(query, 2 * k, threshold) {
                Ok(candidates) => {
                    debug!(candidates = candidates.len(), "index-backed search");
                    let documents = candidates.into_iter().map(|c| c.document).collect();
                    return Ok(self.rank(query, documents, k, threshold, exclude_doc));
                }
                Err(err) => {
                    warn!("index search failed, falling back to scan: {:#}", err);
                    Some(err)
                }
            }
        } else {
            None
        };

        match self.store.recent(self.config.scan_limit) {
            Ok(documents) => {
                debug!(scanned = documents.len(), "brute-force fallback scan");
                Ok(self.rank(query, documents, k, threshold, exclude_doc))
            }
            Err(scan_err) => Err(match index_error {
                Some(index_err) => SimilarityError::IndexUnavailable(format!(
                    "index search failed ({:#}) and fallback scan failed ({:#})",
                    index_err, scan_err
                )),
                None => SimilarityError::Store(scan_err),
            }),
        }
    }

    /// Shared post-filtering: one scoring definition for both tiers.
    fn rank(
        &self,
        query: &[f32],
        documents: Vec<CorpusDocument>,
        k: usize,
        threshold: f32,
        exclude_doc: Option<&str>,
    ) -> Vec<ScoredDocument> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut results: Vec<ScoredDocument> = documents
            .into_iter()
            .filter(|doc| exclude_doc != Some(doc.doc_id.as_str()))
            .filter(|doc| seen.insert(doc.doc_id.clone()))
            .map(|document| {
                let score = cosine_similarity(query, &document.vector);
                ScoredDocument { document, score }
            })
            .filter(|scored| scored.score >= threshold)
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document.doc_id.cmp(&b.document.doc_id))
        });
        results.truncate(k);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    /// In-memory store with switchable index behavior.
    struct MemoryStore {
        documents: Vec<CorpusDocument>,
        supports_index: bool,
        index_fails: bool,
    }

    impl MemoryStore {
        fn new(documents: Vec<CorpusDocument>) -> Self {
            Self {
                documents,
                supports_index: true,
                index_fails: false,
            }
        }
    }

    impl DocumentStore for MemoryStore {
        fn store(&self, _document: &CorpusDocument) -> anyhow::Result<()> {
            unimplemented!("not needed in search tests")
        }

        fn get(&self, doc_id: &str) -> anyhow::Result<Option<CorpusDocument>> {
            Ok(self.documents.iter().find(|d| d.doc_id == doc_id).cloned())
        }

        fn supports_index(&self) -> bool {
            self.supports_index
        }

        fn search_nearest(
            &self,
            vector: &[f32],
            k: usize,
            threshold: f32,
        ) -> anyhow::Result<Vec<ScoredDocument>> {
            if self.index_fails {
                return Err(anyhow!("index offline"));
            }
            let mut results: Vec<ScoredDocument> = self
                .documents
                .iter()
                .cloned()
                .map(|document| {
                    let score = cosine_similarity(vector, &document.vector);
                    ScoredDocument { document, score }
                })
                .filter(|s| s.score >= threshold)
                .collect();
            results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
            results.truncate(k);
            Ok(results)
        }

        fn recent(&self, limit: usize) -> anyhow::Result<Vec<CorpusDocument>> {
            let mut documents = self.documents.clone();
            documents.sort_by_key(|d| std::cmp::Reverse(d.created_at));
            documents.truncate(limit);
            Ok(documents)
        }

        fn count(&self) -> anyhow::Result<u64> {
            Ok(self.documents.len() as u64)
        }
    }

    fn corpus() -> Vec<CorpusDocument> {
        let vectors = [
            vec![1.0, 0.0, 0.0],
            vec![0.8, 0.6, 0.0],
            vec![0.6, 0.8, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        vectors
            .into_iter()
            .enumerate()
            .map(|(i, vector)| CorpusDocument {
                doc_id: format!("doc-{}", i + 1),
                content: format!("document {}", i + 1),
                vector,
                filename: format!("doc{}.txt", i + 1),
                created_at: (i as i64) + 1,
            })
            .collect()
    }

    #[test]
    fn test_exact_match_ranks_first() {
        let store = MemoryStore::new(corpus());
        let search = NearestNeighbors::new(&store);

        // Query equal to doc-3's vector.
        let results = search
            .find_similar(&[0.6, 0.8, 0.0], 3, 0.5, None)
            .unwrap();

        assert!(results.len() <= 3);
        assert_eq!(results[0].document.doc_id, "doc-3");
        assert!((results[0].score - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_query_document_excluded_by_identity() {
        let store = MemoryStore::new(corpus());
        let search = NearestNeighbors::new(&store);

        let results = search
            .find_similar(&[0.6, 0.8, 0.0], 3, 0.5, Some("doc-3"))
            .unwrap();

        assert!(results.iter().all(|r| r.document.doc_id != "doc-3"));
        assert!(!results.is_empty());
    }

    #[test]
    fn test_fallback_agrees_with_index_on_top1() {
        let query = [0.8, 0.6, 0.0];

        let indexed = MemoryStore::new(corpus());
        let primary = NearestNeighbors::new(&indexed)
            .find_similar(&query, 3, 0.3, None)
            .unwrap();

        let mut unindexed = MemoryStore::new(corpus());
        unindexed.supports_index = false;
        let fallback = NearestNeighbors::new(&unindexed)
            .find_similar(&query, 3, 0.3, None)
            .unwrap();

        assert_eq!(
            primary[0].document.doc_id,
            fallback[0].document.doc_id
        );
        assert!((primary[0].score - fallback[0].score).abs() < 1e-6);
    }

    #[test]
    fn test_index_failure_triggers_fallback() {
        let mut store = MemoryStore::new(corpus());
        store.index_fails = true;
        let search = NearestNeighbors::new(&store);

        let results = search
            .find_similar(&[1.0, 0.0, 0.0], 2, 0.5, None)
            .unwrap();

        assert_eq!(results[0].document.doc_id, "doc-1");
    }

    #[test]
    fn test_threshold_filters_results() {
        let store = MemoryStore::new(corpus());
        let search = NearestNeighbors::new(&store);

        let results = search
            .find_similar(&[1.0, 0.0, 0.0], 5, 0.95, None)
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.doc_id, "doc-1");
    }

    #[test]
    fn test_results_bounded_by_k() {
        let store = MemoryStore::new(corpus());
        let search = NearestNeighbors::new(&store);

        let results = search
            .find_similar(&[1.0, 1.0, 1.0], 2, 0.0, None)
            .unwrap();
        assert_eq!(results.len(), 2);

        let none = search.find_similar(&[1.0, 0.0, 0.0], 0, 0.0, None).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_duplicate_candidates_deduplicated() {
        let mut documents = corpus();
        documents.push(documents[0].clone());
        let store = MemoryStore::new(documents);
        let search = NearestNeighbors::new(&store);

        let results = search
            .find_similar(&[1.0, 0.0, 0.0], 5, 0.0, None)
            .unwrap();

        let mut ids: Vec<&str> = results.iter().map(|r| r.document.doc_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), results.len());
    }
}
