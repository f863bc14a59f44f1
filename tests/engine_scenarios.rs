// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenarios driving the engine against a SQLite-backed store
//! with the deterministic hashing provider.

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use simscan::embedding::{Embedder, EmbeddingCache, HashingProvider};
use simscan::engine::SimilarityEngine;
use simscan::search::NearestNeighbors;
use simscan::store::{CorpusDocument, DocumentStore, ScoredDocument, SqliteDocumentStore};
use simscan::SimilarityError;

static INIT_LOGS: std::sync::Once = std::sync::Once::new();

fn test_engine() -> SimilarityEngine {
    INIT_LOGS.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_env("SIMSCAN_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .try_init();
    });

    let embedder = Embedder::new(Box::new(HashingProvider::new(384)))
        .with_cache(EmbeddingCache::new(1024));
    SimilarityEngine::with_defaults(Arc::new(embedder))
}

fn open_store(dir: &Path) -> SqliteDocumentStore {
    SqliteDocumentStore::open(dir.join("documents.sqlite")).unwrap()
}

/// Store wrapper whose index path always fails, forcing the fallback.
struct BrokenIndexStore<'a> {
    inner: &'a SqliteDocumentStore,
}

impl DocumentStore for BrokenIndexStore<'_> {
    fn store(&self, document: &CorpusDocument) -> anyhow::Result<()> {
        self.inner.store(document)
    }

    fn get(&self, doc_id: &str) -> anyhow::Result<Option<CorpusDocument>> {
        self.inner.get(doc_id)
    }

    fn supports_index(&self) -> bool {
        true
    }

    fn search_nearest(
        &self,
        _vector: &[f32],
        _k: usize,
        _threshold: f32,
    ) -> anyhow::Result<Vec<ScoredDocument>> {
        anyhow::bail!("index offline")
    }

    fn recent(&self, limit: usize) -> anyhow::Result<Vec<CorpusDocument>> {
        self.inner.recent(limit)
    }

    fn count(&self) -> anyhow::Result<u64> {
        self.inner.count()
    }
}

fn seed_corpus(engine: &SimilarityEngine, store: &dyn DocumentStore) {
    let documents = [
        ("doc-1", "The stock market closed higher on Monday."),
        ("doc-2", "Rainfall in the northern region exceeded forecasts."),
        ("doc-3", "The committee approved the new research funding proposal."),
        ("doc-4", "Migratory birds arrive earlier each spring season."),
        ("doc-5", "Local bakeries report record demand for sourdough bread."),
    ];
    for (doc_id, content) in documents {
        engine
            .submit_document(store, doc_id, &format!("{}.txt", doc_id), content)
            .unwrap();
    }
}

#[test]
fn identical_documents_produce_maximal_report() {
    let engine = test_engine();
    let text = "The quick brown fox jumps over the lazy dog.";

    let report = engine.compare(text, text).unwrap();

    assert!((report.document_similarity - 1.0).abs() < 1e-4);
    assert!((report.overall_similarity - 1.0).abs() < 1e-4);
    assert_eq!(report.matched_segments.len(), 1);
    assert!((report.matched_segments[0].semantic_similarity - 1.0).abs() < 1e-4);
}

#[test]
fn unrelated_documents_stay_below_relevance_threshold() {
    let engine = test_engine();

    let report = engine
        .compare(
            "Quantum computing uses qubits.",
            "Bananas are a good source of potassium.",
        )
        .unwrap();

    assert!(report.overall_similarity < 0.3);
    assert!(report.matched_segments.is_empty());
}

#[test]
fn report_serializes_with_stable_field_names() {
    let engine = test_engine();
    let report = engine
        .compare("A sentence to check.", "A sentence to check.")
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    for field in [
        "sentence_similarity",
        "tfidf_similarity",
        "document_similarity",
        "overall_similarity",
        "similarity_score",
        "matched_segments",
        "similarity_breakdown",
    ] {
        assert!(json.get(field).is_some(), "missing field: {}", field);
    }
}

#[test]
fn query_by_own_vector_ranks_self_first() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let engine = test_engine();
    seed_corpus(&engine, &store);

    let doc3 = store.get("doc-3").unwrap().unwrap();
    let search = NearestNeighbors::new(&store);

    let results = search.find_similar(&doc3.vector, 3, 0.5, None).unwrap();
    assert_eq!(results[0].document.doc_id, "doc-3");
    assert!((results[0].score - 1.0).abs() < 1e-4);
}

#[test]
fn query_excluding_self_omits_the_document() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let engine = test_engine();
    seed_corpus(&engine, &store);

    let doc3 = store.get("doc-3").unwrap().unwrap();
    let search = NearestNeighbors::new(&store);

    let results = search
        .find_similar(&doc3.vector, 3, 0.0, Some("doc-3"))
        .unwrap();
    assert!(results.iter().all(|r| r.document.doc_id != "doc-3"));
    assert!(results.len() <= 3);
}

#[test]
fn fallback_path_agrees_with_index_path() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let engine = test_engine();
    seed_corpus(&engine, &store);

    let doc1 = store.get("doc-1").unwrap().unwrap();

    let primary = NearestNeighbors::new(&store)
        .find_similar(&doc1.vector, 3, 0.0, Some("doc-1"))
        .unwrap();

    let broken = BrokenIndexStore { inner: &store };
    let fallback = NearestNeighbors::new(&broken)
        .find_similar(&doc1.vector, 3, 0.0, Some("doc-1"))
        .unwrap();

    assert!(!primary.is_empty());
    assert_eq!(primary[0].document.doc_id, fallback[0].document.doc_id);
    assert!((primary[0].score - fallback[0].score).abs() < 1e-6);
}

#[test]
fn check_document_reports_best_corpus_match() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let engine = test_engine();
    seed_corpus(&engine, &store);

    // A near-duplicate of doc-3.
    engine
        .submit_document(
            &store,
            "doc-6",
            "doc-6.txt",
            "The committee approved the new research funding proposal.",
        )
        .unwrap();

    let outcome = engine.check_document(&store, "doc-6").unwrap();

    assert!(!outcome.neighbors.is_empty());
    assert!(outcome
        .neighbors
        .iter()
        .all(|n| n.document.doc_id != "doc-6"));

    let best = outcome.best_match.unwrap();
    assert_eq!(best.doc_id, "doc-3");
    assert!((best.score - 1.0).abs() < 1e-4);
    assert!(best.report.overall_similarity > 0.9);
    assert!(!best.report.matched_segments.is_empty());
}

#[test]
fn check_document_with_no_neighbors() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let engine = test_engine();

    engine
        .submit_document(&store, "only", "only.txt", "A single lonely document.")
        .unwrap();

    let outcome = engine.check_document(&store, "only").unwrap();
    assert!(outcome.neighbors.is_empty());
    assert!(outcome.best_match.is_none());
}

#[test]
fn check_unknown_document_is_a_typed_error() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let engine = test_engine();

    let err = engine.check_document(&store, "missing").unwrap_err();
    assert!(matches!(err, SimilarityError::DocumentNotFound(_)));
}

#[test]
fn submitting_empty_document_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let engine = test_engine();

    let err = engine
        .submit_document(&store, "empty", "empty.txt", "  \n ")
        .unwrap_err();
    assert!(matches!(err, SimilarityError::EmptyInput));
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn partially_copied_document_yields_matches_and_buckets() {
    let engine = test_engine();

    let source = "The committee approved the new research funding proposal. \
                  Unrelated filler about garden vegetables and weather patterns. \
                  Final remarks close the report.";
    let target = "The committee approved the new research funding proposal. \
                  Completely different content occupies this document otherwise.";

    let report = engine.compare(source, target).unwrap();

    // The copied sentence is found even though most of the text differs.
    assert!(report
        .matched_segments
        .iter()
        .any(|m| m.source_text.contains("committee approved")));
    assert_eq!(report.similarity_breakdown.total(), 3);
    assert!(report.similarity_breakdown.exact >= 1);

    // Matched segments are sorted non-increasing.
    for pair in report.matched_segments.windows(2) {
        assert!(pair[0].semantic_similarity >= pair[1].semantic_similarity);
    }
}
