// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document store interface consumed by the engine.
//!
//! The engine never mutates a stored document; it writes once on
//! submission and reads for comparison. Nearest-neighbor retrieval goes
//! through [`DocumentStore::search_nearest`] when the backend advertises
//! an index, with the engine's own brute-force scan as fallback.

pub mod sqlite;

pub use sqlite::SqliteDocumentStore;

use anyhow::Result;

/// A document persisted with its embedding vector and provenance.
#[derive(Debug, Clone)]
pub struct CorpusDocument {
    /// Opaque unique key.
    pub doc_id: String,
    /// Extracted plain text.
    pub content: String,
    /// Document-level embedding vector.
    pub vector: Vec<f32>,
    /// Origin filename.
    pub filename: String,
    /// Unix timestamp of submission.
    pub created_at: i64,
}

/// A candidate document with its similarity to a query vector.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub document: CorpusDocument,
    /// Cosine similarity against the query vector (0.0 to 1.0).
    pub score: f32,
}

/// Pluggable vector-search backend.
pub trait DocumentStore: Send + Sync {
    /// Persists a new document. Documents are immutable once stored;
    /// re-submitting an existing id is an error.
    fn store(&self, document: &CorpusDocument) -> Result<()>;

    /// Fetches a document by id.
    fn get(&self, doc_id: &str) -> Result<Option<CorpusDocument>>;

    /// Whether the backend can serve ranked nearest-neighbor queries.
    /// Checked before [`search_nearest`](Self::search_nearest) is tried.
    fn supports_index(&self) -> bool;

    /// Ranked nearest-neighbor candidates for a query vector, descending
    /// by cosine similarity, filtered by `threshold`, at most `k`.
    fn search_nearest(&self, vector: &[f32], k: usize, threshold: f32)
        -> Result<Vec<ScoredDocument>>;

    /// Most recently stored documents, newest first. The fallback scan
    /// source when the index path is unavailable.
    fn recent(&self, limit: usize) -> Result<Vec<CorpusDocument>>;

    /// Number of stored documents.
    fn count(&self) -> Result<u64>;
}
