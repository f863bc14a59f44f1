// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for the similarity engine.
//!
//! A comparison either produces a complete report or fails with one of
//! these variants; partial results are never returned. Lexical metrics
//! that cannot produce a meaningful score degrade to 0.0 instead of
//! erroring, so they do not appear here.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the similarity engine.
#[derive(Debug, Error)]
pub enum SimilarityError {
    /// Input text was empty or whitespace-only after normalization.
    /// Fatal to the comparison; never substituted with a default.
    #[error("input text is empty after trimming")]
    EmptyInput,

    /// The comparison exceeded its configured deadline.
    #[error("comparison exceeded timeout of {0:?}")]
    Timeout(Duration),

    /// A referenced document does not exist in the store.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// The index-backed nearest-neighbor path failed. Handled internally
    /// by falling back to a brute-force scan; only surfaced when the
    /// fallback fails as well.
    #[error("vector index unavailable: {0}")]
    IndexUnavailable(String),

    /// The embedding provider failed.
    #[error("embedding failed")]
    Embedding(#[source] anyhow::Error),

    /// The document store failed outside the index-search path.
    #[error("document store failure")]
    Store(#[source] anyhow::Error),
}

/// Result alias used across the engine's public surface.
pub type Result<T> = std::result::Result<T, SimilarityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimilarityError::EmptyInput;
        assert_eq!(err.to_string(), "input text is empty after trimming");

        let err = SimilarityError::DocumentNotFound("doc-1".to_string());
        assert!(err.to_string().contains("doc-1"));
    }

    #[test]
    fn test_embedding_error_source() {
        use std::error::Error;

        let err = SimilarityError::Embedding(anyhow::anyhow!("model exploded"));
        assert!(err.source().is_some());
    }
}
