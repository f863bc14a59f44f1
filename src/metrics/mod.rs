// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lexical similarity metrics.
//!
//! These metrics operate on raw text and complement the embedding-based
//! scores. They never fail: degenerate input (empty collections, vocabulary
//! that collapses after tokenization) produces 0.0, which reads as "no
//! detectable similarity" rather than an error.

pub mod edit;
pub mod ngram;
pub mod tfidf;

pub use edit::edit_similarity;
pub use ngram::ngram_jaccard_similarity;
pub use tfidf::tfidf_similarity;
