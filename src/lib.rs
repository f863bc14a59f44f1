// SPDX-License-Identifier: MIT OR Apache-2.0

//! simscan - Document similarity detection engine
//!
//! Compares a candidate document against a corpus of previously seen
//! documents, combining embedding similarity, sentence-level matching and
//! TF-IDF into one weighted report with extracted matched passages.

pub mod aggregator;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod errors;
pub mod matcher;
pub mod metrics;
pub mod report;
pub mod search;
pub mod segment;
pub mod store;

pub use engine::{CheckOutcome, DocumentComparison, EngineConfig, SimilarityEngine};
pub use errors::{Result, SimilarityError};
pub use report::{SimilarityBreakdown, SimilarityMatch, SimilarityReport};
