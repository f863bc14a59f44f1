// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding module - turns text units into normalized vectors.
//!
//! The provider generates vectors, the embedder is the injectable facade
//! the rest of the engine talks to, and the cache keeps repeated content
//! from being embedded twice.

pub mod cache;
pub mod embedder;
pub mod provider;

pub use cache::{Claim, EmbeddingCache, DEFAULT_CACHE_CAPACITY};
pub use embedder::{Embedder, DEFAULT_BATCH_SIZE};
pub use provider::{
    EmbeddingProvider, EmbeddingProviderConfig, FastEmbedder, HashingProvider,
    DEFAULT_EMBEDDING_DIM,
};
