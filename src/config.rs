// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for simscan
//!
//! Loads configuration from .simscanrc.toml in current directory or
//! ~/.config/simscan/config.toml

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::aggregator::{ScoringWeights, DEFAULT_RELEVANCE_THRESHOLD};
use crate::embedding::{
    Embedder, EmbeddingCache, EmbeddingProvider, EmbeddingProviderConfig, FastEmbedder,
    HashingProvider, DEFAULT_BATCH_SIZE, DEFAULT_CACHE_CAPACITY, DEFAULT_EMBEDDING_DIM,
};
use crate::matcher::{MatcherConfig, DEFAULT_MATCH_THRESHOLD, MAX_MATCHED_SEGMENTS};
use crate::search::{SearchConfig, DEFAULT_SCAN_LIMIT, DEFAULT_SEARCH_K, DEFAULT_SEARCH_THRESHOLD};

/// Embedding provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderType {
    #[default]
    Fastembed,
    Hashing,
}

/// Embedding configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider type (fastembed, hashing)
    pub provider: Option<EmbeddingProviderType>,
    /// Model identifier for the embedding provider
    pub model: Option<String>,
    /// Number of text units per embedding batch
    pub batch_size: Option<usize>,
    /// Vector dimension for the hashing provider
    pub dimension: Option<usize>,
    /// Capacity of the embedding cache (0 disables caching)
    pub cache_capacity: Option<usize>,
}

impl EmbeddingConfig {
    /// Get provider type (defaults to Fastembed)
    pub fn provider(&self) -> EmbeddingProviderType {
        self.provider.unwrap_or_default()
    }

    /// Get model identifier (defaults to "minilm")
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or("minilm")
    }

    /// Get batch size (defaults to 32)
    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    /// Get hashing provider dimension (defaults to 384)
    pub fn dimension(&self) -> usize {
        self.dimension.unwrap_or(DEFAULT_EMBEDDING_DIM)
    }

    /// Get cache capacity (defaults to 4096)
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY)
    }

    /// Build an embedder from this configuration.
    ///
    /// The fastembed provider downloads the model on first use; the
    /// hashing provider is fully offline.
    pub fn build_embedder(&self) -> anyhow::Result<Embedder> {
        let provider: Box<dyn EmbeddingProvider> = match self.provider() {
            EmbeddingProviderType::Hashing => Box::new(HashingProvider::new(self.dimension())),
            EmbeddingProviderType::Fastembed => Box::new(FastEmbedder::new(
                EmbeddingProviderConfig::with_model_name(self.model())?,
            )?),
        };

        let embedder = Embedder::with_batch_size(provider, self.batch_size());
        Ok(if self.cache_capacity() > 0 {
            embedder.with_cache(EmbeddingCache::new(self.cache_capacity()))
        } else {
            embedder
        })
    }
}

/// Scoring configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of the averaged sentence score (0.0-1.0)
    pub weight_sentence: Option<f32>,
    /// Weight of the TF-IDF similarity (0.0-1.0)
    pub weight_tfidf: Option<f32>,
    /// Weight of the document embedding similarity (0.0-1.0)
    pub weight_document: Option<f32>,
    /// Overall score below which matched segments are dropped
    pub relevance_threshold: Option<f32>,
}

impl ScoringConfig {
    /// Get combination weights (defaults to 0.4/0.3/0.3)
    pub fn weights(&self) -> ScoringWeights {
        let defaults = ScoringWeights::default();
        ScoringWeights {
            sentence: self.weight_sentence.unwrap_or(defaults.sentence),
            tfidf: self.weight_tfidf.unwrap_or(defaults.tfidf),
            document: self.weight_document.unwrap_or(defaults.document),
        }
    }

    /// Get relevance threshold (defaults to 0.3)
    pub fn relevance_threshold(&self) -> f32 {
        self.relevance_threshold
            .unwrap_or(DEFAULT_RELEVANCE_THRESHOLD)
    }
}

/// Sentence matching configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Semantic similarity above which a pair becomes a match
    pub match_threshold: Option<f32>,
    /// Maximum matched segments retained
    pub max_matches: Option<usize>,
    /// Whether to compute the edit-distance corroboration
    pub lexical_signal: Option<bool>,
    /// Overall comparison timeout in milliseconds (absent = no timeout)
    pub timeout_ms: Option<u64>,
}

impl MatchingConfig {
    /// Get match threshold (defaults to 0.8)
    pub fn match_threshold(&self) -> f32 {
        self.match_threshold.unwrap_or(DEFAULT_MATCH_THRESHOLD)
    }

    /// Get max matches (defaults to 10)
    pub fn max_matches(&self) -> usize {
        self.max_matches.unwrap_or(MAX_MATCHED_SEGMENTS)
    }

    /// Get lexical signal flag (defaults to true)
    pub fn lexical_signal(&self) -> bool {
        self.lexical_signal.unwrap_or(true)
    }

    /// Get comparison timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Build the matcher configuration
    pub fn matcher_config(&self) -> MatcherConfig {
        MatcherConfig {
            match_threshold: self.match_threshold(),
            max_matches: self.max_matches(),
            lexical_signal: self.lexical_signal(),
        }
    }
}

/// Nearest-neighbor search configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NeighborConfig {
    /// Number of neighbors returned by default
    pub default_k: Option<usize>,
    /// Minimum similarity for a neighbor to be reported
    pub threshold: Option<f32>,
    /// Bound on documents scanned by the brute-force fallback
    pub scan_limit: Option<usize>,
}

impl NeighborConfig {
    /// Get default k (defaults to 5)
    pub fn default_k(&self) -> usize {
        self.default_k.unwrap_or(DEFAULT_SEARCH_K)
    }

    /// Get search threshold (defaults to 0.3)
    pub fn threshold(&self) -> f32 {
        self.threshold.unwrap_or(DEFAULT_SEARCH_THRESHOLD)
    }

    /// Get fallback scan limit (defaults to 100)
    pub fn scan_limit(&self) -> usize {
        self.scan_limit.unwrap_or(DEFAULT_SCAN_LIMIT)
    }

    /// Build the search configuration
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            scan_limit: self.scan_limit(),
        }
    }
}

/// Configuration loaded from .simscanrc.toml or ~/.config/simscan/config.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Embedding configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,

    /// Scoring configuration
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Sentence matching configuration
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Nearest-neighbor search configuration
    #[serde(default)]
    pub search: NeighborConfig,
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .simscanrc.toml in current directory
    /// 2. ~/.config/simscan/config.toml
    pub fn load() -> Self {
        if let Some(config) = Self::load_from_path(&PathBuf::from(".simscanrc.toml")) {
            return config;
        }

        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("simscan").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    fn load_from_path(path: &PathBuf) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Get the embedding configuration
    pub fn embeddings(&self) -> &EmbeddingConfig {
        &self.embeddings
    }

    /// Get the scoring configuration
    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// Get the matching configuration
    pub fn matching(&self) -> &MatchingConfig {
        &self.matching
    }

    /// Get the search configuration
    pub fn search(&self) -> &NeighborConfig {
        &self.search
    }
}
