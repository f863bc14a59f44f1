// SPDX-License-Identifier: MIT OR Apache-2.0

//! Injectable embedding facade shared across concurrent comparisons.
//!
//! One `Embedder` is constructed at process start around a provider and
//! passed to every component that needs vectors. The provider sits behind
//! a mutex; calls never mutate model state, so sharing is safe, and the
//! optional content-keyed cache keeps repeated sentences from being
//! embedded twice.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::embedding::cache::{Claim, EmbeddingCache};
use crate::embedding::provider::EmbeddingProvider;
use crate::errors::{Result, SimilarityError};
use crate::segment::SentenceSegmenter;

/// Number of text units sent to the provider per batch.
///
/// Purely a throughput/memory knob: batch boundaries never affect output
/// values.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Long-lived embedding facade.
pub struct Embedder {
    provider: Mutex<Box<dyn EmbeddingProvider>>,
    cache: Option<EmbeddingCache>,
    model_id: String,
    dimension: usize,
    batch_size: usize,
}

impl Embedder {
    pub fn new(provider: Box<dyn EmbeddingProvider>) -> Self {
        Self::with_batch_size(provider, DEFAULT_BATCH_SIZE)
    }

    pub fn with_batch_size(provider: Box<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        let model_id = provider.model_id().to_string();
        let dimension = provider.dimension();
        Self {
            provider: Mutex::new(provider),
            cache: None,
            model_id,
            dimension,
            batch_size: batch_size.max(1),
        }
    }

    /// Attaches a bounded embedding cache.
    pub fn with_cache(mut self, cache: EmbeddingCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embeds each unit, order-preserving, one vector per input.
    ///
    /// Fails with [`SimilarityError::EmptyInput`] if any unit is empty or
    /// whitespace-only after trimming.
    pub fn embed(&self, units: &[String]) -> Result<Vec<Vec<f32>>> {
        for unit in units {
            if unit.trim().is_empty() {
                return Err(SimilarityError::EmptyInput);
            }
        }
        if units.is_empty() {
            return Ok(Vec::new());
        }

        match &self.cache {
            Some(cache) => self.embed_cached(cache, units),
            None => self.embed_direct(units),
        }
    }

    /// Embeds a single unit.
    pub fn embed_one(&self, unit: &str) -> Result<Vec<f32>> {
        let units = [unit.to_string()];
        let mut vectors = self.embed(&units)?;
        vectors
            .pop()
            .ok_or_else(|| SimilarityError::Embedding(anyhow::anyhow!("no embedding returned")))
    }

    /// Embeds a whole document as the componentwise mean of its sentence
    /// vectors.
    pub fn embed_document(
        &self,
        text: &str,
        segmenter: &dyn SentenceSegmenter,
    ) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(SimilarityError::EmptyInput);
        }

        let mut sentences = segmenter.segment(text);
        if sentences.is_empty() {
            sentences.push(text.trim().to_string());
        }

        let vectors = self.embed(&sentences)?;
        let mut mean = vec![0.0f32; self.dimension];
        for vector in &vectors {
            for (slot, value) in mean.iter_mut().zip(vector.iter()) {
                *slot += value;
            }
        }
        let count = vectors.len() as f32;
        for slot in mean.iter_mut() {
            *slot /= count;
        }

        Ok(mean)
    }

    fn embed_direct(&self, units: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(units.len());
        for batch in units.chunks(self.batch_size) {
            let mut provider = self.provider.lock().expect("provider lock poisoned");
            let mut embedded = provider
                .embed_texts(batch)
                .map_err(SimilarityError::Embedding)?;
            drop(provider);

            if embedded.len() != batch.len() {
                return Err(SimilarityError::Embedding(anyhow::anyhow!(
                    "provider returned {} vectors for {} inputs",
                    embedded.len(),
                    batch.len()
                )));
            }
            vectors.append(&mut embedded);
        }
        Ok(vectors)
    }

    fn embed_cached(&self, cache: &EmbeddingCache, units: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut outputs: Vec<Option<Arc<Vec<f32>>>> = vec![None; units.len()];
        // Keys this call owns, with every unit index that wants each key.
        let mut pending: Vec<(String, String, Vec<usize>)> = Vec::new();

        for (idx, unit) in units.iter().enumerate() {
            let key = EmbeddingCache::key(&self.model_id, unit);
            if let Some(entry) = pending.iter_mut().find(|(k, _, _)| *k == key) {
                entry.2.push(idx);
                continue;
            }
            match cache.claim(&key) {
                Claim::Hit(vector) => outputs[idx] = Some(vector),
                Claim::Miss => pending.push((key, unit.clone(), vec![idx])),
            }
        }

        if !pending.is_empty() {
            debug!(
                misses = pending.len(),
                total = units.len(),
                "embedding cache misses"
            );
            let texts: Vec<String> = pending.iter().map(|(_, text, _)| text.clone()).collect();
            let vectors = match self.embed_direct(&texts) {
                Ok(vectors) => vectors,
                Err(err) => {
                    for (key, _, _) in &pending {
                        cache.abandon(key);
                    }
                    return Err(err);
                }
            };

            for ((key, _, indices), vector) in pending.iter().zip(vectors.into_iter()) {
                let vector = Arc::new(vector);
                cache.complete(key, Arc::clone(&vector));
                for &idx in indices {
                    outputs[idx] = Some(Arc::clone(&vector));
                }
            }
        }

        Ok(outputs
            .into_iter()
            .map(|slot| slot.map(|v| (*v).clone()).unwrap_or_default())
            .collect())
    }
}
