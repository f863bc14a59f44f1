// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded in-process cache of embedding vectors keyed by text content.
//!
//! The cache is explicit and externally visible: callers claim a key,
//! compute on a miss, then publish or abandon the result. At most one
//! computation per key is in flight; a concurrent claim for the same key
//! blocks until the owner publishes or abandons. Capacity is bounded with
//! insertion-order eviction.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Condvar, Mutex};

/// Default number of cached vectors.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Outcome of [`EmbeddingCache::claim`].
pub enum Claim {
    /// The vector is cached.
    Hit(Arc<Vec<f32>>),
    /// The caller now owns the computation for this key and must call
    /// `complete` or `abandon`.
    Miss,
}

struct CacheState {
    entries: HashMap<String, Arc<Vec<f32>>>,
    order: VecDeque<String>,
    in_flight: HashSet<String>,
}

/// Bounded embedding cache with at-most-one computation per key in flight.
pub struct EmbeddingCache {
    state: Mutex<CacheState>,
    ready: Condvar,
    capacity: usize,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
                in_flight: HashSet::new(),
            }),
            ready: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    /// Cache key for a text under a given model. Different models never
    /// share entries.
    pub fn key(model_id: &str, text: &str) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(model_id.as_bytes());
        hasher.update(&[0]);
        hasher.update(text.as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    /// Looks up `key`, blocking while another thread computes it.
    ///
    /// On `Claim::Miss` the caller owns the computation and must follow
    /// up with [`complete`](Self::complete) or [`abandon`](Self::abandon),
    /// otherwise waiters block until this claim is resolved.
    pub fn claim(&self, key: &str) -> Claim {
        let mut state = self.state.lock().expect("cache lock poisoned");
        loop {
            if let Some(vector) = state.entries.get(key) {
                return Claim::Hit(Arc::clone(vector));
            }
            if !state.in_flight.contains(key) {
                state.in_flight.insert(key.to_string());
                return Claim::Miss;
            }
            state = self.ready.wait(state).expect("cache lock poisoned");
        }
    }

    /// Publishes a computed vector and wakes waiters.
    pub fn complete(&self, key: &str, vector: Arc<Vec<f32>>) {
        let mut state = self.state.lock().expect("cache lock poisoned");
        state.in_flight.remove(key);
        if state.entries.insert(key.to_string(), vector).is_none() {
            state.order.push_back(key.to_string());
        }
        while state.entries.len() > self.capacity {
            match state.order.pop_front() {
                Some(oldest) => {
                    state.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.ready.notify_all();
    }

    /// Releases a claimed key without publishing, waking waiters so one
    /// of them can retry the computation.
    pub fn abandon(&self, key: &str) {
        let mut state = self.state.lock().expect("cache lock poisoned");
        state.in_flight.remove(key);
        self.ready.notify_all();
    }

    /// Number of cached vectors.
    pub fn len(&self) -> usize {
        self.state.lock().expect("cache lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
