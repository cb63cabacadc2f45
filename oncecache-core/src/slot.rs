//! Per-computation result table.
//!
//! A [`FunctionSlot`] holds the results of one computation on one owner,
//! keyed by [`CompositeKey`]. Slots are unbounded by default; with a
//! capacity the least recently used key is evicted first.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::key::CompositeKey;

/// Result table for one (owner, computation identity) pair.
pub struct FunctionSlot<R> {
    entries: LruCache<CompositeKey, R>,
}

impl<R> FunctionSlot<R> {
    /// Create a slot holding at most `capacity` results (`0` = unbounded).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let entries = match NonZeroUsize::new(capacity) {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };
        Self { entries }
    }

    /// Look up a stored result, marking it most recently used.
    pub fn get(&mut self, key: CompositeKey) -> Option<&R> {
        self.entries.get(&key)
    }

    /// Whether a result is stored for `key`, without touching recency.
    #[must_use]
    pub fn contains(&self, key: CompositeKey) -> bool {
        self.entries.contains(&key)
    }

    /// Store a result, overwriting any previous one for the same key.
    ///
    /// Returns the key evicted to make room, if the slot was full.
    pub fn insert(&mut self, key: CompositeKey, value: R) -> Option<CompositeKey> {
        match self.entries.push(key, value) {
            Some((old, _)) if old != key => Some(old),
            _ => None,
        }
    }

    /// Drop one stored result.
    pub fn remove(&mut self, key: CompositeKey) -> Option<R> {
        self.entries.pop(&key)
    }

    /// Drop every stored result.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<R: Clone> FunctionSlot<R> {
    /// Return the stored result for `key`, or run `compute` once and store it.
    pub fn get_or_compute(&mut self, key: CompositeKey, compute: impl FnOnce() -> R) -> R {
        if let Some(hit) = self.entries.get(&key) {
            return hit.clone();
        }
        let value = compute();
        self.insert(key, value.clone());
        value
    }

    /// Fallible variant of [`Self::get_or_compute`].
    ///
    /// # Errors
    /// Returns whatever `compute` returned. Nothing is stored on failure.
    pub fn try_get_or_compute<E>(
        &mut self,
        key: CompositeKey,
        compute: impl FnOnce() -> Result<R, E>,
    ) -> Result<R, E> {
        if let Some(hit) = self.entries.get(&key) {
            return Ok(hit.clone());
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }
}

impl<R> Default for FunctionSlot<R> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<R> std::fmt::Debug for FunctionSlot<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionSlot")
            .field("entries", &self.entries.len())
            .field("capacity", &self.entries.cap())
            .finish()
    }
}
