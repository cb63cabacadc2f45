//! The memoization store.
//!
//! [`MemoStore`] maps owners to their [`OwnerCache`] and answers memoized
//! calls:
//!
//! ```text
//! once(owner, id, params, compute)
//!   ├─ disabled? ─────────────────────────────▶ compute()
//!   ├─ key  = compose(params)
//!   ├─ lock ─▶ owner cache ─▶ slot(id) ─▶ hit? ─▶ clone, return
//!   ├─ unlock, value = compute()              (error: return it, store nothing)
//!   └─ lock ─▶ slot(id).insert(key, value) ─▶ return value
//! ```
//!
//! The table lock is released while `compute` runs, so a computation may
//! itself call into the same store (recursive memoization). Two threads that
//! miss on the same key both compute; the last insert wins.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::config::OnceConfig;
use crate::error::{MemoError, Result};
use crate::identity::ComputationId;
use crate::key::{self, CompositeKey, KeyParams};
use crate::metrics::{spans, CounterSnapshot, MemoCounters, StoreStats};
use crate::owner::{AsOwner, OwnerCache, OwnerEntry, OwnerKey, OwnerRef};

/// Process-wide or scoped registry of owner caches.
pub struct MemoStore {
    enabled: AtomicBool,
    inner: Mutex<StoreInner>,
    counters: MemoCounters,
}

struct StoreInner {
    owners: HashMap<OwnerKey, OwnerEntry>,
    slot_capacity: usize,
    sweep_interval: u32,
    calls_since_sweep: usize,
}

impl StoreInner {
    /// Count one memoized call and sweep once enough calls have passed.
    ///
    /// The threshold grows with the table, so the cost of a sweep is spread
    /// over at least as many calls as there are entries to scan.
    fn tick(&mut self, counters: &MemoCounters) {
        if self.sweep_interval == 0 {
            return;
        }
        self.calls_since_sweep = self.calls_since_sweep.saturating_add(1);
        let threshold = (self.sweep_interval as usize).max(self.owners.len());
        if self.calls_since_sweep >= threshold {
            let purged = self.purge_reclaimed();
            MemoCounters::add(&counters.owners_reclaimed, purged as u64);
        }
    }

    /// The cache of `owner`, registering it on first use.
    fn cache_for(&mut self, owner: &OwnerRef, counters: &MemoCounters) -> &mut OwnerCache {
        if !self.owners.contains_key(&owner.key()) {
            MemoCounters::bump(&counters.owners_registered);
            debug!(owner = owner.type_name(), "registered memo owner");
        }
        let capacity = self.slot_capacity;
        &mut self
            .owners
            .entry(owner.key())
            .or_insert_with(|| OwnerEntry::new(owner, capacity))
            .cache
    }

    fn purge_reclaimed(&mut self) -> usize {
        let _span = tracing::debug_span!(spans::SWEEP).entered();
        let before = self.owners.len();
        self.owners.retain(|_, entry| entry.owner.is_alive());
        self.calls_since_sweep = 0;
        let purged = before - self.owners.len();
        if purged > 0 {
            info!(purged, remaining = self.owners.len(), "swept reclaimed memo owners");
        }
        purged
    }
}

impl MemoStore {
    /// Create an enabled store with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&OnceConfig::default())
    }

    /// Create a store from configuration.
    #[must_use]
    pub fn with_config(config: &OnceConfig) -> Self {
        Self {
            enabled: AtomicBool::new(config.general.enabled),
            inner: Mutex::new(StoreInner {
                owners: HashMap::new(),
                slot_capacity: config.store.max_entries_per_slot,
                sweep_interval: config.store.sweep_interval,
                calls_since_sweep: 0,
            }),
            counters: MemoCounters::new(),
        }
    }

    /// Apply configuration to a live store.
    ///
    /// Sets the switch and the sweep interval. The slot capacity applies to
    /// owners registered afterwards; existing caches keep their bounds.
    pub fn configure(&self, config: &OnceConfig) {
        self.set_enabled(config.general.enabled);
        let sweep_interval = config.store.sweep_interval;
        let max_entries_per_slot = config.store.max_entries_per_slot;
        let mut inner = self.inner.lock();
        inner.sweep_interval = sweep_interval;
        inner.slot_capacity = max_entries_per_slot;
        debug!(sweep_interval, max_entries_per_slot, "memo store reconfigured");
    }

    // -----------------------------------------------------------------------
    // Switch
    // -----------------------------------------------------------------------

    /// Turn memoization on or off for subsequent calls. Never discards data.
    pub fn set_enabled(&self, enabled: bool) {
        let was = self.enabled.swap(enabled, Ordering::Relaxed);
        if was != enabled {
            debug!(enabled, "memoization switch toggled");
        }
    }

    /// Whether calls consult the cache.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    // -----------------------------------------------------------------------
    // Memoized calls
    // -----------------------------------------------------------------------

    /// Return the cached result of `compute` for `(owner, id, params)`, or
    /// run it and cache the result.
    ///
    /// # Errors
    /// Returns [`MemoError::InvalidIdentity`] for a blank id,
    /// [`MemoError::OwnerGone`] for a dead weak owner and
    /// [`MemoError::ResultTypeMismatch`] when `id` was used with another
    /// result type on this owner.
    pub fn once<O, P, R, F>(&self, owner: &O, id: &ComputationId, params: &P, compute: F) -> Result<R>
    where
        O: AsOwner + ?Sized,
        P: KeyParams + ?Sized,
        R: Clone + Send + 'static,
        F: FnOnce() -> R,
    {
        self.try_once(owner, id, params, || Ok::<R, MemoError>(compute()))
    }

    /// Fallible variant of [`Self::once`].
    ///
    /// The computation's own error comes back unchanged and nothing is cached
    /// for the key, so the next call computes again. Engine errors are
    /// converted into `E` through `From<MemoError>`.
    ///
    /// # Errors
    /// Whatever `compute` returns, plus the engine errors of [`Self::once`].
    pub fn try_once<O, P, R, E, F>(
        &self,
        owner: &O,
        id: &ComputationId,
        params: &P,
        compute: F,
    ) -> std::result::Result<R, E>
    where
        O: AsOwner + ?Sized,
        P: KeyParams + ?Sized,
        R: Clone + Send + 'static,
        E: From<MemoError>,
        F: FnOnce() -> std::result::Result<R, E>,
    {
        if !self.is_enabled() {
            MemoCounters::bump(&self.counters.bypassed);
            return compute();
        }

        id.validate()?;
        let owner = owner.owner_ref()?;
        let key = key::compose(params);

        if let Some(hit) = self.lookup::<R>(&owner, id, key)? {
            MemoCounters::bump(&self.counters.hits);
            trace!(identity = %id, %key, "memo hit");
            return Ok(hit);
        }

        MemoCounters::bump(&self.counters.misses);
        debug!(identity = %id, %key, owner = owner.type_name(), "memo miss");
        let value = match compute() {
            Ok(value) => value,
            Err(err) => {
                MemoCounters::bump(&self.counters.computations_failed);
                debug!(identity = %id, %key, "memoized computation failed, nothing stored");
                return Err(err);
            }
        };

        self.insert(&owner, id, key, value.clone())?;
        Ok(value)
    }

    fn lookup<R: Clone + Send + 'static>(
        &self,
        owner: &OwnerRef,
        id: &ComputationId,
        key: CompositeKey,
    ) -> Result<Option<R>> {
        let mut inner = self.inner.lock();
        inner.tick(&self.counters);
        let slot = inner
            .cache_for(owner, &self.counters)
            .slot_for::<R>(id)
            .inspect_err(|err| warn!(%err, "computation identity reused with another result type"))?;
        Ok(slot.get(key).cloned())
    }

    fn insert<R: Send + 'static>(
        &self,
        owner: &OwnerRef,
        id: &ComputationId,
        key: CompositeKey,
        value: R,
    ) -> Result<()> {
        // A weakly passed owner may have died while computing.
        if !owner.is_alive() {
            return Ok(());
        }
        let mut inner = self.inner.lock();
        let slot = inner.cache_for(owner, &self.counters).slot_for::<R>(id)?;
        if let Some(evicted) = slot.insert(key, value) {
            MemoCounters::bump(&self.counters.evictions);
            trace!(identity = %id, %evicted, "evicted least recently used result");
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Invalidation
    // -----------------------------------------------------------------------

    /// Drop every owner's cache.
    pub fn clear_all(&self) {
        let _span = tracing::debug_span!(spans::CLEAR_ALL).entered();
        let mut inner = self.inner.lock();
        let owners = inner.owners.len();
        inner.owners.clear();
        inner.calls_since_sweep = 0;
        MemoCounters::bump(&self.counters.clears);
        info!(owners, "cleared all memo caches");
    }

    /// Drop one owner's cache. Returns whether it had one.
    pub fn clear_for_owner<O: AsOwner + ?Sized>(&self, owner: &O) -> bool {
        let removed = self.inner.lock().owners.remove(&owner.owner_key());
        match removed {
            Some(entry) => {
                MemoCounters::bump(&self.counters.clears);
                debug!(owner = entry.owner.type_name(), "cleared memo cache for owner");
                true
            }
            None => false,
        }
    }

    /// Drop the cache of a single computation on one owner. Returns whether
    /// it existed.
    pub fn clear_slot<O: AsOwner + ?Sized>(&self, owner: &O, id: &ComputationId) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner
            .owners
            .get_mut(&owner.owner_key())
            .is_some_and(|entry| entry.cache.remove_slot(id));
        if removed {
            MemoCounters::bump(&self.counters.clears);
            debug!(identity = %id, "cleared memo slot");
        }
        removed
    }

    /// Drop the caches of every owner that has been reclaimed. Returns how
    /// many were dropped.
    pub fn purge_reclaimed(&self) -> usize {
        let purged = self.inner.lock().purge_reclaimed();
        MemoCounters::add(&self.counters.owners_reclaimed, purged as u64);
        purged
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Whether `owner` currently has a cache entry.
    #[must_use]
    pub fn has_owner<O: AsOwner + ?Sized>(&self, owner: &O) -> bool {
        self.inner.lock().owners.contains_key(&owner.owner_key())
    }

    /// Current table sizes.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.lock();
        inner.owners.values().fold(
            StoreStats {
                owners: inner.owners.len(),
                ..StoreStats::default()
            },
            |mut stats, entry| {
                if entry.owner.is_alive() {
                    stats.live_owners += 1;
                }
                stats.slots += entry.cache.slot_count();
                stats.entries += entry.cache.entry_count();
                stats
            },
        )
    }

    /// Live counters.
    #[must_use]
    pub fn counters(&self) -> &MemoCounters {
        &self.counters
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }
}

impl Default for MemoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoStore")
            .field("enabled", &self.is_enabled())
            .field("stats", &self.stats())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::hash::{Hash, Hasher};
    use std::sync::Arc;

    struct Npc {
        _name: &'static str,
    }

    fn npc(name: &'static str) -> Arc<Npc> {
        Arc::new(Npc { _name: name })
    }

    fn square(store: &MemoStore, owner: &Arc<Npc>, x: i64, calls: &Cell<u32>) -> i64 {
        store
            .once(owner, &ComputationId::named("square"), &(x,), || {
                calls.set(calls.get() + 1);
                x * x
            })
            .expect("memoized call")
    }

    #[test]
    fn second_call_is_a_hit() {
        let store = MemoStore::new();
        let owner = npc("guard");
        let calls = Cell::new(0);
        assert_eq!(square(&store, &owner, 12, &calls), 144);
        assert_eq!(square(&store, &owner, 12, &calls), 144);
        assert_eq!(calls.get(), 1);
        let snap = store.snapshot();
        assert_eq!((snap.hits, snap.misses), (1, 1));
    }

    #[test]
    fn five_calls_two_computations() {
        let store = MemoStore::new();
        let owner = npc("guard");
        let calls = Cell::new(0);
        for x in [100, 100, 200, 200, 100] {
            square(&store, &owner, x, &calls);
        }
        assert_eq!(calls.get(), 2);
        assert_eq!(store.stats().entries, 2);
    }

    #[test]
    fn identities_are_isolated() {
        let store = MemoStore::new();
        let owner = npc("guard");
        let a = store
            .once(&owner, &ComputationId::named("double"), &(3_i32,), || 6)
            .expect("call");
        let b = store
            .once(&owner, &ComputationId::named("triple"), &(3_i32,), || 9)
            .expect("call");
        assert_eq!((a, b), (6, 9));
        assert_eq!(store.stats().slots, 2);
    }

    #[test]
    fn owners_are_isolated() {
        let store = MemoStore::new();
        let (a, b) = (npc("a"), npc("b"));
        let id = ComputationId::named("label");
        let first = store.once(&a, &id, &(), || "a").expect("call");
        let second = store.once(&b, &id, &(), || "b").expect("call");
        assert_eq!((first, second), ("a", "b"));
        assert_eq!(store.stats().owners, 2);
    }

    #[test]
    fn disabled_store_always_computes_and_keeps_data() {
        let store = MemoStore::new();
        let owner = npc("guard");
        let calls = Cell::new(0);
        square(&store, &owner, 4, &calls);

        store.set_enabled(false);
        square(&store, &owner, 4, &calls);
        square(&store, &owner, 4, &calls);
        assert_eq!(calls.get(), 3);
        assert_eq!(store.snapshot().bypassed, 2);

        store.set_enabled(true);
        square(&store, &owner, 4, &calls);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn disabled_store_skips_validation() {
        let store = MemoStore::new();
        store.set_enabled(false);
        let owner = npc("guard");
        let value = store
            .once(&owner, &ComputationId::named(""), &(), || 1)
            .expect("bypassed call");
        assert_eq!(value, 1);
        assert!(!store.has_owner(&owner));
    }

    #[test]
    fn clear_for_owner_leaves_others() {
        let store = MemoStore::new();
        let (a, b) = (npc("a"), npc("b"));
        let calls = Cell::new(0);
        square(&store, &a, 5, &calls);
        square(&store, &b, 5, &calls);

        assert!(store.clear_for_owner(&a));
        assert!(!store.clear_for_owner(&a));
        square(&store, &b, 5, &calls);
        assert_eq!(calls.get(), 2);
        square(&store, &a, 5, &calls);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn clear_all_empties_everything() {
        let store = MemoStore::new();
        let (a, b) = (npc("a"), npc("b"));
        let calls = Cell::new(0);
        square(&store, &a, 1, &calls);
        square(&store, &b, 1, &calls);
        store.clear_all();
        assert_eq!(store.stats(), StoreStats::default());
        square(&store, &a, 1, &calls);
        square(&store, &b, 1, &calls);
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn clear_slot_is_selective() {
        let store = MemoStore::new();
        let owner = npc("a");
        let calls = Cell::new(0);
        square(&store, &owner, 2, &calls);
        store
            .once(&owner, &ComputationId::named("other"), &(), || 0_u8)
            .expect("call");
        assert!(store.clear_slot(&owner, &ComputationId::named("square")));
        assert!(!store.clear_slot(&owner, &ComputationId::named("square")));
        assert_eq!(store.stats().slots, 1);
        square(&store, &owner, 2, &calls);
        assert_eq!(calls.get(), 2);
    }

    #[derive(Debug, PartialEq)]
    enum AppError {
        Pathing(&'static str),
        Memo(String),
    }

    impl From<MemoError> for AppError {
        fn from(err: MemoError) -> Self {
            Self::Memo(err.to_string())
        }
    }

    #[test]
    fn failures_pass_through_and_are_not_cached() {
        let store = MemoStore::new();
        let owner = npc("a");
        let id = ComputationId::named("route");
        let calls = Cell::new(0);
        let run = |fail: bool| {
            store.try_once(&owner, &id, &(7_u32,), || {
                calls.set(calls.get() + 1);
                if fail { Err(AppError::Pathing("blocked")) } else { Ok(70_u32) }
            })
        };
        assert_eq!(run(true), Err(AppError::Pathing("blocked")));
        assert_eq!(store.stats().entries, 0);
        assert_eq!(run(false), Ok(70));
        assert_eq!(run(true), Ok(70));
        assert_eq!(calls.get(), 2);
        assert_eq!(store.snapshot().computations_failed, 1);
    }

    #[test]
    fn blank_identity_is_rejected() {
        let store = MemoStore::new();
        let owner = npc("a");
        let err = store
            .once(&owner, &ComputationId::named(""), &(), || 1)
            .unwrap_err();
        assert!(matches!(err, MemoError::InvalidIdentity(_)));
        assert_eq!(store.stats().owners, 0);
    }

    #[test]
    fn engine_errors_convert_into_caller_type() {
        let store = MemoStore::new();
        let owner = npc("a");
        let err = store
            .try_once(&owner, &ComputationId::named(" "), &(), || Ok::<u8, AppError>(1))
            .unwrap_err();
        assert!(matches!(err, AppError::Memo(_)));
    }

    #[test]
    fn type_mismatch_is_reported() {
        let store = MemoStore::new();
        let owner = npc("a");
        let id = ComputationId::named("shared");
        store.once(&owner, &id, &(), || 1_u32).expect("call");
        let err = store.once(&owner, &id, &(), || "x").unwrap_err();
        assert!(matches!(err, MemoError::ResultTypeMismatch { .. }));
    }

    #[test]
    fn dead_weak_owner_is_rejected() {
        let store = MemoStore::new();
        let owner = npc("a");
        let weak = Arc::downgrade(&owner);
        drop(owner);
        let err = store
            .once(&weak, &ComputationId::named("x"), &(), || 1)
            .unwrap_err();
        assert!(matches!(err, MemoError::OwnerGone { .. }));
        // Clearing through a dead handle is still fine.
        assert!(!store.clear_for_owner(&weak));
    }

    #[test]
    fn weak_and_strong_handles_share_a_cache() {
        let store = MemoStore::new();
        let owner = npc("a");
        let weak = Arc::downgrade(&owner);
        let id = ComputationId::named("x");
        store.once(&owner, &id, &(1_u8,), || 10).expect("call");
        let hit = store.once(&weak, &id, &(1_u8,), || 99).expect("call");
        assert_eq!(hit, 10);
    }

    struct Test {
        number: i32,
        _label: String,
    }

    impl PartialEq for Test {
        fn eq(&self, other: &Self) -> bool {
            self.number == other.number
        }
    }

    impl Eq for Test {}

    impl Hash for Test {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.number.hash(state);
        }
    }

    #[test]
    fn custom_hash_makes_distinct_values_share_a_key() {
        let store = MemoStore::new();
        let owner = npc("a");
        let id = ComputationId::named("describe");
        let calls = Cell::new(0);
        let first = Test { number: 5, _label: "first".into() };
        let second = Test { number: 5, _label: "second".into() };
        for param in [&first, &second] {
            store
                .once(&owner, &id, &(param,), || {
                    calls.set(calls.get() + 1);
                    param.number * 2
                })
                .expect("call");
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn recursive_computation_reenters_store() {
        fn fib(store: &MemoStore, owner: &Arc<Npc>, n: u64, calls: &Cell<u32>) -> u64 {
            store
                .once(owner, &ComputationId::named("fib"), &(n,), || {
                    calls.set(calls.get() + 1);
                    if n < 2 { n } else { fib(store, owner, n - 1, calls) + fib(store, owner, n - 2, calls) }
                })
                .expect("memoized fib")
        }

        let store = MemoStore::new();
        let owner = npc("math");
        let calls = Cell::new(0);
        assert_eq!(fib(&store, &owner, 40, &calls), 102_334_155);
        assert_eq!(calls.get(), 41);
    }

    #[test]
    fn dropped_owner_is_swept() {
        let store = MemoStore::new();
        let owner = npc("temp");
        let result = Arc::new(vec![1_u8; 64]);
        let freed = Arc::downgrade(&result);
        store
            .once(&owner, &ComputationId::named("buffer"), &(), move || result)
            .expect("call");
        assert_eq!(store.stats().live_owners, 1);

        drop(owner);
        assert_eq!(store.stats().live_owners, 0);
        assert_eq!(store.purge_reclaimed(), 1);
        assert_eq!(store.stats().owners, 0);
        assert!(freed.upgrade().is_none());
        assert_eq!(store.snapshot().owners_reclaimed, 1);
    }

    #[test]
    fn calls_trigger_automatic_sweep() {
        let mut config = OnceConfig::default();
        config.store.sweep_interval = 3;
        let store = MemoStore::with_config(&config);
        let id = ComputationId::named("x");

        for _ in 0..2 {
            let temp = npc("temp");
            store.once(&temp, &id, &(), || 0_u8).expect("call");
        }
        assert_eq!(store.stats().owners, 2);

        let keeper = npc("keeper");
        store.once(&keeper, &id, &(), || 0_u8).expect("call");
        assert_eq!(store.stats().owners, 1);
        assert!(store.has_owner(&keeper));
    }

    #[test]
    fn bounded_slots_evict() {
        let mut config = OnceConfig::default();
        config.store.max_entries_per_slot = 2;
        let store = MemoStore::with_config(&config);
        let owner = npc("a");
        let calls = Cell::new(0);
        for x in [1, 2, 3, 1] {
            square(&store, &owner, x, &calls);
        }
        assert_eq!(calls.get(), 4);
        assert_eq!(store.stats().entries, 2);
        assert_eq!(store.snapshot().evictions, 2);
    }

    #[test]
    fn configure_toggles_switch_without_clearing() {
        let store = MemoStore::new();
        let owner = npc("a");
        let calls = Cell::new(0);
        square(&store, &owner, 9, &calls);

        let mut config = OnceConfig::default();
        config.general.enabled = false;
        store.configure(&config);
        assert!(!store.is_enabled());
        assert_eq!(store.stats().entries, 1);
    }

    #[test]
    fn store_is_shareable_across_threads() {
        let store = Arc::new(MemoStore::new());
        let owner = npc("shared");
        let handles: Vec<_> = (0..4_u64)
            .map(|i| {
                let store = Arc::clone(&store);
                let owner = Arc::clone(&owner);
                std::thread::spawn(move || {
                    store
                        .once(&owner, &ComputationId::named("id"), &(i % 2,), || i % 2)
                        .expect("call")
                })
            })
            .collect();
        for handle in handles {
            let value = handle.join().expect("thread");
            assert!(value < 2);
        }
        assert_eq!(store.stats().entries, 2);
    }

    #[test]
    fn hits_on_live_owner_sweep_dead_ones() {
        let mut config = OnceConfig::default();
        config.store.sweep_interval = 4;
        let store = MemoStore::with_config(&config);
        let id = ComputationId::named("x");
        let keeper = npc("keeper");

        let temp = npc("temp");
        store.once(&temp, &id, &(), || 0_u8).expect("call");
        drop(temp);

        for _ in 0..4 {
            store.once(&keeper, &id, &(), || 0_u8).expect("call");
        }
        assert_eq!(store.stats().owners, 1);
        assert_eq!(store.snapshot().owners_reclaimed, 1);
    }

    #[test]
    fn zero_interval_never_counts_or_sweeps() {
        let mut config = OnceConfig::default();
        config.store.sweep_interval = 0;
        let store = MemoStore::with_config(&config);
        let id = ComputationId::named("x");

        let temp = npc("temp");
        store.once(&temp, &id, &(), || 0_u8).expect("call");
        drop(temp);

        let keeper = npc("keeper");
        for _ in 0..100 {
            store.once(&keeper, &id, &(), || 0_u8).expect("call");
        }
        assert_eq!(store.inner.lock().calls_since_sweep, 0);
        assert_eq!(store.stats().owners, 2);
        assert_eq!(store.purge_reclaimed(), 1);
    }

    struct Exploding;

    impl Hash for Exploding {
        fn hash<H: Hasher>(&self, _state: &mut H) {
            panic!("hash exploded");
        }
    }

    #[test]
    fn panicking_parameter_hash_leaves_store_untouched() {
        let store = MemoStore::new();
        let owner = npc("a");
        let calls = Cell::new(0);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            store.once(&owner, &ComputationId::named("explode"), &(1_u8, Exploding), || {
                calls.set(calls.get() + 1);
                1_u32
            })
        }));
        assert!(outcome.is_err());
        assert_eq!(calls.get(), 0);
        assert_eq!(store.stats(), StoreStats::default());
        assert_eq!(store.snapshot().misses, 0);

        let value = store
            .once(&owner, &ComputationId::named("explode"), &(1_u8,), || 2_u32)
            .expect("store still usable");
        assert_eq!(value, 2);
    }
}
