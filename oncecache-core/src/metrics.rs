//! Runtime counters for the memoization engine.
//!
//! Every [`crate::MemoStore`] carries a [`MemoCounters`] block updated on the
//! hot path with relaxed atomics. Snapshots can be exported in Prometheus
//! text format for server dashboards.

use std::sync::atomic::{AtomicU64, Ordering};

// ---------------------------------------------------------------------------
// Counters (lock-free)
// ---------------------------------------------------------------------------

/// Atomic counters for high-frequency store events.
pub struct MemoCounters {
    /// Lookups answered from the cache.
    pub hits: AtomicU64,
    /// Lookups that ran the computation.
    pub misses: AtomicU64,
    /// Computations that returned an error (nothing stored).
    pub computations_failed: AtomicU64,
    /// Calls made while memoization was disabled.
    pub bypassed: AtomicU64,
    /// Owners that received a cache.
    pub owners_registered: AtomicU64,
    /// Caches dropped because their owner was reclaimed.
    pub owners_reclaimed: AtomicU64,
    /// Results evicted from bounded slots.
    pub evictions: AtomicU64,
    /// Explicit clear operations (all, owner or slot).
    pub clears: AtomicU64,
}

impl MemoCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            computations_failed: AtomicU64::new(0),
            bypassed: AtomicU64::new(0),
            owners_registered: AtomicU64::new(0),
            owners_reclaimed: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            clears: AtomicU64::new(0),
        }
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            computations_failed: self.computations_failed.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
            owners_registered: self.owners_registered.load(Ordering::Relaxed),
            owners_reclaimed: self.owners_reclaimed.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
        }
    }
}

impl Default for MemoCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    /// Cache hits.
    pub hits: u64,
    /// Cache misses.
    pub misses: u64,
    /// Failed computations.
    pub computations_failed: u64,
    /// Calls that bypassed the cache.
    pub bypassed: u64,
    /// Owners registered.
    pub owners_registered: u64,
    /// Owners reclaimed.
    pub owners_reclaimed: u64,
    /// Bounded-slot evictions.
    pub evictions: u64,
    /// Explicit clears.
    pub clears: u64,
}

impl CounterSnapshot {
    /// Fraction of cached lookups that hit (0.0 when nothing was looked up).
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }

    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP oncecache_lookups_total Memoized lookups by outcome\n\
             # TYPE oncecache_lookups_total counter\n\
             oncecache_lookups_total{{outcome=\"hit\"}} {}\n\
             oncecache_lookups_total{{outcome=\"miss\"}} {}\n\
             # HELP oncecache_computations_failed_total Computations that returned an error\n\
             # TYPE oncecache_computations_failed_total counter\n\
             oncecache_computations_failed_total {}\n\
             # HELP oncecache_bypassed_total Calls made while memoization was disabled\n\
             # TYPE oncecache_bypassed_total counter\n\
             oncecache_bypassed_total {}\n\
             # HELP oncecache_owners_registered_total Owners that received a cache\n\
             # TYPE oncecache_owners_registered_total counter\n\
             oncecache_owners_registered_total {}\n\
             # HELP oncecache_owners_reclaimed_total Owner caches dropped after reclamation\n\
             # TYPE oncecache_owners_reclaimed_total counter\n\
             oncecache_owners_reclaimed_total {}\n\
             # HELP oncecache_evictions_total Results evicted from bounded slots\n\
             # TYPE oncecache_evictions_total counter\n\
             oncecache_evictions_total {}\n\
             # HELP oncecache_clears_total Explicit clear operations\n\
             # TYPE oncecache_clears_total counter\n\
             oncecache_clears_total {}\n",
            self.hits,
            self.misses,
            self.computations_failed,
            self.bypassed,
            self.owners_registered,
            self.owners_reclaimed,
            self.evictions,
            self.clears,
        )
    }
}

/// Size of a store at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    /// Owner entries in the table, including not yet swept dead ones.
    pub owners: usize,
    /// Owner entries whose owner is still alive.
    pub live_owners: usize,
    /// Function slots across all owners.
    pub slots: usize,
    /// Stored results across all slots.
    pub entries: usize,
}

// ---------------------------------------------------------------------------
// Tracing Span Names
// ---------------------------------------------------------------------------

/// Span names used with `tracing` spans.
pub mod spans {
    /// Reclamation sweep.
    pub const SWEEP: &str = "oncecache::sweep";
    /// Bulk clear.
    pub const CLEAR_ALL: &str = "oncecache::clear_all";
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
