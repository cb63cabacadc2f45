//! Process-wide memoization facade.
//!
//! One [`MemoStore`] lives for the whole process, created enabled on first
//! use. The free functions here are the only way to reach it:
//!
//! ```
//! use std::sync::Arc;
//! use oncecache_core::{computation_id, global};
//!
//! struct Terrain { seed: u64 }
//!
//! let terrain = Arc::new(Terrain { seed: 7 });
//! let id = computation_id!("terrain::height");
//! let height = |x: i32, z: i32| {
//!     global::once(&terrain, &id, &(x, z), || (x * 31 + z) as u64 ^ terrain.seed)
//! };
//! assert_eq!(height(3, 4).unwrap(), height(3, 4).unwrap());
//! ```

use std::sync::{Arc, LazyLock};

use crate::config::OnceConfig;
use crate::error::{MemoError, Result};
use crate::identity::ComputationId;
use crate::key::KeyParams;
use crate::metrics::{CounterSnapshot, StoreStats};
use crate::owner::AsOwner;
use crate::store::MemoStore;

static STORE: LazyLock<MemoStore> = LazyLock::new(MemoStore::new);

/// The process-wide store.
#[must_use]
pub fn store() -> &'static MemoStore {
    &STORE
}

/// Memoized call on the process-wide store. See [`MemoStore::once`].
///
/// # Errors
/// Engine misuse only; see [`MemoStore::once`].
pub fn once<O, P, R, F>(owner: &O, id: &ComputationId, params: &P, compute: F) -> Result<R>
where
    O: AsOwner + ?Sized,
    P: KeyParams + ?Sized,
    R: Clone + Send + 'static,
    F: FnOnce() -> R,
{
    STORE.once(owner, id, params, compute)
}

/// Fallible memoized call on the process-wide store. See
/// [`MemoStore::try_once`].
///
/// # Errors
/// The computation's own error, unchanged, or an engine error converted into
/// `E`.
pub fn try_once<O, P, R, E, F>(
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
    STORE.try_once(owner, id, params, compute)
}

/// Turn memoization on. Cached results become reachable again.
pub fn enable() {
    STORE.set_enabled(true);
}

/// Turn memoization off. Every call computes; nothing is discarded.
pub fn disable() {
    STORE.set_enabled(false);
}

/// Whether memoization is on.
#[must_use]
pub fn is_enabled() -> bool {
    STORE.is_enabled()
}

/// Drop every owner's cache.
pub fn clear_all() {
    STORE.clear_all();
}

/// Drop one owner's cache. Returns whether it had one.
pub fn clear_for_owner<O: AsOwner + ?Sized>(owner: &O) -> bool {
    STORE.clear_for_owner(owner)
}

/// Drop one computation's cache on one owner.
pub fn clear_slot<O: AsOwner + ?Sized>(owner: &O, id: &ComputationId) -> bool {
    STORE.clear_slot(owner, id)
}

/// Drop the caches of reclaimed owners now instead of at the next sweep.
pub fn purge_reclaimed() -> usize {
    STORE.purge_reclaimed()
}

/// Apply configuration to the process-wide store.
pub fn configure(config: &OnceConfig) {
    STORE.configure(config);
}

/// Table sizes of the process-wide store.
#[must_use]
pub fn stats() -> StoreStats {
    STORE.stats()
}

/// Counter snapshot of the process-wide store.
#[must_use]
pub fn snapshot() -> CounterSnapshot {
    STORE.snapshot()
}

// ---------------------------------------------------------------------------
// Owner-side convenience
// ---------------------------------------------------------------------------

/// Memoization through the owner itself, on the process-wide store.
///
/// ```
/// use std::sync::Arc;
/// use oncecache_core::{computation_id, MemoOwner};
///
/// struct Village { houses: Vec<u32> }
///
/// let village = Arc::new(Village { houses: vec![3, 4, 5] });
/// let id = computation_id!();
/// let total = village.once(&id, &(), || village.houses.iter().sum::<u32>()).unwrap();
/// assert_eq!(total, 12);
/// assert!(village.clear_memoized());
/// ```
pub trait MemoOwner {
    /// Memoized call scoped to `self`.
    ///
    /// # Errors
    /// Engine misuse only; see [`MemoStore::once`].
    fn once<P, R, F>(&self, id: &ComputationId, params: &P, compute: F) -> Result<R>
    where
        P: KeyParams + ?Sized,
        R: Clone + Send + 'static,
        F: FnOnce() -> R;

    /// Fallible memoized call scoped to `self`.
    ///
    /// # Errors
    /// The computation's own error, or an engine error converted into `E`.
    fn try_once<P, R, E, F>(&self, id: &ComputationId, params: &P, compute: F) -> std::result::Result<R, E>
    where
        P: KeyParams + ?Sized,
        R: Clone + Send + 'static,
        E: From<MemoError>,
        F: FnOnce() -> std::result::Result<R, E>;

    /// Drop everything memoized on `self`. Returns whether anything was.
    fn clear_memoized(&self) -> bool;
}

impl<T: Send + Sync + 'static> MemoOwner for Arc<T> {
    fn once<P, R, F>(&self, id: &ComputationId, params: &P, compute: F) -> Result<R>
    where
        P: KeyParams + ?Sized,
        R: Clone + Send + 'static,
        F: FnOnce() -> R,
    {
        STORE.once(self, id, params, compute)
    }

    fn try_once<P, R, E, F>(&self, id: &ComputationId, params: &P, compute: F) -> std::result::Result<R, E>
    where
        P: KeyParams + ?Sized,
        R: Clone + Send + 'static,
        E: From<MemoError>,
        F: FnOnce() -> std::result::Result<R, E>,
    {
        STORE.try_once(self, id, params, compute)
    }

    fn clear_memoized(&self) -> bool {
        STORE.clear_for_owner(self)
    }
}
