//! Owners and their caches.
//!
//! An owner is any `Arc<T>` used as the scope of a set of memoized
//! computations. The store never holds a strong reference to it: the owner's
//! value is dropped as soon as the program releases its last `Arc`, and the
//! entry left behind is freed by the next sweep.
//!
//! Owners are keyed by allocation address. The `Weak` kept per entry pins the
//! allocation (not the value) until the entry is dropped, so an address can
//! never be handed to a new owner while a stale entry still refers to it.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::error::{MemoError, Result};
use crate::identity::ComputationId;
use crate::slot::FunctionSlot;

// ---------------------------------------------------------------------------
// Owner handles
// ---------------------------------------------------------------------------

/// Address of an owner's allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerKey(usize);

/// A resolved, weakly held owner.
#[derive(Debug, Clone)]
pub struct OwnerRef {
    key: OwnerKey,
    handle: Weak<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl OwnerRef {
    /// The owner's table key.
    #[must_use]
    pub fn key(&self) -> OwnerKey {
        self.key
    }

    /// Type name of the owner.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the owner has not been dropped yet.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.handle.strong_count() > 0
    }
}

/// Types usable as a cache owner.
pub trait AsOwner {
    /// Table key of this owner. Infallible so clearing never fails.
    fn owner_key(&self) -> OwnerKey;

    /// Resolve to a weak handle.
    ///
    /// # Errors
    /// Returns [`MemoError::OwnerGone`] when the handle no longer points at a
    /// live owner.
    fn owner_ref(&self) -> Result<OwnerRef>;
}

impl<T: Send + Sync + 'static> AsOwner for Arc<T> {
    fn owner_key(&self) -> OwnerKey {
        OwnerKey(Arc::as_ptr(self).cast::<()>() as usize)
    }

    fn owner_ref(&self) -> Result<OwnerRef> {
        let weak: Weak<T> = Arc::downgrade(self);
        let handle: Weak<dyn Any + Send + Sync> = weak;
        Ok(OwnerRef {
            key: self.owner_key(),
            handle,
            type_name: type_name::<T>(),
        })
    }
}

impl<T: Send + Sync + 'static> AsOwner for Weak<T> {
    fn owner_key(&self) -> OwnerKey {
        OwnerKey(Weak::as_ptr(self).cast::<()>() as usize)
    }

    fn owner_ref(&self) -> Result<OwnerRef> {
        if self.strong_count() == 0 {
            return Err(MemoError::OwnerGone {
                type_name: type_name::<T>(),
            });
        }
        let weak: Weak<T> = Weak::clone(self);
        let handle: Weak<dyn Any + Send + Sync> = weak;
        Ok(OwnerRef {
            key: self.owner_key(),
            handle,
            type_name: type_name::<T>(),
        })
    }
}

// ---------------------------------------------------------------------------
// Type-erased slots
// ---------------------------------------------------------------------------

trait ErasedSlot: Send {
    fn len(&self) -> usize;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<R: Send + 'static> ErasedSlot for FunctionSlot<R> {
    fn len(&self) -> usize {
        FunctionSlot::len(self)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct SlotEntry {
    slot: Box<dyn ErasedSlot>,
    result_type: &'static str,
}

// ---------------------------------------------------------------------------
// OwnerCache
// ---------------------------------------------------------------------------

/// All function slots of one owner, keyed by computation identity.
pub struct OwnerCache {
    slots: HashMap<ComputationId, SlotEntry>,
    slot_capacity: usize,
}

impl OwnerCache {
    /// Create an empty cache whose slots hold at most `slot_capacity`
    /// results each (`0` = unbounded).
    #[must_use]
    pub fn new(slot_capacity: usize) -> Self {
        Self {
            slots: HashMap::new(),
            slot_capacity,
        }
    }

    /// The slot for `id`, created on first access.
    ///
    /// # Errors
    /// Returns [`MemoError::ResultTypeMismatch`] if the slot already exists
    /// with a different result type.
    pub fn slot_for<R: Send + 'static>(
        &mut self,
        id: &ComputationId,
    ) -> Result<&mut FunctionSlot<R>> {
        let capacity = self.slot_capacity;
        let entry = self.slots.entry(id.clone()).or_insert_with(|| SlotEntry {
            slot: Box::new(FunctionSlot::<R>::new(capacity)),
            result_type: type_name::<R>(),
        });
        let stored = entry.result_type;
        entry
            .slot
            .as_any_mut()
            .downcast_mut::<FunctionSlot<R>>()
            .ok_or_else(|| MemoError::ResultTypeMismatch {
                identity: id.to_string(),
                stored,
                requested: type_name::<R>(),
            })
    }

    /// Whether a slot exists for `id`.
    #[must_use]
    pub fn has_slot(&self, id: &ComputationId) -> bool {
        self.slots.contains_key(id)
    }

    /// Drop the slot for `id`. Returns whether one existed.
    pub fn remove_slot(&mut self, id: &ComputationId) -> bool {
        self.slots.remove(id).is_some()
    }

    /// Drop every slot.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Number of slots.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of stored results across all slots.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.slots.values().map(|s| s.slot.len()).sum()
    }

    /// Whether no slot exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for OwnerCache {
    fn default() -> Self {
        Self::new(0)
    }
}

impl std::fmt::Debug for OwnerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnerCache")
            .field("slots", &self.slots.len())
            .field("entries", &self.entry_count())
            .finish()
    }
}

/// An owner's table row: weak handle plus cache.
pub(crate) struct OwnerEntry {
    pub(crate) owner: OwnerRef,
    pub(crate) cache: OwnerCache,
}

impl OwnerEntry {
    pub(crate) fn new(owner: &OwnerRef, slot_capacity: usize) -> Self {
        Self {
            owner: owner.clone(),
            cache: OwnerCache::new(slot_capacity),
        }
    }
}
