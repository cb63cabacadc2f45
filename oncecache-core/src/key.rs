//! Composite key derivation.
//!
//! A memoized call is looked up by a single [`CompositeKey`] folded from the
//! hashes of its parameters, in order:
//!
//! ```text
//! acc = 17
//! for p in params:  acc = acc * 31 + hash(p)     (wrapping u64)
//! ```
//!
//! Each parameter is hashed through its own [`Hash`] impl with a fixed-key
//! hasher, so keys are stable for the whole process run (and across runs).
//! Equal parameter sequences always produce equal keys; unequal sequences
//! may collide. Collisions are not verified against the original
//! parameters.
//!
//! ## Hash stability
//!
//! A parameter whose hash changes between the call that stored a result and
//! a later "equal" call (interior mutability, hashing a cell's contents, ...)
//! silently misses or collides. Parameters must hash stably for as long as
//! the memoized result is expected to be reused.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Seed of the fold; also the key of a call with no parameters.
pub const KEY_SEED: u64 = 17;

/// Multiplier applied to the accumulator before each parameter.
pub const KEY_PRIME: u64 = 31;

/// Lookup key of one parameter sequence inside a [`crate::FunctionSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey(pub u64);

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Composer
// ---------------------------------------------------------------------------

/// Order-sensitive accumulator over parameter hashes.
#[derive(Debug, Clone, Copy)]
pub struct KeyComposer {
    acc: u64,
}

impl KeyComposer {
    /// Start a new fold at [`KEY_SEED`].
    #[must_use]
    pub const fn new() -> Self {
        Self { acc: KEY_SEED }
    }

    /// Fold one parameter into the key.
    ///
    /// A panicking `Hash` impl unwinds out of here before any cache state
    /// is touched.
    pub fn push<T: Hash + ?Sized>(&mut self, value: &T) -> &mut Self {
        self.acc = self
            .acc
            .wrapping_mul(KEY_PRIME)
            .wrapping_add(element_hash(value));
        self
    }

    /// Finish the fold.
    #[must_use]
    pub const fn finish(&self) -> CompositeKey {
        CompositeKey(self.acc)
    }
}

impl Default for KeyComposer {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash of a single parameter, independent of its position.
#[must_use]
pub fn element_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Compose the key of a full parameter sequence.
#[must_use]
pub fn compose<P: KeyParams + ?Sized>(params: &P) -> CompositeKey {
    let mut composer = KeyComposer::new();
    params.feed(&mut composer);
    composer.finish()
}

// ---------------------------------------------------------------------------
// Parameter sequences
// ---------------------------------------------------------------------------

/// An ordered parameter sequence that can be folded into a [`CompositeKey`].
///
/// Implemented for `()` (no parameters), tuples of up to twelve [`Hash`]
/// values, and homogeneous slices, arrays and `Vec`s. Each tuple field or
/// slice element counts as one parameter. A collection passed *inside* a
/// tuple is a single parameter hashed by its own `Hash` impl.
pub trait KeyParams {
    /// Push every parameter, in order, into `composer`.
    fn feed(&self, composer: &mut KeyComposer);
}

impl KeyParams for () {
    fn feed(&self, _composer: &mut KeyComposer) {}
}

impl<T: Hash> KeyParams for [T] {
    fn feed(&self, composer: &mut KeyComposer) {
        for value in self {
            composer.push(value);
        }
    }
}

impl<T: Hash, const N: usize> KeyParams for [T; N] {
    fn feed(&self, composer: &mut KeyComposer) {
        self.as_slice().feed(composer);
    }
}

impl<T: Hash> KeyParams for Vec<T> {
    fn feed(&self, composer: &mut KeyComposer) {
        self.as_slice().feed(composer);
    }
}

impl<P: KeyParams + ?Sized> KeyParams for &P {
    fn feed(&self, composer: &mut KeyComposer) {
        (**self).feed(composer);
    }
}

macro_rules! tuple_params {
    ($($name:ident)+) => {
        impl<$($name: Hash),+> KeyParams for ($($name,)+) {
            #[allow(non_snake_case)]
            fn feed(&self, composer: &mut KeyComposer) {
                let ($($name,)+) = self;
                $(composer.push($name);)+
            }
        }
    };
}

tuple_params!(A);
tuple_params!(A B);
tuple_params!(A B C);
tuple_params!(A B C D);
tuple_params!(A B C D E);
tuple_params!(A B C D E F);
tuple_params!(A B C D E F G);
tuple_params!(A B C D E F G H);
tuple_params!(A B C D E F G H I);
tuple_params!(A B C D E F G H I J);
tuple_params!(A B C D E F G H I J K);
tuple_params!(A B C D E F G H I J K L);

// ---------------------------------------------------------------------------
// Pointer identity wrapper
// ---------------------------------------------------------------------------

/// Hashes and compares an `Arc` by allocation address instead of contents.
///
/// Use it for parameters that should key on *which* object was passed, not
/// on what it currently holds.
#[derive(Debug)]
pub struct ByAddress<T: ?Sized>(pub Arc<T>);

impl<T: ?Sized> Clone for ByAddress<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> PartialEq for ByAddress<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Eq for ByAddress<T> {}

impl<T: ?Sized> Hash for ByAddress<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).cast::<()>().hash(state);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
