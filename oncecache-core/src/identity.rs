//! Computation identities.
//!
//! Every memoized computation on an owner gets its own
//! [`crate::FunctionSlot`], selected by a [`ComputationId`]. Two call sites
//! that pass the same id share results; giving one id to semantically
//! different computations is a caller bug the engine cannot detect (unless
//! the result types differ, see [`crate::MemoError::ResultTypeMismatch`]).
//!
//! Ids are either explicit names or derived from the call site by
//! [`crate::computation_id!`].

use std::borrow::Cow;
use std::fmt;

use crate::error::{MemoError, Result};

/// Stable token naming one memoized computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComputationId(Cow<'static, str>);

impl ComputationId {
    /// An id with an explicit name, e.g. `"pathfinding::cost"`.
    #[must_use]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// An id over a static name, usable in `const` and `static` items.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// The id's name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reject ids that cannot name a computation.
    ///
    /// # Errors
    /// Returns [`MemoError::InvalidIdentity`] for an empty or blank name.
    pub fn validate(&self) -> Result<()> {
        if self.0.trim().is_empty() {
            return Err(MemoError::InvalidIdentity(self.0.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for ComputationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ComputationId {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for ComputationId {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

/// Build a [`ComputationId`].
///
/// Without arguments the id is derived from the macro's call site (module,
/// file, line and column), so every invocation site is its own computation
/// and repeated executions of that site share one slot. With an argument the
/// id is that name.
///
/// ```
/// use oncecache_core::computation_id;
///
/// let here = computation_id!();
/// let named = computation_id!("terrain::height");
/// assert_ne!(here, named);
/// assert_eq!(named.as_str(), "terrain::height");
/// ```
#[macro_export]
macro_rules! computation_id {
    () => {
        $crate::ComputationId::from_static(concat!(
            module_path!(),
            "@",
            file!(),
            ":",
            line!(),
            ":",
            column!()
        ))
    };
    ($name:expr) => {
        $crate::ComputationId::named($name)
    };
}
