//! Error types for the oncecache engine.
//!
//! Errors raised by a memoized computation are never wrapped here: they are
//! the caller's own error type and pass through [`crate::MemoStore::try_once`]
//! unchanged. [`MemoError`] only covers misuse of the engine itself.

use thiserror::Error;

/// Top-level error type for all engine operations.
#[derive(Error, Debug)]
pub enum MemoError {
    /// A computation identity could not be established (empty name).
    #[error("Invalid computation identity: {0:?}")]
    InvalidIdentity(String),

    /// The owner handle no longer resolves to a live object.
    #[error("Owner is gone: {type_name}")]
    OwnerGone {
        /// Type name of the owner the stale handle pointed to.
        type_name: &'static str,
    },

    /// The same computation identity was used with two different result types
    /// on one owner.
    #[error("Result type mismatch for {identity}: slot holds {stored}, call expects {requested}")]
    ResultTypeMismatch {
        /// The reused identity.
        identity: String,
        /// Result type the existing slot was created with.
        stored: &'static str,
        /// Result type requested by this call.
        requested: &'static str,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, MemoError>;
