//! # oncecache Core Library
//!
//! Owner-scoped transparent memoization for frame-based game code.
//!
//! A memoized call is identified by three things:
//!
//! - **Owner** — an `Arc<T>` scoping the cache. Held weakly: the cache never
//!   keeps its owner alive, and an owner's results are freed after it drops.
//! - **Computation** — a [`ComputationId`], named explicitly or derived from
//!   the call site with [`computation_id!`].
//! - **Parameters** — any [`KeyParams`] sequence, folded into a
//!   [`CompositeKey`] from each value's own `Hash`.
//!
//! ```
//! use std::sync::Arc;
//! use oncecache_core::{computation_id, global};
//!
//! struct Npc { strength: u32 }
//!
//! let npc = Arc::new(Npc { strength: 12 });
//! let id = computation_id!("npc::damage");
//! let mut runs = 0;
//! for weapon in [100, 100, 200, 200, 100] {
//!     global::once(&npc, &id, &(weapon,), || { runs += 1; weapon * npc.strength }).unwrap();
//! }
//! assert_eq!(runs, 2);
//! ```
//!
//! ## Layout
//!
//! [`MemoStore`] → [`OwnerCache`] per owner → [`FunctionSlot`] per
//! computation → results per [`CompositeKey`].

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod global;
pub mod identity;
pub mod key;
pub mod metrics;
pub mod owner;
pub mod slot;
pub mod store;

pub use config::OnceConfig;
pub use error::MemoError;
pub use global::{clear_all, clear_for_owner, disable, enable, is_enabled, once, try_once, MemoOwner};
pub use identity::ComputationId;
pub use key::{ByAddress, CompositeKey, KeyComposer, KeyParams};
pub use owner::{AsOwner, OwnerCache};
pub use slot::FunctionSlot;
pub use store::MemoStore;
