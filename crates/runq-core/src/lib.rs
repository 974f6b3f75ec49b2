//! Persistent sequencing engine for units of work.
//!
//! An ordered queue, a single-slot "currently running" marker and an
//! append-only completion history, all persisted in a list-oriented
//! key-value store. The [`QueueManager`] serializes every public operation
//! behind one coordinating lock, so compound store command sequences appear
//! atomic to concurrent callers, and keeps an in-memory UID index that
//! mirrors the persisted queue and running slot exactly.
//!
//! One manager instance per store: the identity index is process-local and
//! two instances sharing a store would desynchronize.

mod config;
pub use config::StoreKeys;

mod error;
pub use error::QueueError;

mod index;

mod manager;
pub use manager::QueueManager;

pub use runq_model::{ExitStatus, Item, Place, Position, Select};
