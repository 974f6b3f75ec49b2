//! Storage backends for the run queue.
//!
//! The queue engine talks to a list-oriented key-value store through the
//! [`ListStore`] trait: three named collections (a list for the queue, a
//! scalar for the running slot, a list for the history log) whose elements
//! are serialized text records. Two implementations are provided:
//!
//! - [`RedisStore`] — the production backend, one Redis command per trait
//!   method over a multiplexed connection.
//! - [`MemoryStore`] — an in-process backend with the same command
//!   semantics, for tests and embedded use.

mod client;
pub use client::ListStore;

mod error;
pub use error::StoreError;

mod memory;
pub use memory::MemoryStore;

mod redis;
pub use self::redis::RedisStore;
