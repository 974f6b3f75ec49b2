use async_trait::async_trait;

use crate::StoreError;

/// Contract over a remote list-oriented key-value store.
///
/// List commands follow Redis semantics: a missing key behaves like an empty
/// list, pushes return the new list length, and the targeted commands
/// ([`lrem_exact`](ListStore::lrem_exact),
/// [`linsert`](ListStore::linsert)) match elements by byte-for-byte
/// equality of the serialized record. Callers must never re-encode a record
/// between reading it and using it as a match target.
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Length of the list at `key`.
    async fn llen(&self, key: &str) -> Result<usize, StoreError>;

    /// Full front-to-back snapshot of the list at `key`.
    async fn lrange_all(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Push to the front, returning the new length.
    async fn lpush(&self, key: &str, value: &str) -> Result<usize, StoreError>;

    /// Push to the back, returning the new length.
    async fn rpush(&self, key: &str, value: &str) -> Result<usize, StoreError>;

    /// Pop from the front; `None` when the list is empty.
    async fn lpop(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Pop from the back; `None` when the list is empty.
    async fn rpop(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Element at `index` (negative counts from the back); `None` when out
    /// of range.
    async fn lindex(&self, key: &str, index: i64) -> Result<Option<String>, StoreError>;

    /// Remove every element exactly equal to `value`, returning the number
    /// removed.
    async fn lrem_exact(&self, key: &str, value: &str) -> Result<usize, StoreError>;

    /// Insert `value` before or after the first element exactly equal to
    /// `pivot`. Returns the new length, or `None` when the pivot is not
    /// present.
    async fn linsert(
        &self,
        key: &str,
        pivot: &str,
        value: &str,
        before: bool,
    ) -> Result<Option<usize>, StoreError>;

    /// Read a scalar key; `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a scalar key.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a key (list or scalar).
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
