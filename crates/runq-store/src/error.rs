use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store command failed: {0}")]
    Redis(#[from] redis::RedisError),

    /// Failure reported by a non-Redis [`ListStore`](crate::ListStore)
    /// implementation.
    #[error("store backend error: {0}")]
    Backend(String),
}
