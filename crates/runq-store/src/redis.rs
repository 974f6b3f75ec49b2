use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use tracing::debug;

use crate::{ListStore, StoreError};

/// Redis-backed store.
///
/// Holds a [`ConnectionManager`], which multiplexes one underlying
/// connection and reconnects on failure; it is cheap to clone, so each
/// command operates on its own handle.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis at `url` (e.g. `"redis://localhost:6379"`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        debug!(url, "connected to redis store");
        Ok(Self { conn })
    }
}

#[async_trait]
impl ListStore for RedisStore {
    async fn llen(&self, key: &str) -> Result<usize, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.llen(key).await?)
    }

    async fn lrange_all(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.lrange(key, 0, -1).await?)
    }

    async fn lpush(&self, key: &str, value: &str) -> Result<usize, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.lpush(key, value).await?)
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<usize, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.rpush(key, value).await?)
    }

    async fn lpop(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.lpop(key, None).await?)
    }

    async fn rpop(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.rpop(key, None).await?)
    }

    async fn lindex(&self, key: &str, index: i64) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.lindex(key, index as isize).await?)
    }

    async fn lrem_exact(&self, key: &str, value: &str) -> Result<usize, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.lrem(key, 0, value).await?)
    }

    async fn linsert(
        &self,
        key: &str,
        pivot: &str,
        value: &str,
        before: bool,
    ) -> Result<Option<usize>, StoreError> {
        let mut conn = self.conn.clone();
        // Redis returns -1 when the pivot is missing and 0 when the key
        // does not exist; neither inserted anything.
        let len: i64 = if before {
            conn.linsert_before(key, pivot, value).await?
        } else {
            conn.linsert_after(key, pivot, value).await?
        };
        Ok((len > 0).then_some(len as usize))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
