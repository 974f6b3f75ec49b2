use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::{ListStore, StoreError};

/// In-process store with Redis list semantics.
///
/// Backs the engine in tests and embedded deployments where no external
/// store is available. Matching commands compare elements byte-for-byte,
/// exactly like the Redis backend.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    lists: HashMap<String, VecDeque<String>>,
    scalars: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ListStore for MemoryStore {
    async fn llen(&self, key: &str) -> Result<usize, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.lists.get(key).map_or(0, VecDeque::len))
    }

    async fn lrange_all(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .lists
            .get(key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn lpush(&self, key: &str, value: &str) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let list = inner.lists.entry(key.to_string()).or_default();
        list.push_front(value.to_string());
        Ok(list.len())
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let list = inner.lists.entry(key.to_string()).or_default();
        list.push_back(value.to_string());
        Ok(list.len())
    }

    async fn lpop(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.lists.get_mut(key).and_then(VecDeque::pop_front))
    }

    async fn rpop(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.lists.get_mut(key).and_then(VecDeque::pop_back))
    }

    async fn lindex(&self, key: &str, index: i64) -> Result<Option<String>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let Some(list) = inner.lists.get(key) else {
            return Ok(None);
        };
        let len = list.len() as i64;
        let index = if index < 0 { len + index } else { index };
        if index < 0 || index >= len {
            return Ok(None);
        }
        Ok(list.get(index as usize).cloned())
    }

    async fn lrem_exact(&self, key: &str, value: &str) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(list) = inner.lists.get_mut(key) else {
            return Ok(0);
        };
        let before = list.len();
        list.retain(|element| element != value);
        Ok(before - list.len())
    }

    async fn linsert(
        &self,
        key: &str,
        pivot: &str,
        value: &str,
        before: bool,
    ) -> Result<Option<usize>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(list) = inner.lists.get_mut(key) else {
            return Ok(None);
        };
        let Some(at) = list.iter().position(|element| element == pivot) else {
            return Ok(None);
        };
        let at = if before { at } else { at + 1 };
        list.insert(at, value.to_string());
        Ok(Some(list.len()))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.scalars.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.scalars.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.lists.remove(key);
        inner.scalars.remove(key);
        Ok(())
    }
}
