use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::UserStore;
use crate::errors::ServiceError;

/// In-process store with Redis `HSET` / `HGETALL` semantics.
/// Backs tests and `STORE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Number of keys currently held.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<(), ServiceError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut map = self.inner.write().await;
        let hash = map.entry(key.to_string()).or_default();
        for (field, value) in fields {
            hash.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, ServiceError> {
        let map = self.inner.read().await;
        Ok(map.get(key).cloned().unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), ServiceError> { Ok(()) }

    async fn close(&self) -> Result<(), ServiceError> { Ok(()) }
}
