use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::errors::ServiceError;
use crate::storage::UserStore;
use crate::user_record::{storage_key, UserRecord};

/// Create and fetch user records over a shared store handle.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Write every field of `record` under its storage key.
    ///
    /// Field-level merge: a second create with the same id overwrites the
    /// fields it names and leaves the rest in place.
    pub async fn create(&self, record: &UserRecord) -> Result<(), ServiceError> {
        let key = record.storage_key();
        let fields = record.to_store_fields();
        self.store.hset(&key, &fields).await?;
        debug!(id = record.id(), %key, fields = fields.len(), "user record written");
        Ok(())
    }

    /// All stored fields for `id`, or `None` when the key holds nothing.
    pub async fn get(&self, id: &str) -> Result<Option<HashMap<String, String>>, ServiceError> {
        let fields = self.store.hgetall(&storage_key(id)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(fields))
    }
}
