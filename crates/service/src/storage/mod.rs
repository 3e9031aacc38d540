//! Storage abstractions for the service layer
//!
//! `UserStore` is the hash-map capability the service needs from a
//! key-value backend: write named fields under a key, read them all back.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::ServiceError;

pub mod memory_store;
pub mod redis_store;

/// Hash-map operations over a shared, long-lived store handle.
/// Implementations must tolerate concurrent calls from many requests.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Set every `(field, value)` pair under `key`. Fields not named are left untouched.
    async fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<(), ServiceError>;

    /// All fields under `key`; empty when the key does not exist.
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, ServiceError>;

    /// Round-trip check used at startup.
    async fn ping(&self) -> Result<(), ServiceError>;

    /// Release the underlying connection. Called once at shutdown.
    async fn close(&self) -> Result<(), ServiceError>;
}
