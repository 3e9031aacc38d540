use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, IntoConnectionInfo, RedisResult};
use tracing::{debug, info};

use super::UserStore;
use crate::errors::ServiceError;

/// Redis-backed store over a single multiplexed connection.
///
/// `ConnectionManager` is cheap to clone and pipelines concurrent commands
/// over one socket, so a single `RedisStore` is shared by every request.
/// Each command is bounded by `timeout`.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
    timeout: Duration,
}

impl RedisStore {
    /// Open the connection and verify it with `PING`.
    ///
    /// `url` uses the `redis://` or `rediss://` (TLS) scheme; a non-empty
    /// `password` replaces whatever the URL carries.
    pub async fn connect(url: &str, password: Option<&str>, timeout: Duration) -> Result<Self, ServiceError> {
        let mut conn_info = url.into_connection_info()?;
        if let Some(pw) = password.filter(|p| !p.is_empty()) {
            conn_info.redis.password = Some(pw.to_string());
        }
        let client = redis::Client::open(conn_info)?;
        let manager = tokio::time::timeout(timeout, client.get_connection_manager())
            .await
            .map_err(|_| ServiceError::Timeout(timeout))??;

        let store = Self { manager, timeout };
        store.ping().await?;
        info!(event = "store_connected", "redis connection established");
        Ok(store)
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, ServiceError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res.map_err(ServiceError::from),
            Err(_) => Err(ServiceError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl UserStore for RedisStore {
    async fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<(), ServiceError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = self.manager.clone();
        debug!(%key, fields = fields.len(), "HSET");
        self.bounded(async move {
            redis::cmd("HSET").arg(key).arg(fields).query_async::<_, ()>(&mut conn).await
        })
        .await
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, ServiceError> {
        let mut conn = self.manager.clone();
        debug!(%key, "HGETALL");
        self.bounded(async move {
            redis::cmd("HGETALL").arg(key).query_async::<_, HashMap<String, String>>(&mut conn).await
        })
        .await
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        let mut conn = self.manager.clone();
        let pong = self
            .bounded(async move { redis::cmd("PING").query_async::<_, String>(&mut conn).await })
            .await?;
        debug!(%pong, "PING");
        Ok(())
    }

    async fn close(&self) -> Result<(), ServiceError> {
        let mut conn = self.manager.clone();
        self.bounded(async move { redis::cmd("QUIT").query_async::<_, ()>(&mut conn).await })
            .await?;
        info!(event = "store_closed", "redis connection closed");
        Ok(())
    }
}
