use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("store command timed out after {0:?}")]
    Timeout(Duration),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    /// Whether the caller sent something unusable, as opposed to an upstream failure.
    pub fn is_client_error(&self) -> bool { matches!(self, Self::Validation(_)) }
}

impl From<redis::RedisError> for ServiceError {
    fn from(e: redis::RedisError) -> Self { Self::Store(e.to_string()) }
}
