// Key-value cache with expiry, plus the cache-aside chart operations built on it.

pub mod keys;
pub mod memory;
pub mod operations;
pub mod redis_store;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use self::memory::MemoryCache;
pub use self::operations::chart::ChartCache;
pub use self::redis_store::RedisCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}
