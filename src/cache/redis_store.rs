use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};

use crate::cache::{CacheError, CacheStore};

/// Redis-backed cache store.
#[derive(Clone)]
pub struct RedisCache {
    client: Arc<RedisClient>,
}

impl RedisCache {
    /// Opens the client and checks the server answers `PING`.
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = RedisClient::open(redis_url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        tracing::info!("Connected to Redis");

        Ok(Self {
            client: Arc::new(client),
        })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        // Redis rejects a zero expiry.
        let secs = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value, secs).await?;
        Ok(())
    }
}
