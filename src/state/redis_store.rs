use crate::state::error::{CacheError, CacheResult};
use crate::state::store::SlotCache;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Client;
use std::time::Duration;

/// Redis-backed slot cache using `SET key value PX ttl`
#[derive(Clone)]
pub struct RedisSlotCache {
    connection: ConnectionManager,
}

impl RedisSlotCache {
    /// Connect and verify the server answers
    pub async fn new(redis_url: &str) -> CacheResult<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            CacheError::Configuration(format!("Failed to create Redis client: {}", e))
        })?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        // Test connection
        let mut test_conn = connection.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut test_conn)
            .await
            .map_err(|e| CacheError::Connection(format!("Redis connection test failed: {}", e)))?;

        tracing::info!(url = %redis_url, "Initialized Redis slot cache");

        Ok(Self { connection })
    }
}

#[async_trait]
impl SlotCache for RedisSlotCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection.clone();
        // PX rejects zero
        let ttl_ms = ttl.as_millis().max(1) as u64;

        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| CacheError::Command(format!("SET {} failed: {}", key, e)))
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await
            .map_err(|e| CacheError::Command(format!("GET {} failed: {}", key, e)))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
