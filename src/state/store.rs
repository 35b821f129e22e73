use crate::state::error::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

/// Key/value cache where each write replaces the previous value wholesale
#[async_trait]
pub trait SlotCache: Send + Sync {
    /// Overwrite `key` with `value`, expiring after `ttl`
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Current value of `key`, if set and not expired
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Backend label for logs
    fn backend_name(&self) -> &'static str;
}
