use crate::state::cache::MemorySlotCache;
use crate::state::config::{CacheBackend, CacheConfig};
use crate::state::error::CacheResult;
use crate::state::redis_store::RedisSlotCache;
use crate::state::store::SlotCache;
use std::sync::Arc;

/// Create a slot cache based on configuration
pub async fn create_slot_cache(config: &CacheConfig) -> CacheResult<Arc<dyn SlotCache>> {
    match config.backend {
        CacheBackend::Redis => {
            tracing::info!(url = %config.redis_url, "Initializing Redis slot cache");
            Ok(Arc::new(RedisSlotCache::new(&config.redis_url).await?))
        }
        CacheBackend::InMemory => Ok(create_in_memory_cache()),
    }
}

/// Create an in-memory slot cache (for testing and development)
pub fn create_in_memory_cache() -> Arc<dyn SlotCache> {
    tracing::info!("Initializing in-memory slot cache");
    Arc::new(MemorySlotCache::default())
}
