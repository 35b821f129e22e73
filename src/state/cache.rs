use crate::state::error::CacheResult;
use crate::state::store::SlotCache;
use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct SlotEntry {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with
struct PerEntryTtl;

impl Expiry<String, SlotEntry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &SlotEntry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &SlotEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-process slot cache using Moka
#[derive(Clone)]
pub struct MemorySlotCache {
    cache: Cache<String, SlotEntry>,
}

impl MemorySlotCache {
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self { cache }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for MemorySlotCache {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl SlotCache for MemorySlotCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.cache
            .insert(
                key.to_string(),
                SlotEntry {
                    value: value.to_string(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    fn backend_name(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let cache = MemorySlotCache::default();
        let ttl = Duration::from_secs(60);

        cache.set("slot", "first", ttl).await.unwrap();
        cache.set("slot", "second", ttl).await.unwrap();

        assert_eq!(cache.get("slot").await.unwrap(), Some("second".to_string()));
        assert_eq!(cache.get("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cache_ttl() {
        let cache = MemorySlotCache::default();

        cache.set("slot", "value", Duration::from_millis(100)).await.unwrap();

        // Value should be present immediately
        assert!(cache.get("slot").await.unwrap().is_some());

        // Wait for TTL to expire
        tokio::time::sleep(Duration::from_millis(150)).await;

        // Value should be expired
        assert!(cache.get("slot").await.unwrap().is_none());
    }
}
