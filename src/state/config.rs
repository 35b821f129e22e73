use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache backend type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    Redis,
    InMemory,
}

/// Single-slot cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Key mirroring the most recent change event
    #[serde(default = "default_key")]
    pub key: String,

    /// Lifetime of the mirrored payload, in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            redis_url: default_redis_url(),
            key: default_key(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn in_memory() -> Self {
        Self {
            backend: CacheBackend::InMemory,
            ..Default::default()
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_key() -> String {
    "doc-system:created-log".to_string()
}

fn default_ttl_secs() -> u64 {
    100
}
