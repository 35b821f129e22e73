//! Single-slot cache mirroring the latest change event

pub mod cache;
pub mod config;
pub mod error;
pub mod factory;
pub mod redis_store;
pub mod store;

pub use cache::MemorySlotCache;
pub use config::{CacheBackend, CacheConfig};
pub use error::{CacheError, CacheResult};
pub use factory::{create_in_memory_cache, create_slot_cache};
pub use redis_store::RedisSlotCache;
pub use store::SlotCache;
