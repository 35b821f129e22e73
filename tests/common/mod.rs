//! Shared fixtures for integration tests

#![allow(dead_code)]

use docsys::changes::{ChangeNotifier, SubscriberConfig};
use docsys::messaging::{InMemoryBus, MessagingService};
use docsys::models::{NewDocument, NewUser};
use docsys::repository::Repositories;
use docsys::search::{InMemoryEngine, SearchConfig};
use docsys::state::RedisSlotCache;
use std::sync::Arc;
use std::time::Duration;

pub const REDIS_URL: &str = "redis://127.0.0.1:6379/15";
pub const NATS_URL: &str = "nats://127.0.0.1:4222";

/// The document from the end-to-end scenario
pub fn sample_document() -> NewDocument {
    NewDocument {
        name: "a.txt".to_string(),
        description: "d".to_string(),
        extension: ".txt".to_string(),
        path: "p".to_string(),
        mime_type: "text/plain".to_string(),
    }
}

pub fn sample_user(email: &str) -> NewUser {
    NewUser {
        username: "ada".to_string(),
        password_hash: "$2a$14$Qb0r0Gx9uJ8y2v6ZKzq8kO".to_string(),
        email: email.to_string(),
        role: "admin".to_string(),
    }
}

/// Repositories over a fresh in-memory engine, publishing nothing
pub fn memory_repositories() -> (Repositories, Arc<InMemoryEngine>) {
    let engine = Arc::new(InMemoryEngine::new());
    let repositories = Repositories::new(
        engine.clone(),
        &SearchConfig::default(),
        ChangeNotifier::disabled(),
    );
    (repositories, engine)
}

/// Repositories publishing onto a shared in-memory bus
pub fn memory_stack() -> (Repositories, Arc<MessagingService>, Arc<InMemoryBus>) {
    let bus = Arc::new(InMemoryBus::default());
    let messaging = Arc::new(MessagingService::in_memory(bus.clone()));
    let repositories = Repositories::new(
        Arc::new(InMemoryEngine::new()),
        &SearchConfig::default(),
        ChangeNotifier::new(messaging.clone()),
    );
    (repositories, messaging, bus)
}

/// Millisecond-scale backoff so reconnect tests finish quickly
pub fn fast_backoff() -> SubscriberConfig {
    SubscriberConfig {
        initial_backoff_ms: 10,
        max_backoff_ms: 50,
    }
}

/// Poll `check` until it returns true or `within` elapses
pub async fn eventually<F, Fut>(within: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + within;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub async fn redis_available() -> bool {
    matches!(
        tokio::time::timeout(Duration::from_secs(2), RedisSlotCache::new(REDIS_URL)).await,
        Ok(Ok(_))
    )
}

pub async fn nats_available() -> bool {
    matches!(
        tokio::time::timeout(Duration::from_secs(2), async_nats::connect(NATS_URL)).await,
        Ok(Ok(_))
    )
}
