//! Messaging configuration

use serde::{Deserialize, Serialize};

/// Message bus backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessagingBackend {
    /// Redis pub/sub channels
    #[default]
    Redis,
    /// NATS core subjects
    Nats,
    /// Process-local broadcast channels
    InMemory,
}

impl MessagingBackend {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            MessagingBackend::Redis => "redis",
            MessagingBackend::Nats => "nats",
            MessagingBackend::InMemory => "in_memory",
        }
    }
}

/// Main messaging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Enable the message bus; when off, creation events are not published
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Backend to use
    #[serde(default)]
    pub backend: MessagingBackend,

    /// Topic carrying creation events
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// NATS server URL
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// Connection name announced to NATS
    #[serde(default = "default_connection_name")]
    pub connection_name: String,

    /// Capacity of each in-memory topic buffer
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: MessagingBackend::default(),
            topic: default_topic(),
            redis_url: default_redis_url(),
            nats_url: default_nats_url(),
            connection_name: default_connection_name(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl MessagingConfig {
    /// Configuration for a process-local bus
    pub fn in_memory() -> Self {
        Self {
            backend: MessagingBackend::InMemory,
            ..Default::default()
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_topic() -> String {
    "doc-system".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_connection_name() -> String {
    "docsys".to_string()
}

fn default_channel_capacity() -> usize {
    256
}
