//! Search engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// When writes become visible to subsequent searches
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Leave visibility to the engine's refresh cycle
    None,
    /// Block the write until a refresh makes it visible
    #[default]
    WaitFor,
    /// Force an immediate refresh of the affected shards
    Immediate,
}

impl RefreshPolicy {
    /// Value for the `refresh` parameter of single-document writes
    pub fn document_param(&self) -> Option<&'static str> {
        match self {
            RefreshPolicy::None => None,
            RefreshPolicy::WaitFor => Some("wait_for"),
            RefreshPolicy::Immediate => Some("true"),
        }
    }

    /// Value for the `refresh` parameter of by-query writes, which accept only a boolean
    pub fn by_query_param(&self) -> Option<&'static str> {
        match self {
            RefreshPolicy::None => None,
            RefreshPolicy::WaitFor | RefreshPolicy::Immediate => Some("true"),
        }
    }
}

/// Literal index name, alias and topology for one entity kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexSettings {
    /// Versioned index name, e.g. `documents_19092022`
    pub name: String,

    /// Stable alias attached at creation
    pub alias: String,

    /// Number of primary shards
    #[serde(default = "default_shards")]
    pub shards: u32,

    /// Number of replicas per shard
    #[serde(default = "default_replicas")]
    pub replicas: u32,
}

impl IndexSettings {
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            shards: default_shards(),
            replicas: default_replicas(),
        }
    }

    pub fn documents() -> Self {
        Self::new("documents_19092022", "documents")
    }

    pub fn users() -> Self {
        Self::new("users_19092022", "users")
    }
}

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base URL of the engine's REST endpoint
    pub url: String,

    /// Basic auth username
    pub username: Option<String>,

    /// Basic auth password
    pub password: Option<String>,

    /// Deadline for each repository operation, in milliseconds
    pub request_timeout_ms: u64,

    /// Visibility policy applied to writes
    pub refresh: RefreshPolicy,

    /// Maximum hits requested by list operations
    pub max_results: usize,

    /// Ping the engine when connecting
    pub ping_on_connect: bool,

    /// Document index
    pub documents: IndexSettings,

    /// User index
    pub users: IndexSettings,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            username: None,
            password: None,
            request_timeout_ms: 5000,
            refresh: RefreshPolicy::default(),
            max_results: 1000,
            ping_on_connect: true,
            documents: IndexSettings::documents(),
            users: IndexSettings::users(),
        }
    }
}

impl SearchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self.config.password = Some(password.into());
        self
    }

    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.request_timeout_ms = ms;
        self
    }

    pub fn refresh(mut self, policy: RefreshPolicy) -> Self {
        self.config.refresh = policy;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.config.max_results = max;
        self
    }

    pub fn ping_on_connect(mut self, enabled: bool) -> Self {
        self.config.ping_on_connect = enabled;
        self
    }

    pub fn documents(mut self, settings: IndexSettings) -> Self {
        self.config.documents = settings;
        self
    }

    pub fn users(mut self, settings: IndexSettings) -> Self {
        self.config.users = settings;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_shards() -> u32 {
    3
}

fn default_replicas() -> u32 {
    2
}
