use crate::changes::SubscriberConfig;
use crate::messaging::MessagingConfig;
use crate::search::SearchConfig;
use crate::state::CacheConfig;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Search engine and index configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Message bus configuration
    #[serde(default)]
    pub messaging: MessagingConfig,

    /// Single-slot cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Change subscriber supervision
    #[serde(default)]
    pub subscriber: SubscriberConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the embedded defaults, an optional file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("DOCSYS_CONFIG_PATH")
            .unwrap_or_else(|_| "config/docsys.toml".to_string());

        Self::load_from(&config_path)
    }

    /// Load configuration, overriding the defaults with the file at `path` if present
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(path).required(false))
            // Override with environment variables (prefix: DOCSYS_)
            .add_source(
                config::Environment::with_prefix("DOCSYS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            prometheus_enabled: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::MessagingBackend;
    use crate::search::RefreshPolicy;

    #[test]
    fn test_default_config_values() {
        assert_eq!(default_log_level(), "info");
        assert!(default_true());
    }

    #[test]
    fn test_embedded_defaults_parse() {
        let config = Config::load_from("does/not/exist").unwrap();

        assert_eq!(config.search.documents.name, "documents_19092022");
        assert_eq!(config.search.documents.alias, "documents");
        assert_eq!(config.search.users.name, "users_19092022");
        assert_eq!(config.search.users.alias, "users");
        assert_eq!(config.search.documents.shards, 3);
        assert_eq!(config.search.documents.replicas, 2);
        assert_eq!(config.search.refresh, RefreshPolicy::WaitFor);
        assert_eq!(config.messaging.backend, MessagingBackend::Redis);
        assert_eq!(config.messaging.topic, "doc-system");
        assert_eq!(config.cache.key, "doc-system:created-log");
        assert_eq!(config.cache.ttl_secs, 100);
    }

    #[test]
    fn test_partial_sections_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"search": {"url": "http://es:9200"}}"#).unwrap();
        assert_eq!(config.search.url, "http://es:9200");
        assert_eq!(config.search.max_results, 1000);
        assert!(config.observability.prometheus_enabled);
    }
}
