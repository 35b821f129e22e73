//! Lazy index provisioning

use crate::error::AppError;
use crate::metrics::INDEX_PROVISION_TOTAL;
use crate::search::config::IndexSettings;
use crate::search::engine::{IndexDefinition, SearchEngine};
use crate::search::error::SearchError;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

/// How an index came to be available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    /// The index was already there
    Existing,
    /// This call created it
    Created,
    /// Another writer created it between our check and our create
    AlreadyExists,
}

impl Provisioned {
    fn label(&self) -> &'static str {
        match self {
            Provisioned::Existing => "existing",
            Provisioned::Created => "created",
            Provisioned::AlreadyExists => "already_exists",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// Existence could not be determined, so nothing was created
    #[error("Could not check whether index {index} exists: {source}")]
    ExistenceCheck {
        index: String,
        #[source]
        source: SearchError,
    },

    #[error("Could not create index {index}: {source}")]
    Creation {
        index: String,
        #[source]
        source: SearchError,
    },
}

impl ProvisionError {
    pub fn index(&self) -> &str {
        match self {
            ProvisionError::ExistenceCheck { index, .. } | ProvisionError::Creation { index, .. } => {
                index
            }
        }
    }
}

impl From<ProvisionError> for AppError {
    fn from(err: ProvisionError) -> Self {
        AppError::Provision(err.to_string())
    }
}

/// Ensures an index and its alias exist before the first write
#[derive(Clone)]
pub struct IndexProvisioner {
    engine: Arc<dyn SearchEngine>,
}

impl IndexProvisioner {
    pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
        Self { engine }
    }

    /// Create `settings.name` with its alias, topology and mappings unless it exists
    ///
    /// Safe to call concurrently: a losing creator sees `AlreadyExists`.
    pub async fn ensure_index(
        &self,
        settings: &IndexSettings,
        mappings: &Value,
    ) -> Result<Provisioned, ProvisionError> {
        let index = settings.name.as_str();

        let exists = self.engine.index_exists(index).await.map_err(|source| {
            error!(index = %index, error = %source, "Index existence check failed");
            Self::record(index, "failed");
            ProvisionError::ExistenceCheck {
                index: index.to_string(),
                source,
            }
        })?;

        if exists {
            debug!(index = %index, "Index already provisioned");
            Self::record(index, Provisioned::Existing.label());
            return Ok(Provisioned::Existing);
        }

        let definition = IndexDefinition {
            alias: settings.alias.clone(),
            shards: settings.shards,
            replicas: settings.replicas,
            mappings: mappings.clone(),
        };

        let outcome = match self.engine.create_index(index, &definition).await {
            Ok(()) => {
                info!(
                    index = %index,
                    alias = %settings.alias,
                    shards = settings.shards,
                    replicas = settings.replicas,
                    "Index created"
                );
                Provisioned::Created
            }
            Err(SearchError::IndexAlreadyExists(_)) => {
                info!(index = %index, "Index created concurrently by another writer");
                Provisioned::AlreadyExists
            }
            Err(source) => {
                error!(index = %index, error = %source, "Index creation failed");
                Self::record(index, "failed");
                return Err(ProvisionError::Creation {
                    index: index.to_string(),
                    source,
                });
            }
        };

        Self::record(index, outcome.label());
        Ok(outcome)
    }

    fn record(index: &str, outcome: &str) {
        INDEX_PROVISION_TOTAL.with_label_values(&[index, outcome]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::memory::InMemoryEngine;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_then_existing() {
        let engine = Arc::new(InMemoryEngine::new());
        let provisioner = IndexProvisioner::new(engine.clone());
        let settings = IndexSettings::documents();

        let first = provisioner.ensure_index(&settings, &json!({})).await.unwrap();
        assert_eq!(first, Provisioned::Created);

        let second = provisioner.ensure_index(&settings, &json!({})).await.unwrap();
        assert_eq!(second, Provisioned::Existing);

        assert!(engine.index_exists("documents_19092022").await.unwrap());
        assert_eq!(engine.alias_target("documents").as_deref(), Some("documents_19092022"));
    }

    #[test]
    fn test_error_keeps_index_name() {
        let err = ProvisionError::Creation {
            index: "users_19092022".to_string(),
            source: SearchError::Transport("refused".to_string()),
        };
        assert_eq!(err.index(), "users_19092022");

        let app: AppError = err.into();
        assert_eq!(app.error_code(), "PROVISION_ERROR");
    }
}
