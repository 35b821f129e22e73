//! Typed access to one index

use crate::metrics::OperationTimer;
use crate::models::IndexedEntity;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::search::{
    decode, decode_by_query, decode_total, ByQueryCounts, FilterExpression, IndexProvisioner, IndexSettings,
    Provisioned, SearchConfig, SearchEngine, SearchError, SearchRequest, UpdateScript,
};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Engine operations for the records of type `T`, addressed by literal index name
pub struct IndexRepository<T> {
    engine: Arc<dyn SearchEngine>,
    provisioner: IndexProvisioner,
    settings: IndexSettings,
    timeout: Duration,
    max_results: usize,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for IndexRepository<T> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            provisioner: self.provisioner.clone(),
            settings: self.settings.clone(),
            timeout: self.timeout,
            max_results: self.max_results,
            _entity: PhantomData,
        }
    }
}

impl<T: IndexedEntity> IndexRepository<T> {
    pub fn new(engine: Arc<dyn SearchEngine>, settings: IndexSettings, config: &SearchConfig) -> Self {
        Self {
            provisioner: IndexProvisioner::new(engine.clone()),
            engine,
            settings,
            timeout: config.request_timeout(),
            max_results: config.max_results,
            _entity: PhantomData,
        }
    }

    pub fn index_name(&self) -> &str {
        &self.settings.name
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    /// Deadline applied to each operation
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// A handle on the same index whose operations use `timeout` as their deadline
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    /// Run `operation` under the request deadline and record its outcome
    pub(crate) async fn run<R, F>(&self, operation: &'static str, fut: F) -> RepositoryResult<R>
    where
        F: Future<Output = RepositoryResult<R>>,
    {
        let timer = OperationTimer::start(T::KIND, operation);

        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RepositoryError::Timeout(format!(
                "{} {} exceeded {}ms",
                T::KIND,
                operation,
                self.timeout.as_millis()
            ))),
        };

        timer.finish(match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        });
        result
    }

    /// Create the index with its alias and mappings unless it exists
    pub async fn ensure_index(&self) -> RepositoryResult<Provisioned> {
        Ok(self
            .provisioner
            .ensure_index(&self.settings, &T::mappings())
            .await?)
    }

    /// Provision, then index `entity` under its own id
    pub async fn insert(&self, entity: &T) -> RepositoryResult<()> {
        self.ensure_index().await?;

        let source = serde_json::to_value(entity)
            .map_err(|e| RepositoryError::Validation(format!("Unserializable {}: {}", T::KIND, e)))?;
        self.engine
            .index_document(self.index_name(), entity.id(), &source)
            .await?;
        Ok(())
    }

    /// First match in engine order
    pub async fn find_one(&self, filter: FilterExpression) -> RepositoryResult<Option<T>> {
        let raw = match self
            .engine
            .search(self.index_name(), &SearchRequest::new(filter, 1))
            .await
        {
            Ok(raw) => raw,
            Err(SearchError::IndexNotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let hits = decode::<T>(&raw)?;
        if hits.total > 1 {
            debug!(index = %self.index_name(), total = hits.total, "Unique lookup matched several records");
        }
        Ok(hits.into_first())
    }

    /// Every record, up to the configured result limit
    pub async fn find_all(&self) -> RepositoryResult<Vec<T>> {
        let request = SearchRequest::new(FilterExpression::MatchAll, self.max_results);
        let raw = match self.engine.search(self.index_name(), &request).await {
            Ok(raw) => raw,
            Err(SearchError::IndexNotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let hits = decode::<T>(&raw)?;
        if hits.total > hits.sources.len() as u64 {
            debug!(
                index = %self.index_name(),
                total = hits.total,
                returned = hits.sources.len(),
                "Listing truncated at max_results"
            );
        }
        Ok(hits.sources)
    }

    /// Number of matching records, without fetching them
    pub async fn count(&self, filter: FilterExpression) -> RepositoryResult<u64> {
        match self
            .engine
            .search(self.index_name(), &SearchRequest::count(filter))
            .await
        {
            Ok(raw) => Ok(decode_total(&raw)?),
            Err(SearchError::IndexNotFound(_)) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply `script` to every match
    pub async fn update_where(
        &self,
        filter: FilterExpression,
        script: UpdateScript,
    ) -> RepositoryResult<ByQueryCounts> {
        match self
            .engine
            .update_by_query(self.index_name(), &filter, &script)
            .await
        {
            Ok(raw) => Ok(decode_by_query(&raw)?),
            Err(SearchError::IndexNotFound(_)) => Ok(ByQueryCounts::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every match
    pub async fn delete_where(&self, filter: FilterExpression) -> RepositoryResult<ByQueryCounts> {
        match self.engine.delete_by_query(self.index_name(), &filter).await {
            Ok(raw) => Ok(decode_by_query(&raw)?),
            Err(SearchError::IndexNotFound(_)) => Ok(ByQueryCounts::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Make all prior writes searchable
    pub async fn refresh(&self) -> RepositoryResult<()> {
        self.run("refresh", async {
            match self.engine.refresh(self.index_name()).await {
                Ok(()) | Err(SearchError::IndexNotFound(_)) => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }
}

/// Judge a by-query mutation addressed to the single record `id`
///
/// NotFound only when nothing matched. A match that was skipped because of a
/// version conflict is a Conflict, not a missing record.
pub(crate) fn expect_one(
    kind: &'static str,
    id: &str,
    counts: ByQueryCounts,
    affected: u64,
) -> RepositoryResult<()> {
    let matched = counts.total.max(affected + counts.version_conflicts);
    if matched == 0 {
        return Err(RepositoryError::not_found(kind, id));
    }
    if affected == 0 && counts.version_conflicts > 0 {
        return Err(RepositoryError::Conflict(format!(
            "{} {} was modified concurrently ({} version conflicts)",
            kind, id, counts.version_conflicts
        )));
    }
    Ok(())
}

/// Reject blank identifiers before they reach the engine
pub(crate) fn require(field: &str, value: &str) -> RepositoryResult<()> {
    if value.trim().is_empty() {
        return Err(RepositoryError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;
    use crate::search::InMemoryEngine;

    fn counts(total: u64, updated: u64, deleted: u64, version_conflicts: u64) -> ByQueryCounts {
        ByQueryCounts {
            total,
            updated,
            deleted,
            version_conflicts,
        }
    }

    #[test]
    fn test_nothing_matched_is_not_found() {
        let err = expect_one("document", "d1", counts(0, 0, 0, 0), 0).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_version_conflict_is_conflict() {
        let err = expect_one("document", "d1", counts(1, 0, 0, 1), 0).unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        // total omitted by the engine still counts the conflicting match
        let err = expect_one("user", "u1", counts(0, 0, 0, 1), 0).unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[test]
    fn test_applied_mutation_is_ok() {
        assert!(expect_one("document", "d1", counts(1, 1, 0, 0), 1).is_ok());
        assert!(expect_one("document", "d1", counts(1, 0, 1, 0), 1).is_ok());
    }

    #[test]
    fn test_with_timeout_leaves_original_untouched() {
        let config = SearchConfig::default();
        let repository: IndexRepository<Document> = IndexRepository::new(
            Arc::new(InMemoryEngine::new()),
            config.documents.clone(),
            &config,
        );

        let short = repository.with_timeout(Duration::from_millis(50));
        assert_eq!(short.timeout(), Duration::from_millis(50));
        assert_eq!(repository.timeout(), config.request_timeout());
        assert_eq!(short.index_name(), repository.index_name());
    }
}
