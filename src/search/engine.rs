//! Search engine abstraction

use crate::search::error::SearchResult;
use crate::search::filter::FilterExpression;
use crate::search::script::UpdateScript;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Body of an index-creation request: alias, topology and mappings together
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub alias: String,
    pub shards: u32,
    pub replicas: u32,
    pub mappings: Value,
}

impl IndexDefinition {
    pub fn to_body(&self) -> Value {
        let mut aliases = Map::new();
        aliases.insert(self.alias.clone(), json!({}));

        json!({
            "aliases": aliases,
            "settings": {
                "number_of_shards": self.shards,
                "number_of_replicas": self.replicas,
            },
            "mappings": self.mappings,
        })
    }
}

/// A filtered search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub filter: FilterExpression,
    /// Maximum number of hits to return; zero asks for the count only
    pub size: usize,
}

impl SearchRequest {
    pub fn new(filter: FilterExpression, size: usize) -> Self {
        Self { filter, size }
    }

    /// A request that only needs `hits.total`
    pub fn count(filter: FilterExpression) -> Self {
        Self { filter, size: 0 }
    }

    pub fn to_body(&self) -> Value {
        json!({
            "query": self.filter.to_query(),
            "size": self.size,
            "track_total_hits": true,
        })
    }
}

/// Operations the repositories need from a search-indexing engine
///
/// Read and by-query operations return the raw response body; turning it into
/// typed values is the job of [`crate::search::decode`].
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Check that the engine is reachable
    async fn ping(&self) -> SearchResult<()>;

    /// Whether an index with this literal name exists
    async fn index_exists(&self, index: &str) -> SearchResult<bool>;

    /// Create an index; a name collision is reported as `IndexAlreadyExists`
    async fn create_index(&self, index: &str, definition: &IndexDefinition) -> SearchResult<()>;

    /// Index (upsert) a document under an explicit id
    async fn index_document(&self, index: &str, id: &str, source: &Value) -> SearchResult<()>;

    /// Run a search and return the hit envelope
    async fn search(&self, index: &str, request: &SearchRequest) -> SearchResult<String>;

    /// Apply a script to every matching document and return the count envelope
    async fn update_by_query(
        &self,
        index: &str,
        filter: &FilterExpression,
        script: &UpdateScript,
    ) -> SearchResult<String>;

    /// Delete every matching document and return the count envelope
    async fn delete_by_query(&self, index: &str, filter: &FilterExpression) -> SearchResult<String>;

    /// Make all prior writes visible to search
    async fn refresh(&self, index: &str) -> SearchResult<()>;
}
