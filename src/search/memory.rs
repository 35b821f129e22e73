//! In-process search engine
//!
//! Keeps documents in insertion order and answers with the same envelopes
//! Elasticsearch produces, so repositories run unchanged on top of it. Writes
//! are visible immediately. Unlike Elasticsearch it never auto-creates an
//! index on write: a missing index is reported as `IndexNotFound`.

use crate::search::engine::{IndexDefinition, SearchEngine, SearchRequest};
use crate::search::error::{SearchError, SearchResult};
use crate::search::filter::FilterExpression;
use crate::search::script::UpdateScript;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::{json, Value};

struct StoredIndex {
    definition: IndexDefinition,
    docs: Vec<(String, Value)>,
}

/// [`SearchEngine`] backed by concurrent maps
#[derive(Default)]
pub struct InMemoryEngine {
    indices: DashMap<String, StoredIndex>,
    aliases: DashMap<String, String>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index an alias points at
    pub fn alias_target(&self, alias: &str) -> Option<String> {
        self.aliases.get(alias).map(|target| target.value().clone())
    }

    /// Names of all created indices
    pub fn index_names(&self) -> Vec<String> {
        self.indices.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Definition an index was created with
    pub fn definition(&self, index: &str) -> Option<IndexDefinition> {
        let name = self.resolve(index)?;
        self.indices.get(&name).map(|stored| stored.definition.clone())
    }

    /// Number of stored documents, or `None` for an unknown index
    pub fn document_count(&self, index: &str) -> Option<usize> {
        let name = self.resolve(index)?;
        self.indices.get(&name).map(|stored| stored.docs.len())
    }

    fn resolve(&self, index: &str) -> Option<String> {
        if self.indices.contains_key(index) {
            return Some(index.to_string());
        }
        self.alias_target(index)
    }

    fn resolve_or_missing(&self, index: &str) -> SearchResult<String> {
        self.resolve(index)
            .ok_or_else(|| SearchError::IndexNotFound(index.to_string()))
    }
}

fn field_value<'a>(source: &'a Value, field: &str) -> Option<&'a Value> {
    let field = field.strip_suffix(".keyword").unwrap_or(field);
    source.get(field).filter(|v| !v.is_null())
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn matches(filter: &FilterExpression, source: &Value) -> bool {
    match filter {
        FilterExpression::MatchAll => true,
        FilterExpression::Exact { field, value } => {
            field_value(source, field).is_some_and(|v| as_text(v) == *value)
        }
        FilterExpression::Phrase { field, value } => {
            let wanted = tokens(value);
            if wanted.is_empty() {
                return false;
            }
            field_value(source, field).is_some_and(|v| {
                tokens(&as_text(v))
                    .windows(wanted.len())
                    .any(|window| window == wanted.as_slice())
            })
        }
    }
}

fn by_query_envelope(total: usize, updated: usize, deleted: usize) -> String {
    json!({
        "took": 0,
        "timed_out": false,
        "total": total,
        "updated": updated,
        "deleted": deleted,
        "batches": 1,
        "version_conflicts": 0,
        "noops": 0,
        "failures": [],
    })
    .to_string()
}

#[async_trait]
impl SearchEngine for InMemoryEngine {
    async fn ping(&self) -> SearchResult<()> {
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> SearchResult<bool> {
        Ok(self.resolve(index).is_some())
    }

    async fn create_index(&self, index: &str, definition: &IndexDefinition) -> SearchResult<()> {
        match self.indices.entry(index.to_string()) {
            Entry::Occupied(_) => return Err(SearchError::IndexAlreadyExists(index.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(StoredIndex {
                    definition: definition.clone(),
                    docs: Vec::new(),
                });
            }
        }

        self.aliases
            .insert(definition.alias.clone(), index.to_string());
        Ok(())
    }

    async fn index_document(&self, index: &str, id: &str, source: &Value) -> SearchResult<()> {
        let name = self.resolve_or_missing(index)?;
        let mut stored = self
            .indices
            .get_mut(&name)
            .ok_or_else(|| SearchError::IndexNotFound(index.to_string()))?;

        match stored.docs.iter_mut().find(|(doc_id, _)| doc_id == id) {
            Some((_, existing)) => *existing = source.clone(),
            None => stored.docs.push((id.to_string(), source.clone())),
        }
        Ok(())
    }

    async fn search(&self, index: &str, request: &SearchRequest) -> SearchResult<String> {
        let name = self.resolve_or_missing(index)?;
        let stored = self
            .indices
            .get(&name)
            .ok_or_else(|| SearchError::IndexNotFound(index.to_string()))?;

        let matching: Vec<&(String, Value)> = stored
            .docs
            .iter()
            .filter(|(_, source)| matches(&request.filter, source))
            .collect();

        let hits: Vec<Value> = matching
            .iter()
            .take(request.size)
            .map(|(id, source)| {
                json!({
                    "_index": name,
                    "_id": id,
                    "_score": 1.0,
                    "_source": source,
                })
            })
            .collect();

        Ok(json!({
            "took": 0,
            "timed_out": false,
            "hits": {
                "total": { "value": matching.len(), "relation": "eq" },
                "max_score": if hits.is_empty() { Value::Null } else { json!(1.0) },
                "hits": hits,
            }
        })
        .to_string())
    }

    async fn update_by_query(
        &self,
        index: &str,
        filter: &FilterExpression,
        script: &UpdateScript,
    ) -> SearchResult<String> {
        let name = self.resolve_or_missing(index)?;
        let mut stored = self
            .indices
            .get_mut(&name)
            .ok_or_else(|| SearchError::IndexNotFound(index.to_string()))?;

        let mut updated = 0;
        for (_, source) in stored.docs.iter_mut() {
            if !matches(filter, source) {
                continue;
            }
            if let Value::Object(fields) = source {
                for (key, value) in script.fields() {
                    fields.insert(key.clone(), value.clone());
                }
                let newer = match fields.get("updated_at").and_then(Value::as_str) {
                    Some(current) => script.updated_at() >= current,
                    None => true,
                };
                if newer {
                    fields.insert(
                        "updated_at".to_string(),
                        Value::String(script.updated_at().to_string()),
                    );
                }
            }
            updated += 1;
        }

        Ok(by_query_envelope(updated, updated, 0))
    }

    async fn delete_by_query(&self, index: &str, filter: &FilterExpression) -> SearchResult<String> {
        let name = self.resolve_or_missing(index)?;
        let mut stored = self
            .indices
            .get_mut(&name)
            .ok_or_else(|| SearchError::IndexNotFound(index.to_string()))?;

        let before = stored.docs.len();
        stored.docs.retain(|(_, source)| !matches(filter, source));
        let deleted = before - stored.docs.len();

        Ok(by_query_envelope(deleted, 0, deleted))
    }

    async fn refresh(&self, index: &str) -> SearchResult<()> {
        self.resolve_or_missing(index).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::decode::{decode, decode_by_query, decode_total};
    use chrono::{TimeZone, Utc};
    use serde_json::Map;

    fn definition() -> IndexDefinition {
        IndexDefinition {
            alias: "documents".to_string(),
            shards: 3,
            replicas: 2,
            mappings: json!({}),
        }
    }

    async fn seeded() -> InMemoryEngine {
        let engine = InMemoryEngine::new();
        engine.create_index("documents_19092022", &definition()).await.unwrap();
        engine
            .index_document(
                "documents_19092022",
                "1",
                &json!({ "id": "1", "description": "Quarterly sales report" }),
            )
            .await
            .unwrap();
        engine
            .index_document(
                "documents_19092022",
                "2",
                &json!({ "id": "2", "description": "Report on sales, quarterly" }),
            )
            .await
            .unwrap();
        engine
    }

    #[tokio::test]
    async fn test_second_create_reports_already_exists() {
        let engine = seeded().await;
        let err = engine
            .create_index("documents_19092022", &definition())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::IndexAlreadyExists(_)));
        assert_eq!(engine.document_count("documents"), Some(2));
    }

    #[tokio::test]
    async fn test_write_to_missing_index() {
        let engine = InMemoryEngine::new();
        let err = engine
            .index_document("users_19092022", "1", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::IndexNotFound(_)));
    }

    #[tokio::test]
    async fn test_phrase_and_exact_matching() {
        let engine = seeded().await;

        let raw = engine
            .search(
                "documents_19092022",
                &SearchRequest::new(FilterExpression::phrase("description", "sales report"), 10),
            )
            .await
            .unwrap();
        let hits = decode::<Value>(&raw).unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.sources[0]["id"], json!("1"));

        let raw = engine
            .search(
                "documents",
                &SearchRequest::count(FilterExpression::exact("id.keyword", "2")),
            )
            .await
            .unwrap();
        assert_eq!(decode_total(&raw).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_size_limits_hits_not_total() {
        let engine = seeded().await;
        let raw = engine
            .search(
                "documents_19092022",
                &SearchRequest::new(FilterExpression::MatchAll, 1),
            )
            .await
            .unwrap();
        let hits = decode::<Value>(&raw).unwrap();
        assert_eq!(hits.total, 2);
        assert_eq!(hits.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_by_query() {
        let engine = seeded().await;

        let mut fields = Map::new();
        fields.insert("description".to_string(), json!("Annual report"));
        let script = UpdateScript::assign(fields, Utc::now());

        let raw = engine
            .update_by_query("documents_19092022", &FilterExpression::exact("id", "1"), &script)
            .await
            .unwrap();
        assert_eq!(decode_by_query(&raw).unwrap().updated, 1);

        let raw = engine
            .delete_by_query("documents_19092022", &FilterExpression::exact("id", "missing"))
            .await
            .unwrap();
        assert_eq!(decode_by_query(&raw).unwrap().deleted, 0);

        let raw = engine
            .delete_by_query("documents_19092022", &FilterExpression::exact("id", "2"))
            .await
            .unwrap();
        assert_eq!(decode_by_query(&raw).unwrap().deleted, 1);
        assert_eq!(engine.document_count("documents_19092022"), Some(1));
    }

    #[tokio::test]
    async fn test_updated_at_never_moves_backwards() {
        let engine = seeded().await;
        let filter = FilterExpression::exact("id", "1");
        let later = Utc.with_ymd_and_hms(2022, 9, 19, 12, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2022, 9, 19, 11, 0, 0).unwrap();

        let script = UpdateScript::assign(Map::new(), later);
        engine
            .update_by_query("documents_19092022", &filter, &script)
            .await
            .unwrap();

        let mut fields = Map::new();
        fields.insert("description".to_string(), json!("Annual report"));
        let script = UpdateScript::assign(fields, earlier);
        let raw = engine
            .update_by_query("documents_19092022", &filter, &script)
            .await
            .unwrap();
        assert_eq!(decode_by_query(&raw).unwrap().updated, 1);

        let raw = engine
            .search("documents_19092022", &SearchRequest::new(filter, 1))
            .await
            .unwrap();
        let hits = decode::<Value>(&raw).unwrap();
        assert_eq!(hits.sources[0]["description"], json!("Annual report"));
        assert_eq!(hits.sources[0]["updated_at"], json!("2022-09-19T12:00:00.000000Z"));
    }
}
