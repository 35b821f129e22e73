//! Query filter construction
//!
//! Every searchable field has exactly one matcher, fixed by how the field is
//! mapped at index creation (see [`crate::models::mappings`]). Callers name the
//! field and the builder picks the matcher, so a keyword field can never be
//! queried through the text analyzer by accident.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// How a filter value is compared against the indexed field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    /// `term` query against non-analyzed keyword data
    Exact,
    /// `match_phrase` query against analyzed text
    Phrase,
}

/// Fields that repositories filter on, with their canonical matcher
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IndexedField {
    Id,
    Email,
    Username,
    Role,
    Name,
    Description,
    Extension,
    Path,
    MimeType,
}

impl IndexedField {
    /// Source field path in the index
    pub fn path(&self) -> &'static str {
        match self {
            IndexedField::Id => "id",
            IndexedField::Email => "email",
            IndexedField::Username => "username",
            IndexedField::Role => "role",
            IndexedField::Name => "name",
            IndexedField::Description => "description",
            IndexedField::Extension => "extension",
            IndexedField::Path => "path",
            IndexedField::MimeType => "mime_type",
        }
    }

    /// Matcher dictated by the field's mapping
    pub fn matcher(&self) -> MatcherKind {
        match self {
            IndexedField::Id | IndexedField::Email => MatcherKind::Exact,
            _ => MatcherKind::Phrase,
        }
    }
}

impl fmt::Display for IndexedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A single-field predicate used to scope search, update and delete requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpression {
    /// Every document in the index
    MatchAll,
    /// Exact term comparison
    Exact { field: String, value: String },
    /// Analyzed phrase comparison
    Phrase { field: String, value: String },
}

impl FilterExpression {
    pub fn exact(field: impl Into<String>, value: impl Into<String>) -> Self {
        FilterExpression::Exact {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn phrase(field: impl Into<String>, value: impl Into<String>) -> Self {
        FilterExpression::Phrase {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn kind(&self) -> Option<MatcherKind> {
        match self {
            FilterExpression::MatchAll => None,
            FilterExpression::Exact { .. } => Some(MatcherKind::Exact),
            FilterExpression::Phrase { .. } => Some(MatcherKind::Phrase),
        }
    }

    /// Render as an engine query clause
    pub fn to_query(&self) -> Value {
        match self {
            FilterExpression::MatchAll => json!({ "match_all": {} }),
            FilterExpression::Exact { field, value } => json!({ "term": clause(field, value) }),
            FilterExpression::Phrase { field, value } => {
                json!({ "match_phrase": clause(field, value) })
            }
        }
    }
}

fn clause(field: &str, value: &str) -> Value {
    let mut inner = Map::new();
    inner.insert(field.to_string(), Value::String(value.to_string()));
    Value::Object(inner)
}

/// Build the filter for `field == value` using the field's canonical matcher
pub fn build_filter(field: IndexedField, value: impl Into<String>) -> FilterExpression {
    match field.matcher() {
        MatcherKind::Exact => FilterExpression::exact(field.path(), value),
        MatcherKind::Phrase => FilterExpression::phrase(field.path(), value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_fields_use_exact_terms() {
        let filter = build_filter(IndexedField::Id, "6f1c2a9e-0d4b-4b6e-9d55-3c1f8a7e2b10");
        assert_eq!(filter.kind(), Some(MatcherKind::Exact));
        assert_eq!(
            filter.to_query(),
            json!({ "term": { "id": "6f1c2a9e-0d4b-4b6e-9d55-3c1f8a7e2b10" } })
        );

        let filter = build_filter(IndexedField::Email, "a@b.io");
        assert_eq!(filter.to_query(), json!({ "term": { "email": "a@b.io" } }));
    }

    #[test]
    fn test_text_fields_use_phrase_match() {
        let filter = build_filter(IndexedField::Description, "quarterly report");
        assert_eq!(filter.kind(), Some(MatcherKind::Phrase));
        assert_eq!(
            filter.to_query(),
            json!({ "match_phrase": { "description": "quarterly report" } })
        );
    }

    #[test]
    fn test_match_all() {
        assert_eq!(FilterExpression::MatchAll.to_query(), json!({ "match_all": {} }));
        assert_eq!(FilterExpression::MatchAll.kind(), None);
    }

    #[test]
    fn test_values_are_not_interpreted() {
        let hostile = r#"x" } }, "match_all": { "#;
        let filter = build_filter(IndexedField::Name, hostile);
        assert_eq!(filter.to_query()["match_phrase"]["name"], json!(hostile));
    }
}
