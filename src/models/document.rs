use super::{mappings, IndexedEntity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored document's metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Repository-assigned identifier
    pub id: String,

    pub name: String,

    pub description: String,

    /// File extension including the dot, e.g. `.txt`
    pub extension: String,

    /// Storage path of the uploaded file
    pub path: String,

    pub mime_type: String,

    /// Creation timestamp, never changed afterwards
    #[serde(serialize_with = "super::serialize_timestamp")]
    pub created_at: DateTime<Utc>,

    /// Refreshed on every accepted update
    #[serde(serialize_with = "super::serialize_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl IndexedEntity for Document {
    const KIND: &'static str = "document";

    fn id(&self) -> &str {
        &self.id
    }

    fn mappings() -> Value {
        mappings::documents()
    }
}

/// Caller-supplied attributes of a document to create
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NewDocument {
    pub name: String,
    pub description: String,
    pub extension: String,
    pub path: String,
    pub mime_type: String,
}

impl NewDocument {
    /// Attach identity and timestamps; both timestamps share one instant
    pub fn into_document(self, id: String, now: DateTime<Utc>) -> Document {
        Document {
            id,
            name: self.name,
            description: self.description,
            extension: self.extension,
            path: self.path,
            mime_type: self.mime_type,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a document; `None` fields are left untouched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl DocumentPatch {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Patched fields keyed by their source name
    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        let entries = [
            ("name", self.name),
            ("description", self.description),
            ("extension", self.extension),
            ("path", self.path),
            ("mime_type", self.mime_type),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                fields.insert(key.to_string(), Value::String(value));
            }
        }
        fields
    }
}
