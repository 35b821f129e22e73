//! Server-side update scripts
//!
//! The script source is a constant. Patched values travel only in `params`,
//! so no field value can change what the script does.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

/// Painless source assigning every entry of `params.fields` plus `updated_at`
///
/// `updated_at` only moves forward. Both sides use the layout of
/// [`format_timestamp`], so text order is time order.
pub const ASSIGN_FIELDS_SOURCE: &str = "for (def entry : params.fields.entrySet()) { ctx._source[entry.getKey()] = entry.getValue(); } if (ctx._source.updated_at == null || params.updated_at.compareTo(ctx._source.updated_at) >= 0) { ctx._source.updated_at = params.updated_at; }";

/// An update-by-query script with bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateScript {
    fields: Map<String, Value>,
    updated_at: String,
}

impl UpdateScript {
    /// Assign `fields` and stamp `updated_at`
    pub fn assign(fields: Map<String, Value>, updated_at: DateTime<Utc>) -> Self {
        Self {
            fields,
            updated_at: format_timestamp(&updated_at),
        }
    }

    pub fn source(&self) -> &'static str {
        ASSIGN_FIELDS_SOURCE
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn updated_at(&self) -> &str {
        &self.updated_at
    }

    /// Render as the `script` member of an update-by-query body
    pub fn to_body(&self) -> Value {
        json!({
            "source": ASSIGN_FIELDS_SOURCE,
            "lang": "painless",
            "params": {
                "fields": Value::Object(self.fields.clone()),
                "updated_at": self.updated_at,
            }
        })
    }
}

/// Timestamp layout shared by indexed sources and script parameters
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
