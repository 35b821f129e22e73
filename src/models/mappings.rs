//! Explicit field mappings
//!
//! Identity fields are `keyword` so they can only be matched exactly.
//! Free-text attributes are analyzed `text` with a `keyword` sub-field.

use serde_json::{json, Value};

fn text_with_keyword() -> Value {
    json!({
        "type": "text",
        "fields": { "keyword": { "type": "keyword", "ignore_above": 256 } }
    })
}

fn date() -> Value {
    json!({ "type": "date" })
}

pub fn documents() -> Value {
    json!({
        "properties": {
            "id": { "type": "keyword" },
            "name": text_with_keyword(),
            "description": text_with_keyword(),
            "extension": text_with_keyword(),
            "path": text_with_keyword(),
            "mime_type": text_with_keyword(),
            "created_at": date(),
            "updated_at": date(),
        }
    })
}

pub fn users() -> Value {
    json!({
        "properties": {
            "id": { "type": "keyword" },
            "email": { "type": "keyword" },
            "username": text_with_keyword(),
            "role": text_with_keyword(),
            "password_hash": { "type": "keyword", "index": false },
            "created_at": date(),
            "updated_at": date(),
        }
    })
}
