use super::{mappings, IndexedEntity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A registered user
///
/// The password arrives already hashed; this crate never sees plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub role: String,
    #[serde(serialize_with = "super::serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "super::serialize_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl IndexedEntity for User {
    const KIND: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }

    fn mappings() -> Value {
        mappings::users()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub role: String,
}

impl NewUser {
    pub fn into_user(self, id: String, now: DateTime<Utc>) -> User {
        User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            email: self.email,
            role: self.role,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a user; `None` fields are left untouched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl UserPatch {
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        let entries = [
            ("username", self.username),
            ("password_hash", self.password_hash),
            ("email", self.email),
            ("role", self.role),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                fields.insert(key.to_string(), Value::String(value));
            }
        }
        fields
    }
}
