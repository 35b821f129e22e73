//! Domain records stored in the search indices

pub mod document;
pub mod mappings;
pub mod user;

pub use document::{Document, DocumentPatch, NewDocument};
pub use user::{NewUser, User, UserPatch};

use chrono::{DateTime, Timelike, Utc};
use serde::{de::DeserializeOwned, Serialize, Serializer};
use serde_json::Value;

/// A record that lives in its own index under a repository-assigned id
pub trait IndexedEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Entity name used in logs and metric labels
    const KIND: &'static str;

    fn id(&self) -> &str;

    /// Field mappings declared when the index is created
    fn mappings() -> Value;
}

/// Current time at the microsecond precision the indices store
pub fn timestamp_now() -> DateTime<Utc> {
    let now = Utc::now();
    now.with_nanosecond(now.nanosecond() / 1_000 * 1_000)
        .unwrap_or(now)
}

/// Writes a timestamp in the layout update scripts compare against
pub(crate) fn serialize_timestamp<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&crate::search::format_timestamp(ts))
}

/// Fresh opaque record id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
