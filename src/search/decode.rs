//! Decoding of engine response envelopes

use crate::error::AppError;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;

/// Result type for decoding
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// The engine answered, but not with the envelope we expected
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed {envelope} envelope: {source}")]
    Malformed {
        envelope: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::Decode(err.to_string())
    }
}

/// Typed sources of a search response
#[derive(Debug, Clone, PartialEq)]
pub struct Hits<T> {
    /// Total matching documents, which may exceed `sources.len()`
    pub total: u64,
    /// Sources in engine order
    pub sources: Vec<T>,
}

impl<T> Hits<T> {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// First hit in engine order, for lookups expected to be unique
    pub fn into_first(self) -> Option<T> {
        self.sources.into_iter().next()
    }
}

/// Affected-document counts of an update- or delete-by-query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ByQueryCounts {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub deleted: u64,
    #[serde(default)]
    pub version_conflicts: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Object { value: u64 },
    Count(u64),
}

impl TotalHits {
    fn value(&self) -> u64 {
        match self {
            TotalHits::Object { value } => *value,
            TotalHits::Count(count) => *count,
        }
    }
}

#[derive(Deserialize)]
struct SearchEnvelope<H> {
    hits: HitsSection<H>,
}

#[derive(Deserialize)]
struct HitsSection<H> {
    #[serde(default)]
    total: Option<TotalHits>,
    #[serde(default = "Vec::new")]
    hits: Vec<H>,
}

#[derive(Deserialize)]
struct SourceHit<T> {
    #[serde(rename = "_source")]
    source: T,
}

/// Decode a search envelope into typed sources
pub fn decode<T: DeserializeOwned>(raw: &str) -> DecodeResult<Hits<T>> {
    let envelope: SearchEnvelope<SourceHit<T>> =
        serde_json::from_str(raw).map_err(|source| DecodeError::Malformed {
            envelope: "search",
            source,
        })?;

    let section = envelope.hits;
    let sources: Vec<T> = section.hits.into_iter().map(|hit| hit.source).collect();
    let total = section
        .total
        .map(|t| t.value())
        .unwrap_or(sources.len() as u64);

    Ok(Hits { total, sources })
}

/// Read only the total-hit count of a search envelope, ignoring sources
pub fn decode_total(raw: &str) -> DecodeResult<u64> {
    let envelope: SearchEnvelope<IgnoredAny> =
        serde_json::from_str(raw).map_err(|source| DecodeError::Malformed {
            envelope: "search",
            source,
        })?;

    let section = envelope.hits;
    Ok(section
        .total
        .map(|t| t.value())
        .unwrap_or(section.hits.len() as u64))
}

/// Decode the counts reported by an update- or delete-by-query
pub fn decode_by_query(raw: &str) -> DecodeResult<ByQueryCounts> {
    serde_json::from_str(raw).map_err(|source| DecodeError::Malformed {
        envelope: "by-query",
        source,
    })
}
