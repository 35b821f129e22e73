//! Error types for search engine operations

use crate::error::AppError;

/// Result type for search engine operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors reported by a [`SearchEngine`](crate::search::SearchEngine)
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Connection or protocol failure before a response was received
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The engine did not answer within the configured deadline
    #[error("Engine request timed out: {0}")]
    Timeout(String),

    /// Index creation rejected because the name is taken
    #[error("Index already exists: {0}")]
    IndexAlreadyExists(String),

    /// The addressed index (or alias) does not exist
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// The engine answered with a non-success status
    #[error("Engine returned {status} ({error_type}): {reason}")]
    Status {
        status: u16,
        error_type: String,
        reason: String,
    },

    /// Request body could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SearchError {
    /// Build a status error from an engine error body
    ///
    /// Elasticsearch reports `{"error": {"type": ..., "reason": ...}, "status": ...}`;
    /// bodies in any other shape keep the raw text as the reason.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
        let error = parsed.as_ref().and_then(|v| v.get("error"));

        let error_type = error
            .and_then(|e| e.get("type"))
            .and_then(|t| t.as_str())
            .unwrap_or("unknown")
            .to_string();
        let reason = error
            .and_then(|e| e.get("reason"))
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string());

        SearchError::Status {
            status,
            error_type,
            reason,
        }
    }

    /// Engine error type, when the engine reported one
    pub fn error_type(&self) -> Option<&str> {
        match self {
            SearchError::Status { error_type, .. } => Some(error_type),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SearchError::Timeout(err.to_string())
        } else {
            SearchError::Transport(err.to_string())
        }
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Timeout(msg) => AppError::Timeout(msg),
            SearchError::IndexNotFound(index) => {
                AppError::NotFound(format!("index {} does not exist", index))
            }
            SearchError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            SearchError::Serialization(msg) => AppError::Serialization(msg),
            other => AppError::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_elastic_error_body() {
        let body = r#"{"error":{"type":"resource_already_exists_exception","reason":"index [documents_19092022/abc] already exists"},"status":400}"#;
        let err = SearchError::from_response(400, body);

        assert_eq!(err.error_type(), Some("resource_already_exists_exception"));
        match err {
            SearchError::Status { status, reason, .. } => {
                assert_eq!(status, 400);
                assert!(reason.contains("already exists"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_plain_body() {
        let err = SearchError::from_response(502, "Bad Gateway");
        assert_eq!(err.error_type(), Some("unknown"));
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[test]
    fn test_app_error_mapping() {
        let app: AppError = SearchError::Timeout("5s".to_string()).into();
        assert_eq!(app.error_code(), "TIMEOUT");

        let app: AppError = SearchError::Transport("refused".to_string()).into();
        assert_eq!(app.error_code(), "TRANSPORT_ERROR");
    }
}
