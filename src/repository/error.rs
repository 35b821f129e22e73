//! Error types for repository operations

use crate::error::AppError;
use crate::search::{DecodeError, ProvisionError, SearchError};

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// No record matched a scoped operation
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness rule checked by the repository was violated
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Engine unreachable or answered with an error status
    #[error("Search engine error: {0}")]
    Transport(SearchError),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation deadline expired
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        RepositoryError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }

    /// Outcome label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            RepositoryError::NotFound { .. } => "not_found",
            RepositoryError::Conflict(_) => "conflict",
            RepositoryError::Provision(_) => "provision_error",
            RepositoryError::Decode(_) => "decode_error",
            RepositoryError::Transport(_) => "transport_error",
            RepositoryError::Validation(_) => "validation_error",
            RepositoryError::Timeout(_) => "timeout",
        }
    }
}

impl From<SearchError> for RepositoryError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Timeout(msg) => RepositoryError::Timeout(msg),
            other => RepositoryError::Transport(other),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } => AppError::NotFound(err.to_string()),
            RepositoryError::Conflict(msg) => AppError::Conflict(msg),
            RepositoryError::Provision(e) => e.into(),
            RepositoryError::Decode(e) => e.into(),
            RepositoryError::Transport(e) => e.into(),
            RepositoryError::Validation(msg) => AppError::Validation(msg),
            RepositoryError::Timeout(msg) => AppError::Timeout(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = RepositoryError::not_found("document", "abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "document abc not found");

        let app: AppError = err.into();
        assert_eq!(app.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let app: AppError = RepositoryError::Conflict("email taken".to_string()).into();
        assert_eq!(app.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_engine_timeout_becomes_timeout() {
        let err: RepositoryError = SearchError::Timeout("5000ms".to_string()).into();
        assert_eq!(err.kind(), "timeout");

        let err: RepositoryError = SearchError::Transport("refused".to_string()).into();
        assert_eq!(err.kind(), "transport_error");
    }
}
