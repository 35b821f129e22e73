//! Error types for the single-slot cache

use crate::error::AppError;

/// Result type for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Cache command failed: {0}")]
    Command(String),

    #[error("Cache configuration error: {0}")]
    Configuration(String),
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Configuration(msg) => AppError::Configuration(msg),
            other => AppError::Transport(other.to_string()),
        }
    }
}
