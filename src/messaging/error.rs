//! Error types for messaging operations

use crate::error::AppError;

/// Result type for messaging operations
pub type MessagingResult<T> = std::result::Result<T, MessagingError>;

/// Errors that can occur during messaging operations
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Publish failed
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    /// Subscribe failed
    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Payload was not valid UTF-8 text
    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Backend not available
    #[error("Backend not available: {0}")]
    BackendUnavailable(String),
}

impl MessagingError {
    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            MessagingError::ConnectionFailed(_) => "connection",
            MessagingError::PublishFailed(_) => "publish",
            MessagingError::SubscribeFailed(_) => "subscribe",
            MessagingError::SerializationError(_) => "serialization",
            MessagingError::InvalidMessage(_) => "invalid_message",
            MessagingError::ConfigurationError(_) => "configuration",
            MessagingError::BackendUnavailable(_) => "unavailable",
        }
    }
}

impl From<serde_json::Error> for MessagingError {
    fn from(err: serde_json::Error) -> Self {
        MessagingError::SerializationError(err.to_string())
    }
}

impl From<MessagingError> for AppError {
    fn from(err: MessagingError) -> Self {
        match err {
            MessagingError::ConfigurationError(msg) => AppError::Configuration(msg),
            MessagingError::SerializationError(msg) => AppError::Serialization(msg),
            other => AppError::Transport(other.to_string()),
        }
    }
}
