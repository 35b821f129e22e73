//! Event types published on the message bus

use crate::models::{Document, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record-creation events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A document was indexed
    DocumentCreated {
        document_id: String,
        name: String,
        description: String,
        extension: String,
        path: String,
        mime_type: String,
        /// Acting user, when the caller supplied one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },

    /// A user registered; the password hash never leaves the index
    UserCreated {
        user_id: String,
        username: String,
        email: String,
        role: String,
    },
}

impl ChangeEvent {
    pub fn document_created(document: &Document, user_id: Option<&str>) -> Self {
        ChangeEvent::DocumentCreated {
            document_id: document.id.clone(),
            name: document.name.clone(),
            description: document.description.clone(),
            extension: document.extension.clone(),
            path: document.path.clone(),
            mime_type: document.mime_type.clone(),
            user_id: user_id.map(str::to_string),
        }
    }

    pub fn user_created(user: &User) -> Self {
        ChangeEvent::UserCreated {
            user_id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
        }
    }

    /// Id of the created record
    pub fn record_id(&self) -> &str {
        match self {
            ChangeEvent::DocumentCreated { document_id, .. } => document_id,
            ChangeEvent::UserCreated { user_id, .. } => user_id,
        }
    }

    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            ChangeEvent::DocumentCreated { .. } => "document_created",
            ChangeEvent::UserCreated { .. } => "user_created",
        }
    }
}

/// Message metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageMetadata {
    /// Message ID
    pub message_id: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// Source service
    pub source: String,
}

impl Default for MessageMetadata {
    fn default() -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            source: "docsys".to_string(),
        }
    }
}

/// Message envelope wrapping the event with metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageEnvelope<T> {
    /// Message metadata
    pub metadata: MessageMetadata,

    /// Message payload
    pub payload: T,
}

impl<T> MessageEnvelope<T> {
    /// Create a new message envelope
    pub fn new(payload: T) -> Self {
        Self {
            metadata: MessageMetadata::default(),
            payload,
        }
    }
}
