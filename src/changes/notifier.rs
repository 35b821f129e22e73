//! Publishing of creation events

use crate::messaging::{ChangeEvent, MessageEnvelope, MessagingResult, MessagingService};
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened to the creation event after a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// The event reached the bus
    Published,
    /// No bus is configured
    Disabled,
    /// Publishing failed; the write itself stands
    Failed(String),
}

impl NotificationOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, NotificationOutcome::Published)
    }
}

/// Publishes [`ChangeEvent`]s onto the configured topic
#[derive(Clone)]
pub struct ChangeNotifier {
    messaging: Option<Arc<MessagingService>>,
}

impl ChangeNotifier {
    pub fn new(messaging: Arc<MessagingService>) -> Self {
        Self {
            messaging: Some(messaging),
        }
    }

    /// A notifier that publishes nothing
    pub fn disabled() -> Self {
        Self { messaging: None }
    }

    /// Publish `event` to `topic`, returning the payload sent
    pub async fn publish(&self, topic: &str, event: &ChangeEvent) -> MessagingResult<Option<String>> {
        let Some(messaging) = self.active() else {
            return Ok(None);
        };

        let envelope = MessageEnvelope::new(event);
        let payload = messaging.publish(topic, &envelope).await?;
        debug!(
            topic = %topic,
            event_type = event.event_type(),
            record_id = %event.record_id(),
            "Change event published"
        );
        Ok(Some(payload))
    }

    /// Publish `event` to the configured topic, logging instead of failing
    pub async fn notify(&self, event: &ChangeEvent) -> NotificationOutcome {
        let Some(messaging) = self.active() else {
            return NotificationOutcome::Disabled;
        };

        match self.publish(messaging.topic(), event).await {
            Ok(_) => NotificationOutcome::Published,
            Err(e) => {
                warn!(
                    topic = %messaging.topic(),
                    event_type = event.event_type(),
                    record_id = %event.record_id(),
                    error = %e,
                    "Failed to publish change event"
                );
                NotificationOutcome::Failed(e.to_string())
            }
        }
    }

    fn active(&self) -> Option<&Arc<MessagingService>> {
        self.messaging.as_ref().filter(|m| m.is_enabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::{MessageProducer, MessagingConfig, MessagingError, InMemoryBus};
    use async_trait::async_trait;

    struct BrokenProducer;

    #[async_trait]
    impl MessageProducer for BrokenProducer {
        async fn publish(&self, _topic: &str, _payload: &str) -> MessagingResult<()> {
            Err(MessagingError::PublishFailed("connection reset".to_string()))
        }

        async fn is_connected(&self) -> bool {
            false
        }

        async fn close(&self) -> MessagingResult<()> {
            Ok(())
        }
    }

    fn event() -> ChangeEvent {
        ChangeEvent::UserCreated {
            user_id: "u1".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            role: "admin".to_string(),
        }
    }

    #[tokio::test]
    async fn test_disabled_notifier() {
        let notifier = ChangeNotifier::disabled();
        assert_eq!(notifier.notify(&event()).await, NotificationOutcome::Disabled);
        assert_eq!(notifier.publish("doc-system", &event()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failure_is_reported() {
        let bus = Arc::new(InMemoryBus::default());
        let messaging = MessagingService::with_backend(
            MessagingConfig::in_memory(),
            Arc::new(BrokenProducer),
            bus,
        );
        let notifier = ChangeNotifier::new(Arc::new(messaging));

        match notifier.notify(&event()).await {
            NotificationOutcome::Failed(reason) => assert!(reason.contains("connection reset")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_payload_carries_event() {
        let bus = Arc::new(InMemoryBus::default());
        let notifier = ChangeNotifier::new(Arc::new(MessagingService::in_memory(bus)));

        let payload = notifier.publish("doc-system", &event()).await.unwrap().unwrap();
        let envelope: MessageEnvelope<ChangeEvent> = serde_json::from_str(&payload).unwrap();
        assert_eq!(envelope.payload, event());
    }
}
