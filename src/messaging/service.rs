//! Main messaging service

use crate::messaging::config::{MessagingBackend, MessagingConfig};
use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::memory::InMemoryBus;
use crate::messaging::metrics::MESSAGING_METRICS;
use crate::messaging::nats::{NatsConsumer, NatsProducer};
use crate::messaging::redis::{RedisConsumer, RedisProducer};
use crate::messaging::traits::{MessageConsumer, MessageProducer, MessageStream};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Unified access to the configured message bus
pub struct MessagingService {
    config: MessagingConfig,
    producer: Option<Arc<dyn MessageProducer>>,
    consumer: Option<Arc<dyn MessageConsumer>>,
}

impl MessagingService {
    /// Connect to the configured backend
    pub async fn new(config: MessagingConfig) -> MessagingResult<Self> {
        if !config.enabled {
            return Ok(Self {
                config,
                producer: None,
                consumer: None,
            });
        }

        let (producer, consumer): (Arc<dyn MessageProducer>, Arc<dyn MessageConsumer>) =
            match config.backend {
                MessagingBackend::Redis => (
                    Arc::new(RedisProducer::new(&config.redis_url).await?),
                    Arc::new(RedisConsumer::new(&config.redis_url)?),
                ),
                MessagingBackend::Nats => (
                    Arc::new(NatsProducer::new(&config).await?),
                    Arc::new(NatsConsumer::new(&config).await?),
                ),
                MessagingBackend::InMemory => {
                    let bus = Arc::new(InMemoryBus::new(config.channel_capacity));
                    (bus.clone(), bus)
                }
            };

        info!(backend = config.backend.as_str(), topic = %config.topic, "Message bus connected");

        Ok(Self {
            config,
            producer: Some(producer),
            consumer: Some(consumer),
        })
    }

    /// Use an already-constructed backend
    pub fn with_backend(
        config: MessagingConfig,
        producer: Arc<dyn MessageProducer>,
        consumer: Arc<dyn MessageConsumer>,
    ) -> Self {
        Self {
            config,
            producer: Some(producer),
            consumer: Some(consumer),
        }
    }

    /// Process-local bus sharing `bus` between publishers and subscribers
    pub fn in_memory(bus: Arc<InMemoryBus>) -> Self {
        Self::with_backend(MessagingConfig::in_memory(), bus.clone(), bus)
    }

    pub fn config(&self) -> &MessagingConfig {
        &self.config
    }

    /// Topic carrying creation events
    pub fn topic(&self) -> &str {
        &self.config.topic
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled && self.producer.is_some()
    }

    pub fn backend_name(&self) -> &'static str {
        self.config.backend.as_str()
    }

    /// Serialize `message` as JSON and publish it; returns the payload sent
    pub async fn publish<T: Serialize + Sync>(
        &self,
        topic: &str,
        message: &T,
    ) -> MessagingResult<String> {
        let payload = serde_json::to_string(message)?;
        self.publish_raw(topic, &payload).await?;
        Ok(payload)
    }

    /// Publish a payload as-is
    pub async fn publish_raw(&self, topic: &str, payload: &str) -> MessagingResult<()> {
        let Some(producer) = self.producer.as_ref() else {
            return Err(MessagingError::BackendUnavailable("Messaging disabled".to_string()));
        };

        let backend = self.backend_name();
        let start = Instant::now();
        let result = producer.publish(topic, payload).await;

        match &result {
            Ok(()) => {
                MESSAGING_METRICS
                    .messages_published
                    .with_label_values(&[topic, backend])
                    .inc();
                MESSAGING_METRICS
                    .publish_latency
                    .with_label_values(&[topic, backend])
                    .observe(start.elapsed().as_secs_f64());
            }
            Err(e) => {
                MESSAGING_METRICS
                    .publish_failures
                    .with_label_values(&[topic, backend, e.kind()])
                    .inc();
            }
        }

        result
    }

    /// Subscribe to a topic
    pub async fn subscribe(&self, topic: &str) -> MessagingResult<Box<dyn MessageStream>> {
        match self.consumer.as_ref() {
            Some(consumer) => consumer.subscribe(topic).await,
            None => Err(MessagingError::BackendUnavailable("Messaging disabled".to_string())),
        }
    }

    /// Check if the service is connected
    pub async fn is_connected(&self) -> bool {
        match self.producer.as_ref() {
            Some(producer) => producer.is_connected().await,
            None => false,
        }
    }

    /// Close all connections
    pub async fn close(&self) -> MessagingResult<()> {
        if let Some(ref producer) = self.producer {
            producer.close().await?;
        }

        if let Some(ref consumer) = self.consumer {
            consumer.close().await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_disabled_service() {
        let config = MessagingConfig {
            enabled: false,
            ..Default::default()
        };

        let service = MessagingService::new(config).await.unwrap();
        assert!(!service.is_enabled());
        assert!(!service.is_connected().await);
        assert!(matches!(
            service.publish_raw("doc-system", "x").await,
            Err(MessagingError::BackendUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let service = MessagingService::new(MessagingConfig::in_memory()).await.unwrap();
        let mut stream = service.subscribe("doc-system").await.unwrap();

        let sent = service
            .publish("doc-system", &json!({ "document_id": "d1" }))
            .await
            .unwrap();

        let received = stream.next().await.unwrap().unwrap();
        assert_eq!(received.payload, sent);
        assert_eq!(service.backend_name(), "in_memory");
    }
}
