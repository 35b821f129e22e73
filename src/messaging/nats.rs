//! NATS message bus implementation

use crate::messaging::config::MessagingConfig;
use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::traits::{BusMessage, MessageConsumer, MessageProducer, MessageStream};
use async_nats::Client;
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;

async fn connect(config: &MessagingConfig) -> MessagingResult<Client> {
    async_nats::ConnectOptions::new()
        .name(config.connection_name.clone())
        .connect(config.nats_url.as_str())
        .await
        .map_err(|e| MessagingError::ConnectionFailed(format!("NATS connection failed: {}", e)))
}

/// NATS producer
pub struct NatsProducer {
    client: Arc<Client>,
}

impl NatsProducer {
    /// Create a new NATS producer
    pub async fn new(config: &MessagingConfig) -> MessagingResult<Self> {
        Ok(Self {
            client: Arc::new(connect(config).await?),
        })
    }
}

#[async_trait]
impl MessageProducer for NatsProducer {
    async fn publish(&self, topic: &str, payload: &str) -> MessagingResult<()> {
        self.client
            .publish(topic.to_string(), payload.to_string().into())
            .await
            .map_err(|e| MessagingError::PublishFailed(format!("NATS publish failed: {}", e)))?;

        Ok(())
    }

    async fn is_connected(&self) -> bool {
        matches!(
            self.client.connection_state(),
            async_nats::connection::State::Connected
        )
    }

    async fn close(&self) -> MessagingResult<()> {
        self.client
            .flush()
            .await
            .map_err(|e| MessagingError::PublishFailed(format!("NATS flush failed: {}", e)))
    }
}

/// NATS consumer
pub struct NatsConsumer {
    client: Arc<Client>,
}

impl NatsConsumer {
    /// Create a new NATS consumer
    pub async fn new(config: &MessagingConfig) -> MessagingResult<Self> {
        Ok(Self {
            client: Arc::new(connect(config).await?),
        })
    }
}

#[async_trait]
impl MessageConsumer for NatsConsumer {
    async fn subscribe(&self, topic: &str) -> MessagingResult<Box<dyn MessageStream>> {
        let subscriber = self
            .client
            .subscribe(topic.to_string())
            .await
            .map_err(|e| MessagingError::SubscribeFailed(format!("NATS subscribe failed: {}", e)))?;

        Ok(Box::new(NatsMessageStream { subscriber }))
    }

    async fn is_connected(&self) -> bool {
        matches!(
            self.client.connection_state(),
            async_nats::connection::State::Connected
        )
    }

    async fn close(&self) -> MessagingResult<()> {
        // subscriptions end when the client is dropped
        Ok(())
    }
}

/// NATS message stream
pub struct NatsMessageStream {
    subscriber: async_nats::Subscriber,
}

#[async_trait]
impl MessageStream for NatsMessageStream {
    async fn next(&mut self) -> MessagingResult<Option<BusMessage>> {
        match self.subscriber.next().await {
            Some(msg) => {
                let payload = String::from_utf8(msg.payload.to_vec())
                    .map_err(|e| MessagingError::InvalidMessage(e.to_string()))?;
                Ok(Some(BusMessage {
                    channel: msg.subject.to_string(),
                    payload,
                }))
            }
            None => Ok(None),
        }
    }
}
