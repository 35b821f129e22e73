//! Redis pub/sub message bus implementation

use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::traits::{BusMessage, MessageConsumer, MessageProducer, MessageStream};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use redis::aio::ConnectionManager;
use redis::Client;
use std::pin::Pin;
use tracing::warn;

/// Publishes over a shared, auto-reconnecting connection
pub struct RedisProducer {
    connection: ConnectionManager,
}

impl RedisProducer {
    pub async fn new(url: &str) -> MessagingResult<Self> {
        let client = Client::open(url).map_err(|e| {
            MessagingError::ConfigurationError(format!("Invalid Redis URL {}: {}", url, e))
        })?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| MessagingError::ConnectionFailed(format!("Redis connection failed: {}", e)))?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl MessageProducer for RedisProducer {
    async fn publish(&self, topic: &str, payload: &str) -> MessagingResult<()> {
        let mut conn = self.connection.clone();
        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(topic)
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| MessagingError::PublishFailed(format!("Redis publish failed: {}", e)))?;

        if receivers == 0 {
            warn!(topic = %topic, "Published with no subscribers listening");
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        let mut conn = self.connection.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .is_ok()
    }

    async fn close(&self) -> MessagingResult<()> {
        Ok(())
    }
}

/// Opens a dedicated pub/sub connection per subscription
pub struct RedisConsumer {
    client: Client,
}

impl RedisConsumer {
    pub fn new(url: &str) -> MessagingResult<Self> {
        let client = Client::open(url).map_err(|e| {
            MessagingError::ConfigurationError(format!("Invalid Redis URL {}: {}", url, e))
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MessageConsumer for RedisConsumer {
    async fn subscribe(&self, topic: &str) -> MessagingResult<Box<dyn MessageStream>> {
        let conn = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| MessagingError::ConnectionFailed(format!("Redis connection failed: {}", e)))?;

        let mut pubsub = conn.into_pubsub();
        pubsub
            .subscribe(topic)
            .await
            .map_err(|e| MessagingError::SubscribeFailed(format!("Redis subscribe failed: {}", e)))?;

        Ok(Box::new(RedisMessageStream {
            messages: Box::pin(pubsub.into_on_message()),
        }))
    }

    async fn is_connected(&self) -> bool {
        match self.client.get_async_connection().await {
            Ok(mut conn) => redis::cmd("PING")
                .query_async::<_, String>(&mut conn)
                .await
                .is_ok(),
            Err(_) => false,
        }
    }

    async fn close(&self) -> MessagingResult<()> {
        Ok(())
    }
}

/// Redis pub/sub message stream
pub struct RedisMessageStream {
    messages: Pin<Box<dyn Stream<Item = redis::Msg> + Send>>,
}

#[async_trait]
impl MessageStream for RedisMessageStream {
    async fn next(&mut self) -> MessagingResult<Option<BusMessage>> {
        let Some(msg) = self.messages.next().await else {
            return Ok(None);
        };

        let payload: String = msg
            .get_payload()
            .map_err(|e| MessagingError::InvalidMessage(e.to_string()))?;

        Ok(Some(BusMessage {
            channel: msg.get_channel_name().to_string(),
            payload,
        }))
    }
}
