//! Process-local message bus over tokio broadcast channels

use crate::messaging::error::MessagingResult;
use crate::messaging::traits::{BusMessage, MessageConsumer, MessageProducer, MessageStream};
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::warn;

/// Both producer and consumer for a single process
///
/// Messages published while nobody is subscribed are dropped, as they are on
/// a real pub/sub bus.
pub struct InMemoryBus {
    topics: DashMap<String, broadcast::Sender<BusMessage>>,
    capacity: usize,
}

impl InMemoryBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<BusMessage> {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Number of live subscriptions on a topic
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Drop a topic, ending every open subscription on it
    pub fn disconnect(&self, topic: &str) {
        self.topics.remove(topic);
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl MessageProducer for InMemoryBus {
    async fn publish(&self, topic: &str, payload: &str) -> MessagingResult<()> {
        let message = BusMessage {
            channel: topic.to_string(),
            payload: payload.to_string(),
        };
        if self.sender(topic).send(message).is_err() {
            warn!(topic = %topic, "Published with no subscribers listening");
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        true
    }

    async fn close(&self) -> MessagingResult<()> {
        self.topics.clear();
        Ok(())
    }
}

#[async_trait]
impl MessageConsumer for InMemoryBus {
    async fn subscribe(&self, topic: &str) -> MessagingResult<Box<dyn MessageStream>> {
        Ok(Box::new(InMemoryStream {
            receiver: self.sender(topic).subscribe(),
        }))
    }

    async fn is_connected(&self) -> bool {
        true
    }

    async fn close(&self) -> MessagingResult<()> {
        self.topics.clear();
        Ok(())
    }
}

struct InMemoryStream {
    receiver: broadcast::Receiver<BusMessage>,
}

#[async_trait]
impl MessageStream for InMemoryStream {
    async fn next(&mut self) -> MessagingResult<Option<BusMessage>> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Ok(Some(message)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscriber lagged; messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        }
    }
}
