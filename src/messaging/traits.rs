//! Messaging trait abstractions

use crate::messaging::error::MessagingResult;
use async_trait::async_trait;

/// A message as delivered by the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    /// Topic (channel or subject) the message arrived on
    pub channel: String,
    /// Raw payload text
    pub payload: String,
}

/// Message producer trait
#[async_trait]
pub trait MessageProducer: Send + Sync {
    /// Publish a raw payload to a topic
    async fn publish(&self, topic: &str, payload: &str) -> MessagingResult<()>;

    /// Check if the producer is connected
    async fn is_connected(&self) -> bool;

    /// Close the producer connection
    async fn close(&self) -> MessagingResult<()>;
}

/// Message consumer trait
#[async_trait]
pub trait MessageConsumer: Send + Sync {
    /// Subscribe to a topic; messages published before this returns are not seen
    async fn subscribe(&self, topic: &str) -> MessagingResult<Box<dyn MessageStream>>;

    /// Check if the consumer is connected
    async fn is_connected(&self) -> bool;

    /// Close the consumer connection
    async fn close(&self) -> MessagingResult<()>;
}

/// An open subscription
///
/// Delivery is at-most-once: there is no acknowledgement and nothing is
/// replayed after a reconnect.
#[async_trait]
pub trait MessageStream: Send {
    /// Next message, or `None` once the subscription has ended
    async fn next(&mut self) -> MessagingResult<Option<BusMessage>>;
}
