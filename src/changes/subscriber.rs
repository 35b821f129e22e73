//! Background task mirroring the latest change event into the slot cache

use crate::changes::config::SubscriberConfig;
use crate::messaging::{BusMessage, MessagingError, MessagingService, MESSAGING_METRICS};
use crate::state::{CacheConfig, SlotCache};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Liveness of the subscriber loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriberHealth {
    /// Not subscribed yet
    Starting,
    /// Receiving messages
    Subscribed,
    /// Waiting `backoff_ms` before resubscription attempt `attempt`
    Reconnecting { attempt: u32, backoff_ms: u64 },
    /// The loop has exited
    Stopped,
}

/// Drains a topic and overwrites one cache key with every payload
///
/// Delivery is at-most-once. Messages published while the subscription is
/// down are lost, and the cache only ever holds the most recent payload.
pub struct ChangeSubscriber {
    messaging: Arc<MessagingService>,
    cache: Arc<dyn SlotCache>,
    topic: String,
    cache_key: String,
    ttl: Duration,
    config: SubscriberConfig,
    health: watch::Sender<SubscriberHealth>,
}

impl ChangeSubscriber {
    pub fn new(
        messaging: Arc<MessagingService>,
        cache: Arc<dyn SlotCache>,
        cache_config: &CacheConfig,
        config: SubscriberConfig,
    ) -> Self {
        let (health, _) = watch::channel(SubscriberHealth::Starting);

        Self {
            topic: messaging.topic().to_string(),
            messaging,
            cache,
            cache_key: cache_config.key.clone(),
            ttl: cache_config.ttl(),
            config,
            health,
        }
    }

    pub fn health(&self) -> watch::Receiver<SubscriberHealth> {
        self.health.subscribe()
    }

    /// Run for the lifetime of the process
    pub async fn run(self) {
        self.run_until(std::future::pending()).await
    }

    /// Run until `shutdown` completes
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);
        let mut attempt: u32 = 0;

        info!(topic = %self.topic, cache_key = %self.cache_key, "Change subscriber starting");

        loop {
            let subscribed = tokio::select! {
                _ = &mut shutdown => break,
                subscribed = self.consume() => subscribed,
            };

            if subscribed {
                attempt = 0;
            }
            attempt = attempt.saturating_add(1);

            let backoff = self.config.backoff_for(attempt);
            self.health.send_replace(SubscriberHealth::Reconnecting {
                attempt,
                backoff_ms: backoff.as_millis() as u64,
            });
            MESSAGING_METRICS
                .reconnects
                .with_label_values(&[&self.topic, self.messaging.backend_name()])
                .inc();
            warn!(topic = %self.topic, attempt, backoff_ms = backoff.as_millis() as u64, "Resubscribing after backoff");

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(backoff) => {}
            }
        }

        self.health.send_replace(SubscriberHealth::Stopped);
        info!(topic = %self.topic, "Change subscriber stopped");
    }

    /// Spawn onto the runtime, returning a handle that can stop the loop
    pub fn spawn(self) -> SubscriberHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let health = self.health();

        let task = tokio::spawn(self.run_until(async move {
            let _ = shutdown_rx.await;
        }));

        SubscriberHandle {
            shutdown: shutdown_tx,
            task,
            health,
        }
    }

    /// One subscription session; returns whether the subscription was established
    async fn consume(&self) -> bool {
        let backend = self.messaging.backend_name();

        let mut stream = match self.messaging.subscribe(&self.topic).await {
            Ok(stream) => stream,
            Err(e) => {
                error!(topic = %self.topic, error = %e, "Subscribe failed");
                MESSAGING_METRICS
                    .consume_failures
                    .with_label_values(&[&self.topic, backend, e.kind()])
                    .inc();
                return false;
            }
        };

        self.health.send_replace(SubscriberHealth::Subscribed);
        info!(topic = %self.topic, backend, "Subscribed to change events");

        loop {
            match stream.next().await {
                Ok(Some(message)) => self.mirror(message).await,
                Ok(None) => {
                    warn!(topic = %self.topic, "Subscription ended");
                    return true;
                }
                Err(e) => {
                    MESSAGING_METRICS
                        .consume_failures
                        .with_label_values(&[&self.topic, backend, e.kind()])
                        .inc();
                    if let MessagingError::InvalidMessage(_) = e {
                        // the subscription stays open
                        warn!(topic = %self.topic, error = %e, "Skipping invalid message");
                        continue;
                    }
                    error!(topic = %self.topic, error = %e, "Receive failed");
                    return true;
                }
            }
        }
    }

    async fn mirror(&self, message: BusMessage) {
        MESSAGING_METRICS
            .messages_consumed
            .with_label_values(&[&self.topic, self.messaging.backend_name()])
            .inc();

        info!(channel = %message.channel, payload = %message.payload, "Change event received");

        if let Err(e) = self
            .cache
            .set(&self.cache_key, &message.payload, self.ttl)
            .await
        {
            error!(cache_key = %self.cache_key, error = %e, "Failed to mirror change event");
        }
    }
}

/// Handle to a spawned [`ChangeSubscriber`]
pub struct SubscriberHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
    health: watch::Receiver<SubscriberHealth>,
}

impl SubscriberHandle {
    pub fn health(&self) -> watch::Receiver<SubscriberHealth> {
        self.health.clone()
    }

    /// Stop the loop and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            warn!(error = %e, "Change subscriber task ended abnormally");
        }
    }
}
