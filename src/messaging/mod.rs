//! Message bus access for change events
//!
//! Creation events travel over a pub/sub topic with at-most-once delivery.
//! Three interchangeable backends sit behind [`MessageProducer`] and
//! [`MessageConsumer`]:
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │         Messaging Service API                    │
//! ├─────────────────────────────────────────────────┤
//! │  - publish()      - subscribe()                  │
//! └─────────────────────────────────────────────────┘
//!                      │
//!        ┌─────────────┼──────────────┐
//!        ▼             ▼              ▼
//! ┌────────────┐ ┌────────────┐ ┌──────────────┐
//! │ Redis      │ │ NATS       │ │ In-memory    │
//! │ pub/sub    │ │ subjects   │ │ broadcast    │
//! └────────────┘ └────────────┘ └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use docsys::messaging::{MessagingConfig, MessagingService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let messaging = MessagingService::new(MessagingConfig::default()).await?;
//!     let mut stream = messaging.subscribe("doc-system").await?;
//!
//!     while let Some(message) = stream.next().await? {
//!         println!("{}: {}", message.channel, message.payload);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod events;
mod memory;
mod metrics;
mod nats;
mod redis;
mod service;
mod traits;

pub use config::{MessagingBackend, MessagingConfig};
pub use error::{MessagingError, MessagingResult};
pub use events::{ChangeEvent, MessageEnvelope, MessageMetadata};
pub use memory::InMemoryBus;
pub use metrics::{init_messaging_metrics, MESSAGING_METRICS};
pub use nats::{NatsConsumer, NatsProducer};
pub use self::redis::{RedisConsumer, RedisProducer};
pub use service::MessagingService;
pub use traits::{BusMessage, MessageConsumer, MessageProducer, MessageStream};
