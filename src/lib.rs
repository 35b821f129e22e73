//! Document and user repositories over an Elasticsearch-compatible engine,
//! with creation events published to a message bus and the latest one
//! mirrored into a single-slot cache.
//!
//! # Example
//!
//! ```no_run
//! use docsys::changes::ChangeSubscriber;
//! use docsys::config::Config;
//! use docsys::messaging::MessagingService;
//! use docsys::models::NewDocument;
//! use docsys::repository::Repositories;
//! use docsys::state::create_slot_cache;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     docsys::telemetry::init_tracing(&config.observability)?;
//!     docsys::metrics::init_from_config(&config.observability)?;
//!
//!     let messaging = Arc::new(MessagingService::new(config.messaging.clone()).await?);
//!     let cache = create_slot_cache(&config.cache).await?;
//!     let subscriber = ChangeSubscriber::new(
//!         messaging.clone(),
//!         cache,
//!         &config.cache,
//!         config.subscriber.clone(),
//!     )
//!     .spawn();
//!
//!     let repositories = Repositories::connect(&config, Some(messaging)).await?;
//!     let created = repositories
//!         .documents
//!         .create(NewDocument { name: "a.txt".into(), ..Default::default() }, None)
//!         .await?;
//!     println!("created {}", created.id);
//!
//!     subscriber.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod changes;
pub mod config;
pub mod error;
pub mod messaging;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod search;
pub mod state;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
