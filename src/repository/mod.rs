//! Document and user repositories over the search engine
//!
//! Every operation runs under the configured request deadline. Writes
//! provision the target index first; reads against a missing index behave
//! as reads against an empty one.

mod document;
mod error;
mod index;
mod user;

pub use document::DocumentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use index::IndexRepository;
pub use user::UserRepository;

use crate::changes::{ChangeNotifier, NotificationOutcome};
use crate::config::Config;
use crate::error::Result;
use crate::messaging::MessagingService;
use crate::search::{ElasticEngine, SearchConfig, SearchEngine};
use std::sync::Arc;

/// Result of a successful create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    /// Id assigned to the new record
    pub id: String,
    /// Fate of the creation event
    pub notification: NotificationOutcome,
}

/// Both repositories sharing one engine and one notifier
#[derive(Clone)]
pub struct Repositories {
    pub documents: DocumentRepository,
    pub users: UserRepository,
}

impl Repositories {
    pub fn new(engine: Arc<dyn SearchEngine>, config: &SearchConfig, notifier: ChangeNotifier) -> Self {
        Self {
            documents: DocumentRepository::new(engine.clone(), config, notifier.clone()),
            users: UserRepository::new(engine, config, notifier),
        }
    }

    /// Connect to the configured engine, publishing through `messaging` when given
    pub async fn connect(config: &Config, messaging: Option<Arc<MessagingService>>) -> Result<Self> {
        let engine = ElasticEngine::connect(&config.search).await?;
        let notifier = match messaging {
            Some(messaging) => ChangeNotifier::new(messaging),
            None => ChangeNotifier::disabled(),
        };

        Ok(Self::new(Arc::new(engine), &config.search, notifier))
    }
}
