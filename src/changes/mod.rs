//! Change notification: publishing creation events and mirroring the latest one

mod config;
mod notifier;
mod subscriber;

pub use config::SubscriberConfig;
pub use notifier::{ChangeNotifier, NotificationOutcome};
pub use subscriber::{ChangeSubscriber, SubscriberHandle, SubscriberHealth};
