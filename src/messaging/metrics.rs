//! Prometheus metrics for messaging

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

/// Messaging metrics
pub struct MessagingMetrics {
    /// Messages published counter
    pub messages_published: CounterVec,

    /// Messages consumed counter
    pub messages_consumed: CounterVec,

    /// Message publish failures
    pub publish_failures: CounterVec,

    /// Subscription failures seen by the change subscriber
    pub consume_failures: CounterVec,

    /// Resubscriptions performed by the change subscriber
    pub reconnects: CounterVec,

    /// Message publish latency
    pub publish_latency: HistogramVec,
}

lazy_static! {
    pub static ref MESSAGING_METRICS: MessagingMetrics = MessagingMetrics {
        messages_published: register_counter_vec!(
            "docsys_messaging_messages_published_total",
            "Total number of messages published",
            &["topic", "backend"]
        )
        .expect("Failed to register messages_published metric"),

        messages_consumed: register_counter_vec!(
            "docsys_messaging_messages_consumed_total",
            "Total number of messages consumed",
            &["topic", "backend"]
        )
        .expect("Failed to register messages_consumed metric"),

        publish_failures: register_counter_vec!(
            "docsys_messaging_publish_failures_total",
            "Total number of publish failures",
            &["topic", "backend", "error"]
        )
        .expect("Failed to register publish_failures metric"),

        consume_failures: register_counter_vec!(
            "docsys_messaging_consume_failures_total",
            "Total number of consume failures",
            &["topic", "backend", "error"]
        )
        .expect("Failed to register consume_failures metric"),

        reconnects: register_counter_vec!(
            "docsys_subscriber_reconnects_total",
            "Total number of subscriber resubscriptions",
            &["topic", "backend"]
        )
        .expect("Failed to register reconnects metric"),

        publish_latency: register_histogram_vec!(
            "docsys_messaging_publish_latency_seconds",
            "Message publish latency in seconds",
            &["topic", "backend"]
        )
        .expect("Failed to register publish_latency metric"),
    };
}

/// Initialize messaging metrics
pub fn init_messaging_metrics() {
    lazy_static::initialize(&MESSAGING_METRICS);
}
