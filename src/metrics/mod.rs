//! Prometheus metrics for the repository and provisioning paths.
//!
//! Messaging and subscriber metrics live next to the bus code in
//! [`crate::messaging::MESSAGING_METRICS`]; both sets are exported by
//! [`gather_metrics`].
//!
//! # Example
//! ```no_run
//! use docsys::metrics::REPOSITORY_OPERATIONS_TOTAL;
//!
//! REPOSITORY_OPERATIONS_TOTAL
//!     .with_label_values(&["document", "create", "ok"])
//!     .inc();
//! ```
use crate::config::ObservabilityConfig;
use lazy_static::lazy_static;
use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use std::time::Instant;

lazy_static! {
    /// Registry for repository metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Repository Metrics
    // ============================================================================

    /// Total number of repository operations
    ///
    /// Labels: entity, operation, outcome
    pub static ref REPOSITORY_OPERATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("repository_operations_total", "Total number of repository operations")
            .namespace("docsys"),
        &["entity", "operation", "outcome"]
    ).expect("Failed to create REPOSITORY_OPERATIONS_TOTAL metric");

    /// Repository operation duration in seconds
    ///
    /// Labels: entity, operation
    pub static ref REPOSITORY_OPERATION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "repository_operation_duration_seconds",
            "Repository operation duration in seconds"
        )
        .namespace("docsys")
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["entity", "operation"]
    ).expect("Failed to create REPOSITORY_OPERATION_DURATION_SECONDS metric");

    // ============================================================================
    // Provisioning Metrics
    // ============================================================================

    /// Outcomes of index provisioning
    ///
    /// Labels: index, outcome (existing, created, already_exists, failed)
    pub static ref INDEX_PROVISION_TOTAL: CounterVec = CounterVec::new(
        Opts::new("index_provision_total", "Outcomes of index provisioning")
            .namespace("docsys"),
        &["index", "outcome"]
    ).expect("Failed to create INDEX_PROVISION_TOTAL metric");

    // ============================================================================
    // Error Metrics
    // ============================================================================

    /// Total number of errors
    ///
    /// Labels: component, error_type
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("errors_total", "Total number of errors")
            .namespace("docsys"),
        &["component", "error_type"]
    ).expect("Failed to create ERRORS_TOTAL metric");
}

/// Register all repository metrics
///
/// Safe to call more than once; collectors that are already registered are kept.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    register(Box::new(REPOSITORY_OPERATIONS_TOTAL.clone()))?;
    register(Box::new(REPOSITORY_OPERATION_DURATION_SECONDS.clone()))?;
    register(Box::new(INDEX_PROVISION_TOTAL.clone()))?;
    register(Box::new(ERRORS_TOTAL.clone()))?;

    crate::messaging::init_messaging_metrics();

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Register the metrics when `prometheus_enabled` is set; returns whether they were
pub fn init_from_config(config: &ObservabilityConfig) -> Result<bool, prometheus::Error> {
    if !config.prometheus_enabled {
        tracing::info!("Prometheus metrics disabled");
        return Ok(false);
    }
    init_metrics()?;
    Ok(true)
}

fn register(collector: Box<dyn prometheus::core::Collector>) -> Result<(), prometheus::Error> {
    match PROMETHEUS_REGISTRY.register(collector) {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Times one repository operation and records its outcome when finished
pub struct OperationTimer {
    entity: &'static str,
    operation: &'static str,
    started: Instant,
}

impl OperationTimer {
    pub fn start(entity: &'static str, operation: &'static str) -> Self {
        Self {
            entity,
            operation,
            started: Instant::now(),
        }
    }

    /// Record the elapsed time and the outcome label
    pub fn finish(self, outcome: &str) {
        REPOSITORY_OPERATION_DURATION_SECONDS
            .with_label_values(&[self.entity, self.operation])
            .observe(self.started.elapsed().as_secs_f64());
        REPOSITORY_OPERATIONS_TOTAL
            .with_label_values(&[self.entity, self.operation, outcome])
            .inc();
        if outcome != "ok" {
            ERRORS_TOTAL.with_label_values(&[self.entity, outcome]).inc();
        }
    }
}

/// Generate Prometheus text format metrics
///
/// Includes the collectors registered in the default registry by the
/// messaging module.
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let mut metric_families = PROMETHEUS_REGISTRY.gather();
    metric_families.extend(prometheus::gather());
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        init_metrics().unwrap();
        // a second registration of the same collectors is not an error
        init_metrics().unwrap();

        REPOSITORY_OPERATIONS_TOTAL
            .with_label_values(&["user", "create", "ok"])
            .inc();
        ERRORS_TOTAL.with_label_values(&["document", "timeout"]).inc();

        let metrics = gather_metrics();
        assert!(metrics.contains("docsys_repository_operations_total"));
        assert!(metrics.contains("docsys_errors_total"));
    }

    #[test]
    fn test_init_respects_prometheus_enabled() {
        let disabled = ObservabilityConfig {
            prometheus_enabled: false,
            ..Default::default()
        };
        assert!(!init_from_config(&disabled).unwrap());

        let enabled = ObservabilityConfig::default();
        assert!(init_from_config(&enabled).unwrap());

        INDEX_PROVISION_TOTAL
            .with_label_values(&["users_19092022", "existing"])
            .inc();
        assert!(gather_metrics().contains("docsys_index_provision_total"));
    }

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::start("document", "get_by_id");
        timer.finish("not_found");

        let value = REPOSITORY_OPERATIONS_TOTAL
            .with_label_values(&["document", "get_by_id", "not_found"])
            .get();
        assert!(value >= 1.0);
    }

    #[test]
    fn test_gather_metrics() {
        init_metrics().unwrap();
        INDEX_PROVISION_TOTAL
            .with_label_values(&["documents_19092022", "created"])
            .inc();

        let metrics = gather_metrics();
        assert!(metrics.contains("docsys_index_provision_total"));
    }
}
