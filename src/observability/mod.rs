// src/observability/mod.rs
//! Logging and metrics export
//!
//! - **Tracing**: `tracing-subscriber` fmt output, plain or JSON, filtered by
//!   `RUST_LOG` or the configured level
//! - **Metrics**: optional Prometheus scrape endpoint for the queue counters

use crate::dispatch::metrics::{
    METRIC_DROPPED, METRIC_ENQUEUED, METRIC_OVERFLOW, METRIC_PROCESSED, METRIC_QUEUE_LENGTH,
};
use crate::utils::errors::{DispatchError, Result};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Address of the installed Prometheus listener, set once per process
static METRICS_LISTENER: OnceCell<SocketAddr> = OnceCell::new();

/// Observability configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub log_level: String,

    /// Emit JSON log lines
    pub json: bool,

    /// Prometheus listen address (e.g. "127.0.0.1:9000"); disabled when unset
    pub metrics_addr: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            metrics_addr: None,
        }
    }
}

impl ObservabilityConfig {
    pub fn validate(&self) -> Result<()> {
        if self.log_level.trim().is_empty() {
            return Err(DispatchError::ConfigError(
                "log_level must not be empty".to_string(),
            ));
        }
        self.metrics_socket()?;
        Ok(())
    }

    fn metrics_socket(&self) -> Result<Option<SocketAddr>> {
        self.metrics_addr
            .as_deref()
            .map(|addr| {
                addr.parse::<SocketAddr>().map_err(|e| {
                    DispatchError::ConfigError(format!("invalid metrics_addr '{}': {}", addr, e))
                })
            })
            .transpose()
    }
}

/// Install the global tracing subscriber
pub fn init_tracing(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| DispatchError::ObservabilityError(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json {
        registry.with(fmt::layer().json().with_target(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };

    installed.map_err(|e| DispatchError::ObservabilityError(e.to_string()))
}

/// Start the Prometheus exporter if configured, then describe queue metrics.
///
/// Descriptions go to the recorder that is current when they are issued, so
/// they follow the install. Safe to call more than once; only the first
/// listener is installed.
pub fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    let addr = match config.metrics_socket()? {
        Some(addr) => addr,
        None => return Ok(()),
    };

    METRICS_LISTENER
        .get_or_try_init(|| {
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()
                .map_err(|e| DispatchError::ObservabilityError(e.to_string()))?;
            describe_metrics();
            info!(%addr, "Prometheus exporter listening");
            Ok::<_, DispatchError>(addr)
        })
        .map(|_| ())
}

/// Register help text for every queue metric with the current recorder
pub(crate) fn describe_metrics() {
    describe_counter!(METRIC_ENQUEUED, "Events passed to enqueue, retained or not");
    describe_counter!(METRIC_PROCESSED, "Events handed to a processor that returned normally");
    describe_counter!(METRIC_DROPPED, "Events evicted or rejected on overflow");
    describe_counter!(METRIC_OVERFLOW, "Overflow resolutions");
    describe_gauge!(METRIC_QUEUE_LENGTH, "Current queue length");
}

/// Address of the running Prometheus exporter, if any
pub fn metrics_listener() -> Option<SocketAddr> {
    METRICS_LISTENER.get().copied()
}
