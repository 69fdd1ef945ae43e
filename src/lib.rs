// src/lib.rs
//! Tick Dispatch Library
//!
//! A priority-aware, bounded event queue for single-threaded fixed-tick
//! loops (games, simulations, UI frames). Producers enqueue during a frame;
//! the loop drains a bounded amount of work per tick, highest priority first,
//! with a configurable policy for what to shed when the queue is full.
//!
//! # Architecture
//!
//! The crate is structured into several key modules:
//!
//! - **dispatch**: the queue, records, ordering, overflow and counters
//! - **runtime**: fixed-rate host loop driving a queue with tokio
//! - **observability**: tracing subscriber and Prometheus exporter setup
//! - **utils**: error types and layered application configuration
//!
//! # Example
//!
//! ```
//! use tick_dispatch::{DispatchQueue, QueueConfig};
//!
//! let mut queue = DispatchQueue::new(QueueConfig::default()).unwrap();
//! queue.enqueue("low", "l", 75).unwrap();
//! queue.enqueue("high", "h", 10).unwrap();
//!
//! let mut order = Vec::new();
//! queue.drain(|event| order.push(event.into_data()));
//! assert_eq!(order, vec!["h", "l"]);
//! ```

// Public module exports
pub mod dispatch;
pub mod observability;
pub mod runtime;
pub mod utils;

// Re-export commonly used types
pub use dispatch::{
    DispatchQueue, EnqueueOptions, Metadata, MetricsSnapshot, OverflowStrategy, QueueConfig,
    QueuedEvent,
};
pub use runtime::{HostConfig, TickLoop, TickLoopReport};
pub use utils::config::DispatchConfig;
pub use utils::errors::{BoxError, DispatchError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_HASH: &str = env!("GIT_HASH");

/// Crate build information
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_timestamp: &'static str,
    pub rustc_version: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: VERSION,
            git_hash: GIT_HASH,
            build_timestamp: env!("BUILD_TIMESTAMP"),
            rustc_version: env!("RUSTC_VERSION"),
        }
    }
}
