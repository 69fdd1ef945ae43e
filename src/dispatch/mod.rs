// src/dispatch/mod.rs
//! Priority-aware event dispatch
//!
//! This module provides the bounded queue that sits between event producers
//! and a fixed-tick consumer:
//!
//! - **Queue**: `DispatchQueue`, enqueue plus the four draining modes
//! - **Record**: immutable `QueuedEvent` and per-enqueue `EnqueueOptions`
//! - **Ordering**: lazily sorted buffer (priority, then arrival)
//! - **Overflow**: the four strategies for a full queue
//! - **Metrics**: local counters mirrored to the `metrics` facade
//! - **Config**: construction-time `QueueConfig`
//!
//! # Architecture
//!
//! ```text
//! Producers → enqueue() → validate → sequence → capacity check
//!                                                   │
//!                              full? ──► OverflowStrategy
//!                                                   │
//!                                         OrderedBuffer (dirty)
//!                                                   │
//! Host loop → tick(delta) / process_batch / flush / drain
//!                                                   │
//!                                    sort once → pop → processor
//! ```

pub mod config;
pub mod metrics;
pub mod ordering;
pub mod overflow;
pub mod queue;
pub mod record;

// Re-export commonly used types
pub use config::QueueConfig;
pub use metrics::MetricsSnapshot;
pub use ordering::dispatch_order;
pub use overflow::OverflowStrategy;
pub use queue::DispatchQueue;
pub use record::{EnqueueOptions, Metadata, QueuedEvent};
