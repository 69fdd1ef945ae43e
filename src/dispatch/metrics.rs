// src/dispatch/metrics.rs
//! Queue counters
//!
//! Each queue owns plain counters (single-threaded, no atomics needed) and
//! mirrors every increment to the `metrics` facade, labelled by queue name.
//! Handles are registered when the queue is built, so install the exporter
//! (`observability::init_metrics`) before creating queues. Without a recorder
//! the handles are no-ops.

use metrics::{counter, gauge, Counter, Gauge};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const METRIC_ENQUEUED: &str = "tick_dispatch_events_enqueued_total";
pub const METRIC_PROCESSED: &str = "tick_dispatch_events_processed_total";
pub const METRIC_DROPPED: &str = "tick_dispatch_events_dropped_total";
pub const METRIC_OVERFLOW: &str = "tick_dispatch_overflow_events_total";
pub const METRIC_QUEUE_LENGTH: &str = "tick_dispatch_queue_length";

/// Point-in-time view of a queue's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Records created by `enqueue`, retained or not
    pub enqueued: u64,

    /// Records handed to a processor that returned normally
    pub processed: u64,

    /// Records evicted or rejected
    pub dropped: u64,

    /// Overflow resolutions (one per eviction or rejection)
    pub overflow_events: u64,

    /// Queue length when the snapshot was taken
    pub length: usize,
}

impl MetricsSnapshot {
    /// Percentage of enqueued records that were dropped
    pub fn drop_rate(&self) -> f64 {
        if self.enqueued == 0 {
            0.0
        } else {
            (self.dropped as f64 / self.enqueued as f64) * 100.0
        }
    }

    /// Queue fill as a percentage of `max_size`
    pub fn fill_percentage(&self, max_size: usize) -> f64 {
        if max_size == 0 {
            0.0
        } else {
            (self.length as f64 / max_size as f64) * 100.0
        }
    }
}

/// Counter state owned by a queue
///
/// Exported handles are resolved once against the recorder installed at
/// construction time.
#[derive(Clone)]
pub(crate) struct MetricsCollector {
    enqueued: u64,
    processed: u64,
    dropped: u64,
    overflow_events: u64,
    enqueued_total: Counter,
    processed_total: Counter,
    dropped_total: Counter,
    overflow_total: Counter,
    queue_length: Gauge,
}

impl MetricsCollector {
    pub(crate) fn new(queue: impl Into<String>) -> Self {
        let queue: String = queue.into();
        Self {
            enqueued: 0,
            processed: 0,
            dropped: 0,
            overflow_events: 0,
            enqueued_total: counter!(METRIC_ENQUEUED, "queue" => queue.clone()),
            processed_total: counter!(METRIC_PROCESSED, "queue" => queue.clone()),
            dropped_total: counter!(METRIC_DROPPED, "queue" => queue.clone()),
            overflow_total: counter!(METRIC_OVERFLOW, "queue" => queue.clone()),
            queue_length: gauge!(METRIC_QUEUE_LENGTH, "queue" => queue),
        }
    }

    pub(crate) fn record_enqueued(&mut self) {
        self.enqueued += 1;
        self.enqueued_total.increment(1);
    }

    pub(crate) fn record_processed(&mut self) {
        self.processed += 1;
        self.processed_total.increment(1);
    }

    /// One eviction or rejection: counts as both an overflow and a drop.
    pub(crate) fn record_overflow(&mut self) {
        self.overflow_events += 1;
        self.dropped += 1;
        self.overflow_total.increment(1);
        self.dropped_total.increment(1);
    }

    pub(crate) fn observe_length(&self, length: usize) {
        self.queue_length.set(length as f64);
    }

    /// Zero local counters. Exported counters stay monotonic.
    pub(crate) fn reset(&mut self) {
        self.enqueued = 0;
        self.processed = 0;
        self.dropped = 0;
        self.overflow_events = 0;
    }

    pub(crate) fn snapshot(&self, length: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.enqueued,
            processed: self.processed,
            dropped: self.dropped,
            overflow_events: self.overflow_events,
            length,
        }
    }
}

impl fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("enqueued", &self.enqueued)
            .field("processed", &self.processed)
            .field("dropped", &self.dropped)
            .field("overflow_events", &self.overflow_events)
            .finish_non_exhaustive()
    }
}
