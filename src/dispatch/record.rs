// src/dispatch/record.rs
//! Event records and enqueue options
//!
//! A [`QueuedEvent`] is built once by the queue and never mutated afterwards:
//! its fields are private and only exposed through getters. Ownership of the
//! payload moves back out with [`QueuedEvent::into_data`] or
//! [`QueuedEvent::into_parts`] once the record has been dispatched.

use crate::utils::errors::{DispatchError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque metadata attached to an event
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Optional per-event settings passed to `enqueue`
///
/// Bare numbers convert into options carrying only a priority, so
/// `queue.enqueue("hit", payload, 10)` works as a shortcut.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnqueueOptions {
    /// Dispatch priority (lower = earlier). Non-finite values fall back to the default.
    pub priority: Option<f64>,

    /// Metadata copied into the record
    pub metadata: Option<Metadata>,

    /// Caller-supplied timestamp (wall clock used when absent)
    pub timestamp: Option<DateTime<Utc>>,
}

impl EnqueueOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

impl From<f64> for EnqueueOptions {
    fn from(priority: f64) -> Self {
        Self::default().with_priority(priority)
    }
}

impl From<i32> for EnqueueOptions {
    fn from(priority: i32) -> Self {
        Self::default().with_priority(f64::from(priority))
    }
}

impl From<Option<f64>> for EnqueueOptions {
    fn from(priority: Option<f64>) -> Self {
        Self {
            priority,
            ..Default::default()
        }
    }
}

/// Immutable event record held by the queue
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedEvent<T> {
    event_type: String,
    data: T,
    priority: f64,
    sequence: u64,
    timestamp: DateTime<Utc>,
    metadata: Option<Metadata>,
}

impl<T> QueuedEvent<T> {
    /// Freeze a new record.
    ///
    /// `priority` must already be resolved; see [`resolve_priority`].
    pub(crate) fn new(
        event_type: String,
        data: T,
        priority: f64,
        sequence: u64,
        options: EnqueueOptions,
    ) -> Self {
        Self {
            event_type,
            data,
            priority,
            sequence,
            timestamp: options.timestamp.unwrap_or_else(Utc::now),
            metadata: options.metadata,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn priority(&self) -> f64 {
        self.priority
    }

    /// Queue-assigned tie-breaker, strictly increasing per queue instance
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Take back ownership of the payload
    pub fn into_data(self) -> T {
        self.data
    }

    /// Split into `(event_type, payload, metadata)`
    pub fn into_parts(self) -> (String, T, Option<Metadata>) {
        (self.event_type, self.data, self.metadata)
    }
}

/// Check the event type before any queue state is touched.
pub(crate) fn validate_event_type(event_type: &str) -> Result<()> {
    if event_type.is_empty() {
        return Err(DispatchError::InvalidArgument(
            "event type must be a non-empty string".to_string(),
        ));
    }
    Ok(())
}

/// Resolve the effective priority of a record.
///
/// Absent or non-finite priorities fall back to `default_priority`.
/// Negative zero is folded into zero so the comparator sees one value.
pub(crate) fn resolve_priority(requested: Option<f64>, default_priority: f64) -> f64 {
    let priority = match requested {
        Some(p) if p.is_finite() => p,
        _ => default_priority,
    };
    priority + 0.0
}
