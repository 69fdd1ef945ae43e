// src/dispatch/config.rs
//! Construction-time queue configuration

use crate::dispatch::overflow::OverflowStrategy;
use crate::utils::errors::{DispatchError, Result};
use serde::{Deserialize, Serialize};

/// Queue configuration, fixed for the lifetime of a queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Queue name used in logs and metric labels
    pub name: String,

    /// Maximum number of queued records (>= 1)
    pub max_size: usize,

    /// Records handed out per `process_batch` (>= 1)
    pub max_batch_size: usize,

    /// Priority for records enqueued without a finite one
    pub default_priority: f64,

    /// Interval between batches in `tick` (0 = one batch per tick)
    pub process_interval_ms: u64,

    /// What to do when the queue is full
    pub overflow_strategy: OverflowStrategy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_size: 2048,
            max_batch_size: 64,
            default_priority: 50.0,
            process_interval_ms: 16,
            overflow_strategy: OverflowStrategy::DropLowestPriority,
        }
    }
}

impl QueueConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn with_default_priority(mut self, default_priority: f64) -> Self {
        self.default_priority = default_priority;
        self
    }

    pub fn with_process_interval_ms(mut self, process_interval_ms: u64) -> Self {
        self.process_interval_ms = process_interval_ms;
        self
    }

    pub fn with_overflow_strategy(mut self, strategy: OverflowStrategy) -> Self {
        self.overflow_strategy = strategy;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(DispatchError::ConfigError(
                "max_size must be at least 1".to_string(),
            ));
        }
        if self.max_batch_size == 0 {
            return Err(DispatchError::ConfigError(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        if !self.default_priority.is_finite() {
            return Err(DispatchError::ConfigError(
                "default_priority must be a finite number".to_string(),
            ));
        }
        if self.name.is_empty() {
            return Err(DispatchError::ConfigError(
                "queue name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
