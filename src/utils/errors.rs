// src/utils/errors.rs
//! Error types for the dispatch queue
//!
//! Two families of failure exist:
//!
//! - **Programmer errors** (`InvalidArgument`, `ConfigError`): raised before
//!   any queue state is touched and never recovered internally.
//! - **Runtime conditions** (`CapacityExceeded`, `ProcessorFailed`): surfaced
//!   only where the configured policy or a fallible processor asks for it.

use thiserror::Error;

/// Boxed error returned by a fallible processor
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dispatch error type
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Caller passed an argument the queue cannot accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Queue full under the `throw` overflow strategy
    #[error("Queue capacity exceeded (max_size = {max_size})")]
    CapacityExceeded { max_size: usize },

    /// Processor returned an error part-way through a batch
    #[error("Processor failed after {processed} event(s): {source}")]
    ProcessorFailed {
        /// Events successfully processed before the failure
        processed: usize,
        #[source]
        source: BoxError,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Observability error: {0}")]
    ObservabilityError(String),
}

impl DispatchError {
    /// Whether this error indicates a caller bug rather than a runtime condition
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            DispatchError::InvalidArgument(_) | DispatchError::ConfigError(_)
        )
    }
}

impl From<::config::ConfigError> for DispatchError {
    fn from(err: ::config::ConfigError) -> Self {
        DispatchError::ConfigError(err.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DispatchError::CapacityExceeded { max_size: 4 };
        assert_eq!(err.to_string(), "Queue capacity exceeded (max_size = 4)");

        let err = DispatchError::InvalidArgument("event type must not be empty".to_string());
        assert!(err.to_string().contains("event type"));
    }

    #[test]
    fn test_processor_failed_source() {
        use std::error::Error as _;

        let err = DispatchError::ProcessorFailed {
            processed: 3,
            source: "boom".into(),
        };
        assert!(err.to_string().contains("after 3 event(s)"));
        assert_eq!(err.source().map(|s| s.to_string()), Some("boom".to_string()));
    }

    #[test]
    fn test_programmer_error_classification() {
        assert!(DispatchError::InvalidArgument("x".into()).is_programmer_error());
        assert!(!DispatchError::CapacityExceeded { max_size: 1 }.is_programmer_error());
    }
}
