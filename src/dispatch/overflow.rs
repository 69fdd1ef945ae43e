// src/dispatch/overflow.rs
//! Overflow policy for a full queue
//!
//! Runs only when an enqueue finds the queue at `max_size`. The strategy is
//! fixed per queue instance:
//!
//! | Strategy               | New record   | Evicted                       |
//! |------------------------|--------------|-------------------------------|
//! | `throw`                | refused      | none (caller gets an error)   |
//! | `drop-newest`          | rejected     | none                          |
//! | `drop-oldest`          | inserted     | smallest sequence             |
//! | `drop-lowest-priority` | if better    | worst record, only if beaten  |

use crate::dispatch::ordering::{dispatch_order, OrderedBuffer};
use crate::dispatch::record::QueuedEvent;
use crate::utils::errors::DispatchError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Strategy applied when an enqueue hits `max_size`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowStrategy {
    /// Fail the enqueue with `CapacityExceeded`
    Throw,

    /// Reject the incoming record
    #[serde(alias = "drop-new")]
    DropNewest,

    /// Evict the earliest-arrived record, irrespective of priority
    DropOldest,

    /// Evict the worst record if the incoming one beats it
    #[default]
    DropLowestPriority,
}

impl OverflowStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverflowStrategy::Throw => "throw",
            OverflowStrategy::DropNewest => "drop-newest",
            OverflowStrategy::DropOldest => "drop-oldest",
            OverflowStrategy::DropLowestPriority => "drop-lowest-priority",
        }
    }

    /// Apply the strategy to a full buffer.
    pub(crate) fn resolve<T>(
        self,
        buffer: &mut OrderedBuffer<T>,
        incoming: QueuedEvent<T>,
    ) -> OverflowOutcome<T> {
        match self {
            OverflowStrategy::Throw => OverflowOutcome::Refused(incoming),
            OverflowStrategy::DropNewest => OverflowOutcome::Rejected(incoming),
            OverflowStrategy::DropOldest => match buffer.oldest_index() {
                Some(index) => replace(buffer, index, incoming),
                None => admit(buffer, incoming),
            },
            OverflowStrategy::DropLowestPriority => match buffer.worst_index() {
                Some(index) => {
                    let beats_worst = buffer
                        .get(index)
                        .map_or(false, |worst| dispatch_order(&incoming, worst) == Ordering::Less);
                    if beats_worst {
                        replace(buffer, index, incoming)
                    } else {
                        OverflowOutcome::Rejected(incoming)
                    }
                }
                None => admit(buffer, incoming),
            },
        }
    }
}

fn replace<T>(
    buffer: &mut OrderedBuffer<T>,
    index: usize,
    incoming: QueuedEvent<T>,
) -> OverflowOutcome<T> {
    match buffer.remove(index) {
        Some(evicted) => {
            buffer.push(incoming);
            OverflowOutcome::Evicted(evicted)
        }
        None => admit(buffer, incoming),
    }
}

// Only reachable with a zero-capacity buffer, which config validation forbids.
fn admit<T>(buffer: &mut OrderedBuffer<T>, incoming: QueuedEvent<T>) -> OverflowOutcome<T> {
    buffer.push(incoming);
    OverflowOutcome::Admitted
}

impl fmt::Display for OverflowStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverflowStrategy {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "throw" => Ok(OverflowStrategy::Throw),
            "drop-newest" | "drop-new" => Ok(OverflowStrategy::DropNewest),
            "drop-oldest" => Ok(OverflowStrategy::DropOldest),
            "drop-lowest-priority" => Ok(OverflowStrategy::DropLowestPriority),
            other => Err(DispatchError::ConfigError(format!(
                "unknown overflow strategy '{}'",
                other
            ))),
        }
    }
}

/// What the overflow policy did with an incoming record
#[derive(Debug)]
pub(crate) enum OverflowOutcome<T> {
    /// Incoming inserted, this record evicted
    Evicted(QueuedEvent<T>),

    /// Incoming discarded, queue unchanged
    Rejected(QueuedEvent<T>),

    /// Incoming discarded and the caller must see an error
    Refused(QueuedEvent<T>),

    /// Incoming inserted without eviction
    Admitted,
}
