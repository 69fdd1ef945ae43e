// src/dispatch/ordering.rs
//! Lazily sorted record buffer
//!
//! Records are ordered by priority ascending, then by sequence ascending, so
//! equal priorities dispatch in arrival order. Inserts only mark the buffer
//! dirty; the stable sort runs once right before an order-dependent read.
//!
//! ```text
//! enqueue ─► push (dirty = true) ─► ... ─► ensure_sorted ─► pop_front
//!                                           (sort once, dirty = false)
//! ```

use crate::dispatch::record::QueuedEvent;
use std::cmp::Ordering;
use std::collections::VecDeque;
use tracing::trace;

/// Dispatch order: lower priority number first, then earlier sequence.
pub fn dispatch_order<T>(a: &QueuedEvent<T>, b: &QueuedEvent<T>) -> Ordering {
    a.priority()
        .total_cmp(&b.priority())
        .then_with(|| a.sequence().cmp(&b.sequence()))
}

/// Backing collection of the queue
#[derive(Debug)]
pub(crate) struct OrderedBuffer<T> {
    /// Records, sorted only when `dirty` is false
    records: VecDeque<QueuedEvent<T>>,

    /// Set on insertion, cleared by a sort
    dirty: bool,
}

impl<T> OrderedBuffer<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            dirty: false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Append a record and invalidate the sort order.
    pub(crate) fn push(&mut self, record: QueuedEvent<T>) {
        self.records.push_back(record);
        self.dirty = true;
    }

    /// Sort if any insertion happened since the last sort.
    pub(crate) fn ensure_sorted(&mut self) {
        if !self.dirty {
            return;
        }
        trace!(len = self.records.len(), "Sorting dispatch buffer");
        // slice::sort_by is stable
        self.records.make_contiguous().sort_by(dispatch_order);
        self.dirty = false;
    }

    /// Highest-priority record
    pub(crate) fn front(&mut self) -> Option<&QueuedEvent<T>> {
        self.ensure_sorted();
        self.records.front()
    }

    /// Remove the highest-priority record
    pub(crate) fn pop_front(&mut self) -> Option<QueuedEvent<T>> {
        self.ensure_sorted();
        self.records.pop_front()
    }

    /// Index of the record that arrived first, irrespective of priority
    pub(crate) fn oldest_index(&self) -> Option<usize> {
        self.records
            .iter()
            .enumerate()
            .min_by_key(|(_, record)| record.sequence())
            .map(|(index, _)| index)
    }

    /// Index of the record that would dispatch last
    pub(crate) fn worst_index(&self) -> Option<usize> {
        if self.records.is_empty() {
            return None;
        }
        if !self.dirty {
            return Some(self.records.len() - 1);
        }
        self.records
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| dispatch_order(*a, *b))
            .map(|(index, _)| index)
    }

    pub(crate) fn get(&self, index: usize) -> Option<&QueuedEvent<T>> {
        self.records.get(index)
    }

    /// Remove by index. Removal keeps a sorted buffer sorted.
    pub(crate) fn remove(&mut self, index: usize) -> Option<QueuedEvent<T>> {
        self.records.remove(index)
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
        self.dirty = false;
    }

    /// Records in current backing order (not necessarily sorted)
    pub(crate) fn iter(&self) -> impl Iterator<Item = &QueuedEvent<T>> {
        self.records.iter()
    }
}
