// src/dispatch/queue.rs
//! Priority-aware bounded dispatch queue
//!
//! Producers enqueue events during a frame; the host loop hands them to a
//! processor in priority order through one of four draining modes:
//!
//! - `process_batch`: up to `max_batch_size` records
//! - `flush`: up to an explicit limit (defaults to `max_batch_size`)
//! - `drain`: everything currently queued
//! - `tick`: one batch per elapsed `process_interval_ms`
//!
//! # Failing processors
//!
//! Records are removed one at a time, right before their processor call.
//! The `processed` counter only counts calls that returned normally. When a
//! `try_*` processor returns an error, dispatch stops, the failing record is
//! gone (it was moved into the processor), everything not yet handed out stays
//! queued in order, and the error is returned as `ProcessorFailed`. A panicking
//! processor unwinds with the same guarantees.

use crate::dispatch::config::QueueConfig;
use crate::dispatch::metrics::{MetricsCollector, MetricsSnapshot};
use crate::dispatch::ordering::OrderedBuffer;
use crate::dispatch::overflow::OverflowOutcome;
use crate::dispatch::record::{resolve_priority, validate_event_type, EnqueueOptions, QueuedEvent};
use crate::utils::errors::{BoxError, DispatchError, Result};
use std::convert::Infallible;
use tracing::{debug, info, trace, warn};
use ulid::Ulid;

/// Records dispatched before a processor error, plus the error
type DispatchFailure<E> = (usize, E);

/// Bounded priority queue drained by a host loop
#[derive(Debug)]
pub struct DispatchQueue<T> {
    /// Instance id used in logs
    id: Ulid,

    config: QueueConfig,

    buffer: OrderedBuffer<T>,

    /// Next sequence number to assign; never reset
    next_sequence: u64,

    /// Unconsumed elapsed time for `tick` (milliseconds)
    tick_accumulator_ms: f64,

    metrics: MetricsCollector,
}

impl<T> DispatchQueue<T> {
    /// Create a new queue
    pub fn new(config: QueueConfig) -> Result<Self> {
        config.validate()?;

        let id = Ulid::new();
        info!(
            queue = %config.name,
            queue_id = %id,
            max_size = config.max_size,
            max_batch_size = config.max_batch_size,
            process_interval_ms = config.process_interval_ms,
            overflow_strategy = %config.overflow_strategy,
            "Dispatch queue created"
        );

        Ok(Self::build(id, config))
    }

    fn build(id: Ulid, config: QueueConfig) -> Self {
        Self {
            id,
            buffer: OrderedBuffer::with_capacity(config.max_size.min(4096)),
            next_sequence: 0,
            tick_accumulator_ms: 0.0,
            metrics: MetricsCollector::new(config.name.clone()),
            config,
        }
    }

    /// Enqueue an event.
    ///
    /// Returns whether the new record was retained. An empty event type is
    /// rejected before any state changes. With the `throw` strategy a full
    /// queue yields `CapacityExceeded`.
    pub fn enqueue(
        &mut self,
        event_type: impl Into<String>,
        payload: T,
        options: impl Into<EnqueueOptions>,
    ) -> Result<bool> {
        let event_type = event_type.into();
        validate_event_type(&event_type)?;

        let options = options.into();
        let priority = resolve_priority(options.priority, self.config.default_priority);
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let record = QueuedEvent::new(event_type, payload, priority, sequence, options);
        self.metrics.record_enqueued();

        if self.buffer.len() < self.config.max_size {
            trace!(
                queue = %self.config.name,
                event_type = record.event_type(),
                priority,
                sequence,
                "Event enqueued"
            );
            self.buffer.push(record);
            self.metrics.observe_length(self.buffer.len());
            return Ok(true);
        }

        let strategy = self.config.overflow_strategy;
        match strategy.resolve(&mut self.buffer, record) {
            OverflowOutcome::Evicted(evicted) => {
                self.metrics.record_overflow();
                debug!(
                    queue = %self.config.name,
                    strategy = %strategy,
                    evicted_type = evicted.event_type(),
                    evicted_priority = evicted.priority(),
                    evicted_sequence = evicted.sequence(),
                    sequence,
                    "Queue full, evicted record"
                );
                Ok(true)
            }
            OverflowOutcome::Rejected(rejected) => {
                self.metrics.record_overflow();
                debug!(
                    queue = %self.config.name,
                    strategy = %strategy,
                    event_type = rejected.event_type(),
                    priority = rejected.priority(),
                    sequence,
                    "Queue full, rejected incoming record"
                );
                Ok(false)
            }
            OverflowOutcome::Refused(refused) => {
                self.metrics.record_overflow();
                warn!(
                    queue = %self.config.name,
                    event_type = refused.event_type(),
                    sequence,
                    max_size = self.config.max_size,
                    "Queue capacity exceeded"
                );
                Err(DispatchError::CapacityExceeded {
                    max_size: self.config.max_size,
                })
            }
            OverflowOutcome::Admitted => {
                self.metrics.observe_length(self.buffer.len());
                Ok(true)
            }
        }
    }

    /// Process up to `max_events` records (default `max_batch_size`)
    pub fn flush<F>(&mut self, mut processor: F, max_events: Option<usize>) -> usize
    where
        F: FnMut(QueuedEvent<T>),
    {
        let limit = max_events.unwrap_or(self.config.max_batch_size);
        let outcome = self.dispatch(limit, &mut |record: QueuedEvent<T>| {
            processor(record);
            Ok::<(), Infallible>(())
        });
        match outcome {
            Ok(processed) => processed,
            Err((_, never)) => match never {},
        }
    }

    /// Fallible form of [`flush`](Self::flush)
    pub fn try_flush<F, E>(&mut self, mut processor: F, max_events: Option<usize>) -> Result<usize>
    where
        F: FnMut(QueuedEvent<T>) -> std::result::Result<(), E>,
        E: Into<BoxError>,
    {
        let limit = max_events.unwrap_or(self.config.max_batch_size);
        self.dispatch(limit, &mut processor)
            .map_err(|failure| self.processor_failed(failure))
    }

    /// Process one batch of at most `max_batch_size` records
    pub fn process_batch<F>(&mut self, processor: F) -> usize
    where
        F: FnMut(QueuedEvent<T>),
    {
        self.flush(processor, Some(self.config.max_batch_size))
    }

    /// Fallible form of [`process_batch`](Self::process_batch)
    pub fn try_process_batch<F, E>(&mut self, processor: F) -> Result<usize>
    where
        F: FnMut(QueuedEvent<T>) -> std::result::Result<(), E>,
        E: Into<BoxError>,
    {
        self.try_flush(processor, Some(self.config.max_batch_size))
    }

    /// Process every queued record, ignoring `max_batch_size`
    pub fn drain<F>(&mut self, processor: F) -> usize
    where
        F: FnMut(QueuedEvent<T>),
    {
        let len = self.buffer.len();
        self.flush(processor, Some(len))
    }

    /// Fallible form of [`drain`](Self::drain)
    pub fn try_drain<F, E>(&mut self, processor: F) -> Result<usize>
    where
        F: FnMut(QueuedEvent<T>) -> std::result::Result<(), E>,
        E: Into<BoxError>,
    {
        let len = self.buffer.len();
        self.try_flush(processor, Some(len))
    }

    /// Advance the tick accumulator by `delta_ms` and run the batches it pays for.
    ///
    /// With `process_interval_ms == 0` this is a plain `process_batch`.
    /// Otherwise one batch runs per whole interval accumulated, stopping early
    /// once the queue is empty. Leftover time carries into the next call.
    ///
    /// The accumulator is not capped and keeps growing while the queue is
    /// idle. After a long idle stretch (or one large `delta_ms`) the next
    /// tick can run many batches back to back; hosts that want a per-frame
    /// budget should clamp `delta_ms` themselves.
    pub fn tick<F>(&mut self, delta_ms: f64, mut processor: F) -> Result<usize>
    where
        F: FnMut(QueuedEvent<T>),
    {
        let outcome = self.run_tick(delta_ms, &mut |record: QueuedEvent<T>| {
            processor(record);
            Ok::<(), Infallible>(())
        })?;
        match outcome {
            Ok(processed) => Ok(processed),
            Err((_, never)) => match never {},
        }
    }

    /// Fallible form of [`tick`](Self::tick)
    pub fn try_tick<F, E>(&mut self, delta_ms: f64, mut processor: F) -> Result<usize>
    where
        F: FnMut(QueuedEvent<T>) -> std::result::Result<(), E>,
        E: Into<BoxError>,
    {
        self.run_tick(delta_ms, &mut processor)?
            .map_err(|failure| self.processor_failed(failure))
    }

    fn run_tick<F, E>(
        &mut self,
        delta_ms: f64,
        processor: &mut F,
    ) -> Result<std::result::Result<usize, DispatchFailure<E>>>
    where
        F: FnMut(QueuedEvent<T>) -> std::result::Result<(), E>,
    {
        if !delta_ms.is_finite() || delta_ms < 0.0 {
            return Err(DispatchError::InvalidArgument(format!(
                "tick delta must be a finite, non-negative number of milliseconds (got {})",
                delta_ms
            )));
        }

        let batch = self.config.max_batch_size;
        if self.config.process_interval_ms == 0 {
            return Ok(self.dispatch(batch, processor));
        }

        self.tick_accumulator_ms += delta_ms;
        let interval = self.config.process_interval_ms as f64;

        let mut total = 0;
        let mut batches = 0;
        while self.tick_accumulator_ms >= interval && !self.buffer.is_empty() {
            self.tick_accumulator_ms -= interval;
            batches += 1;
            match self.dispatch(batch, processor) {
                Ok(processed) => total += processed,
                Err((processed, err)) => return Ok(Err((total + processed, err))),
            }
        }

        if batches > 0 {
            debug!(
                queue = %self.config.name,
                batches,
                processed = total,
                remaining = self.buffer.len(),
                accumulator_ms = self.tick_accumulator_ms,
                "Tick processed"
            );
        }

        Ok(Ok(total))
    }

    /// Hand up to `limit` records to `processor`, highest priority first.
    fn dispatch<F, E>(
        &mut self,
        limit: usize,
        processor: &mut F,
    ) -> std::result::Result<usize, DispatchFailure<E>>
    where
        F: FnMut(QueuedEvent<T>) -> std::result::Result<(), E>,
    {
        self.buffer.ensure_sorted();

        let mut processed = 0;
        while processed < limit {
            let record = match self.buffer.pop_front() {
                Some(record) => record,
                None => break,
            };
            trace!(
                queue = %self.config.name,
                event_type = record.event_type(),
                sequence = record.sequence(),
                "Dispatching event"
            );
            if let Err(err) = processor(record) {
                self.metrics.observe_length(self.buffer.len());
                return Err((processed, err));
            }
            processed += 1;
            self.metrics.record_processed();
        }

        self.metrics.observe_length(self.buffer.len());
        Ok(processed)
    }

    fn processor_failed<E: Into<BoxError>>(&self, (processed, err): DispatchFailure<E>) -> DispatchError {
        let source = err.into();
        warn!(
            queue = %self.config.name,
            processed,
            remaining = self.buffer.len(),
            error = %source,
            "Processor failed, dispatch aborted"
        );
        DispatchError::ProcessorFailed { processed, source }
    }

    /// Highest-priority record without removing it
    pub fn peek(&mut self) -> Option<&QueuedEvent<T>> {
        self.buffer.front()
    }

    /// Drop every queued record and reset the tick accumulator.
    ///
    /// Counters survive; use [`reset_metrics`](Self::reset_metrics) for those.
    pub fn clear(&mut self) {
        let discarded = self.buffer.len();
        self.buffer.clear();
        self.tick_accumulator_ms = 0.0;
        self.metrics.observe_length(0);
        info!(queue = %self.config.name, discarded, "Dispatch queue cleared");
    }

    /// Zero the four counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
        info!(queue = %self.config.name, "Dispatch queue metrics reset");
    }

    /// Counter snapshot including the current length
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.buffer.len())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.config.max_size
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn id(&self) -> Ulid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Unconsumed tick time in milliseconds
    pub fn tick_accumulator_ms(&self) -> f64 {
        self.tick_accumulator_ms
    }

    /// Sequence number the next enqueue will receive
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Queued records in backing order. Does not sort.
    pub fn iter(&self) -> impl Iterator<Item = &QueuedEvent<T>> {
        self.buffer.iter()
    }
}

impl<T> Default for DispatchQueue<T> {
    fn default() -> Self {
        Self::build(Ulid::new(), QueueConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::overflow::OverflowStrategy;
    use crate::dispatch::record::Metadata;
    use serde_json::json;
    use std::panic::{self, AssertUnwindSafe};

    fn queue_with(config: QueueConfig) -> DispatchQueue<&'static str> {
        DispatchQueue::new(config).unwrap()
    }

    fn drain_types<T>(queue: &mut DispatchQueue<T>) -> Vec<String> {
        let mut seen = Vec::new();
        queue.drain(|record| seen.push(record.event_type().to_string()));
        seen
    }

    #[test]
    fn test_queue_creation() {
        let queue: DispatchQueue<()> = DispatchQueue::new(QueueConfig::default()).unwrap();
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
        assert!(!queue.is_full());
        assert_eq!(queue.name(), "default");

        let invalid = DispatchQueue::<()>::new(QueueConfig::default().with_max_size(0));
        assert!(matches!(invalid, Err(DispatchError::ConfigError(_))));
    }

    #[test]
    fn test_priority_order_with_fifo_ties() {
        let mut queue = queue_with(QueueConfig::default());
        queue.enqueue("low", "l", 75).unwrap();
        queue.enqueue("high", "h", 10).unwrap();
        queue.enqueue("medium", "m", 40).unwrap();
        queue.enqueue("high2", "h2", 10).unwrap();

        assert_eq!(drain_types(&mut queue), vec!["high", "high2", "medium", "low"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_default_priority_applies() {
        let mut queue = queue_with(QueueConfig::default().with_default_priority(50.0));
        queue.enqueue("no-priority", "a", EnqueueOptions::default()).unwrap();
        queue.enqueue("nan", "b", f64::NAN).unwrap();
        queue.enqueue("urgent", "c", 49).unwrap();
        queue.enqueue("later", "d", 51).unwrap();

        assert_eq!(queue.peek().map(|r| r.priority()), Some(49.0));
        assert_eq!(drain_types(&mut queue), vec!["urgent", "no-priority", "nan", "later"]);
    }

    #[test]
    fn test_empty_event_type_rejected_without_mutation() {
        let mut queue = queue_with(QueueConfig::default());
        let result = queue.enqueue("", "payload", 1);

        assert!(matches!(result, Err(DispatchError::InvalidArgument(_))));
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.next_sequence(), 0);
        assert_eq!(queue.metrics().enqueued, 0);
    }

    #[test]
    fn test_metadata_and_timestamp_kept() {
        let mut queue: DispatchQueue<u32> = DispatchQueue::default();
        let mut metadata = Metadata::new();
        metadata.insert("entity".to_string(), json!(7));
        let stamp = chrono::Utc::now();

        queue
            .enqueue(
                "spawn",
                1,
                EnqueueOptions::new()
                    .with_priority(5.0)
                    .with_metadata(metadata.clone())
                    .with_timestamp(stamp),
            )
            .unwrap();
        // Caller's map is independent of the stored copy
        metadata.insert("entity".to_string(), json!(8));

        let record = queue.peek().unwrap();
        assert_eq!(record.metadata().and_then(|m| m.get("entity")), Some(&json!(7)));
        assert_eq!(record.timestamp(), stamp);
        assert_eq!(*record.data(), 1);
    }

    #[test]
    fn test_timestamp_does_not_affect_order() {
        use chrono::{Duration, Utc};

        let base = Utc::now();
        let mut queue = queue_with(QueueConfig::default());
        // Later arrivals and higher priorities carry ever older timestamps
        let events = [
            ("low", 90, 0),
            ("tie-first", 20, 1),
            ("tie-second", 20, 2),
            ("high", 5, 3),
        ];
        for (name, priority, age) in events {
            let options = EnqueueOptions::from(priority)
                .with_timestamp(base - Duration::seconds(age * 60));
            queue.enqueue(name, name, options).unwrap();
        }

        assert_eq!(
            drain_types(&mut queue),
            vec!["high", "tie-first", "tie-second", "low"]
        );
    }

    #[test]
    fn test_process_batch_respects_max_batch_size() {
        let mut queue = queue_with(QueueConfig::default().with_max_batch_size(2));
        for name in ["a", "b", "c"] {
            queue.enqueue(name, name, EnqueueOptions::default()).unwrap();
        }

        let mut seen = Vec::new();
        assert_eq!(queue.process_batch(|r| seen.push(r.into_data())), 2);
        assert_eq!(seen, vec!["a", "b"]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_flush_max_events() {
        let mut queue = queue_with(QueueConfig::default().with_max_batch_size(2));
        for i in 0..5 {
            queue.enqueue("evt", "x", i).unwrap();
        }

        assert_eq!(queue.flush(|_| {}, Some(4)), 4);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.flush(|_| {}, None), 1);
        assert_eq!(queue.flush(|_| {}, None), 0);
        assert_eq!(queue.flush(|_| {}, Some(0)), 0);
    }

    #[test]
    fn test_drain_ignores_batch_size() {
        let mut queue = queue_with(QueueConfig::default().with_max_batch_size(1));
        for i in 0..10 {
            queue.enqueue("evt", "x", i).unwrap();
        }
        assert_eq!(queue.drain(|_| {}), 10);
        assert_eq!(queue.metrics().processed, 10);
    }

    #[test]
    fn test_tick_accumulates_intervals() {
        let mut queue = queue_with(
            QueueConfig::default()
                .with_process_interval_ms(10)
                .with_max_batch_size(1),
        );
        queue.enqueue("a", "a", EnqueueOptions::default()).unwrap();
        queue.enqueue("b", "b", EnqueueOptions::default()).unwrap();

        assert_eq!(queue.tick(5.0, |_| {}).unwrap(), 0);
        assert_eq!(queue.tick(5.0, |_| {}).unwrap(), 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.tick(10.0, |_| {}).unwrap(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_tick_catches_up_multiple_intervals() {
        let mut queue = queue_with(
            QueueConfig::default()
                .with_process_interval_ms(10)
                .with_max_batch_size(2),
        );
        for i in 0..10 {
            queue.enqueue("evt", "x", i).unwrap();
        }

        // 35ms pays for three batches of two
        assert_eq!(queue.tick(35.0, |_| {}).unwrap(), 6);
        assert_eq!(queue.tick_accumulator_ms(), 5.0);
        assert_eq!(queue.len(), 4);
    }

    #[test]
    fn test_idle_ticks_bank_time() {
        let mut queue = queue_with(
            QueueConfig::default()
                .with_process_interval_ms(16)
                .with_max_batch_size(4),
        );
        for _ in 0..10 {
            assert_eq!(queue.tick(16.0, |_| {}).unwrap(), 0);
        }
        assert_eq!(queue.tick_accumulator_ms(), 160.0);

        for i in 0..40 {
            queue.enqueue("evt", "x", i).unwrap();
        }
        // One frame of 16ms releases the banked intervals as well
        assert_eq!(queue.tick(16.0, |_| {}).unwrap(), 40);
        assert_eq!(queue.tick_accumulator_ms(), 16.0);
    }

    #[test]
    fn test_tick_stops_when_empty() {
        let mut queue = queue_with(
            QueueConfig::default()
                .with_process_interval_ms(10)
                .with_max_batch_size(1),
        );
        queue.enqueue("only", "x", EnqueueOptions::default()).unwrap();

        assert_eq!(queue.tick(50.0, |_| {}).unwrap(), 1);
        // Only one interval was consumed
        assert_eq!(queue.tick_accumulator_ms(), 40.0);
    }

    #[test]
    fn test_tick_zero_interval_is_process_batch() {
        let mut queue = queue_with(
            QueueConfig::default()
                .with_process_interval_ms(0)
                .with_max_batch_size(3),
        );
        for i in 0..5 {
            queue.enqueue("evt", "x", i).unwrap();
        }
        assert_eq!(queue.tick(0.0, |_| {}).unwrap(), 3);
        assert_eq!(queue.tick_accumulator_ms(), 0.0);
    }

    #[test]
    fn test_tick_rejects_negative_delta() {
        let mut queue = queue_with(QueueConfig::default());
        queue.enqueue("a", "a", EnqueueOptions::default()).unwrap();

        assert!(matches!(
            queue.tick(-1.0, |_| {}),
            Err(DispatchError::InvalidArgument(_))
        ));
        assert!(queue.tick(f64::NAN, |_| {}).is_err());
        assert_eq!(queue.tick_accumulator_ms(), 0.0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_drop_lowest_priority_overflow() {
        let mut queue = queue_with(QueueConfig::default().with_max_size(2));
        assert!(queue.enqueue("keep", "k", 10).unwrap());
        assert!(queue.enqueue("drop", "d", 90).unwrap());
        assert!(queue.enqueue("new", "n", 20).unwrap());

        let metrics = queue.metrics();
        assert_eq!(metrics.enqueued, 3);
        assert_eq!(metrics.dropped, 1);
        assert_eq!(metrics.overflow_events, 1);
        assert_eq!(drain_types(&mut queue), vec!["keep", "new"]);
    }

    #[test]
    fn test_drop_lowest_priority_rejects_worse() {
        let mut queue = queue_with(QueueConfig::default().with_max_size(2));
        queue.enqueue("a", "a", 10).unwrap();
        queue.enqueue("b", "b", 20).unwrap();

        assert!(!queue.enqueue("c", "c", 20).unwrap());
        assert!(!queue.enqueue("d", "d", 30).unwrap());
        assert_eq!(queue.metrics().dropped, 2);
        assert_eq!(drain_types(&mut queue), vec!["a", "b"]);
    }

    #[test]
    fn test_drop_newest_overflow() {
        let mut queue = queue_with(
            QueueConfig::default()
                .with_max_size(1)
                .with_overflow_strategy(OverflowStrategy::DropNewest),
        );
        assert!(queue.enqueue("first", "a", 90).unwrap());
        assert!(!queue.enqueue("second", "b", 1).unwrap());
        assert_eq!(queue.metrics().overflow_events, 1);
        assert_eq!(drain_types(&mut queue), vec!["first"]);
    }

    #[test]
    fn test_drop_oldest_overflow() {
        let mut queue = queue_with(
            QueueConfig::default()
                .with_max_size(2)
                .with_overflow_strategy(OverflowStrategy::DropOldest),
        );
        queue.enqueue("first", "a", 1).unwrap();
        queue.enqueue("second", "b", 99).unwrap();
        assert!(queue.enqueue("third", "c", 50).unwrap());

        assert_eq!(queue.metrics().dropped, 1);
        assert_eq!(drain_types(&mut queue), vec!["third", "second"]);
    }

    #[test]
    fn test_throw_overflow() {
        let mut queue = queue_with(
            QueueConfig::default()
                .with_max_size(1)
                .with_overflow_strategy(OverflowStrategy::Throw),
        );
        assert!(queue.enqueue("first", "a", EnqueueOptions::default()).unwrap());

        let result = queue.enqueue("second", "b", EnqueueOptions::default());
        assert!(matches!(
            result,
            Err(DispatchError::CapacityExceeded { max_size: 1 })
        ));
        assert_eq!(queue.len(), 1);
        // Sequence still consumed by the refused record
        assert_eq!(queue.next_sequence(), 2);

        let metrics = queue.metrics();
        assert_eq!(metrics.enqueued, 2);
        assert_eq!(metrics.dropped, 1);
        assert_eq!(metrics.overflow_events, 1);
    }

    #[test]
    fn test_sequences_increase_across_overflow() {
        let mut queue: DispatchQueue<()> =
            DispatchQueue::new(QueueConfig::default().with_max_size(1)).unwrap();
        queue.enqueue("a", (), 50).unwrap();
        queue.enqueue("b", (), 90).unwrap(); // rejected
        queue.enqueue("c", (), 10).unwrap(); // evicts a

        assert_eq!(queue.peek().map(|r| r.sequence()), Some(2));
        assert_eq!(queue.next_sequence(), 3);
    }

    #[test]
    fn test_peek_does_not_remove() {
        let mut queue = queue_with(QueueConfig::default());
        assert!(queue.peek().is_none());

        queue.enqueue("low", "l", 75).unwrap();
        queue.enqueue("high", "h", 10).unwrap();

        assert_eq!(queue.peek().map(|r| r.event_type()), Some("high"));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.metrics().processed, 0);
    }

    #[test]
    fn test_clear_keeps_metrics() {
        let mut queue = queue_with(QueueConfig::default().with_process_interval_ms(10));
        queue.enqueue("a", "a", 1).unwrap();
        queue.enqueue("b", "b", 2).unwrap();
        queue.tick(5.0, |_| {}).unwrap();

        queue.clear();
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.tick_accumulator_ms(), 0.0);
        assert_eq!(queue.metrics().enqueued, 2);

        queue.clear();
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.tick_accumulator_ms(), 0.0);
        assert_eq!(queue.metrics().enqueued, 2);
    }

    #[test]
    fn test_reset_metrics() {
        let mut queue = queue_with(QueueConfig::default());
        queue.enqueue("a", "a", 1).unwrap();
        queue.enqueue("b", "b", 2).unwrap();
        queue.process_batch(|_| {});

        queue.reset_metrics();
        let metrics = queue.metrics();
        assert_eq!(metrics.enqueued, 0);
        assert_eq!(metrics.processed, 0);
        assert_eq!(metrics.dropped, 0);
        assert_eq!(metrics.overflow_events, 0);
        assert_eq!(metrics.length, 0);
    }

    #[test]
    fn test_processor_error_keeps_remaining_records() {
        let mut queue = queue_with(QueueConfig::default());
        for (name, priority) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            queue.enqueue(name, name, priority).unwrap();
        }

        let result = queue.try_drain(|record| {
            if record.event_type() == "b" {
                Err("bad event")
            } else {
                Ok(())
            }
        });

        match result {
            Err(DispatchError::ProcessorFailed { processed, source }) => {
                assert_eq!(processed, 1);
                assert_eq!(source.to_string(), "bad event");
            }
            other => panic!("expected processor failure, got {:?}", other),
        }

        assert_eq!(queue.metrics().processed, 1);
        assert_eq!(drain_types(&mut queue), vec!["c", "d"]);
    }

    #[test]
    fn test_processor_error_in_tick_counts_earlier_batches() {
        let mut queue = queue_with(
            QueueConfig::default()
                .with_process_interval_ms(10)
                .with_max_batch_size(1),
        );
        for i in 0..3 {
            queue.enqueue("evt", "x", i).unwrap();
        }

        let mut calls = 0;
        let result = queue.try_tick(30.0, |_| {
            calls += 1;
            if calls == 2 {
                Err("second call fails")
            } else {
                Ok(())
            }
        });

        assert!(matches!(
            result,
            Err(DispatchError::ProcessorFailed { processed: 1, .. })
        ));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.tick_accumulator_ms(), 10.0);
    }

    #[test]
    fn test_panicking_processor_leaves_queue_consistent() {
        let mut queue = queue_with(QueueConfig::default());
        for (name, priority) in [("a", 1), ("b", 2), ("c", 3)] {
            queue.enqueue(name, name, priority).unwrap();
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            queue.drain(|record| {
                if record.event_type() == "b" {
                    panic!("processor blew up");
                }
            })
        }));
        assert!(outcome.is_err());

        assert_eq!(queue.metrics().processed, 1);
        assert_eq!(drain_types(&mut queue), vec!["c"]);
    }

    #[test]
    fn test_try_process_batch_success() {
        let mut queue = queue_with(QueueConfig::default().with_max_batch_size(2));
        for i in 0..3 {
            queue.enqueue("evt", "x", i).unwrap();
        }
        let processed = queue
            .try_process_batch(|_| Ok::<(), std::io::Error>(()))
            .unwrap();
        assert_eq!(processed, 2);
    }
}
