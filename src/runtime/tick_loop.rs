// src/runtime/tick_loop.rs
//! Fixed-rate host loop driving a dispatch queue
//!
//! Every frame the loop measures elapsed time, lets the producer enqueue,
//! then calls `tick` with the measured delta. The loop ends after
//! `max_frames` frames or when the shutdown future resolves, whichever
//! comes first.

use crate::dispatch::metrics::MetricsSnapshot;
use crate::dispatch::queue::DispatchQueue;
use crate::dispatch::record::QueuedEvent;
use crate::utils::errors::{DispatchError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Host loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Frame period (milliseconds, >= 1)
    pub frame_interval_ms: u64,

    /// Stop after this many frames; run until shutdown when unset
    pub max_frames: Option<u64>,

    /// Drain whatever is left once the loop stops
    pub drain_on_shutdown: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            max_frames: None,
            drain_on_shutdown: true,
        }
    }
}

impl HostConfig {
    pub fn validate(&self) -> Result<()> {
        if self.frame_interval_ms == 0 {
            return Err(DispatchError::ConfigError(
                "frame_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Summary returned when the loop stops
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickLoopReport {
    /// Frames executed
    pub frames: u64,

    /// Records processed, final drain included
    pub processed: usize,

    /// Queue counters at exit
    pub metrics: MetricsSnapshot,
}

/// Frame loop that owns its queue
#[derive(Debug)]
pub struct TickLoop<T> {
    config: HostConfig,
    queue: DispatchQueue<T>,
}

impl<T> TickLoop<T> {
    pub fn new(config: HostConfig, queue: DispatchQueue<T>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, queue })
    }

    pub fn queue(&self) -> &DispatchQueue<T> {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut DispatchQueue<T> {
        &mut self.queue
    }

    pub fn into_queue(self) -> DispatchQueue<T> {
        self.queue
    }

    /// Run frames until `max_frames` or `shutdown`.
    ///
    /// `producer` receives the 1-based frame number and the queue. Errors it
    /// returns for runtime conditions (a `throw` overflow) are logged and the
    /// loop continues; programmer errors stop the loop and are returned.
    pub async fn run<P, F, S>(
        &mut self,
        mut producer: P,
        mut processor: F,
        shutdown: S,
    ) -> Result<TickLoopReport>
    where
        P: FnMut(u64, &mut DispatchQueue<T>) -> Result<()>,
        F: FnMut(QueuedEvent<T>),
        S: Future<Output = ()>,
    {
        let period = Duration::from_millis(self.config.frame_interval_ms);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            queue = %self.queue.name(),
            queue_id = %self.queue.id(),
            frame_interval_ms = self.config.frame_interval_ms,
            max_frames = ?self.config.max_frames,
            "Host loop starting"
        );

        let mut last_frame = Instant::now();
        let mut frames = 0u64;
        let mut processed = 0usize;

        loop {
            if self.config.max_frames.map_or(false, |max| frames >= max) {
                break;
            }

            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!(frames, "Shutdown requested, stopping host loop");
                    break;
                }

                now = interval.tick() => {
                    let delta_ms = now.duration_since(last_frame).as_secs_f64() * 1000.0;
                    last_frame = now;
                    frames += 1;

                    if let Err(err) = producer(frames, &mut self.queue) {
                        if err.is_programmer_error() {
                            return Err(err);
                        }
                        warn!(frame = frames, error = %err, "Producer error");
                    }

                    let handled = self.queue.tick(delta_ms, &mut processor)?;
                    processed += handled;
                    debug!(frame = frames, delta_ms, handled, queued = self.queue.len(), "Frame complete");
                }
            }
        }

        if self.config.drain_on_shutdown && !self.queue.is_empty() {
            let drained = self.queue.drain(&mut processor);
            info!(drained, "Drained remaining events");
            processed += drained;
        }

        let report = TickLoopReport {
            frames,
            processed,
            metrics: self.queue.metrics(),
        };
        info!(
            frames = report.frames,
            processed = report.processed,
            dropped = report.metrics.dropped,
            "Host loop stopped"
        );
        Ok(report)
    }
}
