// src/runtime/mod.rs
//! Host runtime
//!
//! The fixed-tick frame loop that produces events and drives a
//! [`DispatchQueue`](crate::dispatch::DispatchQueue) once per frame.
//!
//! # Architecture
//!
//! ```text
//! tokio interval (frame_interval_ms)
//!        │
//!        ▼
//! measure delta ─► producer(frame, &mut queue) ─► queue.tick(delta, processor)
//!        │
//!        └── until max_frames or shutdown ─► optional final drain ─► report
//! ```

pub mod tick_loop;

pub use tick_loop::{HostConfig, TickLoop, TickLoopReport};
