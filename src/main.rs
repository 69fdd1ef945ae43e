// src/main.rs
//! Tick Dispatch demo host
//!
//! Runs a fixed-tick frame loop fed by synthetic producers and reports the
//! queue counters on exit (Ctrl-C or `host.max_frames`).

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashMap;
use tick_dispatch::observability::{init_metrics, init_tracing};
use tick_dispatch::{DispatchConfig, DispatchQueue, EnqueueOptions, TickLoop};
use tracing::{error, info, trace};

/// Synthetic simulation event
#[derive(Debug, Clone, Serialize)]
enum SimEvent {
    Input { key: u8 },
    Collision { a: u32, b: u32 },
    AiDecision { entity: u32 },
    Telemetry { frame: u64 },
}

impl SimEvent {
    fn kind(&self) -> &'static str {
        match self {
            SimEvent::Input { .. } => "input",
            SimEvent::Collision { .. } => "collision",
            SimEvent::AiDecision { .. } => "ai-decision",
            SimEvent::Telemetry { .. } => "telemetry",
        }
    }

    /// Random event with a priority in its kind's band
    fn random(rng: &mut StdRng, frame: u64) -> (Self, f64) {
        match rng.gen_range(0..4) {
            0 => (SimEvent::Input { key: rng.gen() }, rng.gen_range(0.0..10.0)),
            1 => (
                SimEvent::Collision {
                    a: rng.gen_range(0..512),
                    b: rng.gen_range(0..512),
                },
                rng.gen_range(20.0..40.0),
            ),
            2 => (
                SimEvent::AiDecision {
                    entity: rng.gen_range(0..512),
                },
                rng.gen_range(40.0..70.0),
            ),
            _ => (SimEvent::Telemetry { frame }, rng.gen_range(80.0..100.0)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first: it carries the log settings
    let config = DispatchConfig::load()?;

    init_tracing(&config.observability)?;
    init_metrics(&config.observability)?;

    info!("Starting Tick Dispatch v{} ({})", tick_dispatch::VERSION, tick_dispatch::GIT_HASH);
    info!("Configuration loaded: {:?}", config);

    let queue = DispatchQueue::new(config.queue.clone())?;
    let mut host = TickLoop::new(config.host.clone(), queue)?;

    let mut rng = StdRng::from_entropy();
    let producer = move |frame: u64, queue: &mut DispatchQueue<SimEvent>| -> tick_dispatch::Result<()> {
        for _ in 0..rng.gen_range(0..=6) {
            let (event, priority) = SimEvent::random(&mut rng, frame);
            queue.enqueue(event.kind(), event, EnqueueOptions::new().with_priority(priority))?;
        }
        Ok(())
    };

    let mut handled: HashMap<&'static str, u64> = HashMap::new();
    let processor = |event: tick_dispatch::QueuedEvent<SimEvent>| {
        trace!(kind = event.event_type(), priority = event.priority(), "Handled");
        *handled.entry(event.data().kind()).or_default() += 1;
    };

    // Graceful shutdown handler
    let shutdown_signal = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal, cleaning up..."),
            Err(e) => {
                error!("Failed to install CTRL+C signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    let report = host.run(producer, processor, shutdown_signal).await?;

    info!(
        frames = report.frames,
        processed = report.processed,
        enqueued = report.metrics.enqueued,
        dropped = report.metrics.dropped,
        drop_rate = %format!("{:.2}%", report.metrics.drop_rate()),
        "Simulation finished"
    );
    info!("Events handled by kind: {:?}", handled);
    info!("Final metrics: {}", serde_json::to_string(&report.metrics)?);

    Ok(())
}
