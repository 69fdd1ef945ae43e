// benches/dispatch_bench.rs
//! Dispatch queue benchmarks
//!
//! 1. Enqueue throughput (below capacity)
//! 2. Drain of a dirty queue (sort + dispatch)
//! 3. Overflow churn per strategy on a full queue
//!
//! Run with: cargo bench --bench dispatch_bench

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tick_dispatch::{DispatchQueue, OverflowStrategy, QueueConfig};

const SIZES: [usize; 3] = [256, 2_048, 16_384];

fn priorities(n: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n).map(|_| f64::from(rng.gen_range(0..100u8))).collect()
}

fn filled_queue(config: QueueConfig, priorities: &[f64]) -> DispatchQueue<u64> {
    let mut queue = DispatchQueue::new(config).unwrap();
    for (i, p) in priorities.iter().enumerate() {
        queue.enqueue("bench", i as u64, *p).unwrap();
    }
    queue
}

fn bench_enqueue(c: &mut Criterion) {
    let mut group = c.benchmark_group("enqueue");
    for &n in &SIZES {
        let prio = priorities(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &prio, |b, prio| {
            b.iter_batched(
                || DispatchQueue::<u64>::new(QueueConfig::default().with_max_size(n)).unwrap(),
                |mut queue| {
                    for (i, p) in prio.iter().enumerate() {
                        queue.enqueue("bench", i as u64, *p).unwrap();
                    }
                    queue
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain");
    for &n in &SIZES {
        let prio = priorities(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &prio, |b, prio| {
            b.iter_batched(
                || filled_queue(QueueConfig::default().with_max_size(n), prio),
                |mut queue| queue.drain(|event| {
                    black_box(event.into_data());
                }),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_overflow(c: &mut Criterion) {
    let capacity = 1_024;
    let churn = priorities(4_096);
    let fill = priorities(capacity);

    let mut group = c.benchmark_group("overflow");
    group.throughput(Throughput::Elements(churn.len() as u64));
    for strategy in [
        OverflowStrategy::DropNewest,
        OverflowStrategy::DropOldest,
        OverflowStrategy::DropLowestPriority,
    ] {
        group.bench_function(BenchmarkId::from_parameter(strategy), |b| {
            b.iter_batched(
                || {
                    let config = QueueConfig::default()
                        .with_max_size(capacity)
                        .with_overflow_strategy(strategy);
                    filled_queue(config, &fill)
                },
                |mut queue| {
                    for (i, p) in churn.iter().enumerate() {
                        black_box(queue.enqueue("churn", i as u64, *p).unwrap());
                    }
                    queue
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_enqueue, bench_drain, bench_overflow);
criterion_main!(benches);
