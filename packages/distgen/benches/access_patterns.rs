//! Compares the four access patterns on a single thread at working-set sizes that fit the
//! L1 cache, the last-level cache and main memory of typical hardware.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::time::{Duration, Instant};

use criterion::{Criterion, criterion_group, criterion_main};
use distgen::{AccessPattern, Buffer, Distances, StridePolicy, Workload};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

const PATTERNS: [AccessPattern; 4] = [
    AccessPattern::IndexRead,
    AccessPattern::ChainRead,
    AccessPattern::IndexWrite,
    AccessPattern::ChainWrite,
];

fn entrypoint(c: &mut Criterion) {
    for (name, size) in [
        ("16K", 16 * 1024),
        ("4M", 4 * 1024 * 1024),
        ("256M", 256 * 1024 * 1024),
    ] {
        let mut group = c.benchmark_group(format!("access_patterns_{name}"));

        for stride in [StridePolicy::Sequential, StridePolicy::PseudoRandom] {
            let workload = workload(size, stride);
            let mut buffer = Buffer::new(workload.layout());

            for pattern in PATTERNS {
                group.bench_function(format!("{stride}/{pattern}"), |b| {
                    b.iter_custom(|iters| measure(&workload, &mut buffer, iters, pattern));
                });
            }
        }

        group.finish();
    }
}

fn workload(size: u64, stride: StridePolicy) -> Workload {
    let mut distances = Distances::new();
    distances.add(size);

    Workload::new(distances, stride).expect("benchmark distances are valid and fit in memory")
}

/// Measures `iterations` complete traversals of the workload.
fn measure(
    workload: &Workload,
    buffer: &mut Buffer,
    iterations: u64,
    pattern: AccessPattern,
) -> Duration {
    let started = Instant::now();

    let tally = workload.run(buffer, iterations, pattern);
    black_box(tally.sum());

    let elapsed = started.elapsed();

    assert_eq!(
        tally.accesses(),
        iterations * workload.accesses_per_iteration(),
        "every iteration visits every block once"
    );

    elapsed
}
