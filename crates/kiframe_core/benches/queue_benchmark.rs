//! # Hand-off Benchmark
//!
//! Measures push/pop cost of the drop-oldest queue and slot pool access.
//!
//! Run with: `cargo bench --package kiframe_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kiframe_core::{DropOldestQueue, SlotPool};

/// Benchmark: push into a saturated depth-2 queue (every push evicts).
fn bench_saturated_push(c: &mut Criterion) {
    let queue = DropOldestQueue::new(2);
    queue.push(0u64);
    queue.push(1u64);

    c.bench_function("drop_oldest_push_saturated", |b| {
        let mut next = 2u64;
        b.iter(|| {
            next += 1;
            black_box(queue.push(black_box(next)))
        });
    });
}

/// Benchmark: push then pop.
fn bench_push_pop(c: &mut Criterion) {
    let queue = DropOldestQueue::new(2);

    c.bench_function("drop_oldest_push_pop", |b| {
        b.iter(|| {
            queue.push(black_box(7u64));
            black_box(queue.try_pop())
        });
    });
}

/// Benchmark: claim 320 slots and retract the tail.
fn bench_slot_pool_frame(c: &mut Criterion) {
    let mut pool = SlotPool::new(320, |_| (0i64, 0i64, false));

    c.bench_function("slot_pool_claim_and_hide_320", |b| {
        b.iter(|| {
            for index in 0..200 {
                if let Some(slot) = pool.get_mut(index) {
                    slot.0 = black_box(index as i64);
                    slot.2 = false;
                }
            }
            pool.for_each_from(200, |slot| slot.2 = true);
        });
    });
}

criterion_group!(benches, bench_saturated_push, bench_push_pop, bench_slot_pool_frame);
criterion_main!(benches);
