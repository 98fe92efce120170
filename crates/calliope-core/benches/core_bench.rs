//! Benchmarks for the hot-path core infrastructure.

use criterion::{criterion_group, criterion_main, Criterion};

use calliope_core::{AudioLogger, BufferPool, MusicalClock};

fn bench_pool_borrow(c: &mut Criterion) {
    let pool = BufferPool::with_capacity(512, 8);
    c.bench_function("pool_borrow_return", |b| {
        b.iter(|| {
            let mut block = pool.borrow(512);
            std::hint::black_box(block.block().frames());
        })
    });
}

fn bench_clock_advance(c: &mut Criterion) {
    let mut clock = MusicalClock::new(48_000.0, 120.0);
    c.bench_function("clock_advance_block", |b| {
        b.iter(|| {
            clock.advance(512);
            std::hint::black_box(clock.total_ticks());
        })
    });
}

fn bench_logger_push(c: &mut Criterion) {
    let logger = AudioLogger::with_capacity(4096);
    c.bench_function("logger_push_event", |b| {
        b.iter(|| {
            logger.log_event("bench", 1.0);
            logger.pop();
        })
    });
}

criterion_group!(benches, bench_pool_borrow, bench_clock_advance, bench_logger_push);
criterion_main!(benches);
