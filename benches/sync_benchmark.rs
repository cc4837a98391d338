/*!
 * Synchronization Primitives Benchmarks
 *
 * Hand-off latency and throughput of the queue, latch, barrier and exchanger
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;
use sync_toolkit::{BoundedQueue, CountdownLatch, CyclicBarrier, Exchanger};

fn bench_queue_uncontended(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_uncontended");
    let queue = BoundedQueue::new(1024).unwrap();

    group.bench_function("offer_poll", |b| {
        b.iter(|| {
            queue.offer(black_box(42u64)).ok();
            black_box(queue.poll());
        });
    });

    group.bench_function("put_take", |b| {
        b.iter(|| {
            queue.put(black_box(42u64)).ok();
            black_box(queue.take().ok());
        });
    });

    group.finish();
}

fn bench_queue_handoff(c: &mut Criterion) {
    const ITEMS: u64 = 10_000;
    let mut group = c.benchmark_group("queue_handoff");
    group.throughput(Throughput::Elements(ITEMS));

    for capacity in [1usize, 16, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &capacity| {
            b.iter(|| {
                let queue = Arc::new(BoundedQueue::new(capacity).unwrap());
                let producer = {
                    let queue = queue.clone();
                    thread::spawn(move || {
                        for i in 0..ITEMS {
                            queue.put(i).ok();
                        }
                    })
                };

                let mut sum = 0u64;
                for _ in 0..ITEMS {
                    sum += queue.take().unwrap_or(0);
                }
                producer.join().unwrap();
                black_box(sum)
            });
        });
    }

    group.finish();
}

fn bench_latch_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("latch_release");

    for waiters in [1usize, 4, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(waiters), &waiters, |b, &waiters| {
            b.iter(|| {
                let latch = Arc::new(CountdownLatch::new(1));
                let handles: Vec<_> = (0..waiters)
                    .map(|_| {
                        let latch = latch.clone();
                        thread::spawn(move || latch.wait().ok())
                    })
                    .collect();

                latch.count_down();
                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }

    group.finish();
}

fn bench_barrier_cycles(c: &mut Criterion) {
    const CYCLES: usize = 100;
    let mut group = c.benchmark_group("barrier_cycles");
    group.throughput(Throughput::Elements(CYCLES as u64));

    for parties in [2usize, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(parties), &parties, |b, &parties| {
            b.iter(|| {
                let barrier = Arc::new(CyclicBarrier::new(parties).unwrap());
                let handles: Vec<_> = (0..parties)
                    .map(|_| {
                        let barrier = barrier.clone();
                        thread::spawn(move || {
                            for _ in 0..CYCLES {
                                barrier.wait().ok();
                            }
                        })
                    })
                    .collect();

                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }

    group.finish();
}

fn bench_exchanger_pairs(c: &mut Criterion) {
    const ROUNDS: usize = 1_000;
    let mut group = c.benchmark_group("exchanger_pairs");
    group.throughput(Throughput::Elements(ROUNDS as u64));

    group.bench_function("two_threads", |b| {
        b.iter(|| {
            let exchanger = Arc::new(Exchanger::new());
            let partner = {
                let exchanger = exchanger.clone();
                thread::spawn(move || {
                    for i in 0..ROUNDS {
                        exchanger.exchange(i).ok();
                    }
                })
            };

            for i in 0..ROUNDS {
                black_box(exchanger.exchange(i).ok());
            }
            partner.join().unwrap();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_queue_uncontended,
    bench_queue_handoff,
    bench_latch_release,
    bench_barrier_cycles,
    bench_exchanger_pairs
);
criterion_main!(benches);
