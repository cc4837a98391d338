/*!
 * Concurrent Map Benchmarks
 *
 * Stripe count versus contention for reads and atomic updates
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;
use sync_toolkit::{ConcurrentMap, CopyOnWriteList, MapConfig};

const THREADS: usize = 4;
const OPS_PER_THREAD: u64 = 2_000;

fn bench_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_single_thread");
    let map = ConcurrentMap::new();
    for k in 0..1024u64 {
        map.put(k, k);
    }

    group.bench_function("get", |b| {
        let mut k = 0u64;
        b.iter(|| {
            k = (k + 1) & 1023;
            black_box(map.get(&k))
        });
    });

    group.bench_function("merge", |b| {
        let mut k = 0u64;
        b.iter(|| {
            k = (k + 1) & 1023;
            black_box(map.merge(k, 1, |a, n| Some(a + n)))
        });
    });

    group.finish();
}

fn bench_contended_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_contended_compute");
    group.throughput(Throughput::Elements(THREADS as u64 * OPS_PER_THREAD));

    for stripes in [1usize, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(stripes), &stripes, |b, &stripes| {
            b.iter(|| {
                let map = Arc::new(ConcurrentMap::with_config(MapConfig::with_stripes(stripes)).unwrap());
                let handles: Vec<_> = (0..THREADS as u64)
                    .map(|t| {
                        let map = map.clone();
                        thread::spawn(move || {
                            for i in 0..OPS_PER_THREAD {
                                let key = (t * 7 + i) % 256;
                                map.compute(key, |v: Option<&u64>| Some(v.copied().unwrap_or(0) + 1));
                            }
                        })
                    })
                    .collect();

                for handle in handles {
                    handle.join().unwrap();
                }
                black_box(map.len())
            });
        });
    }

    group.finish();
}

fn bench_cow_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("cow_list");
    let list: CopyOnWriteList<u64> = (0..64).collect();

    group.bench_function("snapshot_sum", |b| {
        b.iter(|| black_box(list.snapshot().iter().sum::<u64>()));
    });

    group.bench_function("push_remove", |b| {
        b.iter(|| {
            list.push(black_box(7));
            black_box(list.remove_at(64))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_single_thread, bench_contended_compute, bench_cow_snapshot);
criterion_main!(benches);
