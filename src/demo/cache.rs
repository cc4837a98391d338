/*!
 * Cache Scenario
 * Memoized computation shared by several threads
 */

use super::DemoConfig;
use anyhow::{anyhow, ensure, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use sync_toolkit::{ConcurrentMap, MapConfig};
use tracing::info;

const KEYS: u64 = 500;

fn collatz_steps(mut n: u64) -> u64 {
    let mut steps = 0;
    while n > 1 {
        n = if n % 2 == 0 { n / 2 } else { 3 * n + 1 };
        steps += 1;
    }
    steps
}

pub fn run(config: &DemoConfig) -> Result<()> {
    let cache = Arc::new(ConcurrentMap::with_config(MapConfig::high_contention())?);
    let requests = Arc::new(ConcurrentMap::new());
    let computations = Arc::new(AtomicUsize::new(0));

    let readers: Vec<_> = (0..config.workers)
        .map(|t| {
            let cache = cache.clone();
            let requests = requests.clone();
            let computations = computations.clone();
            thread::spawn(move || {
                // Each thread walks the keys from a different starting point
                let offset = t as u64 * KEYS / 7;
                for i in 0..KEYS {
                    let key = (i + offset) % KEYS + 1;
                    cache.compute_if_absent(key, |k| {
                        computations.fetch_add(1, Ordering::Relaxed);
                        collatz_steps(*k)
                    });
                    requests.merge(key, 1usize, |seen, one| Some(seen + one));
                }
            })
        })
        .collect();

    for reader in readers {
        reader.join().map_err(|_| anyhow!("cache reader panicked"))?;
    }

    let computed = computations.load(Ordering::Relaxed);
    ensure!(computed == KEYS as usize, "computed {} values for {} keys", computed, KEYS);

    let mut uneven = 0;
    requests.for_each(|_, count| {
        if *count != config.workers {
            uneven += 1;
        }
    });
    ensure!(uneven == 0, "{} keys saw the wrong request count", uneven);

    let mut longest = (0, 0);
    cache.for_each(|key, steps| {
        if *steps > longest.1 {
            longest = (*key, *steps);
        }
    });

    info!(
        keys = cache.len(),
        computed,
        longest_start = longest.0,
        longest_steps = longest.1,
        "Cache complete"
    );
    Ok(())
}
