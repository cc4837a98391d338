/*!
 * Matrix Scenario
 * Rows squared in parallel behind a latch, then column sums stepped
 * row by row through a barrier whose action records the running total
 */

use super::DemoConfig;
use anyhow::{anyhow, ensure, Context, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use sync_toolkit::{ConcurrentMap, CopyOnWriteList, CountdownLatch, CyclicBarrier};
use tracing::info;

const PHASE_TIMEOUT: Duration = Duration::from_secs(5);

pub fn run(config: &DemoConfig) -> Result<()> {
    let n = config.workers;
    let matrix: Vec<Vec<u64>> = (0..n)
        .map(|r| (0..n).map(|c| (r * n + c + 1) as u64).collect())
        .collect();

    // Phase 1: one thread per row, main thread gated on the latch
    let squared = Arc::new(ConcurrentMap::new());
    let latch = Arc::new(CountdownLatch::new(n));

    let squarers: Vec<_> = matrix
        .iter()
        .cloned()
        .enumerate()
        .map(|(r, row)| {
            let squared = squared.clone();
            let latch = latch.clone();
            thread::spawn(move || {
                squared.put(r, row.iter().map(|v| v * v).collect::<Vec<u64>>());
                latch.count_down();
            })
        })
        .collect();

    latch.wait_timeout(PHASE_TIMEOUT)?;
    for squarer in squarers {
        squarer.join().map_err(|_| anyhow!("row worker panicked"))?;
    }

    let rows = (0..n)
        .map(|r| squared.get(&r).with_context(|| format!("row {} missing", r)))
        .collect::<Result<Vec<_>>>()?;
    let rows = Arc::new(rows);

    // Phase 2: one thread per column, one barrier generation per row
    let column_sums: Arc<Vec<AtomicU64>> = Arc::new((0..n).map(|_| AtomicU64::new(0)).collect());
    let running_totals = Arc::new(CopyOnWriteList::new());

    let barrier = {
        let column_sums = column_sums.clone();
        let running_totals = running_totals.clone();
        Arc::new(CyclicBarrier::with_action(n, move || {
            let total: u64 = column_sums.iter().map(|s| s.load(Ordering::Relaxed)).sum();
            running_totals.push(total);
        })?)
    };

    let summers: Vec<_> = (0..n)
        .map(|c| {
            let rows = rows.clone();
            let column_sums = column_sums.clone();
            let barrier = barrier.clone();
            thread::spawn(move || -> Result<()> {
                for row in rows.iter() {
                    column_sums[c].fetch_add(row[c], Ordering::Relaxed);
                    barrier.wait_timeout(PHASE_TIMEOUT)?;
                }
                Ok(())
            })
        })
        .collect();

    for summer in summers {
        summer.join().map_err(|_| anyhow!("column worker panicked"))??;
    }

    let totals = running_totals.snapshot();
    let expected: u64 = matrix.iter().flatten().map(|v| v * v).sum();
    ensure!(totals.len() == n, "expected {} barrier trips, saw {}", n, totals.len());
    ensure!(totals.windows(2).all(|w| w[0] < w[1]), "running totals not increasing");
    ensure!(totals.last() == Some(&expected), "final total {:?} != {}", totals.last(), expected);

    let columns: Vec<u64> = column_sums.iter().map(|s| s.load(Ordering::Relaxed)).collect();
    info!(size = n, ?columns, total = expected, "Matrix complete");
    Ok(())
}
