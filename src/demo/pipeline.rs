/*!
 * Pipeline Scenario
 * Producer thread feeding a bounded queue, consumer dispatching to a pool
 */

use super::pool::WorkerPool;
use super::DemoConfig;
use anyhow::{anyhow, ensure, Result};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use sync_toolkit::{BoundedQueue, WaitError};
use tracing::{debug, info};

const ITEMS: u64 = 64;
const STEP_TIMEOUT: Duration = Duration::from_secs(5);

pub fn run(config: &DemoConfig) -> Result<()> {
    let queue = Arc::new(BoundedQueue::new(config.queue_capacity)?);
    let pool = WorkerPool::new(config.workers, config.queue_capacity)?;

    let producer = {
        let queue = queue.clone();
        thread::spawn(move || -> Result<()> {
            for n in 1..=ITEMS {
                queue.put_timeout(n, STEP_TIMEOUT).map_err(WaitError::from)?;
            }
            debug!(items = ITEMS, "Producer finished");
            Ok(())
        })
    };

    let mut handles = Vec::with_capacity(ITEMS as usize);
    for _ in 0..ITEMS {
        let n = queue.take_timeout(STEP_TIMEOUT)?;
        handles.push(pool.submit(move || n * n)?);
    }

    producer
        .join()
        .map_err(|_| anyhow!("producer panicked"))??;

    let already_done = handles.iter().filter(|handle| handle.is_done()).count();
    debug!(already_done, pending = handles.len() - already_done, "Collecting results");

    let sum = handles
        .into_iter()
        .map(|handle| handle.join(STEP_TIMEOUT))
        .sum::<Result<u64>>()?;
    pool.shutdown()?;

    let expected = ITEMS * (ITEMS + 1) * (2 * ITEMS + 1) / 6;
    ensure!(sum == expected, "sum of squares {} != {}", sum, expected);
    ensure!(queue.is_empty(), "pipeline queue not drained");

    info!(items = ITEMS, sum, "Pipeline complete");
    Ok(())
}
