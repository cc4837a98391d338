/*!
 * Batching Scenario
 * A logger fills a buffer and swaps it with a flusher's empty one
 */

use super::DemoConfig;
use anyhow::{anyhow, ensure, Result};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use sync_toolkit::{CancelToken, Exchanger, Wait, WaitError};
use tracing::{debug, info};

const MESSAGES: usize = 100;
const SWAP_TIMEOUT: Duration = Duration::from_secs(5);

pub fn run(config: &DemoConfig) -> Result<()> {
    let batch = config.queue_capacity.max(1);
    let exchanger = Arc::new(Exchanger::<Vec<String>>::new());
    let finished = CancelToken::new();

    let flusher = {
        let exchanger = exchanger.clone();
        let finished = finished.clone();
        thread::spawn(move || -> Result<(usize, usize)> {
            let wait = Wait::forever().cancellable(&finished);
            let mut spare = Vec::with_capacity(batch);
            let (mut flushed, mut batches) = (0, 0);

            loop {
                match exchanger.exchange_with(spare, &wait) {
                    Ok(mut full) => {
                        debug!(size = full.len(), "Flushed batch");
                        flushed += full.len();
                        batches += 1;
                        full.clear();
                        spare = full;
                    }
                    Err(err) if err.is_cancelled() => break,
                    Err(err) => return Err(WaitError::from(err).into()),
                }
            }
            Ok((flushed, batches))
        })
    };

    let mut buffer = Vec::with_capacity(batch);
    for i in 0..MESSAGES {
        buffer.push(format!("event {}", i));
        if buffer.len() == batch {
            buffer = exchanger
                .exchange_timeout(buffer, SWAP_TIMEOUT)
                .map_err(WaitError::from)?;
        }
    }
    if !buffer.is_empty() {
        exchanger
            .exchange_timeout(buffer, SWAP_TIMEOUT)
            .map_err(WaitError::from)?;
    }
    finished.cancel();

    let (flushed, batches) = flusher
        .join()
        .map_err(|_| anyhow!("flusher panicked"))??;
    ensure!(flushed == MESSAGES, "flushed {} of {} messages", flushed, MESSAGES);

    info!(messages = flushed, batches, batch_size = batch, "Batching complete");
    Ok(())
}
