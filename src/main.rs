/*!
 * Sync Toolkit - Demo Entry Point
 *
 * Runs coordination scenarios built on the toolkit primitives:
 * - Producer/consumer pipeline feeding a small worker pool
 * - Matrix squaring gated by a latch, column sums stepped by a barrier
 * - Log batching through an exchanger
 * - Memoizing cache on the concurrent map
 * - Copy-on-write list under concurrent appends
 */

mod demo;

use anyhow::Result;
use tracing::info;

use demo::{DemoConfig, Scenario};
use sync_toolkit::init_tracing;

fn main() -> Result<()> {
    // Initialize structured tracing
    init_tracing();

    let scenario = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<Scenario>()?,
        None => Scenario::All,
    };
    let config = DemoConfig::from_env()?;

    info!("Sync demo starting...");
    info!("================================================");
    info!(
        scenario = %scenario,
        workers = config.workers,
        queue_capacity = config.queue_capacity,
        "Demo configuration loaded"
    );

    for step in scenario.expand() {
        info!(scenario = %step, "Running scenario");
        demo::run(*step, &config)?;
    }

    info!("================================================");
    info!("All scenarios complete");
    Ok(())
}
