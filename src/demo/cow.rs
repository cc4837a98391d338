/*!
 * Copy-On-Write Scenario
 * Two appenders racing while a reader iterates snapshots
 */

use super::DemoConfig;
use anyhow::{anyhow, ensure, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use sync_toolkit::CopyOnWriteList;
use tracing::info;

const APPENDS: usize = 1_000;

pub fn run(_config: &DemoConfig) -> Result<()> {
    let list = Arc::new(CopyOnWriteList::new());
    let done = Arc::new(AtomicBool::new(false));

    let appenders: Vec<_> = ["left", "right"]
        .into_iter()
        .map(|side| {
            let list = list.clone();
            thread::spawn(move || {
                for i in 0..APPENDS {
                    list.push((side, i));
                }
            })
        })
        .collect();

    let reader = {
        let list = list.clone();
        let done = done.clone();
        thread::spawn(move || {
            let mut snapshots = 0usize;
            let mut largest = 0usize;
            while !done.load(Ordering::Acquire) {
                let snapshot = list.snapshot();
                // A snapshot never changes underneath its reader
                let len = snapshot.iter().count();
                largest = largest.max(len);
                snapshots += 1;
                thread::yield_now();
            }
            (snapshots, largest)
        })
    };

    for appender in appenders {
        appender.join().map_err(|_| anyhow!("appender panicked"))?;
    }
    done.store(true, Ordering::Release);
    let (snapshots, largest) = reader.join().map_err(|_| anyhow!("reader panicked"))?;

    let final_len = list.len();
    ensure!(final_len == 2 * APPENDS, "lost appends: {} of {}", final_len, 2 * APPENDS);

    info!(entries = final_len, snapshots, largest_snapshot = largest, "Copy-on-write complete");
    Ok(())
}
