/*!
 * Demo Scenarios
 * Scenario selection and environment-driven configuration
 */

mod batching;
mod cache;
mod cow;
mod matrix;
mod pipeline;
mod pool;

use anyhow::{bail, Context, Result};
use std::fmt;
use std::str::FromStr;
use sync_toolkit::core::limits::{DEFAULT_DEMO_QUEUE_CAPACITY, DEFAULT_DEMO_WORKERS};

/// Demo settings read from the environment
#[derive(Debug, Clone, Copy)]
pub struct DemoConfig {
    /// Worker threads in the pool and the matrix size
    pub workers: usize,
    /// Capacity of every bounded queue the demos create
    pub queue_capacity: usize,
}

impl DemoConfig {
    /// Environment variables:
    /// - SYNC_DEMO_WORKERS: pool size (default: 4)
    /// - SYNC_DEMO_QUEUE_CAPACITY: queue capacity (default: 8)
    pub fn from_env() -> Result<Self> {
        let config = Self {
            workers: env_usize("SYNC_DEMO_WORKERS", DEFAULT_DEMO_WORKERS)?,
            queue_capacity: env_usize("SYNC_DEMO_QUEUE_CAPACITY", DEFAULT_DEMO_QUEUE_CAPACITY)?,
        };
        if config.workers == 0 {
            bail!("SYNC_DEMO_WORKERS must be at least 1");
        }
        Ok(config)
    }
}

fn env_usize(name: &str, default: usize) -> Result<usize> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a non-negative integer, got {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Pipeline,
    Matrix,
    Batching,
    Cache,
    Cow,
    All,
}

impl Scenario {
    const EACH: [Scenario; 5] = [
        Scenario::Pipeline,
        Scenario::Matrix,
        Scenario::Batching,
        Scenario::Cache,
        Scenario::Cow,
    ];

    /// The concrete scenarios to run
    pub fn expand(&self) -> &[Scenario] {
        match self {
            Scenario::All => &Self::EACH,
            single => std::slice::from_ref(single),
        }
    }
}

impl FromStr for Scenario {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "pipeline" => Scenario::Pipeline,
            "matrix" => Scenario::Matrix,
            "batching" => Scenario::Batching,
            "cache" => Scenario::Cache,
            "cow" => Scenario::Cow,
            "all" => Scenario::All,
            other => bail!(
                "unknown scenario {:?} (expected pipeline, matrix, batching, cache, cow or all)",
                other
            ),
        })
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scenario::Pipeline => "pipeline",
            Scenario::Matrix => "matrix",
            Scenario::Batching => "batching",
            Scenario::Cache => "cache",
            Scenario::Cow => "cow",
            Scenario::All => "all",
        };
        f.write_str(name)
    }
}

/// Run one concrete scenario
pub fn run(scenario: Scenario, config: &DemoConfig) -> Result<()> {
    let span = sync_toolkit::span_operation("scenario");
    let _entered = span.enter();

    match scenario {
        Scenario::Pipeline => pipeline::run(config),
        Scenario::Matrix => matrix::run(config),
        Scenario::Batching => batching::run(config),
        Scenario::Cache => cache::run(config),
        Scenario::Cow => cow::run(config),
        Scenario::All => Scenario::EACH.iter().try_for_each(|s| run(*s, config)),
    }
}
