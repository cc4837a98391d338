/*!
 * Sync Toolkit Library
 * Thread-coordination primitives built on a single monitor abstraction
 */

pub mod core;
pub mod monitoring;

// Re-exports
pub use crate::core::errors::{
    BarrierError, BarrierResult, ConfigError, ConfigResult, HandoffError, WaitError, WaitResult,
};
pub use crate::core::sync::{
    BoundedQueue, CancelToken, Condition, ConcurrentMap, CopyOnWriteList, CountdownLatch,
    CyclicBarrier, Exchanger, MapConfig, Monitor, MonitorGuard, Wait, WakeResult,
};
pub use crate::core::task::{BoxedTask, Task};
pub use monitoring::{init_tracing, span_operation};
