/*!
 * Wait/Notify Primitives
 *
 * The foundation every blocking primitive is built on:
 * - `Monitor`: lock plus condition queues with a predicate-guarded wait
 * - `Wait`: per-call timeout and cancellation options
 * - `CancelToken`: cooperative interruption of blocked threads
 */

mod cancel;
mod monitor;
mod options;
mod traits;

// Re-export public API
pub use cancel::CancelToken;
pub use monitor::{Condition, Monitor, MonitorGuard};
pub use options::Wait;
pub use traits::WakeResult;
