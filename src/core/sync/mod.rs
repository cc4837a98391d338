/*!
 * Synchronization Primitives
 *
 * Thread-coordination building blocks, all built on one monitor
 * abstraction (lock + condition queues + predicate-guarded waits):
 * - Bounded blocking queue for producer/consumer hand-off
 * - Countdown latch: one-shot gate
 * - Cyclic barrier: reusable N-party rendezvous
 * - Exchanger: pairwise value swap
 * - Striped concurrent map with atomic compound updates
 * - Copy-on-write list for read-mostly sequences
 *
 * # Timeouts and Cancellation
 *
 * Every blocking call has a plain form (waits forever), a `_timeout`
 * form and a `_with` form taking a `Wait`, which can carry a
 * `CancelToken`. Timeout and cancellation are reported as distinct
 * errors, and a failed call leaves the primitive as it found it.
 */

mod barrier;
mod config;
mod exchanger;
mod latch;
mod queue;

pub mod lockfree;
pub mod locks;
pub mod wait;

pub use barrier::CyclicBarrier;
pub use config::MapConfig;
pub use exchanger::Exchanger;
pub use latch::CountdownLatch;
pub use queue::BoundedQueue;

pub use lockfree::CopyOnWriteList;
pub use locks::ConcurrentMap;
pub use wait::{CancelToken, Condition, Monitor, MonitorGuard, Wait, WakeResult};
