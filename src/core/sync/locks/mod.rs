/*!
 * Lock-Based Synchronization Primitives
 *
 * Striped locks that reduce contention via partitioning
 */

mod striped;

// Re-export public API
pub use striped::ConcurrentMap;
