/*!
 * Lock-Free Synchronization Primitives
 *
 * Read-mostly structures whose readers never take a lock:
 * - Copy-on-write list (RCU over `arc_swap`)
 */

mod cow_list;

// Re-export public API
pub use cow_list::CopyOnWriteList;
