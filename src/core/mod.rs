/*!
 * Core Module
 * Fundamental types, limits and error handling
 */

pub mod errors;
pub mod limits;
pub mod sync;
pub mod task;

// Re-export for convenience
pub use errors::*;
pub use task::{BoxedTask, Task};
