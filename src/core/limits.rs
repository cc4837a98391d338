/*!
 * System Limits and Constants
 *
 * Centralized location for defaults and thresholds used by the primitives.
 *
 * ## Conventions
 * - Performance-critical constants are marked with [PERF]
 * - Values that must stay powers of two are marked with [POW2]
 */

// =============================================================================
// MONITOR
// =============================================================================

/// Conditions allocated by `Monitor::new`
pub const DEFAULT_MONITOR_CONDITIONS: usize = 1;

// =============================================================================
// CONCURRENT MAP
// =============================================================================

/// Default stripe count for `ConcurrentMap` (16 stripes)
/// [PERF] [POW2] Masked hashing instead of modulo
pub const DEFAULT_MAP_STRIPES: usize = 16;

/// Stripe count for maps shared by many writer threads
/// [PERF] [POW2]
pub const HIGH_CONTENTION_MAP_STRIPES: usize = 64;

/// Upper bound accepted by `MapConfig` (4096 stripes)
/// Beyond this the per-stripe bookkeeping outweighs contention savings
pub const MAX_MAP_STRIPES: usize = 4096;

// =============================================================================
// DEMO BINARY
// =============================================================================

/// Default worker count for the demo pool
pub const DEFAULT_DEMO_WORKERS: usize = 4;

/// Default capacity of the demo pool's submission queue
pub const DEFAULT_DEMO_QUEUE_CAPACITY: usize = 8;
