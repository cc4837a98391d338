/*!
 * Structured Tracing
 * Subscriber setup and timed spans for coordination scenarios
 *
 * Features:
 * - Environment-driven filter and output format
 * - JSON-formatted logs for structured parsing
 * - Timed operation spans with slow-operation warnings
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level, Span};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Operations slower than this are reported at warn level
const SLOW_OPERATION: Duration = Duration::from_millis(500);

static NEXT_OPERATION_ID: AtomicU64 = AtomicU64::new(1);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SYNC_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("SYNC_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    if result.is_ok() {
        info!(json = use_json, "structured tracing initialized");
    }
}

/// Timed span around one named operation
///
/// Logs its duration when dropped: `debug` normally, `warn` past the slow
/// threshold.
pub struct OperationSpan {
    span: Span,
    start: Instant,
    operation: &'static str,
    id: u64,
}

impl OperationSpan {
    pub fn new(operation: &'static str) -> Self {
        let id = NEXT_OPERATION_ID.fetch_add(1, Ordering::Relaxed);
        let span = span!(
            Level::INFO,
            "operation",
            op_id = id,
            operation = operation,
            items = tracing::field::Empty,
        );

        let _entered = span.enter();
        debug!(operation, op_id = id, "operation started");
        drop(_entered);

        Self {
            span,
            start: Instant::now(),
            operation,
            id,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Record how many items the operation handled
    pub fn record_items(&self, count: usize) {
        self.span.record("items", count);
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();

        if duration > SLOW_OPERATION {
            warn!(
                operation = self.operation,
                op_id = self.id,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow operation detected"
            );
        } else {
            debug!(
                operation = self.operation,
                op_id = self.id,
                duration_us = duration.as_micros() as u64,
                "operation completed"
            );
        }
    }
}

/// Helper to create an operation span
#[inline]
pub fn span_operation(name: &'static str) -> OperationSpan {
    OperationSpan::new(name)
}
