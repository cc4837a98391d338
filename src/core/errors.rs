/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for monitor-level waits
pub type WaitResult<T> = Result<T, WaitError>;

/// Result type for barrier waits
pub type BarrierResult<T> = Result<T, BarrierError>;

/// Result type for constructors that validate their configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Rejected construction parameters
///
/// Only ever returned from constructors; a primitive that was built
/// successfully never reports a configuration problem later.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("Invalid queue capacity: {0}")]
    #[diagnostic(
        code(config::invalid_capacity),
        help("A bounded queue needs room for at least one item.")
    )]
    InvalidCapacity(usize),

    #[error("Invalid barrier party count: {0}")]
    #[diagnostic(
        code(config::invalid_parties),
        help("A barrier needs at least one participating thread.")
    )]
    InvalidParties(usize),

    #[error("Invalid stripe count: {0}")]
    #[diagnostic(
        code(config::invalid_stripes),
        help("Stripe count must be a non-zero power of two.")
    )]
    InvalidStripes(usize),
}

/// Wait operation errors
///
/// Neither variant means the protected state was touched: a wait that
/// ends in error has not produced any side effect.
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WaitError {
    #[error("Wait operation timed out")]
    Timeout,

    #[error("Wait was cancelled")]
    Cancelled,
}

impl WaitError {
    /// Check whether the wait ran out of time
    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout)
    }

    /// Check whether the wait was cancelled through its token
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaitError::Cancelled)
    }
}

/// A blocking hand-off that did not happen
///
/// Carries the caller's item back so a timed out or cancelled `put` or
/// `exchange` never loses or duplicates it.
#[derive(Error, Clone, PartialEq, Eq)]
pub enum HandoffError<T> {
    #[error("Hand-off timed out")]
    Timeout(T),

    #[error("Hand-off was cancelled")]
    Cancelled(T),
}

impl<T> HandoffError<T> {
    pub(crate) fn from_wait(err: WaitError, item: T) -> Self {
        match err {
            WaitError::Timeout => HandoffError::Timeout(item),
            WaitError::Cancelled => HandoffError::Cancelled(item),
        }
    }

    /// Recover the item that was not handed off
    #[inline]
    pub fn into_inner(self) -> T {
        match self {
            HandoffError::Timeout(item) | HandoffError::Cancelled(item) => item,
        }
    }

    /// The wait status that caused the rejection
    #[inline]
    pub fn kind(&self) -> WaitError {
        match self {
            HandoffError::Timeout(_) => WaitError::Timeout,
            HandoffError::Cancelled(_) => WaitError::Cancelled,
        }
    }

    #[inline]
    pub fn is_timeout(&self) -> bool {
        self.kind().is_timeout()
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.kind().is_cancelled()
    }
}

// Items are frequently not Debug (boxed tasks), so only the kind is printed
impl<T> fmt::Debug for HandoffError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandoffError::Timeout(_) => f.write_str("Timeout(..)"),
            HandoffError::Cancelled(_) => f.write_str("Cancelled(..)"),
        }
    }
}

impl<T> From<HandoffError<T>> for WaitError {
    fn from(err: HandoffError<T>) -> Self {
        err.kind()
    }
}

/// Barrier wait errors
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BarrierError {
    /// Another participant of this generation failed, or the barrier was reset
    #[error("Barrier generation is broken")]
    Broken,

    /// This caller ran out of time and broke the generation
    #[error("Barrier wait timed out")]
    Timeout,

    /// This caller was cancelled and broke the generation
    #[error("Barrier wait was cancelled")]
    Cancelled,

    /// The barrier action panicked on this thread and broke the generation
    #[error("Barrier action panicked")]
    ActionPanicked,
}

impl From<WaitError> for BarrierError {
    fn from(err: WaitError) -> Self {
        match err {
            WaitError::Timeout => BarrierError::Timeout,
            WaitError::Cancelled => BarrierError::Cancelled,
        }
    }
}
