/*!
 * Wait Options
 *
 * Every blocking call takes a `Wait`: how long it may sleep and which
 * token may cancel it. Relative timeouts are turned into a deadline when
 * the wait starts, so re-waits after spurious wakeups never extend it.
 */

use super::cancel::CancelToken;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Limit {
    Forever,
    After(Duration),
    At(Instant),
}

/// Per-call wait options
///
/// # Example
///
/// ```
/// use sync_toolkit::{CancelToken, Wait};
/// use std::time::Duration;
///
/// let token = CancelToken::new();
/// let wait = Wait::timeout(Duration::from_millis(250)).cancellable(&token);
/// assert_eq!(wait.timeout_hint(), Some(Duration::from_millis(250)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Wait<'a> {
    limit: Limit,
    cancel: Option<&'a CancelToken>,
}

impl<'a> Wait<'a> {
    /// Block until the condition holds
    pub const fn forever() -> Self {
        Self {
            limit: Limit::Forever,
            cancel: None,
        }
    }

    /// Block for at most `timeout`, measured from the start of the call
    pub const fn timeout(timeout: Duration) -> Self {
        Self {
            limit: Limit::After(timeout),
            cancel: None,
        }
    }

    /// Block until an absolute deadline
    pub const fn deadline(deadline: Instant) -> Self {
        Self {
            limit: Limit::At(deadline),
            cancel: None,
        }
    }

    /// Optional timeout, `None` meaning forever
    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        match timeout {
            Some(timeout) => Self::timeout(timeout),
            None => Self::forever(),
        }
    }

    /// Attach a cancellation token
    #[must_use]
    pub fn cancellable(mut self, token: &'a CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[inline]
    pub fn cancel_token(&self) -> Option<&'a CancelToken> {
        self.cancel
    }

    /// Relative timeout this wait was built with, if any
    pub fn timeout_hint(&self) -> Option<Duration> {
        match self.limit {
            Limit::After(timeout) => Some(timeout),
            Limit::At(deadline) => Some(deadline.saturating_duration_since(Instant::now())),
            Limit::Forever => None,
        }
    }

    /// Resolve to an absolute deadline starting now
    ///
    /// Timeouts too large to represent behave like `forever`.
    #[inline]
    pub(crate) fn resolve(&self) -> Option<Instant> {
        match self.limit {
            Limit::Forever => None,
            Limit::After(timeout) => Instant::now().checked_add(timeout),
            Limit::At(deadline) => Some(deadline),
        }
    }

    #[inline]
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.map_or(false, CancelToken::is_cancelled)
    }
}

impl Default for Wait<'_> {
    fn default() -> Self {
        Self::forever()
    }
}

impl From<Duration> for Wait<'_> {
    fn from(timeout: Duration) -> Self {
        Self::timeout(timeout)
    }
}

impl From<Option<Duration>> for Wait<'_> {
    fn from(timeout: Option<Duration>) -> Self {
        Self::from_timeout(timeout)
    }
}
