/*!
 * Wake Reporting
 *
 * Compact result of a signal operation, shared by every primitive built
 * on the monitor.
 */

/// Result of a wake operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeResult {
    /// Successfully woke N waiters (N >= 1)
    Woken(usize),
    /// No waiters were waiting
    NoWaiters,
}

impl WakeResult {
    #[inline(always)]
    pub(crate) fn from_count(count: usize) -> Self {
        if count == 0 {
            WakeResult::NoWaiters
        } else {
            WakeResult::Woken(count)
        }
    }

    /// Check if any waiters were woken
    #[inline(always)]
    pub fn is_woken(&self) -> bool {
        matches!(self, WakeResult::Woken(_))
    }

    /// Get number of woken waiters (0 if none)
    #[inline(always)]
    pub fn count(&self) -> usize {
        match self {
            WakeResult::Woken(n) => *n,
            WakeResult::NoWaiters => 0,
        }
    }
}

/// Something a cancellation can knock on
///
/// Implementors must take the same lock their waiters release while
/// sleeping before notifying, otherwise a wake can slip in between a
/// waiter's cancellation check and its sleep.
pub(crate) trait Wakeable: Send + Sync {
    fn wake_all_waiters(&self);
}
