/*!
 * Countdown Latch
 * One-shot gate that opens when its count reaches zero
 */

use super::wait::{Condition, Monitor, Wait};
use crate::core::errors::WaitResult;
use std::time::Duration;
use tracing::debug;

/// One-shot descending gate
///
/// The count only ever goes down. Once it reaches zero every current
/// waiter is released in the same critical section, and every later
/// `wait` returns immediately.
///
/// # Example
///
/// ```
/// use sync_toolkit::CountdownLatch;
/// use std::sync::Arc;
/// use std::thread;
///
/// let latch = Arc::new(CountdownLatch::new(3));
/// for _ in 0..3 {
///     let latch = latch.clone();
///     thread::spawn(move || latch.count_down());
/// }
///
/// latch.wait().unwrap();
/// assert_eq!(latch.count(), 0);
/// ```
pub struct CountdownLatch {
    count: Monitor<usize>,
}

impl CountdownLatch {
    /// Create a latch that opens after `count` calls to `count_down`
    ///
    /// A latch created with zero is already open.
    pub fn new(count: usize) -> Self {
        Self {
            count: Monitor::new(count),
        }
    }

    /// Decrement the count, opening the latch when it reaches zero
    ///
    /// Calling this on an open latch does nothing.
    pub fn count_down(&self) {
        let mut count = self.count.lock();
        if *count == 0 {
            return;
        }

        *count -= 1;
        if *count == 0 {
            let woken = count.signal_all(Condition::DEFAULT);
            debug!(waiters = woken.count(), "latch opened");
        }
    }

    /// Current count
    #[inline]
    pub fn count(&self) -> usize {
        *self.count.lock()
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.count() == 0
    }

    /// Block until the latch opens
    #[inline]
    pub fn wait(&self) -> WaitResult<()> {
        self.wait_with(&Wait::forever())
    }

    /// Block until the latch opens or `timeout` elapses
    #[inline]
    pub fn wait_timeout(&self, timeout: Duration) -> WaitResult<()> {
        self.wait_with(&Wait::timeout(timeout))
    }

    /// Block until the latch opens, with explicit wait options
    pub fn wait_with(&self, wait: &Wait<'_>) -> WaitResult<()> {
        let mut count = self.count.lock();
        count.wait_while(Condition::DEFAULT, wait, |count| *count > 0)
    }
}

impl std::fmt::Debug for CountdownLatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountdownLatch")
            .field("count", &self.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::WaitError;
    use crate::core::sync::wait::CancelToken;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_zero_latch_is_open() {
        let latch = CountdownLatch::new(0);
        assert!(latch.is_open());
        assert!(latch.wait_timeout(Duration::ZERO).is_ok());
        latch.count_down();
        assert_eq!(latch.count(), 0);
    }

    #[test]
    fn test_wait_released_after_all_count_downs() {
        let latch = Arc::new(CountdownLatch::new(3));
        let counted = Arc::new(AtomicUsize::new(0));

        for i in 0..3u64 {
            let latch = latch.clone();
            let counted = counted.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20 * (i + 1)));
                counted.fetch_add(1, Ordering::SeqCst);
                latch.count_down();
            });
        }

        latch.wait().unwrap();
        assert_eq!(counted.load(Ordering::SeqCst), 3);

        // Extra count downs never push the count below zero
        latch.count_down();
        assert_eq!(latch.count(), 0);
    }

    #[test]
    fn test_all_waiters_released_together() {
        let latch = Arc::new(CountdownLatch::new(1));

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let latch = latch.clone();
                thread::spawn(move || latch.wait_timeout(Duration::from_secs(5)))
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        latch.count_down();

        for waiter in waiters {
            assert!(waiter.join().unwrap().is_ok());
        }
    }

    #[test]
    fn test_wait_timeout() {
        let latch = CountdownLatch::new(2);
        latch.count_down();
        assert_eq!(
            latch.wait_timeout(Duration::from_millis(30)),
            Err(WaitError::Timeout)
        );
        assert_eq!(latch.count(), 1);
    }

    #[test]
    fn test_cancel_does_not_touch_count() {
        let latch = Arc::new(CountdownLatch::new(2));
        let token = CancelToken::new();

        let waiter = {
            let latch = latch.clone();
            let token = token.clone();
            thread::spawn(move || latch.wait_with(&Wait::forever().cancellable(&token)))
        };

        thread::sleep(Duration::from_millis(50));
        token.cancel();

        assert_eq!(waiter.join().unwrap(), Err(WaitError::Cancelled));
        assert_eq!(latch.count(), 2);
    }
}
