/*!
 * Cooperative Cancellation
 *
 * A `CancelToken` is the interruption handle for blocked threads. Any
 * number of waits can be registered with one token; `cancel()` wakes all
 * of them and every later wait on the token fails fast.
 *
 * # Lock Ordering
 *
 * Waiters register while holding their monitor's lock, so registration
 * takes monitor -> token. `cancel()` drains the registry under the token
 * lock and only then knocks on the monitors, so it never holds both.
 */

use super::traits::Wakeable;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

struct Registry {
    next_id: u64,
    waiters: Vec<(u64, Weak<dyn Wakeable>)>,
}

struct CancelInner {
    cancelled: AtomicBool,
    registry: Mutex<Registry>,
}

/// Shareable cancellation flag for blocking waits
///
/// Clones share the same flag. Cancellation is sticky: once cancelled, a
/// token stays cancelled.
///
/// # Example
///
/// ```
/// use sync_toolkit::{BoundedQueue, CancelToken, Wait, WaitError};
/// use std::sync::Arc;
/// use std::thread;
///
/// let queue = Arc::new(BoundedQueue::<u32>::new(4).unwrap());
/// let token = CancelToken::new();
///
/// let consumer = {
///     let queue = queue.clone();
///     let token = token.clone();
///     thread::spawn(move || queue.take_with(&Wait::forever().cancellable(&token)))
/// };
///
/// token.cancel();
/// assert_eq!(consumer.join().unwrap(), Err(WaitError::Cancelled));
/// ```
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                registry: Mutex::new(Registry {
                    next_id: 0,
                    waiters: Vec::new(),
                }),
            }),
        }
    }

    /// Cancel every current and future wait using this token
    pub fn cancel(&self) {
        let waiters = {
            let mut registry = self.inner.registry.lock();
            if self.inner.cancelled.swap(true, Ordering::AcqRel) {
                return;
            }
            std::mem::take(&mut registry.waiters)
        };

        debug!(waiters = waiters.len(), "cancellation fired");

        for (_, waiter) in waiters {
            if let Some(target) = waiter.upgrade() {
                target.wake_all_waiters();
            }
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Register a monitor to be woken on cancellation
    ///
    /// Returns `None` if the token is already cancelled. The registration
    /// is removed when the returned guard drops.
    pub(crate) fn register(&self, target: Weak<dyn Wakeable>) -> Option<Registration<'_>> {
        let mut registry = self.inner.registry.lock();
        if self.inner.cancelled.load(Ordering::Acquire) {
            return None;
        }
        let id = registry.next_id;
        registry.next_id += 1;
        registry.waiters.push((id, target));
        Some(Registration { token: self, id })
    }

    #[cfg(test)]
    fn registered(&self) -> usize {
        self.inner.registry.lock().waiters.len()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Scoped registration of one wait with a token
pub(crate) struct Registration<'a> {
    token: &'a CancelToken,
    id: u64,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        let id = self.id;
        self.token
            .inner
            .registry
            .lock()
            .waiters
            .retain(|(entry, _)| *entry != id);
    }
}
