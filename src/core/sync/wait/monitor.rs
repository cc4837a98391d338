/*!
 * Monitor
 *
 * Mutual exclusion paired with one or more condition queues. Every
 * blocking primitive in this crate is a `Monitor` around its state plus a
 * predicate-guarded wait loop.
 *
 * # Wait Protocol
 *
 * `wait_while` re-checks its predicate after every wakeup, whatever the
 * reason (notify, spurious, timeout, cancellation). A predicate that has
 * become false wins over a timeout or a cancellation that raced with it,
 * so a caller never reports failure while the condition it waited for
 * actually holds.
 *
 * Signaling never releases the lock; woken threads contend for it once
 * the signaling guard drops.
 */

use super::cancel::CancelToken;
use super::options::Wait;
use super::traits::{Wakeable, WakeResult};
use crate::core::errors::{WaitError, WaitResult};
use crate::core::limits::DEFAULT_MONITOR_CONDITIONS;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Index of one condition queue within a monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Condition(usize);

impl Condition {
    /// The condition every monitor has
    pub const DEFAULT: Condition = Condition(0);

    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(&self) -> usize {
        self.0
    }
}

struct MonitorCore<T> {
    state: Mutex<T>,
    conditions: Box<[Condvar]>,
}

impl<T> MonitorCore<T> {
    #[inline]
    fn condvar(&self, condition: Condition) -> &Condvar {
        &self.conditions[condition.0]
    }
}

impl<T: Send> Wakeable for MonitorCore<T> {
    fn wake_all_waiters(&self) {
        // Taking the lock orders this wake after any in-flight cancellation check
        let _guard = self.state.lock();
        for condvar in self.conditions.iter() {
            condvar.notify_all();
        }
    }
}

/// Lock plus condition queues around a piece of state
///
/// # Example
///
/// ```
/// use sync_toolkit::{Condition, Monitor, Wait};
/// use std::sync::Arc;
/// use std::thread;
///
/// let monitor = Arc::new(Monitor::new(false));
///
/// let waiter = {
///     let monitor = monitor.clone();
///     thread::spawn(move || {
///         let mut ready = monitor.lock();
///         ready.wait_while(Condition::DEFAULT, &Wait::forever(), |ready| !*ready)
///     })
/// };
///
/// {
///     let mut ready = monitor.lock();
///     *ready = true;
///     ready.signal_all(Condition::DEFAULT);
/// }
///
/// assert!(waiter.join().unwrap().is_ok());
/// ```
pub struct Monitor<T> {
    core: Arc<MonitorCore<T>>,
}

impl<T> Monitor<T> {
    /// Create a monitor with a single condition queue
    pub fn new(state: T) -> Self {
        Self::with_conditions(state, DEFAULT_MONITOR_CONDITIONS)
    }

    /// Create a monitor with `conditions` independent condition queues
    ///
    /// At least one queue is always allocated.
    pub fn with_conditions(state: T, conditions: usize) -> Self {
        let conditions = (0..conditions.max(1)).map(|_| Condvar::new()).collect();
        Self {
            core: Arc::new(MonitorCore {
                state: Mutex::new(state),
                conditions,
            }),
        }
    }

    /// Block until this thread holds the lock
    #[inline]
    pub fn lock(&self) -> MonitorGuard<'_, T> {
        MonitorGuard {
            core: &self.core,
            guard: self.core.state.lock(),
        }
    }

    /// Acquire the lock only if it is free right now
    #[inline]
    pub fn try_lock(&self) -> Option<MonitorGuard<'_, T>> {
        self.core.state.try_lock().map(|guard| MonitorGuard {
            core: &self.core,
            guard,
        })
    }

    /// Acquire the lock, giving up after `timeout`
    pub fn try_lock_for(&self, timeout: Duration) -> Option<MonitorGuard<'_, T>> {
        self.core.state.try_lock_for(timeout).map(|guard| MonitorGuard {
            core: &self.core,
            guard,
        })
    }

    /// Number of condition queues
    #[inline]
    pub fn conditions(&self) -> usize {
        self.core.conditions.len()
    }
}

impl<T: Default> Default for Monitor<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Monitor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut d = f.debug_struct("Monitor");
        match self.core.state.try_lock() {
            Some(state) => d.field("state", &&*state),
            None => d.field("state", &format_args!("<locked>")),
        };
        d.field("conditions", &self.conditions()).finish()
    }
}

/// Exclusive access to a monitor's state
///
/// Dropping the guard releases the lock.
pub struct MonitorGuard<'a, T> {
    core: &'a Arc<MonitorCore<T>>,
    guard: MutexGuard<'a, T>,
}

impl<'a, T> MonitorGuard<'a, T> {
    /// Wake one thread waiting on `condition`
    ///
    /// # Panics
    ///
    /// Panics if `condition` is not one of this monitor's queues.
    #[inline]
    pub fn signal_one(&self, condition: Condition) -> WakeResult {
        WakeResult::from_count(self.core.condvar(condition).notify_one() as usize)
    }

    /// Wake every thread waiting on `condition`
    ///
    /// # Panics
    ///
    /// Panics if `condition` is not one of this monitor's queues.
    #[inline]
    pub fn signal_all(&self, condition: Condition) -> WakeResult {
        WakeResult::from_count(self.core.condvar(condition).notify_all())
    }

    /// Wake every waiter on every condition queue
    pub fn broadcast(&self) -> WakeResult {
        let woken = self
            .core
            .conditions
            .iter()
            .map(|condvar| condvar.notify_all())
            .sum();
        WakeResult::from_count(woken)
    }
}

impl<'a, T: Send + 'static> MonitorGuard<'a, T> {
    /// Wait on `condition` while `blocked` returns true
    ///
    /// The lock is released while sleeping and held again whenever
    /// `blocked` runs and when this returns. On `Ok(())` the predicate has
    /// just returned false under the lock. On error the predicate was
    /// still true and the state was left as the caller had it.
    ///
    /// # Panics
    ///
    /// Panics if `condition` is not one of this monitor's queues.
    pub fn wait_while<F>(&mut self, condition: Condition, wait: &Wait<'_>, mut blocked: F) -> WaitResult<()>
    where
        F: FnMut(&mut T) -> bool,
    {
        if !blocked(&mut *self.guard) {
            return Ok(());
        }

        let deadline = wait.resolve();
        let _registration = match wait.cancel_token() {
            Some(token) => Some(self.register(token)?),
            None => None,
        };
        let condvar = self.core.condvar(condition);

        loop {
            if wait.is_cancelled() {
                return Err(WaitError::Cancelled);
            }

            match deadline {
                Some(deadline) => {
                    if condvar.wait_until(&mut self.guard, deadline).timed_out() {
                        return if blocked(&mut *self.guard) {
                            Err(WaitError::Timeout)
                        } else {
                            Ok(())
                        };
                    }
                }
                None => condvar.wait(&mut self.guard),
            }

            if !blocked(&mut *self.guard) {
                return Ok(());
            }
        }
    }

    fn register<'t>(&self, token: &'t CancelToken) -> WaitResult<super::cancel::Registration<'t>> {
        let target: Weak<dyn Wakeable> = Arc::downgrade(self.core) as Weak<dyn Wakeable>;
        token.register(target).ok_or(WaitError::Cancelled)
    }
}

impl<T> Deref for MonitorGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for MonitorGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}
