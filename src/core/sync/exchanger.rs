/*!
 * Exchanger
 * Pairwise synchronous swap of values between two threads
 *
 * The first thread to arrive posts its value in the single pending slot
 * and sleeps. The second takes the posted value, leaves its own value as
 * the reply for that exchange and returns at once. A third thread finds
 * the slot empty again and starts a new pending exchange.
 *
 * Replies are keyed by exchange id, so a poster that has not woken up
 * yet never collides with a later pair.
 */

use super::wait::{Condition, Monitor, Wait};
use crate::core::errors::HandoffError;
use std::time::Duration;
use tracing::trace;

struct Pending<T> {
    id: u64,
    item: T,
}

struct ExchangeState<T> {
    next_id: u64,
    pending: Option<Pending<T>>,
    replies: Vec<(u64, T)>,
}

impl<T> ExchangeState<T> {
    fn take_reply(&mut self, id: u64) -> Option<T> {
        let pos = self.replies.iter().position(|(reply, _)| *reply == id)?;
        Some(self.replies.swap_remove(pos).1)
    }

    fn has_reply(&self, id: u64) -> bool {
        self.replies.iter().any(|(reply, _)| *reply == id)
    }
}

/// Rendezvous point where two threads swap values
///
/// # Example
///
/// ```
/// use sync_toolkit::Exchanger;
/// use std::sync::Arc;
/// use std::thread;
///
/// let exchanger = Arc::new(Exchanger::new());
///
/// let a = {
///     let exchanger = exchanger.clone();
///     thread::spawn(move || exchanger.exchange("a"))
/// };
/// let b = exchanger.exchange("b").unwrap();
///
/// assert_eq!(b, "a");
/// assert_eq!(a.join().unwrap().unwrap(), "b");
/// ```
pub struct Exchanger<T> {
    state: Monitor<ExchangeState<T>>,
}

impl<T> Exchanger<T> {
    pub fn new() -> Self {
        Self {
            state: Monitor::new(ExchangeState {
                next_id: 0,
                pending: None,
                replies: Vec::new(),
            }),
        }
    }

    /// Whether a thread is currently waiting for a partner
    pub fn has_waiter(&self) -> bool {
        self.state.lock().pending.is_some()
    }
}

impl<T: Send + 'static> Exchanger<T> {
    /// Swap `item` with the next thread to call `exchange`
    #[inline]
    pub fn exchange(&self, item: T) -> Result<T, HandoffError<T>> {
        self.exchange_with(item, &Wait::forever())
    }

    /// Swap `item`, giving up after `timeout`
    #[inline]
    pub fn exchange_timeout(&self, item: T, timeout: Duration) -> Result<T, HandoffError<T>> {
        self.exchange_with(item, &Wait::timeout(timeout))
    }

    /// Swap `item` with explicit wait options
    ///
    /// If the wait ends before a partner arrives, the caller's own item is
    /// returned inside the error and nothing was exchanged. If a partner
    /// completed the swap just as the wait ended, the swap wins.
    pub fn exchange_with(&self, item: T, wait: &Wait<'_>) -> Result<T, HandoffError<T>> {
        let mut state = self.state.lock();

        if let Some(Pending { id, item: theirs }) = state.pending.take() {
            state.replies.push((id, item));
            state.signal_all(Condition::DEFAULT);
            trace!(exchange = id, "exchange completed by partner");
            return Ok(theirs);
        }

        if wait.is_cancelled() {
            return Err(HandoffError::Cancelled(item));
        }

        let id = state.next_id;
        state.next_id += 1;
        state.pending = Some(Pending { id, item });
        trace!(exchange = id, "exchange posted");

        // Under the lock exactly one of "reply for id" and "offer with id" exists,
        // so every pass returns from one of the arms below
        loop {
            let waited = state.wait_while(Condition::DEFAULT, wait, |state| !state.has_reply(id));

            // A reply wins even when the wait itself gave up
            if let Some(theirs) = state.take_reply(id) {
                return Ok(theirs);
            }

            if let Err(err) = waited {
                if let Some(Pending { item, .. }) = state.pending.take_if(|pending| pending.id == id) {
                    trace!(exchange = id, error = %err, "exchange withdrawn");
                    return Err(HandoffError::from_wait(err, item));
                }
            }
        }
    }
}

impl<T> Default for Exchanger<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Exchanger<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchanger")
            .field("has_waiter", &self.has_waiter())
            .finish()
    }
}
