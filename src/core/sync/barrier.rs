/*!
 * Cyclic Barrier
 * Reusable N-party rendezvous with an optional per-generation action
 *
 * # Generations
 *
 * Each cycle of the barrier is a generation. Waiters remember the
 * generation they arrived in and compare by identity when they wake:
 *
 * - generation replaced, not broken: the barrier tripped, release
 * - generation broken: fail with `Broken`
 * - otherwise: keep waiting
 *
 * A broken generation stays broken (and the barrier unusable) until
 * `reset()` installs a fresh one.
 */

use super::wait::{Condition, Monitor, MonitorGuard, Wait};
use crate::core::errors::{BarrierError, BarrierResult, ConfigError, ConfigResult};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

type BarrierAction = Box<dyn FnMut() + Send + 'static>;

// Only touched under the barrier's monitor lock, hence relaxed ordering
struct Generation {
    id: u64,
    broken: AtomicBool,
}

impl Generation {
    fn new(id: u64) -> Arc<Self> {
        Arc::new(Self {
            id,
            broken: AtomicBool::new(false),
        })
    }

    #[inline]
    fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Relaxed)
    }
}

struct BarrierState {
    generation: Arc<Generation>,
    arrived: usize,
    action: Option<BarrierAction>,
}

/// Reusable rendezvous point for a fixed number of threads
///
/// # Example
///
/// ```
/// use sync_toolkit::CyclicBarrier;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::thread;
///
/// let trips = Arc::new(AtomicUsize::new(0));
/// let barrier = {
///     let trips = trips.clone();
///     Arc::new(CyclicBarrier::with_action(3, move || {
///         trips.fetch_add(1, Ordering::SeqCst);
///     }).unwrap())
/// };
///
/// let handles: Vec<_> = (0..3)
///     .map(|_| {
///         let barrier = barrier.clone();
///         thread::spawn(move || barrier.wait())
///     })
///     .collect();
///
/// for handle in handles {
///     handle.join().unwrap().unwrap();
/// }
/// assert_eq!(trips.load(Ordering::SeqCst), 1);
/// ```
pub struct CyclicBarrier {
    state: Monitor<BarrierState>,
    parties: usize,
}

impl CyclicBarrier {
    /// Create a barrier for `parties` threads
    pub fn new(parties: usize) -> ConfigResult<Self> {
        Self::build(parties, None)
    }

    /// Create a barrier whose last arriving thread runs `action` before
    /// anyone is released
    ///
    /// The action runs while the barrier's lock is held: it must not wait
    /// on this barrier or cancel a token one of its participants is using.
    pub fn with_action<F>(parties: usize, action: F) -> ConfigResult<Self>
    where
        F: FnMut() + Send + 'static,
    {
        Self::build(parties, Some(Box::new(action)))
    }

    fn build(parties: usize, action: Option<BarrierAction>) -> ConfigResult<Self> {
        if parties == 0 {
            return Err(ConfigError::InvalidParties(parties));
        }

        Ok(Self {
            state: Monitor::new(BarrierState {
                generation: Generation::new(0),
                arrived: 0,
                action,
            }),
            parties,
        })
    }

    #[inline]
    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Threads currently blocked in this generation
    pub fn number_waiting(&self) -> usize {
        self.state.lock().arrived
    }

    pub fn is_broken(&self) -> bool {
        self.state.lock().generation.is_broken()
    }

    /// Break the current generation and start a fresh one
    ///
    /// Threads waiting in the old generation fail with `Broken`.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let id = state.generation.id;
        Self::break_generation(&mut state);
        Self::next_generation(&mut state, id + 1);
        debug!(generation = id + 1, "barrier reset");
    }

    /// Wait until all parties have arrived
    ///
    /// Returns the arrival index: `parties - 1` for the first thread to
    /// arrive, `0` for the last (which also ran the action).
    #[inline]
    pub fn wait(&self) -> BarrierResult<usize> {
        self.wait_with(&Wait::forever())
    }

    /// Wait until all parties have arrived or `timeout` elapses
    #[inline]
    pub fn wait_timeout(&self, timeout: Duration) -> BarrierResult<usize> {
        self.wait_with(&Wait::timeout(timeout))
    }

    /// Wait with explicit wait options
    ///
    /// If this caller times out or is cancelled before the barrier trips,
    /// it breaks the generation: it reports its own `Timeout`/`Cancelled`
    /// and every other participant of the generation reports `Broken`.
    pub fn wait_with(&self, wait: &Wait<'_>) -> BarrierResult<usize> {
        let mut state = self.state.lock();
        let generation = Arc::clone(&state.generation);
        let id = generation.id;

        if generation.is_broken() {
            return Err(BarrierError::Broken);
        }

        if wait.is_cancelled() {
            Self::break_generation(&mut state);
            return Err(BarrierError::Cancelled);
        }

        state.arrived += 1;
        let index = self.parties - state.arrived;

        if index == 0 {
            return self.trip(&mut state, id);
        }

        let result = state.wait_while(Condition::DEFAULT, wait, |state| {
            Arc::ptr_eq(&state.generation, &generation) && !generation.is_broken()
        });

        if generation.is_broken() {
            return Err(BarrierError::Broken);
        }

        match result {
            Ok(()) => Ok(index),
            // The generation tripped while we were giving up
            Err(_) if !Arc::ptr_eq(&state.generation, &generation) => Ok(index),
            Err(err) => {
                Self::break_generation(&mut state);
                warn!(generation = id, error = %err, "barrier broken by waiter");
                Err(err.into())
            }
        }
    }

    fn trip(&self, state: &mut MonitorGuard<'_, BarrierState>, id: u64) -> BarrierResult<usize> {
        if let Some(action) = state.action.as_mut() {
            if catch_unwind(AssertUnwindSafe(action)).is_err() {
                Self::break_generation(state);
                warn!(generation = id, "barrier action panicked");
                return Err(BarrierError::ActionPanicked);
            }
        }

        Self::next_generation(state, id + 1);
        debug!(generation = id, parties = self.parties, "barrier tripped");
        Ok(0)
    }

    fn break_generation(state: &mut MonitorGuard<'_, BarrierState>) {
        state.generation.broken.store(true, Ordering::Relaxed);
        state.arrived = 0;
        state.signal_all(Condition::DEFAULT);
    }

    fn next_generation(state: &mut MonitorGuard<'_, BarrierState>, id: u64) {
        state.generation = Generation::new(id);
        state.arrived = 0;
        state.signal_all(Condition::DEFAULT);
    }
}

impl std::fmt::Debug for CyclicBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CyclicBarrier")
            .field("parties", &self.parties)
            .field("arrived", &state.arrived)
            .field("generation", &state.generation.id)
            .field("broken", &state.generation.is_broken())
            .finish()
    }
}
