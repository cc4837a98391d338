/*!
 * Bounded Blocking Queue
 * Fixed-capacity FIFO with blocking, timed and cancellable hand-off
 *
 * Two condition queues share one lock: producers sleep on `NOT_FULL`,
 * consumers on `NOT_EMPTY`. Each successful put wakes one consumer and
 * each successful take wakes one producer, so a signal is never spent on
 * a thread of the wrong kind.
 */

use super::wait::{Condition, Monitor, Wait};
use crate::core::errors::{ConfigError, ConfigResult, HandoffError, WaitResult};
use std::collections::VecDeque;
use std::time::Duration;

const NOT_EMPTY: Condition = Condition::new(0);
const NOT_FULL: Condition = Condition::new(1);

/// Bounded multi-producer multi-consumer FIFO queue
///
/// # Invariants
///
/// - `0 <= len() <= capacity()` at every observable instant
/// - Items leave in the order they were admitted
/// - A put or take that fails (timeout, cancellation) has no effect
///
/// # Example
///
/// ```
/// use sync_toolkit::BoundedQueue;
/// use std::time::Duration;
///
/// let queue = BoundedQueue::new(2).unwrap();
/// queue.put(1).unwrap();
/// assert!(queue.offer(2).is_ok());
/// assert_eq!(queue.offer(3), Err(3));
///
/// assert_eq!(queue.take(), Ok(1));
/// assert_eq!(queue.poll(), Some(2));
/// assert!(queue.take_timeout(Duration::from_millis(10)).is_err());
/// ```
pub struct BoundedQueue<T> {
    items: Monitor<VecDeque<T>>,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items
    pub fn new(capacity: usize) -> ConfigResult<Self> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity(capacity));
        }

        Ok(Self {
            items: Monitor::with_conditions(VecDeque::with_capacity(capacity), 2),
            capacity,
        })
    }

    /// Enqueue without blocking, handing the item back if the queue is full
    pub fn offer(&self, item: T) -> Result<(), T> {
        let mut items = self.items.lock();
        if items.len() >= self.capacity {
            return Err(item);
        }
        items.push_back(item);
        items.signal_one(NOT_EMPTY);
        Ok(())
    }

    /// Dequeue without blocking
    pub fn poll(&self) -> Option<T> {
        let mut items = self.items.lock();
        let item = items.pop_front()?;
        items.signal_one(NOT_FULL);
        Some(item)
    }

    /// Clone of the oldest item without removing it
    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.items.lock().front().cloned()
    }

    /// Move up to `max` items into `sink`, oldest first, without blocking
    ///
    /// Returns the number of items moved.
    pub fn drain_into(&self, sink: &mut Vec<T>, max: usize) -> usize {
        let mut items = self.items.lock();
        let count = items.len().min(max);
        sink.extend(items.drain(..count));
        if count > 0 {
            items.signal_all(NOT_FULL);
        }
        count
    }

    /// Discard every queued item
    pub fn clear(&self) {
        let mut items = self.items.lock();
        if !items.is_empty() {
            items.clear();
            items.signal_all(NOT_FULL);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.items.lock().len() >= self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free slots right now
    #[inline]
    pub fn remaining_capacity(&self) -> usize {
        self.capacity - self.items.lock().len()
    }
}

impl<T: Send + 'static> BoundedQueue<T> {
    /// Enqueue, blocking while the queue is full
    #[inline]
    pub fn put(&self, item: T) -> Result<(), HandoffError<T>> {
        self.put_with(item, &Wait::forever())
    }

    /// Enqueue, giving up after `timeout`
    #[inline]
    pub fn put_timeout(&self, item: T, timeout: Duration) -> Result<(), HandoffError<T>> {
        self.put_with(item, &Wait::timeout(timeout))
    }

    /// Enqueue with explicit wait options
    ///
    /// On timeout or cancellation the item is returned inside the error
    /// and the queue is unchanged.
    pub fn put_with(&self, item: T, wait: &Wait<'_>) -> Result<(), HandoffError<T>> {
        let capacity = self.capacity;
        let mut items = self.items.lock();

        if let Err(err) = items.wait_while(NOT_FULL, wait, |items| items.len() >= capacity) {
            return Err(HandoffError::from_wait(err, item));
        }

        items.push_back(item);
        items.signal_one(NOT_EMPTY);
        Ok(())
    }

    /// Dequeue, blocking while the queue is empty
    #[inline]
    pub fn take(&self) -> WaitResult<T> {
        self.take_with(&Wait::forever())
    }

    /// Dequeue, giving up after `timeout`
    #[inline]
    pub fn take_timeout(&self, timeout: Duration) -> WaitResult<T> {
        self.take_with(&Wait::timeout(timeout))
    }

    /// Dequeue with explicit wait options
    pub fn take_with(&self, wait: &Wait<'_>) -> WaitResult<T> {
        let mut items = self.items.lock();
        loop {
            items.wait_while(NOT_EMPTY, wait, |items| items.is_empty())?;

            if let Some(item) = items.pop_front() {
                items.signal_one(NOT_FULL);
                return Ok(item);
            }
        }
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
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
    use std::time::Instant;

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            BoundedQueue::<u8>::new(0).unwrap_err(),
            ConfigError::InvalidCapacity(0)
        );
    }

    #[test]
    fn test_fifo_order() {
        let queue = BoundedQueue::new(4).unwrap();
        for i in 0..4 {
            queue.put(i).unwrap();
        }
        assert!(queue.is_full());
        assert_eq!(queue.remaining_capacity(), 0);

        let taken: Vec<_> = (0..4).map(|_| queue.take().unwrap()).collect();
        assert_eq!(taken, vec![0, 1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_put_blocks_until_take() {
        let queue = Arc::new(BoundedQueue::new(3).unwrap());
        let completed = Arc::new(AtomicUsize::new(0));

        let producer = {
            let queue = queue.clone();
            let completed = completed.clone();
            thread::spawn(move || {
                for i in 1..=5 {
                    queue.put(i).unwrap();
                    completed.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        thread::sleep(Duration::from_millis(100));
        assert_eq!(completed.load(Ordering::SeqCst), 3);
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.take(), Ok(1));
        thread::sleep(Duration::from_millis(100));
        assert_eq!(completed.load(Ordering::SeqCst), 4);

        assert_eq!(queue.take(), Ok(2));
        producer.join().unwrap();
        assert_eq!(completed.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_timed_out_put_leaves_queue_unchanged() {
        let queue = BoundedQueue::new(1).unwrap();
        queue.put("first").unwrap();

        let start = Instant::now();
        let err = queue.put_timeout("second", Duration::from_millis(50)).unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(err.into_inner(), "second");
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.poll(), Some("first"));
        assert_eq!(queue.poll(), None);
    }

    #[test]
    fn test_take_timeout_on_empty() {
        let queue = BoundedQueue::<u32>::new(2).unwrap();
        assert_eq!(
            queue.take_timeout(Duration::from_millis(20)),
            Err(WaitError::Timeout)
        );
    }

    #[test]
    fn test_cancel_blocked_take() {
        let queue = Arc::new(BoundedQueue::<u32>::new(2).unwrap());
        let token = CancelToken::new();

        let consumer = {
            let queue = queue.clone();
            let token = token.clone();
            thread::spawn(move || queue.take_with(&Wait::forever().cancellable(&token)))
        };

        thread::sleep(Duration::from_millis(50));
        token.cancel();

        assert_eq!(consumer.join().unwrap(), Err(WaitError::Cancelled));
        // The queue still works for everyone else
        queue.put(7).unwrap();
        assert_eq!(queue.take(), Ok(7));
    }

    #[test]
    fn test_cancel_blocked_put_returns_item() {
        let queue = Arc::new(BoundedQueue::new(1).unwrap());
        queue.put(1).unwrap();
        let token = CancelToken::new();

        let producer = {
            let queue = queue.clone();
            let token = token.clone();
            thread::spawn(move || queue.put_with(2, &Wait::forever().cancellable(&token)))
        };

        thread::sleep(Duration::from_millis(50));
        token.cancel();

        let err = producer.join().unwrap().unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.into_inner(), 2);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_drain_wakes_producers() {
        let queue = Arc::new(BoundedQueue::new(2).unwrap());
        queue.put(1).unwrap();
        queue.put(2).unwrap();

        let producers: Vec<_> = (3..5)
            .map(|i| {
                let queue = queue.clone();
                thread::spawn(move || queue.put_timeout(i, Duration::from_secs(5)))
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        let mut sink = Vec::new();
        assert_eq!(queue.drain_into(&mut sink, 10), 2);
        assert_eq!(sink, vec![1, 2]);

        for producer in producers {
            assert!(producer.join().unwrap().is_ok());
        }
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_many_producers_consumers_conserve_items() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 250;

        let queue = Arc::new(BoundedQueue::new(8).unwrap());
        let sum = Arc::new(AtomicUsize::new(0));

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        queue.put(p * PER_PRODUCER + i).unwrap();
                    }
                })
            })
            .collect();

        let consumers: Vec<_> = (0..PRODUCERS)
            .map(|_| {
                let queue = queue.clone();
                let sum = sum.clone();
                thread::spawn(move || {
                    for _ in 0..PER_PRODUCER {
                        let value = queue.take().unwrap();
                        sum.fetch_add(value, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in producers.into_iter().chain(consumers) {
            handle.join().unwrap();
        }

        let n = PRODUCERS * PER_PRODUCER;
        assert_eq!(sum.load(Ordering::SeqCst), n * (n - 1) / 2);
        assert!(queue.is_empty());
    }
}
