/*!
 * Bounded Queue Tests
 * Blocking hand-off, conservation under contention, and a worker pool
 * built from the queue
 */

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use sync_toolkit::{BoundedQueue, BoxedTask, CancelToken, ConfigError, Wait, WaitError};

#[test]
fn test_zero_capacity_rejected() {
    assert_eq!(
        BoundedQueue::<u32>::new(0).unwrap_err(),
        ConfigError::InvalidCapacity(0)
    );
}

#[test]
fn test_producer_blocks_on_fourth_put() {
    let queue = Arc::new(BoundedQueue::new(3).unwrap());
    let completed = Arc::new(AtomicUsize::new(0));

    let producer = {
        let queue = queue.clone();
        let completed = completed.clone();
        thread::spawn(move || {
            for item in 1..=5 {
                queue.put(item).unwrap();
                completed.fetch_add(1, Ordering::SeqCst);
            }
        })
    };

    thread::sleep(Duration::from_millis(80));
    assert_eq!(completed.load(Ordering::SeqCst), 3);
    assert!(queue.is_full());

    assert_eq!(queue.take().unwrap(), 1);
    while completed.load(Ordering::SeqCst) < 4 {
        thread::sleep(Duration::from_millis(5));
    }
    thread::sleep(Duration::from_millis(30));
    assert_eq!(completed.load(Ordering::SeqCst), 4);

    let rest: Vec<i32> = (0..4).map(|_| queue.take().unwrap()).collect();
    producer.join().unwrap();

    assert_eq!(rest, vec![2, 3, 4, 5]);
    assert!(queue.is_empty());
}

#[test]
fn test_offer_poll_never_block() {
    let queue = BoundedQueue::new(1).unwrap();
    assert_eq!(queue.poll(), None);
    assert_eq!(queue.offer('a'), Ok(()));
    assert_eq!(queue.offer('b'), Err('b'));
    assert_eq!(queue.peek(), Some('a'));
    assert_eq!(queue.poll(), Some('a'));
}

#[test]
fn test_timed_out_put_does_not_insert() {
    let queue = BoundedQueue::new(1).unwrap();
    queue.put(1).unwrap();

    let err = queue.put_timeout(2, Duration::from_millis(20)).unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.into_inner(), 2);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.take_timeout(Duration::from_millis(20)), Ok(1));
    assert_eq!(queue.take_timeout(Duration::from_millis(20)), Err(WaitError::Timeout));
}

#[test]
fn test_cancel_wakes_blocked_consumers() {
    let queue = Arc::new(BoundedQueue::<u64>::new(4).unwrap());
    let token = CancelToken::new();

    let consumers: Vec<_> = (0..3)
        .map(|_| {
            let queue = queue.clone();
            let token = token.clone();
            thread::spawn(move || queue.take_with(&Wait::forever().cancellable(&token)))
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    token.cancel();

    for consumer in consumers {
        assert_eq!(consumer.join().unwrap(), Err(WaitError::Cancelled));
    }
    assert!(queue.is_empty());
}

#[test]
fn test_worker_pool_runs_each_task_once() {
    const WORKERS: usize = 4;
    const TASKS: usize = 200;

    let queue = Arc::new(BoundedQueue::<BoxedTask>::new(8).unwrap());
    let shutdown = CancelToken::new();
    let runs: Arc<Vec<AtomicUsize>> = Arc::new((0..TASKS).map(|_| AtomicUsize::new(0)).collect());

    let workers: Vec<_> = (0..WORKERS)
        .map(|_| {
            let queue = queue.clone();
            let shutdown = shutdown.clone();
            thread::spawn(move || {
                let wait = Wait::forever().cancellable(&shutdown);
                while let Ok(task) = queue.take_with(&wait) {
                    task.run();
                }
            })
        })
        .collect();

    for id in 0..TASKS {
        let runs = runs.clone();
        queue
            .put(BoxedTask::new(move || {
                runs[id].fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
    }

    while !queue.is_empty() {
        thread::sleep(Duration::from_millis(5));
    }
    // Let the last taken tasks finish before stopping the workers
    while runs.iter().map(|r| r.load(Ordering::SeqCst)).sum::<usize>() < TASKS {
        thread::sleep(Duration::from_millis(5));
    }
    shutdown.cancel();

    for worker in workers {
        worker.join().unwrap();
    }
    assert!(runs.iter().all(|r| r.load(Ordering::SeqCst) == 1));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_queue_conserves_items(
        capacity in 1usize..6,
        producers in 1usize..4,
        consumers in 1usize..4,
        per_producer in 0usize..60,
    ) {
        let queue = Arc::new(BoundedQueue::new(capacity).unwrap());
        let total = producers * per_producer;

        let producer_handles: Vec<_> = (0..producers)
            .map(|p| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..per_producer {
                        queue.put_timeout(p * 1_000 + i, Duration::from_secs(10)).unwrap();
                    }
                })
            })
            .collect();

        let consumer_handles: Vec<_> = (0..consumers)
            .map(|c| {
                let queue = queue.clone();
                let share = total / consumers + usize::from(c < total % consumers);
                thread::spawn(move || {
                    let mut taken = Vec::with_capacity(share);
                    let mut max_seen = 0;
                    for _ in 0..share {
                        taken.push(queue.take_timeout(Duration::from_secs(10)).unwrap());
                        max_seen = max_seen.max(queue.len());
                    }
                    (taken, max_seen)
                })
            })
            .collect();

        for handle in producer_handles {
            handle.join().unwrap();
        }

        let mut all = Vec::with_capacity(total);
        for handle in consumer_handles {
            let (taken, max_seen) = handle.join().unwrap();
            prop_assert!(max_seen <= capacity);
            all.extend(taken);
        }
        all.sort_unstable();

        let mut expected: Vec<usize> = (0..producers)
            .flat_map(|p| (0..per_producer).map(move |i| p * 1_000 + i))
            .collect();
        expected.sort_unstable();

        prop_assert_eq!(all, expected);
        prop_assert!(queue.is_empty());
    }
}
