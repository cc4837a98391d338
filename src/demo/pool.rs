/*!
 * Worker Pool
 * Fixed set of threads draining a bounded queue of tasks
 */

use anyhow::{anyhow, bail, Context, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use sync_toolkit::{
    BoundedQueue, BoxedTask, CancelToken, Condition, Monitor, Task, Wait, WaitError,
};
use tracing::{debug, info, warn};

enum Job {
    Run(BoxedTask),
    Stop,
}

/// Threads that run submitted tasks in FIFO order
///
/// Submission blocks while the queue is full, which throttles producers to
/// the pool's pace.
pub struct WorkerPool {
    queue: Arc<BoundedQueue<Job>>,
    abort: CancelToken,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(size: usize, capacity: usize) -> Result<Self> {
        let queue = Arc::new(BoundedQueue::new(capacity)?);
        let abort = CancelToken::new();

        let workers = (0..size)
            .map(|id| {
                let queue = queue.clone();
                let abort = abort.clone();
                thread::Builder::new()
                    .name(format!("pool-worker-{}", id))
                    .spawn(move || worker_loop(id, &queue, &abort))
                    .context("failed to spawn pool worker")
            })
            .collect::<Result<Vec<_>>>()?;

        info!(workers = size, capacity, "Worker pool started");
        Ok(Self {
            queue,
            abort,
            workers,
        })
    }

    /// Queue `task`, returning a handle to its result
    pub fn submit<T: Task>(&self, task: T) -> Result<TaskHandle<T::Output>> {
        let slot = Arc::new(Monitor::new(None));
        let handle = TaskHandle { slot: slot.clone() };

        let job = Job::Run(BoxedTask::new(move || {
            let outcome = catch_unwind(AssertUnwindSafe(|| task.run()));
            let mut result = slot.lock();
            *result = Some(outcome.map_err(|_| ()));
            result.signal_all(Condition::DEFAULT);
        }));

        self.queue
            .put_with(job, &Wait::forever().cancellable(&self.abort))
            .map_err(WaitError::from)?;
        Ok(handle)
    }

    /// Run every queued task, then stop the workers
    pub fn shutdown(mut self) -> Result<()> {
        for _ in 0..self.workers.len() {
            self.queue.put(Job::Stop).map_err(WaitError::from)?;
        }
        for worker in std::mem::take(&mut self.workers) {
            worker.join().map_err(|_| anyhow!("pool worker panicked"))?;
        }
        info!("Worker pool stopped");
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Workers still blocked on the queue would otherwise never exit
        if !self.workers.is_empty() {
            self.abort.cancel();
        }
    }
}

fn worker_loop(id: usize, queue: &BoundedQueue<Job>, abort: &CancelToken) {
    let wait = Wait::forever().cancellable(abort);
    let mut completed = 0usize;

    loop {
        match queue.take_with(&wait) {
            Ok(Job::Run(task)) => {
                task.run();
                completed += 1;
            }
            Ok(Job::Stop) => break,
            Err(err) => {
                warn!(worker = id, error = %err, "Worker aborted");
                break;
            }
        }
    }

    debug!(worker = id, completed, "Worker exiting");
}

/// Result of a submitted task
pub struct TaskHandle<R> {
    slot: Arc<Monitor<Option<Result<R, ()>>>>,
}

impl<R> TaskHandle<R> {
    /// Whether the task has finished, without blocking
    pub fn is_done(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl<R: Send + 'static> TaskHandle<R> {
    /// Block until the task finished, up to `timeout`
    #[inline]
    pub fn join(self, timeout: Duration) -> Result<R> {
        self.join_with(&Wait::timeout(timeout))
    }

    /// Block until the task finished, with explicit wait options
    pub fn join_with(self, wait: &Wait<'_>) -> Result<R> {
        let mut result = self.slot.lock();
        result.wait_while(Condition::DEFAULT, wait, |result| result.is_none())?;

        match result.take() {
            Some(Ok(value)) => Ok(value),
            Some(Err(())) => bail!("task panicked"),
            None => bail!("task result already taken"),
        }
    }
}
