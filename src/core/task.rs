/*!
 * Task Abstraction
 *
 * One way to express a unit of work: anything with a single `run` entry
 * point. Closures implement it automatically, so "runnable" and
 * "callable" style work are the same thing with a different `Output`.
 */

/// A unit of work executed exactly once
pub trait Task: Send + 'static {
    type Output: Send + 'static;

    fn run(self) -> Self::Output;
}

impl<F, R> Task for F
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    type Output = R;

    #[inline]
    fn run(self) -> R {
        self()
    }
}

/// Type-erased task with no result, suitable for moving through a queue
pub struct BoxedTask(Box<dyn FnOnce() + Send + 'static>);

impl BoxedTask {
    /// Erase a task, discarding its output
    pub fn new<T: Task>(task: T) -> Self {
        Self(Box::new(move || {
            let _ = task.run();
        }))
    }

    /// Run the task, consuming it
    #[inline]
    pub fn run(self) {
        (self.0)()
    }
}

impl std::fmt::Debug for BoxedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BoxedTask")
    }
}
