//! Cancellable one-shot timers on the tokio clock
//!
//! Timers run as detached tasks, so they keep counting no matter which
//! screen is showing. Because they sleep on the tokio clock, tests drive
//! them with paused virtual time.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Handle to a scheduled task; dropping it cancels the task
#[derive(Debug)]
pub struct TimerHandle {
    task: Option<JoinHandle<()>>,
    deadline: Instant,
}

impl TimerHandle {
    /// When the task fires
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Cancel the task if it has not fired yet
    pub fn cancel(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Release the handle without cancelling the task
    ///
    /// A task that is tearing down its own owner calls this on its own
    /// handle so it is not aborted halfway through.
    pub fn detach(mut self) {
        self.task.take();
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Run `task` once after `delay`
///
/// The deadline is fixed when `schedule` is called, not when the spawned
/// task first gets polled.
pub fn schedule<F>(delay: Duration, task: F) -> TimerHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    let deadline = Instant::now() + delay;
    let task = tokio::spawn(async move {
        tokio::time::sleep_until(deadline).await;
        task.await;
    });
    TimerHandle {
        task: Some(task),
        deadline,
    }
}
