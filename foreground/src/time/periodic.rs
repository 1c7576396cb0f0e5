use crate::host::HostTimer;

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// A repeatable unit of work.
pub(crate) type PeriodicAction = Box<dyn Fn() + Send + Sync + 'static>;

/// The task behind a periodic schedule.
///
/// Every firing of the repeating timer queues a fresh node that calls
/// [`run`](Self::run) on this one shared task. Cancelling it stops the timer
/// and turns firings already sitting in the queue into no-ops.
pub(crate) struct PeriodicTask {
    action: PeriodicAction,
    cancelled: AtomicBool,
    timer: OnceLock<Box<dyn HostTimer>>,
}

impl PeriodicTask {
    pub(crate) fn new(action: PeriodicAction) -> Self {
        Self {
            action,
            cancelled: AtomicBool::new(false),
            timer: OnceLock::new(),
        }
    }

    /// Records the timer driving this task.
    ///
    /// A task cancelled before its timer is attached stops the timer here.
    pub(crate) fn attach(&self, timer: Box<dyn HostTimer>) {
        if let Err(timer) = self.timer.set(timer) {
            timer.stop();
            return;
        }

        if self.is_cancelled() {
            self.stop_timer();
        }
    }

    pub(crate) fn run(&self) {
        if !self.is_cancelled() {
            (self.action)();
        }
    }

    /// Cancels the task and stops its timer. Idempotent.
    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.stop_timer();
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn stop_timer(&self) {
        if let Some(timer) = self.timer.get() {
            timer.stop();
        }
    }
}
