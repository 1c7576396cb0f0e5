use super::handle::TaskHandle;
use super::node::{Action, QueueNode};
use super::state::{DRAINING, IDLE, NOTIFIED, POSTED};
use crate::disposable::Disposable;
use crate::error::ScheduleError;
use crate::host::Host;
use crate::time::binding;

use std::fmt;
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Serializes tasks submitted from any thread onto one host thread.
///
/// A `Worker` keeps its pending tasks in a lock-free singly linked chain.
/// Producers append with compare-and-swap and never block; the host thread
/// drains the chain in link order. The first producer to find the worker
/// idle asks the host for exactly one drain, so however many threads race,
/// at most one hand-off is outstanding.
///
/// Disposing a worker is terminal: pending tasks are dropped without
/// running and later submissions are rejected with an already-disposed
/// handle.
///
/// Dropping a `Worker` does **not** dispose it. Tasks already queued and
/// timers already started keep running until they complete or the worker
/// is disposed.
pub struct Worker {
    core: Arc<WorkerCore>,
}

impl Worker {
    /// Creates a worker delivering its tasks to `host`.
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            core: WorkerCore::new(host),
        }
    }

    /// Queues `task` to run on the host thread.
    ///
    /// Never blocks. If the worker was idle and the caller is the host
    /// thread, the task runs before this call returns; otherwise a single
    /// drain is posted to the host. After [`dispose`](Self::dispose), the
    /// task is dropped and the returned handle is already disposed.
    pub fn schedule<F>(&self, task: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.core.schedule(Box::new(task))
    }

    /// Queues `task` to run on the host thread once `delay` has elapsed.
    ///
    /// The delay is truncated to whole milliseconds; a zero delay queues the
    /// task immediately. Disposing the returned handle stops the timer and
    /// cancels the task if it has not started.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::DelayOutOfRange`] if `delay` exceeds
    /// [`MAX_TIMER_MILLIS`](crate::MAX_TIMER_MILLIS).
    pub fn schedule_delayed<F>(&self, task: F, delay: Duration) -> Result<TaskHandle, ScheduleError>
    where
        F: FnOnce() + Send + 'static,
    {
        binding::schedule_delayed(&self.core, Box::new(task), delay)
    }

    /// Runs `task` on the host thread after `initial_delay`, then every
    /// `period`.
    ///
    /// Firings are anchored to the call instant: the k-th run is requested at
    /// `start + initial_delay + k * period` regardless of how long earlier
    /// runs took. Each firing goes through the worker queue like any other
    /// task, so periodic runs stay ordered with everything else scheduled
    /// on this worker.
    ///
    /// # Errors
    ///
    /// - [`ScheduleError::DelayOutOfRange`] if `initial_delay` exceeds
    ///   [`MAX_TIMER_MILLIS`](crate::MAX_TIMER_MILLIS),
    /// - [`ScheduleError::ZeroPeriod`] if `period` is shorter than one
    ///   millisecond,
    /// - [`ScheduleError::PeriodOutOfRange`] if `period` exceeds the ceiling.
    pub fn schedule_periodically<F>(
        &self,
        task: F,
        initial_delay: Duration,
        period: Duration,
    ) -> Result<TaskHandle, ScheduleError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        binding::schedule_periodically(&self.core, Box::new(task), initial_delay, period)
    }

    /// Disposes the worker. Idempotent.
    ///
    /// A task already running on the host thread finishes; every task still
    /// queued is dropped without running.
    pub fn dispose(&self) {
        self.core.dispose();
    }

    /// Returns `true` once [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.core.is_disposed()
    }
}

impl Disposable for Worker {
    fn dispose(&self) {
        Worker::dispose(self);
    }

    fn is_disposed(&self) -> bool {
        Worker::is_disposed(self)
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

/// Shared state of a [`Worker`], also owned by its pending drains and timers.
///
/// Every node from `head` to the last linked node holds one strong count
/// on behalf of the chain, taken with `Arc::into_raw` when the node is
/// linked and released when the drainer moves `head` past it.
pub(crate) struct WorkerCore {
    /// The node most recently run, or the initial sentinel.
    ///
    /// Only read or written by whoever holds the `DRAINING` state.
    head: AtomicPtr<QueueNode>,

    /// The last linked node, or null once the worker is disposed.
    tail: AtomicPtr<QueueNode>,

    /// Trampoline state, see [`super::state`].
    state: AtomicUsize,

    /// The host thread tasks are delivered to.
    host: Arc<dyn Host>,
}

impl WorkerCore {
    pub(crate) fn new(host: Arc<dyn Host>) -> Arc<Self> {
        let sentinel = Arc::into_raw(QueueNode::sentinel()).cast_mut();

        Arc::new(Self {
            head: AtomicPtr::new(sentinel),
            tail: AtomicPtr::new(sentinel),
            state: AtomicUsize::new(IDLE),
            host,
        })
    }

    pub(crate) fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    pub(crate) fn schedule(self: &Arc<Self>, action: Action) -> TaskHandle {
        let node = QueueNode::new(action);

        if self.enqueue(node.clone()) {
            TaskHandle::queued(node)
        } else {
            TaskHandle::disposed()
        }
    }

    /// Appends `node` to the chain and wakes the host if needed.
    ///
    /// Returns `false`, with the node disposed, if the worker has been
    /// disposed.
    pub(crate) fn enqueue(self: &Arc<Self>, node: Arc<QueueNode>) -> bool {
        let link = Arc::into_raw(node).cast_mut();
        let mut tail = self.tail.load(Ordering::Acquire);

        let prev = loop {
            if tail.is_null() {
                // Safety: `link` came from `Arc::into_raw` above and was never
                // published.
                let node = unsafe { Arc::from_raw(link) };
                node.dispose();
                return false;
            }

            match self
                .tail
                .compare_exchange_weak(tail, link, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(prev) => break prev,
                Err(current) => tail = current,
            }
        };

        // Safety: winning the CAS made this thread the only writer of
        // `prev.next`. Until that write, no drainer can move past `prev`, so
        // its chain reference keeps it alive.
        unsafe { (*prev).next.store(link, Ordering::Release) };

        self.wake();
        true
    }

    /// Moves the trampoline out of `IDLE`, requesting a drain if this thread
    /// is the one that did it.
    fn wake(self: &Arc<Self>) {
        let mut state = self.state.load(Ordering::Acquire);

        loop {
            let next = match state {
                IDLE => POSTED,
                DRAINING => NOTIFIED,
                _ => return,
            };

            match self
                .state
                .compare_exchange_weak(state, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) if next == POSTED => break,
                Ok(_) => return,
                Err(current) => state = current,
            }
        }

        if self.host.is_host_thread() {
            tracing::trace!("draining inline on the host thread");
            self.drain();
        } else {
            tracing::trace!("posting drain to the host");
            let core = Arc::clone(self);
            self.host.run_later(Box::new(move || core.drain()));
        }
    }

    /// Runs every linked task in order. Host thread only.
    ///
    /// A panicking task ends the pass and leaves the worker idle; the tasks
    /// behind it run on the drain requested by the next `schedule`.
    pub(crate) fn drain(&self) {
        if self
            .state
            .compare_exchange(POSTED, DRAINING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        self.drain_claimed();
    }

    /// Walks the chain until no task was linked during the last pass, then
    /// returns to `IDLE`. Requires the `DRAINING` state.
    fn drain_claimed(&self) {
        let _reset = ResetOnUnwind(&self.state);

        loop {
            self.run_linked();

            match self
                .state
                .compare_exchange(DRAINING, IDLE, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return,
                Err(_) => self.state.store(DRAINING, Ordering::Release),
            }
        }
    }

    /// Walks the chain from `head`, running (or, once disposed, dropping)
    /// each task. Requires the `DRAINING` state.
    fn run_linked(&self) {
        loop {
            let head = self.head.load(Ordering::Relaxed);

            // Safety: `head` always holds a chain reference.
            let next = unsafe { (*head).next.load(Ordering::Acquire) };
            if next.is_null() {
                return;
            }

            self.head.store(next, Ordering::Relaxed);

            // Safety: the old head is unreachable from the chain now that
            // `head` moved past it; its chain reference is ours to release.
            drop(unsafe { Arc::from_raw(head) });

            // Safety: `next` is the new head and keeps its chain reference
            // until a later pass moves past it.
            let node = unsafe { &*next };

            if self.is_disposed() {
                node.dispose();
            } else {
                node.run();
            }
        }
    }

    pub(crate) fn dispose(&self) {
        if self.tail.swap(ptr::null_mut(), Ordering::AcqRel).is_null() {
            return;
        }

        tracing::debug!("worker disposed");

        let mut state = self.state.load(Ordering::Acquire);

        loop {
            let claim = match state {
                IDLE | POSTED => DRAINING,
                DRAINING => NOTIFIED,
                _ => return,
            };

            match self
                .state
                .compare_exchange_weak(state, claim, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    // Nobody is draining: clear the pending tasks here. An
                    // active drainer clears them itself on its next pass.
                    if claim == DRAINING {
                        self.drain_claimed();
                    }
                    return;
                }
                Err(current) => state = current,
            }
        }
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.tail.load(Ordering::Acquire).is_null()
    }
}

impl Drop for WorkerCore {
    fn drop(&mut self) {
        let mut node = *self.head.get_mut();

        while !node.is_null() {
            // Safety: with exclusive access, every node from `head` onward
            // holds exactly one chain reference.
            let current = unsafe { Arc::from_raw(node) };
            node = current.next.load(Ordering::Acquire);
        }
    }
}

/// Returns the trampoline to `IDLE` if a task panics mid-drain, so the next
/// `schedule` can wake the host again.
struct ResetOnUnwind<'a>(&'a AtomicUsize);

impl Drop for ResetOnUnwind<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.store(IDLE, Ordering::Release);
        }
    }
}
