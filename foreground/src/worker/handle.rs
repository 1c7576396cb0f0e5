use super::node::QueueNode;
use crate::disposable::Disposable;
use crate::host::HostTimer;
use crate::time::periodic::PeriodicTask;

use std::fmt;
use std::sync::Arc;

/// A handle to a task submitted to a [`Worker`](crate::Worker).
///
/// Disposing the handle before the task starts guarantees it never runs;
/// disposing it later has no effect, a running task is never interrupted.
/// For timed tasks, disposal also stops the underlying host timer.
///
/// A handle reads as disposed once its task was cancelled, rejected by a
/// disposed worker, or has already run. Periodic handles only read as
/// disposed after cancellation.
///
/// Dropping a `TaskHandle` does **not** cancel the task; it only discards
/// the ability to cancel it.
#[must_use = "dropping a TaskHandle does not cancel the task"]
pub struct TaskHandle {
    kind: Kind,
}

enum Kind {
    /// Rejected at submission; nothing to cancel.
    Disposed,

    /// Linked into a worker chain, or posted straight to the host.
    Queued(Arc<QueueNode>),

    /// Waiting on a one-shot host timer before being queued.
    Delayed {
        node: Arc<QueueNode>,
        timer: Box<dyn HostTimer>,
    },

    /// Queued afresh by a repeating host timer on every firing. The task
    /// owns its timer.
    Periodic(Arc<PeriodicTask>),
}

impl TaskHandle {
    pub(crate) fn disposed() -> Self {
        Self {
            kind: Kind::Disposed,
        }
    }

    pub(crate) fn queued(node: Arc<QueueNode>) -> Self {
        Self {
            kind: Kind::Queued(node),
        }
    }

    pub(crate) fn delayed(node: Arc<QueueNode>, timer: Box<dyn HostTimer>) -> Self {
        Self {
            kind: Kind::Delayed { node, timer },
        }
    }

    pub(crate) fn periodic(task: Arc<PeriodicTask>) -> Self {
        Self {
            kind: Kind::Periodic(task),
        }
    }

    /// Cancels the task if it has not started. Idempotent.
    pub fn dispose(&self) {
        match &self.kind {
            Kind::Disposed => {}
            Kind::Queued(node) => node.dispose(),
            Kind::Delayed { node, timer } => {
                node.dispose();
                timer.stop();
            }
            Kind::Periodic(task) => task.cancel(),
        }
    }

    /// Returns `true` if the task can no longer start.
    pub fn is_disposed(&self) -> bool {
        match &self.kind {
            Kind::Disposed => true,
            Kind::Queued(node) | Kind::Delayed { node, .. } => node.is_disposed(),
            Kind::Periodic(task) => task.is_cancelled(),
        }
    }
}

impl Disposable for TaskHandle {
    fn dispose(&self) {
        TaskHandle::dispose(self);
    }

    fn is_disposed(&self) -> bool {
        TaskHandle::is_disposed(self)
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            Kind::Disposed => "disposed",
            Kind::Queued(_) => "queued",
            Kind::Delayed { .. } => "delayed",
            Kind::Periodic(_) => "periodic",
        };

        f.debug_struct("TaskHandle")
            .field("kind", &kind)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
