use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicPtr, Ordering};

/// A unit of work accepted by a worker.
pub(crate) type Action = Box<dyn FnOnce() + Send + 'static>;

/// A cell of the worker's singly linked chain.
///
/// A node holds one pending action and the link to the node queued after
/// it. It doubles as the cancellation target of the [`TaskHandle`] returned
/// to the caller: disposing the node clears its action, and the drain loop
/// skips it when it gets there.
///
/// [`TaskHandle`]: super::TaskHandle
pub(crate) struct QueueNode {
    /// The pending action, null once run or disposed.
    ///
    /// Taken with a single `swap`, so whichever of the drainer and a
    /// canceller gets there first wins and the action runs at most once.
    action: AtomicPtr<Action>,

    /// The following node. Written once by the producer that appended after
    /// this node, never reset.
    pub(crate) next: AtomicPtr<QueueNode>,
}

impl QueueNode {
    /// Creates a node wrapping `action`.
    pub(crate) fn new(action: Action) -> Arc<Self> {
        Arc::new(Self {
            action: AtomicPtr::new(Box::into_raw(Box::new(action))),
            next: AtomicPtr::new(ptr::null_mut()),
        })
    }

    /// Creates the placeholder node a chain starts with.
    pub(crate) fn sentinel() -> Arc<Self> {
        Arc::new(Self {
            action: AtomicPtr::new(ptr::null_mut()),
            next: AtomicPtr::new(ptr::null_mut()),
        })
    }

    /// Runs the action if it has not been taken yet.
    pub(crate) fn run(&self) {
        if let Some(action) = self.take() {
            action();
        }
    }

    /// Releases the action without running it. Idempotent.
    pub(crate) fn dispose(&self) {
        drop(self.take());
    }

    /// Returns `true` once the action has been run or disposed.
    pub(crate) fn is_disposed(&self) -> bool {
        self.action.load(Ordering::Acquire).is_null()
    }

    fn take(&self) -> Option<Action> {
        let action = self.action.swap(ptr::null_mut(), Ordering::AcqRel);

        if action.is_null() {
            return None;
        }

        // Safety: the pointer came from `Box::into_raw` in `new` and the swap
        // above handed it to this caller alone.
        let action = unsafe { Box::from_raw(action) };
        Some(*action)
    }
}

impl Drop for QueueNode {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting(counter: &Arc<AtomicUsize>) -> Arc<QueueNode> {
        let counter = counter.clone();
        QueueNode::new(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn action_runs_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let node = counting(&counter);

        node.run();
        node.run();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(node.is_disposed());
    }

    #[test]
    fn disposed_action_never_runs() {
        let counter = Arc::new(AtomicUsize::new(0));
        let node = counting(&counter);

        node.dispose();
        node.run();

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sentinel_reads_as_disposed() {
        assert!(QueueNode::sentinel().is_disposed());
    }

    #[test]
    fn dropping_a_pending_node_releases_its_captures() {
        let captured = Arc::new(());
        let node = {
            let captured = captured.clone();
            QueueNode::new(Box::new(move || drop(captured)))
        };

        assert_eq!(Arc::strong_count(&captured), 2);
        drop(node);
        assert_eq!(Arc::strong_count(&captured), 1);
    }
}
