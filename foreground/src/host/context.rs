use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of unique host loop identifiers.
static NEXT_LOOP_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_loop_id() -> u64 {
    NEXT_LOOP_ID.fetch_add(1, Ordering::Relaxed)
}

thread_local! {
    /// Identifier of the host loop driving the current thread, if any.
    ///
    /// Set for the whole lifetime of a loop on its thread, which is how
    /// [`LoopHandle::is_host_thread`](super::LoopHandle) answers without
    /// any cross-thread synchronization.
    static CURRENT_LOOP: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Returns `true` if the current thread is driven by the loop `id`.
pub(crate) fn is_current(id: u64) -> bool {
    CURRENT_LOOP.with(|current| current.get() == Some(id))
}

/// Marks the current thread as the host thread of loop `id` while `f` runs.
///
/// The previous marker is restored afterwards, so a loop nested on a thread
/// (as `run_current` does for the platform) does not leak its identity.
pub(crate) fn enter_loop<R>(id: u64, f: impl FnOnce() -> R) -> R {
    CURRENT_LOOP.with(|current| {
        let prev = current.replace(Some(id));
        let out = f();
        current.set(prev);
        out
    })
}
