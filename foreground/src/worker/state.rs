//! Trampoline states of a worker.
//!
//! Exactly one hand-off to the host may be outstanding at a time; the
//! producer that moves the worker out of [`IDLE`] is the one that wakes the
//! host.

/// No hand-off is outstanding and nothing is draining.
///
/// The next producer to link a task must wake the host.
pub(crate) const IDLE: usize = 0;

/// A drain has been requested from the host but has not started yet.
pub(crate) const POSTED: usize = 1;

/// The host thread is running queued tasks.
///
/// Only the owner of this state may read or advance `head`.
pub(crate) const DRAINING: usize = 2;

/// Tasks were linked while draining.
///
/// The drainer walks the chain again before returning to [`IDLE`], so a
/// task linked just after its last read is never stranded.
pub(crate) const NOTIFIED: usize = 3;
