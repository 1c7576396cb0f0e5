//! Host thread abstraction and the built-in host loop.
//!
//! A *host* is the single-threaded execution context (typically a UI event
//! loop) that owns all work submitted to a [`Worker`](crate::Worker). The
//! scheduler only ever talks to it through two primitives:
//! - a "run later" queue that executes callbacks on the host thread in
//!   submission order,
//! - one-shot and repeating timers whose callbacks also fire on the host
//!   thread.
//!
//! Any toolkit exposing those primitives can implement [`Host`]. This module
//! also provides [`HostLoop`], a dedicated thread implementing them, which
//! backs the process-wide [`platform`](crate::platform) scheduler.

mod builder;
mod command;
mod context;
mod event_loop;
mod handle;
mod timer;

pub use builder::HostLoopBuilder;
pub use handle::{HostLoop, LoopHandle};

use std::sync::Arc;

/// A callback handed to the host's "run later" primitive.
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// A callback invoked on the host thread each time a timer fires.
pub type TimerCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// The single-threaded execution context tasks are delivered to.
///
/// Implementations must run every callback on the same thread, and must run
/// `run_later` callbacks in the order they were submitted. Timer callbacks
/// must also fire on that thread.
pub trait Host: Send + Sync + 'static {
    /// Queues `callback` to run on the host thread at some later point.
    fn run_later(&self, callback: Callback);

    /// Returns `true` when called from the host thread.
    fn is_host_thread(&self) -> bool;

    /// Starts a timer that invokes `on_fire` once, after `delay_ms`.
    fn one_shot(&self, delay_ms: u64, on_fire: TimerCallback) -> Box<dyn HostTimer>;

    /// Starts a timer that invokes `on_fire` after `initial_delay_ms`, then
    /// every `period_ms`, anchored to the instant the timer was created.
    fn repeating(
        &self,
        initial_delay_ms: u64,
        period_ms: u64,
        on_fire: TimerCallback,
    ) -> Box<dyn HostTimer>;
}

/// A running host timer.
pub trait HostTimer: Send + Sync {
    /// Stops the timer. Idempotent; a stopped timer never fires again.
    fn stop(&self);
}
