use super::builder::HostLoopBuilder;
use super::command::Command;
use super::context;
use super::timer::TimerEntry;
use super::{Callback, Host, HostTimer, TimerCallback};
use crate::error::HostError;

use crossbeam_channel::{RecvTimeoutError, Sender};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread::JoinHandle;
use std::time::Duration;

/// A cloneable handle to a running [`HostLoop`].
///
/// `LoopHandle` is the [`Host`] implementation handed to workers and
/// schedulers: it forwards callbacks and timers to the loop thread over a
/// channel and never blocks the caller.
#[derive(Clone)]
pub struct LoopHandle {
    /// Identifier of the loop, matched against the thread-local marker.
    id: u64,

    /// Sender side of the command channel.
    sender: Sender<Command>,
}

impl LoopHandle {
    pub(crate) fn new(id: u64, sender: Sender<Command>) -> Self {
        Self { id, sender }
    }

    /// Asks the loop to stop after the command currently being processed.
    ///
    /// Work still queued at that point is dropped without running. Calling
    /// this on a loop that already stopped has no effect.
    pub fn shutdown(&self) {
        let _ = self.sender.send(Command::Shutdown);
    }

    /// Runs `f` on the host thread and waits up to `timeout` for its result.
    ///
    /// When called from the host thread itself, `f` runs inline; a panic is
    /// still caught and reported as [`HostError::CallbackLost`].
    ///
    /// # Errors
    ///
    /// - [`HostError::Shutdown`] if the loop no longer accepts work,
    /// - [`HostError::Timeout`] if `f` did not complete in time,
    /// - [`HostError::CallbackLost`] if `f` panicked or was discarded by a
    ///   shutdown before running.
    pub fn invoke_and_wait<F, R>(&self, timeout: Duration, f: F) -> Result<R, HostError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_host_thread() {
            return panic::catch_unwind(AssertUnwindSafe(f)).map_err(|_| {
                tracing::error!(host = self.id, "inline host callback panicked");
                HostError::CallbackLost
            });
        }

        let (transmitter, receiver) = crossbeam_channel::bounded(1);

        self.send(Command::RunLater(Box::new(move || {
            let _ = transmitter.send(f());
        })))?;

        receiver.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => HostError::Timeout,
            RecvTimeoutError::Disconnected => HostError::CallbackLost,
        })
    }

    fn send(&self, command: Command) -> Result<(), HostError> {
        self.sender.send(command).map_err(|_| HostError::Shutdown)
    }

    fn start_timer(&self, entry: TimerEntry) {
        if self.send(Command::StartTimer(entry)).is_err() {
            tracing::warn!(host = self.id, "host loop has shut down; timer never starts");
        }
    }
}

impl Host for LoopHandle {
    fn run_later(&self, callback: Callback) {
        if self.send(Command::RunLater(callback)).is_err() {
            tracing::warn!(host = self.id, "host loop has shut down; dropping callback");
        }
    }

    fn is_host_thread(&self) -> bool {
        context::is_current(self.id)
    }

    fn one_shot(&self, delay_ms: u64, on_fire: TimerCallback) -> Box<dyn HostTimer> {
        let (entry, timer) = TimerEntry::one_shot(
            Duration::from_millis(delay_ms),
            on_fire,
            self.sender.clone(),
        );
        self.start_timer(entry);
        Box::new(timer)
    }

    fn repeating(
        &self,
        initial_delay_ms: u64,
        period_ms: u64,
        on_fire: TimerCallback,
    ) -> Box<dyn HostTimer> {
        let (entry, timer) = TimerEntry::repeating(
            Duration::from_millis(initial_delay_ms),
            Duration::from_millis(period_ms),
            on_fire,
            self.sender.clone(),
        );
        self.start_timer(entry);
        Box::new(timer)
    }
}

impl fmt::Debug for LoopHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopHandle").field("id", &self.id).finish()
    }
}

/// A host thread running an event loop.
///
/// `HostLoop` owns the thread spawned by [`HostLoopBuilder::spawn`].
/// Dropping it shuts the loop down and joins the thread, unless the drop
/// happens on the host thread itself, in which case the loop simply stops
/// after the current callback.
pub struct HostLoop {
    handle: LoopHandle,
    thread: Option<JoinHandle<()>>,
}

impl HostLoop {
    pub(crate) fn new(handle: LoopHandle, thread: JoinHandle<()>) -> Self {
        Self {
            handle,
            thread: Some(thread),
        }
    }

    /// Returns a builder for configuring a new host loop.
    pub fn builder() -> HostLoopBuilder {
        HostLoopBuilder::new()
    }

    /// Spawns a host loop with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Spawn`] if the thread cannot be created.
    pub fn spawn() -> Result<Self, HostError> {
        HostLoopBuilder::new().spawn()
    }

    /// Returns the handle used to submit work to this loop.
    pub fn handle(&self) -> &LoopHandle {
        &self.handle
    }

    /// Stops the loop and waits for its thread to exit.
    pub fn join(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.handle.shutdown();

        if self.handle.is_host_thread() {
            return;
        }

        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for HostLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for HostLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostLoop")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
