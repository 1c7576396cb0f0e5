use super::command::Command;
use super::context::enter_loop;
use super::timer::TimerEntry;
use super::{Callback, TimerCallback};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::any::Any;
use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// The host event loop.
///
/// The loop runs on the host thread and is responsible for:
/// - running "run later" callbacks in submission order,
/// - firing one-shot and repeating timers when their deadline is reached,
/// - containing panics raised by callbacks so one failing task does not
///   take the host thread down.
///
/// It receives work through [`Command`] messages sent by
/// [`LoopHandle`](super::LoopHandle)s.
pub(crate) struct EventLoop {
    /// Identifier recorded in the thread-local host marker.
    id: u64,

    /// Channel receiving commands from any thread.
    receiver: Receiver<Command>,

    /// Min-heap of pending timers ordered by deadline.
    timers: BinaryHeap<TimerEntry>,
}

impl EventLoop {
    pub(crate) fn new(id: u64, receiver: Receiver<Command>) -> Self {
        Self {
            id,
            receiver,
            timers: BinaryHeap::new(),
        }
    }

    /// Runs the loop on the current thread until shutdown.
    pub(crate) fn run(self) {
        self.run_with(|| {});
    }

    /// Runs `first` on the host thread, then the loop until shutdown.
    ///
    /// Unlike queued callbacks, a panic raised by `first` propagates to the
    /// caller.
    pub(crate) fn run_with(mut self, first: impl FnOnce()) {
        let id = self.id;

        enter_loop(id, || {
            tracing::debug!(host = id, "host loop started");

            first();

            self.turn();
            self.discard_pending();

            tracing::debug!(host = id, "host loop stopped");
        });
    }

    /// Processes commands and timers until a shutdown is requested or every
    /// sender is gone.
    fn turn(&mut self) {
        loop {
            let received = match self.timers.peek() {
                Some(timer) => self.receiver.recv_deadline(timer.deadline),
                None => self
                    .receiver
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(Command::RunLater(callback)) => self.invoke(callback),
                Ok(Command::StartTimer(entry)) => {
                    tracing::trace!(host = self.id, "timer registered");
                    self.timers.push(entry);
                }
                Ok(Command::TimerStopped) => self.release_stopped_timers(),
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) => {}
            }

            self.fire_due_timers();
        }
    }

    fn fire_due_timers(&mut self) {
        let now = Instant::now();

        while self.timers.peek().is_some_and(|timer| timer.deadline <= now) {
            let Some(mut timer) = self.timers.pop() else {
                break;
            };

            if timer.is_stopped() {
                continue;
            }

            tracing::trace!(host = self.id, "timer fired");
            self.invoke_timer(&timer.callback);

            if let Some(period) = timer.period
                && !timer.is_stopped()
            {
                timer.deadline = period.next_after(Instant::now());
                self.timers.push(timer);
            }
        }
    }

    /// Drops every stopped entry, with whatever its callback captured.
    fn release_stopped_timers(&mut self) {
        let before = self.timers.len();
        self.timers.retain(|timer| !timer.is_stopped());

        let released = before - self.timers.len();
        if released > 0 {
            tracing::trace!(host = self.id, released, "stopped timers released");
        }
    }

    fn invoke(&self, callback: Callback) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) {
            self.report_panic(payload);
        }
    }

    fn invoke_timer(&self, callback: &TimerCallback) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback())) {
            self.report_panic(payload);
        }
    }

    fn report_panic(&self, payload: Box<dyn Any + Send>) {
        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("<non-string panic payload>");

        tracing::error!(host = self.id, panic = message, "host callback panicked");
    }

    /// Drops queued callbacks and timers without running them.
    ///
    /// Callbacks often own the worker that enqueued them; releasing them here
    /// breaks the handle -> worker -> handle cycle once the loop is gone.
    fn discard_pending(&mut self) {
        let mut dropped = self.timers.len();
        self.timers.clear();

        while let Ok(command) = self.receiver.try_recv() {
            if matches!(command, Command::RunLater(_) | Command::StartTimer(_)) {
                dropped += 1;
            }
        }

        if dropped > 0 {
            tracing::debug!(host = self.id, dropped, "discarded pending host work");
        }
    }
}
