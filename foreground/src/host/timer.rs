use super::command::Command;
use super::{HostTimer, TimerCallback};

use crossbeam_channel::Sender;
use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{self, AtomicBool};
use std::time::{Duration, Instant};

/// An entry in the host loop timer heap.
///
/// `TimerEntry` represents the next firing of a one-shot or repeating timer.
/// Entries are stored in a `BinaryHeap` ordered by deadline and are skipped
/// once their timer has been stopped.
pub(crate) struct TimerEntry {
    /// The time at which the timer fires next.
    pub(crate) deadline: Instant,

    /// Anchor of a repeating timer, `None` for one-shot timers.
    pub(crate) period: Option<Period>,

    /// Callback invoked on the host thread when the deadline is reached.
    pub(crate) callback: TimerCallback,

    /// Stop flag shared with the [`LoopTimer`] handed to the caller.
    pub(crate) stopped: Arc<AtomicBool>,
}

/// The fixed schedule of a repeating timer.
///
/// Firings land on `first + k * every` for `k = 0, 1, 2, ...`, independent
/// of how long each callback takes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Period {
    pub(crate) first: Instant,
    pub(crate) every: Duration,
}

impl TimerEntry {
    /// Creates a one-shot entry and its caller-side handle.
    ///
    /// `loop_sender` is the channel of the loop the entry is registered on;
    /// stopping the handle tells that loop to release the entry.
    pub(crate) fn one_shot(
        delay: Duration,
        callback: TimerCallback,
        loop_sender: Sender<Command>,
    ) -> (Self, LoopTimer) {
        Self::build(Instant::now() + delay, None, callback, loop_sender)
    }

    pub(crate) fn repeating(
        initial_delay: Duration,
        every: Duration,
        callback: TimerCallback,
        loop_sender: Sender<Command>,
    ) -> (Self, LoopTimer) {
        let first = Instant::now() + initial_delay;
        Self::build(first, Some(Period { first, every }), callback, loop_sender)
    }

    fn build(
        deadline: Instant,
        period: Option<Period>,
        callback: TimerCallback,
        loop_sender: Sender<Command>,
    ) -> (Self, LoopTimer) {
        let stopped = Arc::new(AtomicBool::new(false));

        let entry = Self {
            deadline,
            period,
            callback,
            stopped: stopped.clone(),
        };

        (
            entry,
            LoopTimer {
                stopped,
                loop_sender,
            },
        )
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(atomic::Ordering::Acquire)
    }
}

impl Period {
    /// Returns the first anchored slot strictly after `now`.
    ///
    /// Slots that elapsed while the host thread was busy are skipped rather
    /// than fired back to back.
    pub(crate) fn next_after(&self, now: Instant) -> Instant {
        if now < self.first {
            return self.first;
        }

        let every = self.every.as_nanos().max(1);
        let slots = now.duration_since(self.first).as_nanos() / every + 1;
        let offset = u64::try_from(slots.saturating_mul(every)).unwrap_or(u64::MAX);

        self.first
            .checked_add(Duration::from_nanos(offset))
            .unwrap_or_else(|| now + self.every)
    }
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    /// Two timer entries are equal if their deadlines are equal.
    fn eq(&self, other: &Self) -> bool {
        self.deadline.eq(&other.deadline)
    }
}

impl Ord for TimerEntry {
    /// Orders timer entries by deadline.
    ///
    /// The comparison is **reversed** so that a `BinaryHeap<TimerEntry>`
    /// behaves as a min-heap, where the earliest deadline is popped first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.deadline.cmp(&self.deadline)
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Caller-side handle of a timer running on a [`HostLoop`](super::HostLoop).
pub(crate) struct LoopTimer {
    stopped: Arc<AtomicBool>,
    loop_sender: Sender<Command>,
}

impl HostTimer for LoopTimer {
    /// Marks the entry stopped and asks the loop to drop it now rather
    /// than at its deadline. Only the first call notifies the loop.
    fn stop(&self) {
        if !self.stopped.swap(true, atomic::Ordering::AcqRel) {
            let _ = self.loop_sender.send(Command::TimerStopped);
        }
    }
}
