use super::Callback;
use super::timer::TimerEntry;

/// Messages accepted by the host loop thread.
pub(crate) enum Command {
    RunLater(Callback),
    StartTimer(TimerEntry),

    /// A timer was stopped; its entry can be released before its deadline.
    TimerStopped,
    Shutdown,
}
