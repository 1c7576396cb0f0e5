use std::io;

/// Configuration errors raised synchronously when a timed task is scheduled.
///
/// Host timers count in whole milliseconds and cannot represent values past
/// [`MAX_TIMER_MILLIS`](crate::MAX_TIMER_MILLIS); such values are rejected
/// rather than clamped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("host timers only accept delays up to {max} milliseconds, got {millis}")]
    DelayOutOfRange { millis: u128, max: u64 },

    #[error("host timers only accept periods up to {max} milliseconds, got {millis}")]
    PeriodOutOfRange { millis: u128, max: u64 },

    #[error("periodic scheduling requires a period of at least one millisecond")]
    ZeroPeriod,
}

/// Errors reported by the host loop and the platform registry.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("failed to spawn the host thread: {0}")]
    Spawn(#[from] io::Error),

    #[error("the host loop has shut down")]
    Shutdown,

    #[error("timed out waiting for the host thread")]
    Timeout,

    #[error("the callback was dropped before producing a result")]
    CallbackLost,

    #[error("a platform host is already installed")]
    AlreadyInstalled,
}
