use super::MAX_TIMER_MILLIS;
use super::periodic::{PeriodicAction, PeriodicTask};
use crate::error::ScheduleError;
use crate::host::TimerCallback;
use crate::worker::{Action, QueueNode, TaskHandle, WorkerCore};

use std::sync::Arc;
use std::time::Duration;

/// Arms a one-shot host timer that queues `action` on `core` when it fires.
///
/// A zero delay skips the timer and queues the task right away.
pub(crate) fn schedule_delayed(
    core: &Arc<WorkerCore>,
    action: Action,
    delay: Duration,
) -> Result<TaskHandle, ScheduleError> {
    let delay_ms = delay_millis(delay)?;

    if delay_ms == 0 {
        return Ok(core.schedule(action));
    }

    if core.is_disposed() {
        return Ok(TaskHandle::disposed());
    }

    let node = QueueNode::new(action);

    let on_fire: TimerCallback = {
        let core = core.clone();
        let node = node.clone();

        Arc::new(move || {
            if !node.is_disposed() {
                core.enqueue(node.clone());
            }
        })
    };

    let timer = core.host().one_shot(delay_ms, on_fire);
    tracing::trace!(delay_ms, "delayed task armed");

    Ok(TaskHandle::delayed(node, timer))
}

/// Arms a repeating host timer that queues a run of `action` on `core` at
/// every firing.
pub(crate) fn schedule_periodically(
    core: &Arc<WorkerCore>,
    action: PeriodicAction,
    initial_delay: Duration,
    period: Duration,
) -> Result<TaskHandle, ScheduleError> {
    let delay_ms = delay_millis(initial_delay)?;
    let period_ms = period_millis(period)?;

    if core.is_disposed() {
        return Ok(TaskHandle::disposed());
    }

    let task = Arc::new(PeriodicTask::new(action));

    let on_fire: TimerCallback = {
        let core = core.clone();
        let task = task.clone();

        Arc::new(move || {
            if task.is_cancelled() {
                return;
            }

            let run = task.clone();
            let node = QueueNode::new(Box::new(move || run.run()));

            if !core.enqueue(node) {
                task.cancel();
            }
        })
    };

    task.attach(core.host().repeating(delay_ms, period_ms, on_fire));
    tracing::trace!(delay_ms, period_ms, "periodic task armed");

    Ok(TaskHandle::periodic(task))
}

/// Converts a delay to whole host-timer milliseconds.
pub(crate) fn delay_millis(delay: Duration) -> Result<u64, ScheduleError> {
    let millis = delay.as_millis();

    in_range(millis).ok_or(ScheduleError::DelayOutOfRange {
        millis,
        max: MAX_TIMER_MILLIS,
    })
}

/// Converts a period to whole host-timer milliseconds.
pub(crate) fn period_millis(period: Duration) -> Result<u64, ScheduleError> {
    let millis = period.as_millis();

    if millis == 0 {
        return Err(ScheduleError::ZeroPeriod);
    }

    in_range(millis).ok_or(ScheduleError::PeriodOutOfRange {
        millis,
        max: MAX_TIMER_MILLIS,
    })
}

fn in_range(millis: u128) -> Option<u64> {
    u64::try_from(millis)
        .ok()
        .filter(|millis| *millis <= MAX_TIMER_MILLIS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_millisecond_delays_truncate_to_zero() {
        assert_eq!(delay_millis(Duration::from_micros(999)), Ok(0));
        assert_eq!(delay_millis(Duration::from_micros(1_500)), Ok(1));
    }

    #[test]
    fn delay_ceiling_is_inclusive() {
        let max = Duration::from_millis(MAX_TIMER_MILLIS);

        assert_eq!(delay_millis(max), Ok(MAX_TIMER_MILLIS));
        assert_eq!(
            delay_millis(max + Duration::from_millis(1)),
            Err(ScheduleError::DelayOutOfRange {
                millis: u128::from(MAX_TIMER_MILLIS) + 1,
                max: MAX_TIMER_MILLIS,
            })
        );
    }

    #[test]
    fn huge_delays_are_rejected_not_wrapped() {
        assert!(matches!(
            delay_millis(Duration::MAX),
            Err(ScheduleError::DelayOutOfRange { .. })
        ));
    }

    #[test]
    fn zero_period_is_a_configuration_error() {
        assert_eq!(period_millis(Duration::ZERO), Err(ScheduleError::ZeroPeriod));
        assert_eq!(
            period_millis(Duration::from_micros(500)),
            Err(ScheduleError::ZeroPeriod)
        );
    }

    #[test]
    fn period_above_ceiling_is_rejected() {
        assert!(matches!(
            period_millis(Duration::from_millis(MAX_TIMER_MILLIS + 1)),
            Err(ScheduleError::PeriodOutOfRange { .. })
        ));
        assert_eq!(period_millis(Duration::from_millis(50)), Ok(50));
    }
}
