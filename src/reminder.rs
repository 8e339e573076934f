//! Deadline reminders.
//!
//! Every task gets at most one pending reminder, addressed by its
//! notification id. The reminder fires [`reminder_lead`] before the task's
//! effective time: the start of a duration task, or its deadline otherwise.
//! Delivery is best effort. A reminder that cannot be scheduled is skipped
//! and the task itself is unaffected.

use crate::model::{parse_clock_time, parse_date, Task};
use chrono::{Duration, Local, NaiveDateTime};
use humantime::format_duration;
use thiserror::Error;
use tracing::{debug, warn};

pub fn reminder_lead() -> Duration {
    Duration::minutes(10)
}

/// Placeholder used when a task's date or time cannot be parsed.
pub fn fallback_delay() -> Duration {
    Duration::hours(1)
}

/// A task with this title and notification id is always reminded five
/// seconds from now, which makes it easy to check delivery end to end.
pub const DEBUG_TASK_TITLE: &str = "Test Task";
pub const DEBUG_NOTIFICATION_ID: i32 = 99999;

pub fn debug_delay() -> Duration {
    Duration::seconds(5)
}

/// A pending one-shot trigger and what to show when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub notification_id: i32,
    pub trigger_at: NaiveDateTime,
    pub title: String,
    pub time: String,
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("not allowed to schedule exact alarms")]
    PermissionDenied,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("failed to schedule reminder {id}")]
    Schedule {
        id: i32,
        #[source]
        source: SchedulerError,
    },
    #[error("failed to cancel reminder {id}")]
    Cancel {
        id: i32,
        #[source]
        source: SchedulerError,
    },
}

/// Facility that wakes up at an exact instant, even when nothing is
/// running, and hands the alarm back.
pub trait Scheduler {
    /// Arrange for `alarm` to fire once. An alarm already pending under the
    /// same notification id is replaced.
    fn schedule_once(&mut self, alarm: &Alarm) -> Result<(), SchedulerError>;

    /// Drop the pending alarm for `notification_id`, if there is one.
    fn cancel(&mut self, notification_id: i32) -> Result<(), SchedulerError>;
}

/// Shows reminders to the user.
pub trait Notifier {
    fn show(&mut self, notification_id: i32, title: &str, time: &str);
    fn dismiss(&mut self, notification_id: i32);
}

pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled(NaiveDateTime),
    SkippedPast(NaiveDateTime),
    SkippedPermission,
}

fn is_debug_task(task: &Task) -> bool {
    task.title == DEBUG_TASK_TITLE && task.notification_id == DEBUG_NOTIFICATION_ID
}

/// When the reminder for `task` should fire.
pub fn notify_at(task: &Task, now: NaiveDateTime) -> NaiveDateTime {
    if is_debug_task(task) {
        return now + debug_delay();
    }

    let date = parse_date(&task.deadline_date);
    let time = parse_clock_time(task.effective_time());
    match (date, time) {
        (Some(date), Some(time)) => date.and_time(time) - reminder_lead(),
        _ => {
            warn!(
                title = %task.title,
                date = %task.deadline_date,
                time = %task.effective_time(),
                "unparsable deadline, reminding in an hour"
            );
            now + fallback_delay()
        }
    }
}

pub struct ReminderScheduler<S, N, C> {
    scheduler: S,
    notifier: N,
    clock: C,
}

impl<S: Scheduler, N: Notifier, C: Clock> ReminderScheduler<S, N, C> {
    pub fn new(scheduler: S, notifier: N, clock: C) -> Self {
        ReminderScheduler {
            scheduler,
            notifier,
            clock,
        }
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    #[cfg(test)]
    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    #[cfg(test)]
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Program the reminder for `task`, replacing any earlier one with the
    /// same notification id.
    pub fn schedule(&mut self, task: &Task) -> Result<ScheduleOutcome, ReminderError> {
        let now = self.clock.now();
        let at = notify_at(task, now);

        if at < now {
            debug!(id = task.notification_id, %at, %now, "reminder time has passed, skipping");
            return Ok(ScheduleOutcome::SkippedPast(at));
        }

        let alarm = Alarm {
            notification_id: task.notification_id,
            trigger_at: at,
            title: task.title.clone(),
            time: task.time.clone(),
        };
        match self.scheduler.schedule_once(&alarm) {
            Ok(()) => {
                let wait = (at - now).to_std().unwrap_or_default();
                debug!(
                    id = task.notification_id,
                    %at,
                    "reminder scheduled, fires in {}",
                    format_duration(wait)
                );
                Ok(ScheduleOutcome::Scheduled(at))
            }
            Err(SchedulerError::PermissionDenied) => {
                warn!(id = task.notification_id, "no permission to schedule exact alarms");
                Ok(ScheduleOutcome::SkippedPermission)
            }
            Err(source) => Err(ReminderError::Schedule {
                id: task.notification_id,
                source,
            }),
        }
    }

    /// Retract the pending reminder and hide it if it is showing. Cancelling
    /// an id with nothing pending is fine.
    pub fn cancel(&mut self, notification_id: i32) -> Result<(), ReminderError> {
        self.notifier.dismiss(notification_id);
        self.scheduler
            .cancel(notification_id)
            .map_err(|source| ReminderError::Cancel {
                id: notification_id,
                source,
            })
    }
}
