use crate::alarms::AlarmQueue;
use crate::history::NotificationHistory;
use crate::lifecycle::TaskLifecycle;
use crate::model::NotificationRecord;
use crate::reminder::{Alarm, Clock, Notifier, Scheduler};
use anyhow::Result;
use tracing::{debug, info};

/// Handles alarms once they fire. Nothing here relies on state from the
/// process that scheduled the alarm: the history is opened fresh.
pub struct Receiver<'a, N, C> {
    history: &'a mut NotificationHistory,
    notifier: &'a mut N,
    clock: &'a C,
}

impl<'a, N: Notifier, C: Clock> Receiver<'a, N, C> {
    pub fn new(history: &'a mut NotificationHistory, notifier: &'a mut N, clock: &'a C) -> Self {
        Receiver {
            history,
            notifier,
            clock,
        }
    }

    /// Show the reminder and keep a record of it.
    pub fn on_alarm(&mut self, alarm: &Alarm) {
        info!(id = alarm.notification_id, title = %alarm.title, "reminder fired");
        self.notifier
            .show(alarm.notification_id, &alarm.title, &alarm.time);

        let record = NotificationRecord {
            id: self.history.next_id(),
            task_id: alarm.notification_id,
            task_title: alarm.title.clone(),
            task_time: alarm.time.clone(),
            triggered_at: NotificationRecord::stamp(self.clock.now()),
            is_cleared: false,
        };
        self.history.record(record);
    }

    /// Deliver every alarm that is due. Returns how many fired.
    pub fn deliver_due(&mut self, queue: &mut AlarmQueue) -> Result<usize> {
        let due = queue.take_due(self.clock.now())?;
        debug!(count = due.len(), "delivering due alarms");
        for alarm in &due {
            self.on_alarm(alarm);
        }
        Ok(due.len())
    }
}

/// The "cancel task" action offered by a shown reminder: hide it and remove
/// the task that owns it.
pub fn on_cancel_action<S, N, C>(lifecycle: &mut TaskLifecycle<S, N, C>, notification_id: i32) -> bool
where
    S: Scheduler,
    N: Notifier,
    C: Clock,
{
    lifecycle
        .reminders_mut()
        .notifier_mut()
        .dismiss(notification_id);
    lifecycle.remove_by_notification_id(notification_id)
}
