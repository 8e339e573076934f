//! Test doubles for the scheduling seams.

use crate::reminder::{Alarm, Clock, Notifier, Scheduler, SchedulerError};
use anyhow::anyhow;
use chrono::NaiveDateTime;

pub fn at(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M").unwrap()
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Keeps alarms in memory. `deny` answers every request with a permission
/// error and `fail` with a backend error.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    pub alarms: Vec<Alarm>,
    pub calls: usize,
    pub cancelled: Vec<i32>,
    pub deny: bool,
    pub fail: bool,
}

impl RecordingScheduler {
    pub fn pending(&self, notification_id: i32) -> Option<&Alarm> {
        self.alarms
            .iter()
            .find(|a| a.notification_id == notification_id)
    }
}

impl Scheduler for RecordingScheduler {
    fn schedule_once(&mut self, alarm: &Alarm) -> Result<(), SchedulerError> {
        self.calls += 1;
        if self.deny {
            return Err(SchedulerError::PermissionDenied);
        }
        if self.fail {
            return Err(anyhow!("alarm service unavailable").into());
        }
        self.alarms
            .retain(|a| a.notification_id != alarm.notification_id);
        self.alarms.push(alarm.clone());
        Ok(())
    }

    fn cancel(&mut self, notification_id: i32) -> Result<(), SchedulerError> {
        if self.fail {
            return Err(anyhow!("alarm service unavailable").into());
        }
        self.cancelled.push(notification_id);
        self.alarms.retain(|a| a.notification_id != notification_id);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub shown: Vec<(i32, String, String)>,
    pub dismissed: Vec<i32>,
}

impl Notifier for RecordingNotifier {
    fn show(&mut self, notification_id: i32, title: &str, time: &str) {
        self.shown
            .push((notification_id, title.to_string(), time.to_string()));
    }

    fn dismiss(&mut self, notification_id: i32) {
        self.dismissed.push(notification_id);
    }
}
