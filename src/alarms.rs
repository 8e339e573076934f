use crate::reminder::{Alarm, Notifier, Scheduler, SchedulerError};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::io::Write;
use tracing::debug;

/// Pending one-shot alarms, kept in the data file so they survive the
/// process. `listify fire` takes the due ones out and delivers them.
pub struct AlarmQueue {
    db: Connection,
    exact_alarms_allowed: bool,
}

impl AlarmQueue {
    pub fn new(db: Connection, exact_alarms_allowed: bool) -> AlarmQueue {
        AlarmQueue {
            db,
            exact_alarms_allowed,
        }
    }

    /// All pending alarms, soonest first.
    pub fn pending(&self) -> Result<Vec<Alarm>> {
        let mut stmt = self
            .db
            .prepare("SELECT notification_id, trigger_at, title, time FROM alarm ORDER BY trigger_at, notification_id")
            .context("Failed to fetch alarms from database.")?;
        let alarms = stmt
            .query_map([], |row| alarm_from_row(row))
            .context("Failed to fetch alarms from database.")?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(alarms)
    }

    /// Remove and return every alarm due at or before `now`. Each alarm is
    /// handed out once.
    pub fn take_due(&mut self, now: NaiveDateTime) -> Result<Vec<Alarm>> {
        let tx = self
            .db
            .transaction()
            .context("Failed to start alarm transaction.")?;
        let due = {
            let mut stmt = tx
                .prepare("SELECT notification_id, trigger_at, title, time FROM alarm WHERE trigger_at <= ?1 ORDER BY trigger_at, notification_id")
                .context("Failed to fetch due alarms from database.")?;
            let rows = stmt
                .query_map(params![now], |row| alarm_from_row(row))
                .context("Failed to fetch due alarms from database.")?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.execute("DELETE FROM alarm WHERE trigger_at <= ?1", params![now])
            .context("Failed to remove due alarms from database.")?;
        tx.commit().context("Failed to commit alarm transaction.")?;
        Ok(due)
    }
}

/// Return an alarm from a row in this order: [notification_id,
/// trigger_at, title, time]
fn alarm_from_row(row: &Row) -> rusqlite::Result<Alarm> {
    Ok(Alarm {
        notification_id: row.get(0)?,
        trigger_at: row.get::<_, NaiveDateTime>(1)?,
        title: row.get(2)?,
        time: row.get(3)?,
    })
}

impl Scheduler for AlarmQueue {
    fn schedule_once(&mut self, alarm: &Alarm) -> Result<(), SchedulerError> {
        if !self.exact_alarms_allowed {
            return Err(SchedulerError::PermissionDenied);
        }
        self.db
            .execute(
                "INSERT OR REPLACE INTO alarm (notification_id, trigger_at, title, time) VALUES (?1, ?2, ?3, ?4)",
                params![alarm.notification_id, alarm.trigger_at, alarm.title, alarm.time],
            )
            .context("Failed to insert alarm to database.")?;
        Ok(())
    }

    fn cancel(&mut self, notification_id: i32) -> Result<(), SchedulerError> {
        let removed = self
            .db
            .execute(
                "DELETE FROM alarm WHERE notification_id = ?1",
                params![notification_id],
            )
            .context("Failed to remove alarm from database.")?;
        debug!(id = notification_id, removed, "alarm cancelled");
        Ok(())
    }
}

/// Writes reminders to a terminal (or any other writer).
pub struct TerminalNotifier<W> {
    out: W,
}

impl<W: Write> TerminalNotifier<W> {
    pub fn new(out: W) -> TerminalNotifier<W> {
        TerminalNotifier { out }
    }
}

impl TerminalNotifier<std::io::Stdout> {
    pub fn stdout() -> Self {
        TerminalNotifier::new(std::io::stdout())
    }
}

impl<W: Write> Notifier for TerminalNotifier<W> {
    fn show(&mut self, notification_id: i32, title: &str, time: &str) {
        let result = writeln!(
            self.out,
            "Task Reminder [{}]: {} is due soon\n    Due at {}",
            notification_id, title, time
        );
        if let Err(e) = result {
            tracing::error!(id = notification_id, "failed to show reminder: {}", e);
        }
    }

    fn dismiss(&mut self, notification_id: i32) {
        // A terminal line cannot be taken back.
        debug!(id = notification_id, "reminder dismissed");
    }
}
