use crate::model::NotificationRecord;
use crate::storage::Preferences;
use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{debug, error};

pub const NOTIFICATIONS_NAMESPACE: &str = "notifications_prefs";
pub const NOTIFICATIONS_KEY: &str = "notification_records";

/// Log of fired reminders, most recent first. Records are never removed,
/// only flagged as cleared.
pub struct NotificationHistory {
    prefs: Preferences,
}

impl NotificationHistory {
    pub fn open(db: Connection) -> NotificationHistory {
        NotificationHistory {
            prefs: Preferences::new(db, NOTIFICATIONS_NAMESPACE),
        }
    }

    /// Every record, cleared or not. An unreadable history reads as empty.
    pub fn list(&self) -> Vec<NotificationRecord> {
        match self.read() {
            Ok(records) => records,
            Err(e) => {
                error!("failed to load notification history: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Records not yet cleared by the user.
    pub fn active(&self) -> Vec<NotificationRecord> {
        self.list().into_iter().filter(|r| !r.is_cleared).collect()
    }

    /// Identity for the next record.
    pub fn next_id(&self) -> i32 {
        self.list()
            .iter()
            .map(|r| r.id)
            .max()
            .map_or(1, |id| id.saturating_add(1))
    }

    /// Prepend `entry`. Nothing is written if the stored history cannot be
    /// read, so an unreadable history is never overwritten.
    pub fn record(&mut self, entry: NotificationRecord) {
        let mut records = match self.read_for_update() {
            Some(records) => records,
            None => return,
        };
        debug!(id = entry.id, task_id = entry.task_id, "recording notification");
        records.insert(0, entry);
        self.save(&records);
    }

    pub fn clear(&mut self, id: i32) {
        let mut records = match self.read_for_update() {
            Some(records) => records,
            None => return,
        };
        if let Some(record) = records.iter_mut().find(|r| r.id == id) {
            record.is_cleared = true;
            self.save(&records);
        } else {
            debug!(id, "no notification to clear");
        }
    }

    pub fn clear_all(&mut self) {
        let mut records = match self.read_for_update() {
            Some(records) => records,
            None => return,
        };
        for record in records.iter_mut().filter(|r| !r.is_cleared) {
            record.is_cleared = true;
        }
        self.save(&records);
    }

    fn read(&self) -> Result<Vec<NotificationRecord>> {
        let json = self
            .prefs
            .get_string(NOTIFICATIONS_KEY)?
            .unwrap_or_else(|| "[]".to_string());
        let records =
            serde_json::from_str(&json).context("Failed to decode notification history.")?;
        Ok(records)
    }

    fn read_for_update(&self) -> Option<Vec<NotificationRecord>> {
        match self.read() {
            Ok(records) => Some(records),
            Err(e) => {
                error!("notification history left untouched: {:#}", e);
                None
            }
        }
    }

    fn save(&mut self, records: &[NotificationRecord]) {
        let result = serde_json::to_string(records)
            .context("Failed to encode notification history.")
            .and_then(|json| self.prefs.put_string(NOTIFICATIONS_KEY, &json));
        if let Err(e) = result {
            error!("failed to save notification history: {:#}", e);
        }
    }
}
