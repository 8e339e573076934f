use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Labels offered when creating a task. Stored as free text.
pub const CATEGORIES: [&str; 5] = ["JIRA", "Lunch", "Sync-Up", "Personal", "Meeting"];

/// 24-hour clock format used for `deadline_time` and `start_time`.
pub const CLOCK_FORMAT: &str = "%H:%M";

/// 12-hour clock format used in the display `time` field.
pub const DISPLAY_FORMAT: &str = "%I:%M %p";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A single task, saved as an element of the tasks JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub title: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub deadline_date: String,
    #[serde(default)]
    pub deadline_time: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default)]
    pub notification_id: i32,
}

/// The state of a task. Removal is not a state: a removed task is simply
/// no longer in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Active,
    Completed,
}

impl Task {
    pub fn state(&self) -> TaskState {
        if self.is_completed {
            TaskState::Completed
        } else {
            TaskState::Active
        }
    }

    /// The time the reminder counts back from: the start of a duration
    /// task, or the deadline otherwise.
    pub fn effective_time(&self) -> &str {
        match self.start_time.as_deref() {
            Some(start) if !start.trim().is_empty() => start,
            _ => &self.deadline_time,
        }
    }
}

/// Unvalidated input for a new task.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub category: String,
    pub date: Option<NaiveDate>,
    pub has_duration: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub description: String,
}

/// A required draft field that was left empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Category,
    Date,
    StartTime,
    EndTime,
    Time,
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DraftField::Title => "title",
            DraftField::Category => "category",
            DraftField::Date => "date",
            DraftField::StartTime => "start time",
            DraftField::EndTime => "end time",
            DraftField::Time => "time",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required fields: {}", join_fields(.missing))]
pub struct DraftError {
    pub missing: Vec<DraftField>,
}

fn join_fields(fields: &[DraftField]) -> String {
    fields
        .iter()
        .map(|field| field.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl TaskDraft {
    /// Check every required field, reporting all of the missing ones at once.
    pub fn validate(&self) -> Result<(), DraftError> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push(DraftField::Title);
        }
        if self.category.trim().is_empty() {
            missing.push(DraftField::Category);
        }
        if self.date.is_none() {
            missing.push(DraftField::Date);
        }
        if self.has_duration {
            if self.start_time.is_none() {
                missing.push(DraftField::StartTime);
            }
            if self.end_time.is_none() {
                missing.push(DraftField::EndTime);
            }
        } else if self.end_time.is_none() {
            missing.push(DraftField::Time);
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DraftError { missing })
        }
    }

    /// Build the task this draft describes. The notification id is chosen by
    /// the caller.
    pub fn into_task(self, notification_id: i32) -> Result<Task, DraftError> {
        self.validate()?;

        let missing = |field| DraftError {
            missing: vec![field],
        };
        let date = self.date.ok_or_else(|| missing(DraftField::Date))?;
        let end = self.end_time.ok_or_else(|| missing(DraftField::EndTime))?;
        let start = if self.has_duration {
            self.start_time
        } else {
            None
        };

        let time = match start {
            Some(start) => format!(
                "{} - {}",
                start.format(DISPLAY_FORMAT),
                end.format(DISPLAY_FORMAT)
            ),
            None => end.format(DISPLAY_FORMAT).to_string(),
        };

        Ok(Task {
            title: self.title,
            time,
            category: self.category,
            deadline_date: date.format("%Y-%m-%d").to_string(),
            deadline_time: end.format(CLOCK_FORMAT).to_string(),
            description: self.description,
            is_completed: false,
            start_time: start.map(|start| start.format(CLOCK_FORMAT).to_string()),
            notification_id,
        })
    }
}

/// A reminder that has fired. Only `is_cleared` ever changes after
/// creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: i32,
    pub task_id: i32,
    pub task_title: String,
    pub task_time: String,
    /// ISO local date-time. Kept as text so that one malformed value does
    /// not make the rest of the history unreadable.
    #[serde(default)]
    pub triggered_at: String,
    #[serde(default)]
    pub is_cleared: bool,
}

impl NotificationRecord {
    pub fn stamp(at: NaiveDateTime) -> String {
        at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// When the reminder fired, or `now` if the stored value is unreadable.
    pub fn triggered_at_or(&self, now: NaiveDateTime) -> NaiveDateTime {
        self.triggered_at.trim().parse().unwrap_or(now)
    }
}

/// Parse a clock time: 24-hour first, then 12-hour with meridiem, then
/// the ISO form with seconds.
pub fn parse_clock_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, CLOCK_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(text, DISPLAY_FORMAT))
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S%.f"))
        .ok()
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Display order: active tasks first, then by deadline date and time.
/// Anything unparsable goes to the end of its group.
pub fn sort_for_display(tasks: &mut [Task]) {
    tasks.sort_by_key(|task| {
        let date = parse_date(&task.deadline_date);
        let time = parse_clock_time(&task.deadline_time);
        (task.is_completed, date.is_none(), date, time.is_none(), time)
    });
}

#[cfg(test)]
pub fn task(title: &str, date: &str, time: &str) -> Task {
    Task {
        title: title.to_string(),
        time: time.to_string(),
        category: "Personal".to_string(),
        deadline_date: date.to_string(),
        deadline_time: time.to_string(),
        description: String::new(),
        is_completed: false,
        start_time: None,
        notification_id: 0,
    }
}
