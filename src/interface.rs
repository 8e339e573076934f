use crate::alarms::{AlarmQueue, TerminalNotifier};
use crate::config::Settings;
use crate::flags::AppFlags;
use crate::history::NotificationHistory;
use crate::lifecycle::TaskLifecycle;
use crate::model::{NotificationRecord, Task, TaskDraft, TaskState, CATEGORIES};
use crate::receiver::{on_cancel_action, Receiver};
use crate::reminder::{Alarm, Clock, ReminderScheduler, SystemClock};
use crate::storage::open_database;
use crate::store::TaskStore;
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use humantime::format_duration;
use prettytable::Table;
use std::io::Stdout;

const DESCRIPTION_WIDTH: usize = 40;

pub type Lifecycle = TaskLifecycle<AlarmQueue, TerminalNotifier<Stdout>, SystemClock>;

/// Wire the task store and the alarm queue to the data file.
pub fn open_lifecycle(settings: &Settings) -> Result<Lifecycle> {
    let store = TaskStore::open(open_database(&settings.data_file)?);
    let queue = AlarmQueue::new(
        open_database(&settings.data_file)?,
        settings.exact_alarms_allowed,
    );
    let reminders = ReminderScheduler::new(queue, TerminalNotifier::stdout(), SystemClock);
    Ok(TaskLifecycle::new(store, reminders))
}

pub fn add_task(settings: &Settings, draft: TaskDraft) -> Result<()> {
    let mut lifecycle = open_lifecycle(settings)?;
    let task = lifecycle.create(draft).context("Task was not created")?;
    if !CATEGORIES.contains(&task.category.as_str()) {
        tracing::info!(category = %task.category, "using a custom category");
    }
    println!("{} ({}, {} {})", task.title, task.category, task.deadline_date, task.time);
    Ok(())
}

pub fn list(settings: &Settings) -> Result<()> {
    let mut lifecycle = open_lifecycle(settings)?;
    let tasks = lifecycle.sorted_tasks();
    if tasks.is_empty() {
        println!("No tasks. Use 'listify add' to create one.");
        return Ok(());
    }
    tasks_table(&tasks).printstd();

    let mut flags = AppFlags::open(open_database(&settings.data_file)?);
    if flags.is_first_time_with_swipe()? {
        println!("Tip: 'listify done <n>' completes a task, 'listify rm <n>' removes it.");
        flags.set_first_time_with_swipe(false)?;
    }
    Ok(())
}

pub fn complete(settings: &Settings, position: usize) -> Result<()> {
    let mut lifecycle = open_lifecycle(settings)?;
    let tasks = lifecycle.sorted_tasks();
    let task = task_at(&tasks, position)?;
    if task.is_completed {
        println!("'{}' is already completed.", task.title);
        return Ok(());
    }
    match lifecycle.complete(task) {
        Some(done) => println!("Completed '{}'.", done.title),
        None => println!("'{}' is gone.", task.title),
    }
    Ok(())
}

pub fn remove(settings: &Settings, position: usize) -> Result<()> {
    let mut lifecycle = open_lifecycle(settings)?;
    let tasks = lifecycle.sorted_tasks();
    let task = task_at(&tasks, position)?;
    lifecycle.remove(task);
    println!("Removed '{}'.", task.title);
    Ok(())
}

pub fn clear_tasks(settings: &Settings) -> Result<()> {
    open_lifecycle(settings)?.clear_all();
    println!("All tasks removed.");
    Ok(())
}

pub fn alarms(settings: &Settings) -> Result<()> {
    let queue = AlarmQueue::new(
        open_database(&settings.data_file)?,
        settings.exact_alarms_allowed,
    );
    let pending = queue.pending()?;
    if pending.is_empty() {
        println!("No pending reminders.");
    } else {
        alarms_table(&pending, SystemClock.now()).printstd();
    }
    Ok(())
}

pub fn fire(settings: &Settings) -> Result<()> {
    let mut queue = AlarmQueue::new(
        open_database(&settings.data_file)?,
        settings.exact_alarms_allowed,
    );
    let mut history = NotificationHistory::open(open_database(&settings.data_file)?);
    let mut notifier = TerminalNotifier::stdout();
    let clock = SystemClock;
    Receiver::new(&mut history, &mut notifier, &clock).deliver_due(&mut queue)?;
    Ok(())
}

pub fn dismiss(settings: &Settings, notification_id: i32) -> Result<()> {
    let mut lifecycle = open_lifecycle(settings)?;
    if on_cancel_action(&mut lifecycle, notification_id) {
        println!("Task for reminder {} removed.", notification_id);
    } else {
        println!("No task owns reminder {}.", notification_id);
    }
    Ok(())
}

pub fn notifications(settings: &Settings, all: bool) -> Result<()> {
    let history = NotificationHistory::open(open_database(&settings.data_file)?);
    let records = if all { history.list() } else { history.active() };
    if records.is_empty() {
        println!("No notifications.");
    } else {
        records_table(&records, SystemClock.now()).printstd();
    }
    Ok(())
}

pub fn clear_notification(settings: &Settings, id: i32) -> Result<()> {
    NotificationHistory::open(open_database(&settings.data_file)?).clear(id);
    Ok(())
}

pub fn clear_all_notifications(settings: &Settings) -> Result<()> {
    NotificationHistory::open(open_database(&settings.data_file)?).clear_all();
    Ok(())
}

/// The task at a 1-based list position.
fn task_at(tasks: &[Task], position: usize) -> Result<&Task> {
    position
        .checked_sub(1)
        .and_then(|index| tasks.get(index))
        .ok_or_else(|| anyhow!("No task at position {} (there are {}).", position, tasks.len()))
}

fn tasks_table(tasks: &[Task]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["#", "", "task", "category", "date", "time", "description"]);
    for (index, task) in tasks.iter().enumerate() {
        let position = index + 1;
        let done = match task.state() {
            TaskState::Active => " ",
            TaskState::Completed => "x",
        };
        let description = textwrap::fill(&task.description, DESCRIPTION_WIDTH);
        table.add_row(row![
            position,
            done,
            task.title,
            task.category,
            task.deadline_date,
            task.time,
            description
        ]);
    }
    table
}

fn alarms_table(alarms: &[Alarm], now: NaiveDateTime) -> Table {
    let mut table = Table::new();
    table.add_row(row!["id", "task", "fires at", "in"]);
    for alarm in alarms {
        let wait = match (alarm.trigger_at - now).to_std() {
            Ok(wait) => format_duration(wait).to_string(),
            Err(_) => "due".to_string(),
        };
        let fires_at = alarm.trigger_at.format("%Y-%m-%d %H:%M");
        table.add_row(row![alarm.notification_id, alarm.title, fires_at, wait]);
    }
    table
}

fn records_table(records: &[NotificationRecord], now: NaiveDateTime) -> Table {
    let mut table = Table::new();
    table.add_row(row!["id", "task", "due", "fired at", "cleared"]);
    for record in records {
        let fired_at = record.triggered_at_or(now).format("%Y-%m-%d %H:%M");
        let cleared = if record.is_cleared { "yes" } else { "" };
        table.add_row(row![
            record.id,
            record.task_title,
            record.task_time,
            fired_at,
            cleared
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task;
    use crate::testing::at;

    #[test]
    fn positions_are_one_based() {
        let tasks = vec![task("a", "2024-01-01", "10:00"), task("b", "2024-01-01", "11:00")];
        assert_eq!(task_at(&tasks, 1).unwrap().title, "a");
        assert_eq!(task_at(&tasks, 2).unwrap().title, "b");
        assert!(task_at(&tasks, 0).is_err());
        assert!(task_at(&tasks, 3).is_err());
    }

    #[test]
    fn task_table_marks_completed() {
        let mut done = task("done", "2024-01-01", "10:00");
        done.is_completed = true;
        let text = tasks_table(&[task("open", "2024-01-02", "10:00"), done]).to_string();
        assert!(text.contains("open"));
        assert!(text.contains("| x | done"));
    }

    #[test]
    fn alarm_table_shows_time_left() {
        let alarm = Alarm {
            notification_id: 1,
            trigger_at: at("2024-01-01 09:50"),
            title: "standup".to_string(),
            time: "10:00 AM".to_string(),
        };
        let text = alarms_table(&[alarm.clone()], at("2024-01-01 08:20")).to_string();
        assert!(text.contains("1h 30m"));
        let text = alarms_table(&[alarm], at("2024-01-01 10:00")).to_string();
        assert!(text.contains("due"));
    }

    #[test]
    fn record_table_shows_now_for_unreadable_time() {
        let record = NotificationRecord {
            id: 1,
            task_id: 4,
            task_title: "standup".to_string(),
            task_time: "10:00 AM".to_string(),
            triggered_at: "garbage".to_string(),
            is_cleared: false,
        };
        let text = records_table(&[record], at("2024-01-01 12:30")).to_string();
        assert!(text.contains("2024-01-01 12:30"));
    }
}
