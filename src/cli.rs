use crate::model::parse_clock_time;
use chrono::{NaiveDate, NaiveTime};
use std::path::PathBuf;
use structopt::StructOpt;

fn parse_time(text: &str) -> Result<NaiveTime, String> {
    parse_clock_time(text).ok_or_else(|| format!("invalid time '{}', expected HH:MM or HH:MM AM", text))
}

fn parse_day(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", text))
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Add a new task and schedule its reminder.
    Add {
        /// The task title.
        #[structopt()]
        title: String,

        /// One of JIRA, Lunch, Sync-Up, Personal, Meeting (any text is accepted).
        #[structopt(short, long)]
        category: Option<String>,

        /// Deadline date (YYYY-MM-DD).
        #[structopt(short, long, parse(try_from_str=parse_day))]
        date: Option<NaiveDate>,

        /// Deadline time (HH:MM or HH:MM AM).
        #[structopt(short, long, parse(try_from_str=parse_time))]
        time: Option<NaiveTime>,

        /// Start time; makes the task a duration task.
        #[structopt(short, long, parse(try_from_str=parse_time))]
        start: Option<NaiveTime>,

        /// The task spans a time range. Implied by --start.
        #[structopt(long)]
        duration: bool,

        /// Free text details.
        #[structopt(long, default_value = "")]
        description: String,
    },
    /// List tasks, pending first.
    List,
    /// Mark the task at a list position as completed.
    Done {
        #[structopt()]
        position: usize,
    },
    /// Remove the task at a list position.
    Rm {
        #[structopt()]
        position: usize,
    },
    /// Remove every task and cancel their reminders.
    ClearTasks,
    /// Show pending reminders.
    Alarms,
    /// Deliver every reminder that is due. Meant to run from cron or a timer.
    Fire,
    /// Dismiss a reminder and remove the task it belongs to.
    Dismiss {
        #[structopt()]
        notification_id: i32,
    },
    /// Show the notification history.
    Notifications {
        /// Include cleared notifications.
        #[structopt(short, long)]
        all: bool,
    },
    /// Clear one notification from the history.
    Clear {
        #[structopt()]
        id: i32,
    },
    /// Clear every notification in the history.
    ClearAll,
}

#[derive(Debug, StructOpt)]
#[structopt(name = "listify", about = "A personal task list with deadline reminders.")]
pub struct CommandLineArgs {
    #[structopt(subcommand)]
    pub action: Command,

    /// Use a different data file.
    #[structopt(parse(from_os_str), short = "f", long, env = "LISTIFY_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Behave as if exact alarms were not permitted; reminders are skipped.
    #[structopt(long)]
    pub deny_exact_alarms: bool,

    /// Log debug output.
    #[structopt(short, long)]
    pub verbose: bool,

    /// Log errors only.
    #[structopt(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_parses_duration_task() {
        let args = CommandLineArgs::from_iter_safe(&[
            "listify", "add", "standup", "-c", "Meeting", "-d", "2024-01-01", "-s", "09:00", "-t",
            "10:00 AM",
        ])
        .unwrap();
        match args.action {
            Command::Add {
                title, date, time, start, ..
            } => {
                assert_eq!(title, "standup");
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 1));
                assert_eq!(start, NaiveTime::from_hms_opt(9, 0, 0));
                assert_eq!(time, NaiveTime::from_hms_opt(10, 0, 0));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn bad_time_is_rejected() {
        let result =
            CommandLineArgs::from_iter_safe(&["listify", "add", "x", "-t", "quarter past"]);
        assert!(result.is_err());
    }
}
