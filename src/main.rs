#[macro_use]
extern crate prettytable;

use structopt::StructOpt;

mod alarms;
mod cli;
mod config;
mod flags;
mod history;
mod interface;
mod lifecycle;
mod model;
mod receiver;
mod reminder;
mod storage;
mod store;
#[cfg(test)]
mod testing;

use cli::{Command::*, CommandLineArgs};
use config::{init_tracing, Settings};
use model::TaskDraft;

fn main() -> anyhow::Result<()> {
    // Get the command-line arguments.
    let args = CommandLineArgs::from_args();
    let settings = Settings::resolve(&args)?;
    init_tracing(&settings)?;
    tracing::debug!(data_file = %settings.data_file.display(), "starting");

    // Perform the action.
    match args.action {
        Add {
            title,
            category,
            date,
            time,
            start,
            duration,
            description,
        } => {
            let draft = TaskDraft {
                title,
                category: category.unwrap_or_default(),
                date,
                has_duration: duration || start.is_some(),
                start_time: start,
                end_time: time,
                description,
            };
            interface::add_task(&settings, draft)
        }
        List => interface::list(&settings),
        Done { position } => interface::complete(&settings, position),
        Rm { position } => interface::remove(&settings, position),
        ClearTasks => interface::clear_tasks(&settings),
        Alarms => interface::alarms(&settings),
        Fire => interface::fire(&settings),
        Dismiss { notification_id } => interface::dismiss(&settings, notification_id),
        Notifications { all } => interface::notifications(&settings, all),
        Clear { id } => interface::clear_notification(&settings, id),
        ClearAll => interface::clear_all_notifications(&settings),
    }?;
    Ok(())
}
