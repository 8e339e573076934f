use crate::cli::CommandLineArgs;
use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Environment variable holding a `tracing` filter, e.g. `listify=debug`.
pub const LOG_ENV: &str = "LISTIFY_LOG";

/// Runtime settings resolved from the command line and the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_file: PathBuf,
    pub exact_alarms_allowed: bool,
    pub log_level: &'static str,
}

impl Settings {
    pub fn resolve(args: &CommandLineArgs) -> Result<Settings> {
        let data_file = match &args.data_file {
            Some(path) => path.clone(),
            None => default_data_file()?,
        };
        Ok(Settings {
            data_file,
            exact_alarms_allowed: !args.deny_exact_alarms,
            log_level: log_level(args.quiet, args.verbose),
        })
    }
}

fn log_level(quiet: bool, verbose: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// `<data dir>/listify.sqlite`, creating the directory if needed.
fn default_data_file() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "example", "listify")
        .ok_or_else(|| anyhow!("Failed to find a home directory for the data file."))?;
    let root_dir = dirs.data_dir();
    if !root_dir.exists() {
        std::fs::create_dir_all(root_dir)
            .with_context(|| format!("Failed to create directory {}.", root_dir.display()))?;
    }
    Ok(root_dir.join("listify.sqlite"))
}

/// Send logs to stderr. `LISTIFY_LOG` overrides the level picked by flags.
pub fn init_tracing(settings: &Settings) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(settings.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to initialize tracing subscriber: {}", error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use structopt::StructOpt;

    #[test]
    fn explicit_data_file_and_flags() {
        let args = CommandLineArgs::from_iter_safe(&[
            "listify",
            "-f",
            "/tmp/tasks.sqlite",
            "--deny-exact-alarms",
            "-v",
            "list",
        ])
        .unwrap();
        let settings = Settings::resolve(&args).unwrap();
        assert_eq!(
            settings,
            Settings {
                data_file: PathBuf::from("/tmp/tasks.sqlite"),
                exact_alarms_allowed: false,
                log_level: "debug",
            }
        );
    }

    #[test]
    fn quiet_wins_over_default() {
        assert_eq!(log_level(true, false), "error");
        assert_eq!(log_level(false, false), "warn");
    }
}
