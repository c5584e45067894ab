use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use fern::Dispatch;
use log::info;

use crate::config::LoggingConfig;

const DATE_SUFFIX: &str = "%Y-%m-%d";

/// Install the global logger.
///
/// By default lines go to stdout and to a file that rolls over at local
/// midnight, named `<file_name>.<date>`. Rolled files past the retention
/// period are removed here, at start-up.
pub fn init(config: &LoggingConfig, console_only: bool) -> Result<(), fern::InitError> {
    if console_only {
        pretty_env_logger::try_init()?;
        return Ok(());
    }

    let directory = config.directory();
    fs::create_dir_all(&directory)?;
    let removed = prune_old_logs(
        &directory,
        config.file_name(),
        config.retention_days(),
        Local::now().date_naive(),
    )?;

    Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} - {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                message
            ))
        })
        .level(config.level())
        .chain(io::stdout())
        .chain(fern::DateBased::new(
            directory.join(format!("{}.", config.file_name())),
            DATE_SUFFIX,
        ))
        .apply()?;

    for path in removed {
        info!("Removed expired log file {}", path.display());
    }
    Ok(())
}

/// Delete `<file_name>.<date>` files more than `retention_days` older than
/// `today`.
fn prune_old_logs(
    directory: &Path,
    file_name: &str,
    retention_days: u32,
    today: NaiveDate,
) -> io::Result<Vec<PathBuf>> {
    let prefix = format!("{}.", file_name);
    let mut removed = Vec::new();

    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(date) = name
            .to_str()
            .and_then(|name| name.strip_prefix(&prefix))
            .and_then(|suffix| NaiveDate::parse_from_str(suffix, DATE_SUFFIX).ok())
        else {
            continue;
        };

        if (today - date).num_days() > i64::from(retention_days) {
            fs::remove_file(entry.path())?;
            removed.push(entry.path());
        }
    }

    removed.sort();
    Ok(removed)
}
