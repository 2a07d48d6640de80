use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

pub const RETENTION_DAYS: i64 = 7;

const LOG_PREFIX: &str = "sync_log.";
const LOG_SUFFIX: &str = ".log";
const LOG_DATE_FORMAT: &str = "%Y-%m-%d";

/// Installs the global logger: colored stderr plus a file in `log_dir` that
/// rolls over daily. Files older than a week are removed afterwards.
///
/// A log directory that cannot be created only costs the file sink.
pub fn init(log_dir: &Path, level: LevelFilter) -> Result<(), anyhow::Error> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::BrightBlack);

    let stderr = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    let mut dispatch = fern::Dispatch::new()
        .level(level)
        .level_for("rspotify", LevelFilter::Warn)
        .level_for("rspotify_http", LevelFilter::Warn)
        .level_for("ureq", LevelFilter::Warn)
        .chain(stderr);

    let file_sink = match fs::create_dir_all(log_dir) {
        Ok(()) => {
            let file = fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{} | {:<5} | {} - {}",
                        chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                        record.level(),
                        record.target(),
                        message
                    ))
                })
                .chain(fern::DateBased::new(
                    log_dir.join(LOG_PREFIX),
                    format!("{}{}", LOG_DATE_FORMAT, LOG_SUFFIX),
                ));
            dispatch = dispatch.chain(file);
            true
        }
        Err(e) => {
            eprintln!(
                "cannot create log directory {}: {}; logging to stderr only",
                log_dir.display(),
                e
            );
            false
        }
    };

    dispatch.apply()?;

    if file_sink {
        let today = chrono::Local::now().date_naive();
        match prune_expired(log_dir, today, RETENTION_DAYS) {
            Ok(removed) => {
                for path in removed {
                    log::debug!("removed expired log file {}", path.display());
                }
            }
            Err(e) => log::warn!("failed to prune old log files: {}", e),
        }
    }
    Ok(())
}

/// Deletes `sync_log.<date>.log` files in `log_dir` dated more than
/// `keep_days` before `today`. Files that do not follow the naming scheme
/// are left alone.
pub fn prune_expired(
    log_dir: &Path,
    today: NaiveDate,
    keep_days: i64,
) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut removed = Vec::new();
    for entry in fs::read_dir(log_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let Some(date) = entry.file_name().to_str().and_then(log_file_date) else {
            continue;
        };
        if (today - date).num_days() > keep_days {
            let path = entry.path();
            fs::remove_file(&path)?;
            removed.push(path);
        }
    }
    removed.sort();
    Ok(removed)
}

fn log_file_date(file_name: &str) -> Option<NaiveDate> {
    let date = file_name
        .strip_prefix(LOG_PREFIX)?
        .strip_suffix(LOG_SUFFIX)?;
    NaiveDate::parse_from_str(date, LOG_DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, LOG_DATE_FORMAT).unwrap()
    }

    #[test]
    fn parses_rotated_file_names() {
        assert_eq!(log_file_date("sync_log.2024-03-09.log"), Some(date("2024-03-09")));
        assert_eq!(log_file_date("sync_log.log"), None);
        assert_eq!(log_file_date("sync_log.2024-13-01.log"), None);
        assert_eq!(log_file_date("other.2024-03-09.log"), None);
    }

    #[test]
    fn prunes_only_expired_log_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "sync_log.2024-03-01.log",
            "sync_log.2024-03-02.log",
            "sync_log.2024-03-03.log",
            "sync_log.2024-03-10.log",
            "notes.txt",
            "sync_log.garbage.log",
        ] {
            fs::write(dir.path().join(name), "x").unwrap();
        }

        let removed = prune_expired(dir.path(), date("2024-03-10"), 7).unwrap();

        let removed: Vec<String> = removed
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(removed, vec!["sync_log.2024-03-01.log", "sync_log.2024-03-02.log"]);

        let mut left: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(
            left,
            vec![
                "notes.txt",
                "sync_log.2024-03-03.log",
                "sync_log.2024-03-10.log",
                "sync_log.garbage.log",
            ]
        );
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(prune_expired(&dir.path().join("nope"), date("2024-03-10"), 7).is_err());
    }
}
