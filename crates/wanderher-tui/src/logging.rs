use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use wanderher_core::Config;

const LOG_FILE: &str = "wanderher.log";
const DEFAULT_FILTER: &str = "info";

/// Send logs to a daily `wanderher.log` in the config directory.
///
/// The terminal is owned by the UI, so nothing may be written to stdout or
/// stderr while it runs. Lines are flushed by a background worker until the
/// returned guard is dropped.
/// Returns the log directory with the guard.
pub fn init() -> Result<(PathBuf, WorkerGuard)> {
    let dir = Config::config_dir()?;
    let guard = init_in(&dir)?;
    Ok((dir, guard))
}

fn writer_in(dir: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE);
    Ok(tracing_appender::non_blocking(file_appender))
}

fn init_in(dir: &Path) -> Result<WorkerGuard> {
    let (non_blocking, guard) = writer_in(dir)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!("Failed to install logger: {}", e))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_writer_creates_dir_and_daily_file() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("nested").join("logs");

        let (mut writer, guard) = writer_in(&dir).unwrap();
        writer.write_all(b"hello from the client\n").unwrap();
        // Dropping the guard flushes the background worker
        drop(guard);

        let files: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].starts_with(LOG_FILE));

        let content = fs::read_to_string(dir.join(&files[0])).unwrap();
        assert!(content.contains("hello from the client"));
    }
}
