//! Tracing subscriber initialization.
//!
//! Logs go to a file so they never interleave with the chat transcript.
//! Follow them with `tail -f $QUILL_HOME/logs/quill.log`.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Installs a file-backed subscriber filtered by `RUST_LOG` (default `info`).
///
/// Creates the log directory if it doesn't exist.
///
/// # Errors
/// Returns an error if the directory cannot be created, the path has no file
/// name, or a global subscriber is already installed.
pub fn init(log_path: &Path) -> Result<()> {
    let directory = log_path
        .parent()
        .ok_or_else(|| anyhow!("Log path has no parent directory: {}", log_path.display()))?;
    std::fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create log directory {}", directory.display()))?;

    let file_name = log_path
        .file_name()
        .ok_or_else(|| anyhow!("Invalid log file path: {}", log_path.display()))?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Tracing subscriber already initialized: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_log_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_file = dir.path().join("logs").join("quill.log");

        // A second init in the same process fails; the directory is created first either way.
        let _ = init(&log_file);

        assert!(dir.path().join("logs").is_dir());
    }
}
