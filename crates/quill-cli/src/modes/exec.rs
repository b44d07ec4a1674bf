//! Exec mode: a single turn without interaction.

use std::io::IsTerminal;
use std::path::Path;

use anyhow::{Result, bail};
use quill_core::config::{Config, paths};
use quill_core::core::DisplayState;

use super::{connect, deliver_report, run_turn};

/// Sends `prompt` as the only message and prints the reply.
///
/// Snapshots are only drawn live when stdout is a terminal. A failed turn
/// prints the fallback message and exits non-zero.
///
/// # Errors
/// Returns an error if setup fails, the turn fails, or a report cannot be saved.
pub async fn run_exec(prompt: &str, config: &Config, output_dir: &Path) -> Result<()> {
    let mut conversation = connect(config)?;
    let live = std::io::stdout().is_terminal();

    match run_turn(&mut conversation, prompt, live).await? {
        DisplayState::Download(artifact) => deliver_report(&artifact, output_dir),
        DisplayState::Failed(_) => {
            bail!("Reply failed, details in {}", paths::log_path().display())
        }
        _ => Ok(()),
    }
}
