//! Chat command handler.

use std::io::{IsTerminal, Read};

use anyhow::{Context, Result};
use quill_core::config;

use super::exec;
use crate::modes;

pub async fn run(config: &config::Config) -> Result<()> {
    // If stdin is piped, run exec mode instead
    if !std::io::stdin().is_terminal() {
        let mut prompt = String::new();
        std::io::stdin().lock().read_to_string(&mut prompt)?;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            anyhow::bail!("No input provided via pipe");
        }
        return exec::run(prompt, config, None).await;
    }

    modes::chat::run_interactive_chat(config)
        .await
        .context("interactive chat failed")
}
