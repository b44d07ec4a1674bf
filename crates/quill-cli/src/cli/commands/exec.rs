//! Exec command handler.

use std::path::Path;

use anyhow::{Context, Result};
use quill_core::config;

use crate::modes;

pub async fn run(
    prompt: &str,
    config: &config::Config,
    output_dir_override: Option<&Path>,
) -> Result<()> {
    let output_dir = output_dir_override.map_or_else(|| config.output_dir(), Path::to_path_buf);

    modes::exec::run_exec(prompt, config, &output_dir)
        .await
        .context("execute prompt")
}
