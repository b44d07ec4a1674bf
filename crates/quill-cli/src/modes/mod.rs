//! Runtime execution modes.
//!
//! - `exec`: one turn, prints the terminal state
//! - `chat`: line-based interactive chat with in-place redraw
//! - `render`: terminal rendering shared by both

pub mod chat;
pub mod exec;
pub mod render;

use std::io::{IsTerminal, Write};
use std::path::Path;

use anyhow::{Context, Result};
use quill_core::config::Config;
use quill_core::core::{
    Conversation, DisplayRx, DisplaySender, DisplayState, ReportArtifact, Transport,
    create_display_channel,
};
use quill_core::providers::gemini::{GeminiClient, GeminiConfig};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use self::render::{TurnRenderer, terminal_width};

pub const REPORT_READY_MESSAGE: &str = "I've prepared the report you requested.";

/// Builds a Gemini-backed conversation from config.
///
/// # Errors
/// Returns an error when no API key is configured, the base URL is invalid,
/// or the system prompt file cannot be read.
pub fn connect(config: &Config) -> Result<Conversation<GeminiClient>> {
    let gemini = &config.providers.gemini;
    let gemini_config = GeminiConfig::from_env(
        config.model.clone(),
        config.max_tokens,
        gemini.effective_base_url(),
        gemini.effective_api_key(),
    )?;
    let system_prompt = config.effective_system_prompt()?;
    info!(model = %gemini_config.model, "connecting to gemini");

    Ok(Conversation::new(
        GeminiClient::new(gemini_config),
        Some(system_prompt),
        config.report.clone(),
    ))
}

/// Spawns a task that renders display states until the channel closes.
pub fn spawn_render_task(mut rx: DisplayRx, live: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        let stdout = std::io::stdout();
        let ansi = stdout.is_terminal();
        let mut renderer = TurnRenderer::new(stdout, terminal_width(), ansi, live);
        while let Some(state) = rx.recv().await {
            if let Err(e) = renderer.handle(&state) {
                debug!(error = %e, "render failed");
                break;
            }
        }
    })
}

/// Runs one turn and waits until its last state has been drawn.
///
/// # Errors
/// Returns an error if the message is blank or the render task panicked.
pub async fn run_turn<T: Transport>(
    conversation: &mut Conversation<T>,
    text: &str,
    live: bool,
) -> Result<DisplayState> {
    let (tx, rx) = create_display_channel();
    let renderer = spawn_render_task(rx, live);
    let sender = DisplaySender::new(tx);

    let result = conversation.send_turn(text, &sender).await;
    drop(sender);
    renderer.await.context("render task")?;
    result
}

/// Saves a report into `dir` and announces it on stdout.
///
/// # Errors
/// Returns an error if the PDF cannot be written.
pub fn deliver_report(artifact: &ReportArtifact, dir: &Path) -> Result<()> {
    let path = artifact.save_in(dir)?;
    info!(path = %path.display(), title = %artifact.title, "report saved");

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{REPORT_READY_MESSAGE} Saved: {}", path.display())?;
    stdout.flush()?;
    Ok(())
}
