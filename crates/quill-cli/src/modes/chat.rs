//! Interactive chat: reads lines from stdin and streams each reply.

use std::io::{self, IsTerminal, Write};
use std::path::Path;

use anyhow::{Context, Result};
use quill_core::config::Config;
use quill_core::core::{Conversation, DisplayState, FALLBACK_ERROR_MESSAGE, Transport};
use quill_core::markup::parse_all;
use quill_core::providers::MISSING_CREDENTIAL_MESSAGE;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::warn;

use super::render::{render_records, terminal_width, write_line};
use super::{connect, deliver_report, run_turn};

const PROMPT: &str = "> ";

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Send(&'a str),
    Skip,
    Quit,
}

fn parse_input(line: &str) -> Input<'_> {
    let text = line.trim_end_matches(['\n', '\r']);
    match text.trim() {
        "" => Input::Skip,
        "/quit" | "/exit" => Input::Quit,
        _ => Input::Send(text),
    }
}

fn print_markup(out: &mut impl Write, text: &str, ansi: bool) -> io::Result<()> {
    for line in render_records(&parse_all(text), terminal_width()) {
        write_line(out, &line, ansi)?;
    }
    out.flush()
}

/// Runs the chat loop until EOF or `/quit`.
///
/// Without an API key the credential hint is shown in place of the greeting
/// and no turn is started.
///
/// # Errors
/// Returns an error if setup fails for another reason or the terminal I/O fails.
pub async fn run_interactive_chat(config: &Config) -> Result<()> {
    let mut stdout = io::stdout();
    let ansi = stdout.is_terminal();

    let mut conversation = match connect(config) {
        Ok(conversation) => conversation,
        Err(e) if e.to_string().starts_with(MISSING_CREDENTIAL_MESSAGE) => {
            print_markup(&mut stdout, &e.to_string(), ansi)?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    print_markup(&mut stdout, &config.greeting, ansi)?;
    let input = BufReader::new(tokio::io::stdin());
    let turns = chat_loop(&mut conversation, input, &config.output_dir(), ansi).await?;
    writeln!(stdout)?;
    tracing::info!(turns, "chat ended");
    Ok(())
}

/// Sends each non-blank input line as a turn. Returns the number of turns.
async fn chat_loop<T, R>(
    conversation: &mut Conversation<T>,
    input: R,
    output_dir: &Path,
    live: bool,
) -> Result<usize>
where
    T: Transport,
    R: AsyncBufRead + Unpin,
{
    let mut stdout = io::stdout();
    let mut lines = input.lines();
    let mut turns = 0;

    loop {
        write!(stdout, "\n{PROMPT}")?;
        stdout.flush()?;
        let Some(line) = lines.next_line().await.context("read input")? else {
            break;
        };

        let text = match parse_input(&line) {
            Input::Quit => break,
            Input::Skip => continue,
            Input::Send(text) => text,
        };
        writeln!(stdout)?;
        turns += 1;

        if let DisplayState::Download(artifact) = run_turn(conversation, text, live).await?
            && let Err(e) = deliver_report(&artifact, output_dir)
        {
            warn!(error = %format!("{e:#}"), "failed to save report");
            writeln!(stdout, "{FALLBACK_ERROR_MESSAGE}")?;
        }
    }

    Ok(turns)
}
