//! Per-turn streaming accumulator.
//!
//! A [`StreamTurn`] owns the reply buffer of one in-flight model turn. Every
//! fragment re-parses the whole buffer, so the display always reflects the
//! cumulative text rather than a diff. Completion scans the buffer for a
//! [`ReportDirective`]; failure replaces the partial text with a fixed message.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::directive::ReportDirective;
use crate::document::Document;
use crate::layout::{LayoutConfig, layout_document};
use crate::markup::{self, LineRecord};

/// Shown in place of the partial reply when a turn fails.
pub const FALLBACK_ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Lifecycle of a [`StreamTurn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// No fragment received yet.
    Empty,
    Streaming,
    /// Completed or failed; further fragments are ignored.
    Finalized,
}

/// What the shell should show for a turn at a given moment.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    /// Cumulative line records while fragments are arriving.
    Streaming(Vec<LineRecord>),
    /// Final reply shown as text.
    Plain(Vec<LineRecord>),
    /// Final reply rendered as a downloadable report.
    Download(ReportArtifact),
    /// The turn failed; carries the user-facing message.
    Failed(String),
}

impl DisplayState {
    /// Whether this state ends the turn.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Streaming(_))
    }
}

/// Result of a successfully completed turn, before layout.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Plain(Vec<LineRecord>),
    Report(ReportDirective),
}

impl TurnOutcome {
    /// Resolves the outcome to a terminal display state, laying out reports.
    ///
    /// # Errors
    /// Returns an error if the report layout fails.
    pub fn into_display(self, config: &LayoutConfig) -> Result<DisplayState> {
        match self {
            Self::Plain(lines) => Ok(DisplayState::Plain(lines)),
            Self::Report(directive) => Ok(DisplayState::Download(ReportArtifact::from_directive(
                &directive, config,
            )?)),
        }
    }
}

/// A laid-out report offered for download.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifact {
    pub title: String,
    pub file_name: String,
    pub document: Document,
}

impl ReportArtifact {
    /// Lays out the directive's content under its title.
    ///
    /// # Errors
    /// Returns an error if the layout fails.
    pub fn from_directive(directive: &ReportDirective, config: &LayoutConfig) -> Result<Self> {
        let document = layout_document(&directive.title, &directive.content, config)
            .with_context(|| format!("Failed to lay out report '{}'", directive.title))?;
        Ok(Self {
            title: directive.title.clone(),
            file_name: directive.file_name(),
            document,
        })
    }

    pub fn to_pdf(&self) -> Vec<u8> {
        self.document.to_pdf()
    }

    /// Writes the PDF into `dir` under the suggested file name.
    ///
    /// Path separators in the title become `_`, so the file always lands
    /// directly inside `dir`.
    ///
    /// # Errors
    /// Returns an error if the name cannot be used as a plain file name, the
    /// directory cannot be created, or the file cannot be written.
    pub fn save_in(&self, dir: &Path) -> Result<PathBuf> {
        let name = local_file_name(&self.file_name)?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(&name);
        if path.parent() != Some(dir) {
            bail!("Report file name '{name}' escapes {}", dir.display());
        }
        std::fs::write(&path, self.to_pdf())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// Reduces a suggested name to a single path component.
fn local_file_name(suggested: &str) -> Result<String> {
    let name: String = suggested
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if name.is_empty() || name == "." || name == ".." {
        bail!("Unusable report file name '{suggested}'");
    }
    Ok(name)
}

/// Accumulated state of one model reply.
#[derive(Debug, Clone)]
pub struct StreamTurn {
    text: String,
    lines: Vec<LineRecord>,
    phase: TurnPhase,
}

impl Default for StreamTurn {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamTurn {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            lines: Vec::new(),
            phase: TurnPhase::Empty,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// The accumulated reply text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Line records last emitted for display.
    pub fn lines(&self) -> &[LineRecord] {
        &self.lines
    }

    /// Appends a fragment and returns the re-parsed buffer.
    ///
    /// Returns `None` once the turn is finalized.
    pub fn on_fragment(&mut self, fragment: &str) -> Option<DisplayState> {
        if self.phase == TurnPhase::Finalized {
            debug!(len = fragment.len(), "fragment after finalize ignored");
            return None;
        }
        self.text.push_str(fragment);
        self.phase = TurnPhase::Streaming;
        self.lines = markup::parse_all(&self.text);
        Some(DisplayState::Streaming(self.lines.clone()))
    }

    /// Finalizes the turn and scans the buffer for a report directive.
    ///
    /// Returns `None` if the turn was already finalized.
    pub fn on_complete(&mut self) -> Option<TurnOutcome> {
        if self.phase == TurnPhase::Finalized {
            return None;
        }
        self.phase = TurnPhase::Finalized;
        match ReportDirective::decode(&self.text) {
            Some(directive) => {
                info!(title = %directive.title, "report directive detected");
                Some(TurnOutcome::Report(directive))
            }
            None => Some(TurnOutcome::Plain(self.lines.clone())),
        }
    }

    /// Finalizes the turn as failed. The partial buffer is no longer displayed.
    ///
    /// Returns `None` if the turn was already finalized.
    pub fn on_error(&mut self, reason: &str) -> Option<DisplayState> {
        if self.phase == TurnPhase::Finalized {
            return None;
        }
        warn!(reason, partial_len = self.text.len(), "turn failed");
        self.phase = TurnPhase::Finalized;
        self.lines.clear();
        Some(DisplayState::Failed(FALLBACK_ERROR_MESSAGE.to_string()))
    }
}
