//! Terminal rendering of line records and display states.
//!
//! Records are wrapped to the terminal width by display width
//! (`unicode-width`). Headings and emphasized spans are bold; list items get
//! a hanging indent aligned after the ordinal.

use std::io::{self, Write};

use crossterm::cursor::MoveToPreviousLine;
use crossterm::queue;
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{Clear, ClearType};
use quill_core::core::DisplayState;
use quill_core::markup::{LineRecord, emphasis_spans};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Width used when the terminal size is unknown.
pub const DEFAULT_WIDTH: usize = 80;

/// Current terminal width in columns.
pub fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(cols, _)| usize::from(cols))
        .ok()
        .filter(|cols| *cols > 0)
        .unwrap_or(DEFAULT_WIDTH)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub bold: bool,
}

impl StyledSpan {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledLine {
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            spans: vec![StyledSpan::plain(text)],
        }
    }

    /// Text without styling.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Renders records into display lines no wider than `width`.
pub fn render_records(records: &[LineRecord], width: usize) -> Vec<StyledLine> {
    records
        .iter()
        .flat_map(|record| render_record(record, width))
        .collect()
}

fn render_record(record: &LineRecord, width: usize) -> Vec<StyledLine> {
    match record {
        LineRecord::Spacer { .. } => vec![StyledLine::default()],
        LineRecord::Heading { text } => {
            let spans: Vec<StyledSpan> = emphasis_spans(text)
                .into_iter()
                .map(|span| StyledSpan {
                    text: span.text,
                    bold: true,
                })
                .collect();
            wrap_spans(&spans, width, &[], &[])
        }
        LineRecord::ListItem { ordinal, text } => {
            let first = [StyledSpan::plain(ordinal.clone())];
            let rest = [StyledSpan::plain(" ".repeat(ordinal.width()))];
            wrap_spans(&inline_spans(text), width, &first, &rest)
        }
        LineRecord::Paragraph { text } => wrap_spans(&inline_spans(text), width, &[], &[]),
    }
}

fn inline_spans(text: &str) -> Vec<StyledSpan> {
    emphasis_spans(text)
        .into_iter()
        .map(|span| StyledSpan {
            text: span.text,
            bold: span.emphasized,
        })
        .collect()
}

struct LineBuilder<'a> {
    lines: Vec<StyledLine>,
    current: Vec<StyledSpan>,
    current_width: usize,
    first_prefix: &'a [StyledSpan],
    rest_prefix: &'a [StyledSpan],
    first_avail: usize,
    rest_avail: usize,
}

impl LineBuilder<'_> {
    fn avail(&self) -> usize {
        if self.lines.is_empty() {
            self.first_avail
        } else {
            self.rest_avail
        }
    }

    fn push(&mut self, text: &str, bold: bool) {
        self.current_width += text.width();
        match self.current.last_mut() {
            Some(last) if last.bold == bold => last.text.push_str(text),
            _ => self.current.push(StyledSpan {
                text: text.to_string(),
                bold,
            }),
        }
    }

    fn flush(&mut self) {
        if let Some(last) = self.current.last_mut() {
            let kept = last.text.trim_end_matches(' ').len();
            last.text.truncate(kept);
        }
        self.current.retain(|s| !s.text.is_empty());

        let prefix = if self.lines.is_empty() {
            self.first_prefix
        } else {
            self.rest_prefix
        };
        let mut spans = prefix.to_vec();
        spans.append(&mut self.current);
        self.lines.push(StyledLine { spans });
        self.current_width = 0;
    }
}

fn prefix_width(prefix: &[StyledSpan]) -> usize {
    prefix.iter().map(|s| s.text.width()).sum()
}

/// Word-wraps spans, breaking words wider than a line by character.
///
/// Always returns at least one line.
fn wrap_spans(
    spans: &[StyledSpan],
    width: usize,
    first_prefix: &[StyledSpan],
    rest_prefix: &[StyledSpan],
) -> Vec<StyledLine> {
    let mut builder = LineBuilder {
        lines: Vec::new(),
        current: Vec::new(),
        current_width: 0,
        first_prefix,
        rest_prefix,
        first_avail: width.saturating_sub(prefix_width(first_prefix)).max(1),
        rest_avail: width.saturating_sub(prefix_width(rest_prefix)).max(1),
    };

    for span in spans {
        for piece in span.text.split_inclusive(' ') {
            let word_width = piece.trim_end_matches(' ').width();
            if builder.current_width > 0 && builder.current_width + word_width > builder.avail() {
                builder.flush();
            }
            // Leading spaces are dropped on continuation lines.
            if builder.current_width == 0 && word_width == 0 && !builder.lines.is_empty() {
                continue;
            }
            if word_width <= builder.avail() {
                builder.push(piece, span.bold);
                continue;
            }
            for ch in piece.chars() {
                let ch_width = ch.width().unwrap_or(0);
                if builder.current_width > 0 && builder.current_width + ch_width > builder.avail() {
                    builder.flush();
                }
                builder.push(ch.encode_utf8(&mut [0; 4]), span.bold);
            }
        }
    }

    builder.flush();
    builder.lines
}

/// Draws the display states of one turn.
///
/// In live mode every snapshot replaces the previously drawn lines in place;
/// otherwise only the terminal state is printed.
pub struct TurnRenderer<W: Write> {
    out: W,
    width: usize,
    ansi: bool,
    live: bool,
    drawn: usize,
}

impl<W: Write> TurnRenderer<W> {
    pub fn new(out: W, width: usize, ansi: bool, live: bool) -> Self {
        Self {
            out,
            width,
            ansi,
            live,
            drawn: 0,
        }
    }

    /// Renders one display state.
    ///
    /// # Errors
    /// Returns an error if writing to the output fails.
    pub fn handle(&mut self, state: &DisplayState) -> io::Result<()> {
        match state {
            DisplayState::Streaming(records) => {
                if self.live {
                    let lines = render_records(records, self.width);
                    self.redraw(&lines)?;
                }
                Ok(())
            }
            DisplayState::Plain(records) => {
                let lines = render_records(records, self.width);
                self.redraw(&lines)
            }
            DisplayState::Failed(message) => self.redraw(&[StyledLine::plain(message.as_str())]),
            // The caller announces the saved file.
            DisplayState::Download(_) => self.redraw(&[]),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn redraw(&mut self, lines: &[StyledLine]) -> io::Result<()> {
        if self.live && self.drawn > 0 {
            let rows = u16::try_from(self.drawn).unwrap_or(u16::MAX);
            queue!(
                self.out,
                MoveToPreviousLine(rows),
                Clear(ClearType::FromCursorDown)
            )?;
        }
        for line in lines {
            write_line(&mut self.out, line, self.ansi)?;
        }
        self.drawn = lines.len();
        self.out.flush()
    }
}

/// Writes one line followed by a newline.
///
/// # Errors
/// Returns an error if writing fails.
pub fn write_line<W: Write>(out: &mut W, line: &StyledLine, ansi: bool) -> io::Result<()> {
    for span in &line.spans {
        if ansi && span.bold {
            queue!(
                out,
                SetAttribute(Attribute::Bold),
                Print(&span.text),
                SetAttribute(Attribute::Reset)
            )?;
        } else {
            out.write_all(span.text.as_bytes())?;
        }
    }
    out.write_all(b"\n")
}
