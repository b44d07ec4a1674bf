//! Markup-lite parser shared by live display and report layout.
//!
//! A buffer is split on `\n` and every line is classified on its own:
//! `### ` headings, blank spacers, `<digits>. ` list items and paragraphs.
//! Inline emphasis (`**`) is left in the text; consumers split it with
//! [`emphasis_spans`] when they care about styling.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Prefix that marks a heading line.
pub const HEADING_MARKER: &str = "### ";

/// Doubled marker that toggles emphasis inside a line.
pub const EMPHASIS_MARKER: &str = "**";

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+\. )(.*)$").expect("list item pattern is valid")
});

/// One classified line of markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineRecord {
    /// Line started with `### `; `text` is the remainder.
    Heading { text: String },
    /// Empty or whitespace-only line. `raw` keeps the original whitespace.
    Spacer { raw: String },
    /// `<digits>. <text>`; `ordinal` is the literal number and separator (e.g. `"1. "`).
    ListItem { ordinal: String, text: String },
    /// Any other non-empty line.
    Paragraph { text: String },
}

impl LineRecord {
    /// Classifies a single line (which must not contain `\n`).
    pub fn classify(line: &str) -> Self {
        if let Some(text) = line.strip_prefix(HEADING_MARKER) {
            return LineRecord::Heading {
                text: text.to_string(),
            };
        }

        if line.trim().is_empty() {
            return LineRecord::Spacer {
                raw: line.to_string(),
            };
        }

        if let Some(caps) = LIST_ITEM.captures(line) {
            return LineRecord::ListItem {
                ordinal: caps[1].to_string(),
                text: caps[2].to_string(),
            };
        }

        LineRecord::Paragraph {
            text: line.to_string(),
        }
    }

    /// Reconstructs the exact source line this record was parsed from.
    pub fn source_line(&self) -> String {
        match self {
            LineRecord::Heading { text } => format!("{HEADING_MARKER}{text}"),
            LineRecord::Spacer { raw } => raw.clone(),
            LineRecord::ListItem { ordinal, text } => format!("{ordinal}{text}"),
            LineRecord::Paragraph { text } => text.clone(),
        }
    }

    /// Visible text of the record, if any (spacers have none).
    pub fn text(&self) -> Option<&str> {
        match self {
            LineRecord::Heading { text }
            | LineRecord::ListItem { text, .. }
            | LineRecord::Paragraph { text } => Some(text),
            LineRecord::Spacer { .. } => None,
        }
    }
}

/// Lazily parses `buffer` into line records, one per `\n`-separated line.
///
/// Never merges or drops lines: an empty buffer yields a single spacer.
pub fn parse(buffer: &str) -> impl Iterator<Item = LineRecord> + '_ {
    buffer.split('\n').map(LineRecord::classify)
}

/// Eager form of [`parse`].
pub fn parse_all(buffer: &str) -> Vec<LineRecord> {
    parse(buffer).collect()
}

/// Rejoins records into the buffer they were parsed from.
pub fn rejoin(records: &[LineRecord]) -> String {
    records
        .iter()
        .map(LineRecord::source_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// A run of text that is either plain or emphasized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmphasisSpan {
    pub text: String,
    pub emphasized: bool,
}

/// Splits `text` on `**` into alternating plain/emphasized spans, starting plain.
///
/// Empty spans are kept so alternation holds. With an odd number of markers
/// the final span stays emphasized until the end of the text.
pub fn emphasis_spans(text: &str) -> Vec<EmphasisSpan> {
    text.split(EMPHASIS_MARKER)
        .enumerate()
        .map(|(i, part)| EmphasisSpan {
            text: part.to_string(),
            emphasized: i % 2 == 1,
        })
        .collect()
}

/// Text with emphasis markers removed.
pub fn plain_text(text: &str) -> String {
    text.split(EMPHASIS_MARKER).collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_classifies_each_record_kind() {
        let records = parse_all("### Market Overview\n\n1. Buy **FFC**\nPlain line");
        assert_eq!(
            records,
            vec![
                LineRecord::Heading {
                    text: "Market Overview".to_string()
                },
                LineRecord::Spacer { raw: String::new() },
                LineRecord::ListItem {
                    ordinal: "1. ".to_string(),
                    text: "Buy **FFC**".to_string()
                },
                LineRecord::Paragraph {
                    text: "Plain line".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_heading_wins_over_blank_and_list() {
        assert_eq!(
            LineRecord::classify("### "),
            LineRecord::Heading {
                text: String::new()
            }
        );
        assert_eq!(
            LineRecord::classify("### 1. Not a list"),
            LineRecord::Heading {
                text: "1. Not a list".to_string()
            }
        );
    }

    #[test]
    fn test_heading_requires_trailing_space() {
        assert_eq!(
            LineRecord::classify("###Title"),
            LineRecord::Paragraph {
                text: "###Title".to_string()
            }
        );
    }

    #[test]
    fn test_whitespace_only_line_is_spacer() {
        assert_eq!(
            LineRecord::classify(" \t "),
            LineRecord::Spacer {
                raw: " \t ".to_string()
            }
        );
    }

    #[test]
    fn test_list_item_needs_period_and_single_space() {
        assert!(matches!(
            LineRecord::classify("12. Twelfth"),
            LineRecord::ListItem { ref ordinal, ref text } if ordinal == "12. " && text == "Twelfth"
        ));
        assert!(matches!(
            LineRecord::classify("1.No space"),
            LineRecord::Paragraph { .. }
        ));
        assert!(matches!(
            LineRecord::classify("1) Paren"),
            LineRecord::Paragraph { .. }
        ));
        // Only the first space belongs to the ordinal.
        assert!(matches!(
            LineRecord::classify("3.  Indented"),
            LineRecord::ListItem { ref text, .. } if text == " Indented"
        ));
    }

    #[test]
    fn test_list_ordinal_is_ascii_digits_only() {
        assert!(matches!(
            LineRecord::classify("١. Arabic-Indic"),
            LineRecord::Paragraph { .. }
        ));
        assert!(matches!(
            LineRecord::classify("２. Fullwidth"),
            LineRecord::Paragraph { .. }
        ));
        assert!(matches!(
            LineRecord::classify("007. Bond"),
            LineRecord::ListItem { ref ordinal, .. } if ordinal == "007. "
        ));
    }

    #[test]
    fn test_empty_buffer_is_single_spacer() {
        assert_eq!(
            parse_all(""),
            vec![LineRecord::Spacer { raw: String::new() }]
        );
    }

    #[test]
    fn test_emphasis_even_markers_end_plain() {
        let spans = emphasis_spans("a **b** c");
        assert_eq!(spans.len(), 3);
        assert!(!spans[0].emphasized);
        assert!(spans[1].emphasized);
        assert_eq!(spans[1].text, "b");
        assert!(!spans[2].emphasized);
    }

    #[test]
    fn test_emphasis_odd_marker_leaves_tail_emphasized() {
        let spans = emphasis_spans("start **open to the end");
        assert_eq!(spans.len(), 2);
        assert!(spans[1].emphasized);
        assert_eq!(spans[1].text, "open to the end");
    }

    #[test]
    fn test_plain_text_strips_markers() {
        assert_eq!(plain_text("Buy **FFC** now"), "Buy FFC now");
    }

    proptest! {
        #[test]
        fn prop_parse_is_lossless(buffer in "[ #0-9.*a-z\\n\\t]{0,80}") {
            let records = parse_all(&buffer);
            prop_assert_eq!(records.len(), buffer.split('\n').count());
            prop_assert_eq!(rejoin(&records), buffer);
        }

        #[test]
        fn prop_emphasis_alternates(text in "[a-z *]{0,40}") {
            let markers = text.matches(EMPHASIS_MARKER).count();
            let spans = emphasis_spans(&text);
            prop_assert_eq!(spans.len(), markers + 1);
            for (i, span) in spans.iter().enumerate() {
                prop_assert_eq!(span.emphasized, i % 2 == 1);
            }
            let last = spans.last().map(|s| s.emphasized);
            prop_assert_eq!(last, Some(markers % 2 == 1));
        }
    }
}
