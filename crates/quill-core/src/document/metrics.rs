//! Helvetica metrics for the base-14 PDF fonts.
//!
//! Widths are in 1/1000 em for printable ASCII (0x20..=0x7E).

use crate::layout::{FontFace, TextStyle};

/// Baseline-to-baseline distance as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.15;

/// Used for characters outside printable ASCII.
const FALLBACK_WIDTH: u16 = 556;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn char_width(ch: char, face: FontFace) -> u16 {
    let table = match face {
        FontFace::Regular => &HELVETICA,
        FontFace::Bold => &HELVETICA_BOLD,
    };
    let code = ch as u32;
    if (0x20..=0x7E).contains(&code) {
        table[(code - 0x20) as usize]
    } else {
        FALLBACK_WIDTH
    }
}

/// Rendered width of `text` in points.
pub fn text_width(text: &str, style: TextStyle) -> f32 {
    let units: u32 = text.chars().map(|ch| u32::from(char_width(ch, style.face))).sum();
    units as f32 * style.size / 1000.0
}

pub fn line_height(style: TextStyle) -> f32 {
    style.size * LINE_HEIGHT_FACTOR
}

/// Greedy word wrap; words wider than `max_width` are broken by character.
pub fn wrap_text(text: &str, max_width: f32, style: TextStyle) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split(' ') {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, style) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if text_width(word, style) <= max_width {
            current = word.to_string();
            continue;
        }

        for ch in word.chars() {
            current.push(ch);
            if text_width(&current, style) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::replace(&mut current, ch.to_string()));
            }
        }
    }

    lines.push(current);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: TextStyle = TextStyle::regular(10.0);

    #[test]
    fn test_text_width_uses_face_metrics() {
        // "Hi": H = 722, i = 222 (regular) / 278 (bold).
        assert!((text_width("Hi", BODY) - 9.44).abs() < 1e-4);
        assert!((text_width("Hi", TextStyle::bold(10.0)) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_wrap_breaks_on_word_boundaries() {
        // Each "aaaa" is 22.24pt, a space 2.78pt.
        let lines = wrap_text("aaaa aaaa aaaa", 50.0, BODY);
        assert_eq!(lines, vec!["aaaa aaaa", "aaaa"]);
        for line in &lines {
            assert!(text_width(line, BODY) <= 50.0);
        }
    }

    #[test]
    fn test_wrap_splits_overlong_word() {
        let lines = wrap_text("aaaaaaaaaaaa", 20.0, BODY);
        assert_eq!(lines, vec!["aaa", "aaa", "aaa", "aaa"]);
    }

    #[test]
    fn test_wrap_always_returns_a_line() {
        assert_eq!(wrap_text("", 100.0, BODY), vec![String::new()]);
    }

    #[test]
    fn test_non_ascii_uses_fallback_width() {
        assert!((text_width("é", BODY) - 5.56).abs() < 1e-4);
    }
}
