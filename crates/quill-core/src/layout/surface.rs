//! Rendering surface contract consumed by the layout engine.
//!
//! The engine only decides where blocks start; line breaking inside a block
//! and all text metrics come from the surface.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Font face available on every surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontFace {
    #[default]
    Regular,
    Bold,
}

/// Face plus size in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: f32,
}

impl TextStyle {
    pub const fn regular(size: f32) -> Self {
        Self {
            face: FontFace::Regular,
            size,
        }
    }

    pub const fn bold(size: f32) -> Self {
        Self {
            face: FontFace::Bold,
            size,
        }
    }
}

/// Horizontal anchoring of a drawn line relative to its `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// A paginated drawing target with text measurement.
///
/// Coordinates are in points, `y` grows downward from the top edge and
/// addresses the baseline of the first line drawn.
pub trait RenderSurface {
    fn page_size(&self) -> PageSize;

    /// Distance between consecutive baselines for `style`.
    fn line_height(&self, style: TextStyle) -> f32;

    /// Breaks `text` into display lines no wider than `max_width`.
    ///
    /// Always returns at least one line.
    fn wrap_text(&self, text: &str, max_width: f32, style: TextStyle) -> Vec<String>;

    /// Height of a block of already-wrapped lines.
    fn text_height(&self, lines: &[String], style: TextStyle) -> f32 {
        lines.len() as f32 * self.line_height(style)
    }

    /// Draws `lines` on the current page, one per line height starting at `y`.
    ///
    /// # Errors
    /// Returns an error if the surface rejects the draw.
    fn draw_text(
        &mut self,
        lines: &[String],
        x: f32,
        y: f32,
        style: TextStyle,
        align: Align,
    ) -> Result<()>;

    /// Starts a new page; subsequent draws land on it.
    ///
    /// # Errors
    /// Returns an error if the surface cannot allocate a page.
    fn add_page(&mut self) -> Result<()>;
}
