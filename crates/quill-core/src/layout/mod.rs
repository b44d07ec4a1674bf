//! Page-aware layout of markup into a document.
//!
//! The engine walks the parsed line records with a [`LayoutCursor`] and asks
//! the [`RenderSurface`] to wrap, measure and draw. A block is moved to a
//! fresh page before drawing if it would cross the bottom margin; blocks are
//! never split, so a block taller than a page overruns the bottom margin.

mod surface;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use surface::{Align, FontFace, PageSize, RenderSurface, TextStyle};

use crate::document::{Document, DocumentSurface};
use crate::markup::{self, LineRecord};

/// Attribution line printed above every report title.
pub const DEFAULT_ATTRIBUTION: &str = "This report was created by Quill for its readers.";

/// Layout constants, all in points unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// A4 by default.
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub list_indent: f32,
    /// Baseline of the attribution line on the first page.
    pub header_top: f32,
    pub attribution: String,
    pub attribution_style: TextStyle,
    /// Extra space after the attribution, in line heights.
    pub attribution_gap: f32,
    pub title_style: TextStyle,
    /// Extra space after the title, in line heights.
    pub title_gap: f32,
    pub heading_style: TextStyle,
    pub heading_space_before: f32,
    pub heading_space_after: f32,
    pub body_style: TextStyle,
    pub body_gap: f32,
    pub spacer_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: 595.28,
            page_height: 841.89,
            margin: 40.0,
            list_indent: 20.0,
            header_top: 60.0,
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            attribution_style: TextStyle::bold(14.0),
            attribution_gap: 0.5,
            title_style: TextStyle::bold(12.0),
            title_gap: 1.5,
            heading_style: TextStyle::bold(11.0),
            heading_space_before: 10.0,
            heading_space_after: 5.0,
            body_style: TextStyle::regular(10.0),
            body_gap: 4.0,
            spacer_height: 10.0,
        }
    }
}

impl LayoutConfig {
    pub fn page_size(&self) -> PageSize {
        PageSize {
            width: self.page_width,
            height: self.page_height,
        }
    }
}

/// Current page index and vertical offset. The page index never decreases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    pub page: usize,
    pub y: f32,
}

impl LayoutCursor {
    /// Starts a new page if a block of height `needed` would end below `bottom`.
    ///
    /// Returns whether a page was added.
    fn ensure_room<S: RenderSurface>(
        &mut self,
        surface: &mut S,
        needed: f32,
        bottom: f32,
        top: f32,
    ) -> Result<bool> {
        if self.y + needed > bottom {
            surface.add_page()?;
            self.page += 1;
            self.y = top;
            debug!(page = self.page, needed, "page break");
            return Ok(true);
        }
        Ok(false)
    }
}

/// Lays out a titled report onto `surface`.
///
/// Returns the cursor after the last block.
///
/// # Errors
/// Returns an error if the margins leave no room for text, and propagates
/// failures from the surface.
pub fn layout<S: RenderSurface>(
    surface: &mut S,
    title: &str,
    content: &str,
    config: &LayoutConfig,
) -> Result<LayoutCursor> {
    let page = surface.page_size();
    if page.width - config.margin * 2.0 - config.list_indent <= 0.0
        || page.height - config.margin * 2.0 <= 0.0
    {
        bail!(
            "Report margins ({} pt, list indent {} pt) leave no room on a {}x{} pt page",
            config.margin,
            config.list_indent,
            page.width,
            page.height
        );
    }

    let mut engine = LayoutEngine::new(surface, config);
    engine.header(title)?;
    for record in markup::parse(content) {
        engine.record(&record)?;
    }
    Ok(engine.cursor)
}

/// Lays out a report on the built-in PDF-ready surface.
///
/// # Errors
/// Same as [`layout`].
pub fn layout_document(title: &str, content: &str, config: &LayoutConfig) -> Result<Document> {
    let mut surface = DocumentSurface::new(config.page_size());
    layout(&mut surface, title, content, config)?;
    Ok(surface.into_document())
}

struct LayoutEngine<'a, S> {
    surface: &'a mut S,
    config: &'a LayoutConfig,
    cursor: LayoutCursor,
    page_width: f32,
    bottom: f32,
    content_width: f32,
}

impl<'a, S: RenderSurface> LayoutEngine<'a, S> {
    fn new(surface: &'a mut S, config: &'a LayoutConfig) -> Self {
        let page = surface.page_size();
        Self {
            surface,
            config,
            cursor: LayoutCursor {
                page: 0,
                y: config.header_top,
            },
            page_width: page.width,
            bottom: page.height - config.margin,
            content_width: page.width - config.margin * 2.0,
        }
    }

    fn ensure_room(&mut self, needed: f32) -> Result<bool> {
        self.cursor
            .ensure_room(self.surface, needed, self.bottom, self.config.margin)
    }

    fn header(&mut self, title: &str) -> Result<()> {
        let center = self.page_width / 2.0;
        let config = self.config;
        for (text, style, gap) in [
            (
                config.attribution.as_str(),
                config.attribution_style,
                config.attribution_gap,
            ),
            (title, config.title_style, config.title_gap),
        ] {
            let lines = self.surface.wrap_text(text, self.content_width, style);
            let height = self.surface.text_height(&lines, style);
            self.surface
                .draw_text(&lines, center, self.cursor.y, style, Align::Center)?;
            self.cursor.y += height + self.surface.line_height(style) * gap;
        }
        Ok(())
    }

    fn record(&mut self, record: &LineRecord) -> Result<()> {
        let config = self.config;
        match record {
            LineRecord::Spacer { .. } => {
                self.ensure_room(config.spacer_height)?;
                self.cursor.y += config.spacer_height;
            }
            LineRecord::Heading { text } => {
                let style = config.heading_style;
                let lines =
                    self.surface
                        .wrap_text(&markup::plain_text(text), self.content_width, style);
                let height = self.surface.text_height(&lines, style);
                self.ensure_room(height + config.heading_space_before)?;
                self.cursor.y += config.heading_space_before;
                self.surface
                    .draw_text(&lines, config.margin, self.cursor.y, style, Align::Left)?;
                self.cursor.y += height + config.heading_space_after;
            }
            LineRecord::ListItem { ordinal, text } => {
                let style = config.body_style;
                let lines = self.surface.wrap_text(
                    &markup::plain_text(text),
                    self.content_width - config.list_indent,
                    style,
                );
                let height = self.surface.text_height(&lines, style);
                self.ensure_room(height)?;
                self.surface.draw_text(
                    std::slice::from_ref(ordinal),
                    config.margin,
                    self.cursor.y,
                    style,
                    Align::Left,
                )?;
                self.surface.draw_text(
                    &lines,
                    config.margin + config.list_indent,
                    self.cursor.y,
                    style,
                    Align::Left,
                )?;
                self.cursor.y += height + config.body_gap;
            }
            LineRecord::Paragraph { text } => {
                let style = config.body_style;
                let lines =
                    self.surface
                        .wrap_text(&markup::plain_text(text), self.content_width, style);
                let height = self.surface.text_height(&lines, style);
                self.ensure_room(height)?;
                self.surface
                    .draw_text(&lines, config.margin, self.cursor.y, style, Align::Left)?;
                self.cursor.y += height + config.body_gap;
            }
        }
        Ok(())
    }
}
