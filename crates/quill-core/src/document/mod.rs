//! Laid-out document model and its built-in rendering surface.

pub mod metrics;
mod pdf;

use anyhow::Result;

use crate::layout::{Align, PageSize, RenderSurface, TextStyle};

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDraw {
    pub text: String,
    /// Left edge of the line.
    pub x: f32,
    /// Baseline, measured from the top edge of the page.
    pub y: f32,
    pub style: TextStyle,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub draws: Vec<TextDraw>,
}

/// Finished, paginated document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub page_width: f32,
    pub page_height: f32,
    pub pages: Vec<Page>,
}

impl Document {
    /// Text of every draw, page by page.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|p| p.draws.iter().map(|d| d.text.as_str()))
    }

    /// Serializes the document as PDF bytes.
    pub fn to_pdf(&self) -> Vec<u8> {
        pdf::render(self)
    }
}

/// Surface that records draws into a [`Document`] using Helvetica metrics.
#[derive(Debug)]
pub struct DocumentSurface {
    document: Document,
}

impl DocumentSurface {
    /// Creates a surface with its first page already allocated.
    pub fn new(size: PageSize) -> Self {
        Self {
            document: Document {
                page_width: size.width,
                page_height: size.height,
                pages: vec![Page::default()],
            },
        }
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

impl RenderSurface for DocumentSurface {
    fn page_size(&self) -> PageSize {
        PageSize {
            width: self.document.page_width,
            height: self.document.page_height,
        }
    }

    fn line_height(&self, style: TextStyle) -> f32 {
        metrics::line_height(style)
    }

    fn wrap_text(&self, text: &str, max_width: f32, style: TextStyle) -> Vec<String> {
        metrics::wrap_text(text, max_width, style)
    }

    fn draw_text(
        &mut self,
        lines: &[String],
        x: f32,
        y: f32,
        style: TextStyle,
        align: Align,
    ) -> Result<()> {
        let line_height = metrics::line_height(style);
        let Some(page) = self.document.pages.last_mut() else {
            anyhow::bail!("document has no page to draw on");
        };
        for (i, line) in lines.iter().enumerate() {
            let left = match align {
                Align::Left => x,
                Align::Center => x - metrics::text_width(line, style) / 2.0,
            };
            page.draws.push(TextDraw {
                text: line.clone(),
                x: left,
                y: y + i as f32 * line_height,
                style,
            });
        }
        Ok(())
    }

    fn add_page(&mut self) -> Result<()> {
        self.document.pages.push(Page::default());
        Ok(())
    }
}
