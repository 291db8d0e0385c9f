//! Single-page PDF layout on top of `lopdf`.
//!
//! Text is set in the standard Helvetica font (not embedded) on an A4 page. The document has no
//! info dictionary and no trailer id, and streams are saved uncompressed, so the same page
//! always saves to the same bytes.

use crate::{IntelError, IntelResult};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

const PAGE_WIDTH: f64 = 595.28;
const PAGE_HEIGHT: f64 = 841.89;
pub const MARGIN: f64 = 28.35;
const FONT_SIZE: f64 = 12.0;
const LEADING: f64 = 16.0;
const PARAGRAPH_GAP: f64 = 12.0;

/// Average Helvetica advance in em, used for centring.
const AVERAGE_GLYPH_EM: f64 = 0.53;

/// Characters per wrapped line: the text width over an average glyph at the page font size.
pub const LINE_CHARS: usize = 84;

/// Marks a paragraph cut short by its line budget.
pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Text {
        text: String,
        align: Align,
        max_lines: usize,
    },
    Gap(f64),
}

/// Builds one page of text, top to bottom.
#[derive(Debug, Clone, Default)]
pub struct PdfPage {
    blocks: Vec<Block>,
}

impl PdfPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A paragraph wrapped to the page width and cut to at most `max_lines` lines.
    pub fn text(mut self, text: impl Into<String>, align: Align, max_lines: usize) -> Self {
        self.blocks.push(Block::Text {
            text: text.into(),
            align,
            max_lines: max_lines.max(1),
        });
        self
    }

    /// Vertical whitespace in points.
    pub fn gap(mut self, points: f64) -> Self {
        self.blocks.push(Block::Gap(points));
        self
    }

    /// Renders the page as a complete PDF document.
    ///
    /// # Errors
    ///
    /// Returns [`IntelError::ReportRender`] if the blocks do not fit on one page or the
    /// document cannot be serialised.
    pub fn render(&self) -> IntelResult<Vec<u8>> {
        let content = Content {
            operations: self.layout()?,
        }
        .encode()
        .map_err(|e| IntelError::ReportRender(e.to_string()))?;

        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| IntelError::ReportRender(e.to_string()))?;
        Ok(out)
    }

    fn layout(&self) -> IntelResult<Vec<Operation>> {
        let mut operations = Vec::new();
        let mut y = PAGE_HEIGHT - MARGIN;

        for block in &self.blocks {
            match block {
                Block::Gap(points) => y -= points,
                Block::Text {
                    text,
                    align,
                    max_lines,
                } => {
                    for line in clamp(wrap(text, LINE_CHARS), *max_lines) {
                        y -= LEADING;
                        if y < MARGIN {
                            return Err(IntelError::ReportRender(
                                "report content does not fit on one page".into(),
                            ));
                        }
                        let x = match align {
                            Align::Left => MARGIN,
                            Align::Center => (PAGE_WIDTH - estimated_width(&line)) / 2.0,
                        };
                        operations.extend([
                            Operation::new("BT", vec![]),
                            Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
                            Operation::new("Td", vec![x.into(), y.into()]),
                            Operation::new("Tj", vec![Object::string_literal(win_ansi(&line))]),
                            Operation::new("ET", vec![]),
                        ]);
                    }
                    y -= PARAGRAPH_GAP;
                }
            }
        }
        Ok(operations)
    }
}

fn estimated_width(text: &str) -> f64 {
    text.chars().count() as f64 * FONT_SIZE * AVERAGE_GLYPH_EM
}

/// Greedy word wrap to `width` characters. Longer words are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed <= width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for c in word.chars() {
            if current.chars().count() == width {
                lines.push(std::mem::take(&mut current));
            }
            current.push(c);
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Keeps the first `max_lines` lines, ending the last kept one with [`ELLIPSIS`] if any were cut.
fn clamp(mut lines: Vec<String>, max_lines: usize) -> Vec<String> {
    if lines.len() <= max_lines {
        return lines;
    }
    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        let keep = LINE_CHARS.saturating_sub(ELLIPSIS.len());
        let head: String = last.chars().take(keep).collect();
        *last = format!("{}{ELLIPSIS}", head.trim_end());
    }
    lines
}

/// Maps text to WinAnsi bytes. Printable ASCII and Latin-1 pass through (WinAnsi agrees with
/// Latin-1 there); anything else becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7e | 0xa0..=0xff) => code as u8,
            _ => b'?',
        })
        .collect()
}
