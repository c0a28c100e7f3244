//! PDF writer: lays a story out on US Letter pages with the built-in Helvetica faces.
//!
//! Coordinates are tracked in points from the bottom-left corner (PDF convention)
//! and converted to millimetres only at the printpdf boundary.
//! CPU-bound: callers on the async side run this inside `tokio::task::spawn_blocking`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rgb,
};

use crate::render::font_metrics::{get_metrics, FontStyle};
use crate::render::story::{Block, Run};
use crate::render::RenderError;

const PAGE_WIDTH_PT: f32 = 612.0;
const PAGE_HEIGHT_PT: f32 = 792.0;
const MARGIN_SIDE_PT: f32 = 72.0;
const MARGIN_TOP_PT: f32 = 36.0;
const MARGIN_BOTTOM_PT: f32 = 72.0;
const FRAME_WIDTH_PT: f32 = PAGE_WIDTH_PT - 2.0 * MARGIN_SIDE_PT;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 11.0;
const LEADING_FACTOR: f32 = 1.2;

const TITLE_SPACE_AFTER: f32 = 12.0;
const HEADING_SPACE_BEFORE: f32 = 12.0;
const HEADING_SPACE_AFTER: f32 = 6.0;
const PARAGRAPH_SPACE_AFTER: f32 = 6.0;
const TABLE_ROW_PADDING: f32 = 6.0;

const LABEL_COLUMN_PT: f32 = 108.0; // 1.5"
const VALUE_COLUMN_PT: f32 = 288.0; // 4"

const MM_PER_PT: f32 = 25.4 / 72.0;

fn mm(pt: f32) -> Mm {
    Mm(pt * MM_PER_PT)
}

fn dark_blue() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.545, None))
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

/// A contiguous same-style piece of one wrapped line.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub style: FontStyle,
}

/// Greedy word-wrap over styled runs.
///
/// Words are split on whitespace and re-joined with single spaces; consecutive
/// words of the same style on a line merge into one segment. A single word wider
/// than `max_width_pt` gets its own line and overflows.
pub fn wrap_runs(runs: &[Run], font_size_pt: f32, max_width_pt: f32) -> Vec<Vec<Segment>> {
    let words = runs.iter().flat_map(|run| {
        run.text
            .split_whitespace()
            .map(move |word| (word, run.style))
    });

    let mut lines: Vec<Vec<Segment>> = Vec::new();
    let mut current: Vec<Segment> = Vec::new();
    let mut current_width = 0.0_f32;

    for (word, style) in words {
        let metrics = get_metrics(style);
        let word_w = metrics.width_pt(word, font_size_pt);
        let space_w = if current.is_empty() {
            0.0
        } else {
            metrics.space_width * font_size_pt
        };

        if !current.is_empty() && current_width + space_w + word_w > max_width_pt {
            lines.push(std::mem::take(&mut current));
            current_width = 0.0;
        }

        match current.last_mut() {
            Some(last) if last.style == style => {
                last.text.push(' ');
                last.text.push_str(word);
            }
            Some(last) => {
                // The joining space stays with the previous segment.
                last.text.push(' ');
                current.push(Segment {
                    text: word.to_string(),
                    style,
                });
            }
            None => current.push(Segment {
                text: word.to_string(),
                style,
            }),
        }
        current_width += if current_width == 0.0 { word_w } else { space_w + word_w };
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

/// Stateful page writer: owns the document, the current layer and the vertical cursor.
struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: Fonts,
    /// Top of the free area on the current page, in points from the bottom edge.
    cursor_y: f32,
    pages: usize,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self, RenderError> {
        let (doc, page, layer) =
            PdfDocument::new(title, mm(PAGE_WIDTH_PT), mm(PAGE_HEIGHT_PT), "Layer 1");
        let fonts = Fonts {
            regular: add_font(&doc, BuiltinFont::Helvetica)?,
            bold: add_font(&doc, BuiltinFont::HelveticaBold)?,
            italic: add_font(&doc, BuiltinFont::HelveticaOblique)?,
        };
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            fonts,
            cursor_y: PAGE_HEIGHT_PT - MARGIN_TOP_PT,
            pages: 1,
        })
    }

    /// Starts a new page if fewer than `height` points remain above the bottom margin.
    fn ensure_space(&mut self, height: f32) {
        if self.cursor_y - height >= MARGIN_BOTTOM_PT {
            return;
        }
        let (page, layer) = self
            .doc
            .add_page(mm(PAGE_WIDTH_PT), mm(PAGE_HEIGHT_PT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor_y = PAGE_HEIGHT_PT - MARGIN_TOP_PT;
        self.pages += 1;
    }

    fn advance(&mut self, height: f32) {
        self.cursor_y -= height;
    }

    /// Writes one wrapped line with its baseline one font-size below the cursor.
    fn write_line(&self, line: &[Segment], x_pt: f32, font_size_pt: f32, color: Color) {
        self.layer.set_fill_color(color);
        let baseline = self.cursor_y - font_size_pt;
        let mut x = x_pt;
        for segment in line {
            self.layer.use_text(
                segment.text.as_str(),
                font_size_pt,
                mm(x),
                mm(baseline),
                self.fonts.get(segment.style),
            );
            x += get_metrics(segment.style).width_pt(&segment.text, font_size_pt);
        }
    }

    fn write_block(&mut self, block: &Block) {
        match block {
            Block::Title(text) => self.write_title(text),
            Block::Heading(text) => self.write_heading(text),
            Block::Paragraph(runs) => self.write_paragraph(runs),
            Block::Table(rows) => self.write_table(rows),
            Block::Spacer(height) => {
                if self.cursor_y - height >= MARGIN_BOTTOM_PT {
                    self.advance(*height);
                }
            }
        }
    }

    fn write_title(&mut self, text: &str) {
        let leading = TITLE_SIZE * LEADING_FACTOR;
        for line in wrap_runs(&[Run::bold(text)], TITLE_SIZE, FRAME_WIDTH_PT) {
            self.ensure_space(leading);
            let width: f32 = line
                .iter()
                .map(|s| get_metrics(s.style).width_pt(&s.text, TITLE_SIZE))
                .sum();
            let x = MARGIN_SIDE_PT + (FRAME_WIDTH_PT - width).max(0.0) / 2.0;
            self.write_line(&line, x, TITLE_SIZE, dark_blue());
            self.advance(leading);
        }
        self.advance(TITLE_SPACE_AFTER);
    }

    fn write_heading(&mut self, text: &str) {
        let leading = HEADING_SIZE * LEADING_FACTOR;
        // Keep the heading with at least one line of its section.
        self.ensure_space(
            HEADING_SPACE_BEFORE + leading + HEADING_SPACE_AFTER + BODY_SIZE * LEADING_FACTOR,
        );
        self.advance(HEADING_SPACE_BEFORE);
        for line in wrap_runs(&[Run::bold(text)], HEADING_SIZE, FRAME_WIDTH_PT) {
            self.write_line(&line, MARGIN_SIDE_PT, HEADING_SIZE, dark_blue());
            self.advance(leading);
        }
        self.advance(HEADING_SPACE_AFTER);
    }

    fn write_paragraph(&mut self, runs: &[Run]) {
        let leading = BODY_SIZE * LEADING_FACTOR;
        for line in wrap_runs(runs, BODY_SIZE, FRAME_WIDTH_PT) {
            self.ensure_space(leading);
            self.write_line(&line, MARGIN_SIDE_PT, BODY_SIZE, black());
            self.advance(leading);
        }
        self.advance(PARAGRAPH_SPACE_AFTER);
    }

    fn write_table(&mut self, rows: &[(String, String)]) {
        let leading = BODY_SIZE * LEADING_FACTOR;
        for (label, value) in rows {
            let label_lines = wrap_runs(&[Run::bold(label)], BODY_SIZE, LABEL_COLUMN_PT);
            let value_lines = wrap_runs(&[Run::regular(value)], BODY_SIZE, VALUE_COLUMN_PT);
            let line_count = label_lines.len().max(value_lines.len()).max(1);
            self.ensure_space(line_count as f32 * leading + TABLE_ROW_PADDING);

            let row_top = self.cursor_y;
            for (i, line) in label_lines.iter().enumerate() {
                self.cursor_y = row_top - i as f32 * leading;
                self.write_line(line, MARGIN_SIDE_PT, BODY_SIZE, black());
            }
            for (i, line) in value_lines.iter().enumerate() {
                self.cursor_y = row_top - i as f32 * leading;
                self.write_line(line, MARGIN_SIDE_PT + LABEL_COLUMN_PT, BODY_SIZE, black());
            }
            self.cursor_y = row_top - line_count as f32 * leading - TABLE_ROW_PADDING;
        }
    }

    fn save(self, path: &Path) -> Result<usize, RenderError> {
        let pages = self.pages;
        let mut writer = BufWriter::new(File::create(path)?);
        self.doc
            .save(&mut writer)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        writer.flush()?;
        Ok(pages)
    }
}

fn add_font(doc: &PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef, RenderError> {
    doc.add_builtin_font(font)
        .map_err(|e| RenderError::Pdf(e.to_string()))
}

/// Lays out `story` and writes it to `path`. Returns the page count.
pub fn write_story(story: &[Block], title: &str, path: &Path) -> Result<usize, RenderError> {
    let mut writer = PdfWriter::new(title)?;
    for block in story {
        writer.write_block(block);
    }
    writer.save(path)
}
