//! WordprocessingML (`.docx`) writer on top of `docx-rs`.
//!
//! The document model is deliberately flat: a list of pages, each a list of
//! positioned paragraphs and tables. Positions are expressed the way Word
//! expects them in flowing text: a left indent plus the vertical gap to the
//! previous block, both in points, converted to twentieths of a point
//! ("twips") on output.
//!
//! Each page becomes its own section carrying the page size and margins, so
//! mixed portrait/landscape documents keep their geometry.
//!
//! ## Repacking
//!
//! `docx-rs` numbers paragraphs (`w14:paraId`) from a process-wide counter
//! and may stamp creation times into the core properties. Both are rewritten
//! per document and the parts are repacked through [`Package`], so the same
//! pages always give the same bytes.

use crate::error::ConvertError;
use crate::writer::package::Package;
use docx_rs::{
    Docx, HeightRule, LineSpacing, LineSpacingType, PageMargin, PageOrientationType, PageSize,
    Paragraph, Run, RunFonts, SectionProperty, Table, TableCell, TableLayoutType, TableRow,
    VMergeType, WidthType,
};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::info;

const FORMAT: &str = "docx";

/// US Letter, used when a document has no pages at all.
const FALLBACK_PAGE: (f64, f64) = (612.0, 792.0);

/// Font size used when a block carries none (pt).
pub const DEFAULT_FONT_SIZE: f64 = 11.0;

/// Points to twentieths of a point, never negative.
pub fn twips(pt: f64) -> i64 {
    (pt * 20.0).round().max(0.0) as i64
}

/// Font size in the half-points `w:sz` expects; at least 1 pt.
fn half_points(size: f64) -> usize {
    (size * 2.0).round().max(2.0) as usize
}

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// A line of text placed on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct DocParagraph {
    pub text: String,
    /// Distance from the left margin (pt).
    pub indent: f64,
    /// Gap above the paragraph (pt).
    pub space_before: f64,
    /// Exact line height (pt).
    pub line_height: f64,
    pub font_size: f64,
}

/// Vertical merge state of a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VMerge {
    /// First row of a vertically merged cell.
    Restart,
    /// Continuation of the cell above.
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocCell {
    /// One paragraph per line; may be empty.
    pub lines: Vec<String>,
    pub font_size: f64,
    /// Number of grid columns covered.
    pub grid_span: usize,
    pub v_merge: Option<VMerge>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocRow {
    /// Minimum row height (pt).
    pub height: f64,
    pub cells: Vec<DocCell>,
}

/// A bordered table on a fixed column grid.
#[derive(Debug, Clone, PartialEq)]
pub struct DocTable {
    pub indent: f64,
    pub space_before: f64,
    /// Grid column widths (pt).
    pub column_widths: Vec<f64>,
    pub rows: Vec<DocRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(DocParagraph),
    Table(DocTable),
}

/// One PDF page worth of content.
#[derive(Debug, Clone, PartialEq)]
pub struct DocPage {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
    pub blocks: Vec<Block>,
}

impl DocPage {
    fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

/// Collects pages, then serialises them into a `.docx` package.
#[derive(Debug, Default)]
pub struct DocxBuilder {
    pages: Vec<DocPage>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&mut self, page: DocPage) -> &mut Self {
        self.pages.push(page);
        self
    }

    /// Build the package without writing it.
    pub fn build(&self) -> Result<Package, ConvertError> {
        let mut buf = Cursor::new(Vec::new());
        self.document()
            .build()
            .pack(&mut buf)
            .map_err(|e| ConvertError::package(FORMAT, e))?;
        repack(buf.into_inner())
    }

    /// Serialise and write atomically to `path`.
    pub fn write_to(&self, path: &Path) -> Result<(), ConvertError> {
        self.build()?.write_to(path)?;
        info!("Document written: {} ({} pages)", path.display(), self.pages.len());
        Ok(())
    }

    fn document(&self) -> Docx {
        let mut docx = Docx::new()
            .default_fonts(RunFonts::new().ascii("Calibri").hi_ansi("Calibri").cs("Calibri"))
            .default_size(half_points(DEFAULT_FONT_SIZE));

        let last = self.pages.len().saturating_sub(1);
        for (i, page) in self.pages.iter().enumerate() {
            for block in &page.blocks {
                match block {
                    Block::Paragraph(p) => docx = docx.add_paragraph(paragraph(p)),
                    Block::Table(t) => {
                        docx = docx.add_paragraph(spacer(t.space_before)).add_table(table(t));
                    }
                }
            }
            // Closing paragraph: carries the section break of every page but
            // the last, and keeps a trailing table from touching the next one.
            let mut closing = spacer(0.0);
            if i != last {
                closing.property.section_property = Some(section(page));
            }
            docx = docx.add_paragraph(closing);
        }

        // The body's own section describes the last page.
        let (width, height, margins, landscape) = match self.pages.last() {
            Some(p) => (p.width, p.height, p.margins, p.is_landscape()),
            None => (FALLBACK_PAGE.0, FALLBACK_PAGE.1, Margins::default(), false),
        };
        docx = docx
            .page_size(twips(width) as u32, twips(height) as u32)
            .page_margin(page_margin(&margins));
        if landscape {
            docx = docx.page_orient(PageOrientationType::Landscape);
        }
        docx
    }
}

// ── Body elements ────────────────────────────────────────────────────────────

/// Exact line height with an optional gap above.
fn spacing(before: f64, line: f64) -> LineSpacing {
    LineSpacing::new()
        .before(twips(before) as u32)
        .after(0)
        .line(twips(line).max(1) as i32)
        .line_rule(LineSpacingType::Exact)
}

/// Empty paragraph `height` points tall.
fn spacer(height: f64) -> Paragraph {
    Paragraph::new().line_spacing(spacing(0.0, height.max(0.05)))
}

fn run(text: &str, font_size: f64) -> Run {
    Run::new().add_text(text).size(half_points(font_size))
}

fn paragraph(p: &DocParagraph) -> Paragraph {
    let mut para = Paragraph::new()
        .line_spacing(spacing(p.space_before, p.line_height))
        .indent(Some(twips(p.indent) as i32), None, None, None);
    if !p.text.is_empty() {
        para = para.add_run(run(&p.text, p.font_size));
    }
    para
}

fn table(t: &DocTable) -> Table {
    let grid: Vec<usize> = t.column_widths.iter().map(|w| twips(*w) as usize).collect();
    let total: usize = grid.iter().sum();

    let rows = t
        .rows
        .iter()
        .map(|row| {
            let mut column = 0;
            let cells = row
                .cells
                .iter()
                .map(|cell| {
                    let span = cell.grid_span.max(1);
                    let width: usize = grid.iter().skip(column).take(span).sum();
                    column += span;
                    table_cell(cell, span, width)
                })
                .collect();
            TableRow::new(cells)
                .row_height(twips(row.height) as f32)
                .height_rule(HeightRule::AtLeast)
        })
        .collect();

    Table::new(rows)
        .set_grid(grid)
        .width(total, WidthType::Dxa)
        .indent(twips(t.indent) as i32)
        .layout(TableLayoutType::Fixed)
}

fn table_cell(cell: &DocCell, span: usize, width: usize) -> TableCell {
    let mut tc = TableCell::new().width(width, WidthType::Dxa);
    if span > 1 {
        tc = tc.grid_span(span);
    }
    match cell.v_merge {
        Some(VMerge::Restart) => tc = tc.vertical_merge(VMergeType::Restart),
        Some(VMerge::Continue) => tc = tc.vertical_merge(VMergeType::Continue),
        None => {}
    }

    // A cell must hold at least one paragraph.
    if cell.lines.is_empty() || cell.v_merge == Some(VMerge::Continue) {
        return tc.add_paragraph(spacer(cell.font_size));
    }
    for line in &cell.lines {
        tc = tc.add_paragraph(
            Paragraph::new()
                .line_spacing(spacing(0.0, cell.font_size * 1.2))
                .add_run(run(line, cell.font_size)),
        );
    }
    tc
}

fn page_margin(m: &Margins) -> PageMargin {
    PageMargin::new()
        .top(twips(m.top) as i32)
        .right(twips(m.right) as i32)
        .bottom(twips(m.bottom) as i32)
        .left(twips(m.left) as i32)
        .header(0)
        .footer(0)
        .gutter(0)
}

fn section(page: &DocPage) -> SectionProperty {
    let mut size = PageSize::new().size(twips(page.width) as u32, twips(page.height) as u32);
    if page.is_landscape() {
        size = size.orient(PageOrientationType::Landscape);
    }
    SectionProperty::new()
        .page_size(size)
        .page_margin(page_margin(&page.margins))
}

// ── Repacking ────────────────────────────────────────────────────────────────

static RE_PARA_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(w14:(?:paraId|textId))="[0-9A-Fa-f]+""#).unwrap());

static RE_CORE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(<dcterms:(?:created|modified)[^>]*>)[^<]*(</dcterms:(?:created|modified)>)")
        .unwrap()
});

const EPOCH: &str = "1970-01-01T00:00:00Z";

/// Copy every part of `bytes` into a [`Package`], renumbering paragraph ids
/// from 1 and pinning core-property dates.
fn repack(bytes: Vec<u8>) -> Result<Package, ConvertError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ConvertError::package(FORMAT, e))?;
    let mut pkg = Package::new(FORMAT);
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| ConvertError::package(FORMAT, e))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|e| ConvertError::package(FORMAT, e))?;
        if name.ends_with(".xml") || name.ends_with(".rels") {
            data = stable_xml(data);
        }
        pkg.add(name, data);
    }
    Ok(pkg)
}

fn stable_xml(data: Vec<u8>) -> Vec<u8> {
    let text = match String::from_utf8(data) {
        Ok(text) => text,
        Err(e) => return e.into_bytes(),
    };
    let mut next = 0u32;
    let text = RE_PARA_ID.replace_all(&text, |caps: &Captures| {
        next += 1;
        format!("{}=\"{:08X}\"", &caps[1], next)
    });
    let text = RE_CORE_DATE.replace_all(&text, format!("${{1}}{EPOCH}${{2}}").as_str());
    text.into_owned().into_bytes()
}
