//! Conversion entry points: PDF → `.xlsx` and PDF → `.docx`.
//!
//! ## Why two layers?
//!
//! `convert_to_*` take a [`ConversionRequest`], bind pdfium and open the
//! document. `source_to_*` take any [`PageSource`] and do the actual work,
//! so library callers and tests can drive the same code with pre-built
//! pages. The pdfium binding and the open document are locals of
//! `convert_to_*` and are released on every exit path.

use crate::config::{ConversionSettings, TableSettings};
use crate::error::ConvertError;
use crate::output::ConversionStats;
use crate::pipeline::extract::extract_workbook;
use crate::pipeline::geometry::{BBox, PageContent, TextChar};
use crate::pipeline::input::{ensure_readable_pdf, ConversionRequest};
use crate::pipeline::layout::{text_lines, TextLine};
use crate::pipeline::pdfium::{bind_pdfium, PageSource, PdfiumSource};
use crate::pipeline::sanitize::clean_text;
use crate::pipeline::table::{cell_chars, find_tables, Table};
use crate::writer::docx::{
    Block, DocCell, DocPage, DocParagraph, DocRow, DocTable, DocxBuilder, Margins, VMerge,
    DEFAULT_FONT_SIZE,
};
use crate::writer::xlsx::write_workbook;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

// ── Spreadsheet ──────────────────────────────────────────────────────────────

/// Convert the request's PDF into a workbook with one sheet per table (or
/// per text-only page).
pub fn convert_to_xlsx(request: &ConversionRequest) -> Result<ConversionStats, ConvertError> {
    let start = Instant::now();
    ensure_readable_pdf(&request.input_path)?;

    let pdfium = bind_pdfium()?;
    let source = PdfiumSource::open(&pdfium, &request.input_path)?;
    let stats = source_to_xlsx(&source, &TableSettings::default(), &request.output_path)?;

    info!(
        "xlsx conversion finished in {} ms",
        start.elapsed().as_millis()
    );
    Ok(stats)
}

/// Extract every page of `source` and write the workbook to `output`.
pub fn source_to_xlsx<S>(
    source: &S,
    settings: &TableSettings,
    output: &Path,
) -> Result<ConversionStats, ConvertError>
where
    S: PageSource + ?Sized,
{
    let (sheets, mut stats) = extract_workbook(source, settings)?;
    write_workbook(&sheets, output)?;
    stats.output_path = output.to_path_buf();
    Ok(stats)
}

// ── Document ─────────────────────────────────────────────────────────────────

/// Convert the request's PDF into a Word document using `settings`.
pub fn convert_to_docx(
    request: &ConversionRequest,
    settings: &ConversionSettings,
) -> Result<ConversionStats, ConvertError> {
    let start = Instant::now();
    ensure_readable_pdf(&request.input_path)?;

    let pdfium = bind_pdfium()?;
    let source = PdfiumSource::open(&pdfium, &request.input_path)?;
    let stats = source_to_docx(&source, settings, &request.output_path)?;

    info!(
        "docx conversion finished in {} ms",
        start.elapsed().as_millis()
    );
    Ok(stats)
}

/// Lay out the selected pages of `source` and write the document to `output`.
pub fn source_to_docx<S>(
    source: &S,
    settings: &ConversionSettings,
    output: &Path,
) -> Result<ConversionStats, ConvertError>
where
    S: PageSource + ?Sized,
{
    settings.validate()?;
    debug!(
        "Document settings: {}",
        serde_json::to_string(settings).unwrap_or_default()
    );

    let total = source.page_count();
    let indices = settings.page_indices(total);
    if indices.is_empty() {
        return Err(ConvertError::PageOutOfRange {
            start: settings.start,
            end: settings.end,
            total,
        });
    }

    let mut stats = ConversionStats {
        pages: indices.len(),
        output_path: output.to_path_buf(),
        ..ConversionStats::default()
    };
    let mut builder = DocxBuilder::new();
    for index in indices {
        let page = source.page(index)?;
        let (doc_page, tables) = layout_page(&page, settings);
        stats.tables += tables;
        if tables == 0 {
            stats.text_pages += 1;
        }
        builder.add_page(doc_page);
    }
    builder.write_to(output)?;
    Ok(stats)
}

/// Place the text lines and tables of one page, top to bottom.
///
/// Returns the laid-out page and the number of tables on it.
pub fn layout_page(page: &PageContent, settings: &ConversionSettings) -> (DocPage, usize) {
    let ts = settings.table_settings();
    let tables = find_tables(page, &ts);
    let margins = Margins {
        top: settings.margin_top,
        right: settings.margin_right,
        bottom: settings.margin_bottom,
        left: settings.margin_left,
    };

    let table_boxes: Vec<BBox> = tables.iter().map(Table::bbox).collect();
    let free_chars: Vec<TextChar> = page
        .chars
        .iter()
        .filter(|c| {
            let (x, y) = c.center();
            !table_boxes.iter().any(|b| b.contains_point(x, y))
        })
        .cloned()
        .collect();
    let lines = text_lines(&free_chars, ts.text_x_tolerance, ts.text_y_tolerance);

    // Text starting near a table border lines up with it.
    let grid: Vec<f64> = tables.iter().flat_map(Table::column_boundaries).collect();

    enum Item<'a> {
        Line(&'a TextLine),
        Table(&'a Table, BBox),
    }
    let mut items: Vec<(f64, Item<'_>)> = lines
        .iter()
        .map(|l| (l.bbox.top, Item::Line(l)))
        .chain(tables.iter().zip(&table_boxes).map(|(t, b)| (b.top, Item::Table(t, *b))))
        .collect();
    items.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut cursor = margins.top;
    let mut blocks = Vec::with_capacity(items.len());
    for (top, item) in items {
        let space_before = (top - cursor).max(0.0);
        match item {
            Item::Line(line) => {
                let x0 = snap_to_grid(line.bbox.x0, &grid, settings.snap_tolerance);
                let height = line.bbox.height().max(1.0);
                blocks.push(Block::Paragraph(DocParagraph {
                    text: clean_text(&line.text()),
                    indent: (x0 - margins.left).max(0.0),
                    space_before,
                    line_height: height,
                    font_size: font_size_or_default(line.size()),
                }));
                cursor = cursor.max(top + height);
            }
            Item::Table(table, bbox) => {
                blocks.push(Block::Table(doc_table(
                    table,
                    &page.chars,
                    &ts,
                    (bbox.x0 - margins.left).max(0.0),
                    space_before,
                )));
                cursor = cursor.max(bbox.bottom);
            }
        }
    }

    debug!(
        "Page {}: {} paragraphs, {} tables",
        page.page_number,
        lines.len(),
        tables.len()
    );
    let doc_page = DocPage {
        width: page.width,
        height: page.height,
        margins,
        blocks,
    };
    (doc_page, tables.len())
}

/// The grid position within `tolerance` of `value` closest to it, or `value`.
fn snap_to_grid(value: f64, grid: &[f64], tolerance: f64) -> f64 {
    grid.iter()
        .copied()
        .filter(|g| (g - value).abs() <= tolerance)
        .min_by(|a, b| (a - value).abs().total_cmp(&(b - value).abs()))
        .unwrap_or(value)
}

fn font_size_or_default(size: f64) -> f64 {
    if size > 0.0 {
        size
    } else {
        DEFAULT_FONT_SIZE
    }
}

/// Map a detected table onto a Word grid.
///
/// Grid columns and rows are the distinct cell borders. A cell spanning
/// several grid columns gets a `gridSpan`; one spanning several grid rows
/// starts a vertical merge continued on the rows below.
fn doc_table(
    table: &Table,
    chars: &[TextChar],
    settings: &TableSettings,
    indent: f64,
    space_before: f64,
) -> DocTable {
    let xs = table.column_boundaries();
    let ys = table.row_boundaries();
    let column_widths: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();

    let mut rows = Vec::with_capacity(ys.len().saturating_sub(1));
    for band in ys.windows(2) {
        let (top, bottom) = (band[0], band[1]);
        let mut cells = Vec::new();
        let mut col = 0;
        while col < column_widths.len() {
            let (left, right) = (xs[col], xs[col + 1]);
            let covering = table.cells.iter().find(|c| {
                c.x0 <= left && c.x1 >= right && c.top <= top && c.bottom >= bottom
            });
            let Some(cell) = covering else {
                cells.push(DocCell {
                    lines: Vec::new(),
                    font_size: DEFAULT_FONT_SIZE,
                    grid_span: 1,
                    v_merge: None,
                });
                col += 1;
                continue;
            };

            let span = xs[col..xs.len() - 1]
                .iter()
                .take_while(|&&x| x < cell.x1)
                .count()
                .max(1);
            let v_merge = if cell.top < top {
                Some(VMerge::Continue)
            } else if cell.bottom > bottom {
                Some(VMerge::Restart)
            } else {
                None
            };

            let inside = cell_chars(cell, chars);
            let size = inside.iter().map(|c| c.size).fold(0.0, f64::max);
            let lines = if v_merge == Some(VMerge::Continue) {
                Vec::new()
            } else {
                text_lines(&inside, settings.text_x_tolerance, settings.text_y_tolerance)
                    .iter()
                    .map(|l| clean_text(&l.text()))
                    .collect()
            };
            cells.push(DocCell {
                lines,
                font_size: font_size_or_default(size),
                grid_span: span,
                v_merge,
            });
            col += span;
        }
        rows.push(DocRow {
            height: bottom - top,
            cells,
        });
    }

    DocTable {
        indent,
        space_before,
        column_widths,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::geometry::Edge;
    use crate::pipeline::layout::tests::glyphs;

    fn letter() -> PageContent {
        PageContent::new(1, 612.0, 792.0)
    }

    /// 2×2 grid at (100, 200) with 100×20 pt cells.
    fn grid_edges() -> Vec<Edge> {
        let mut edges: Vec<Edge> = [100.0, 200.0, 300.0]
            .iter()
            .map(|&x| Edge::vertical(x, 200.0, 240.0))
            .collect();
        edges.extend(
            [200.0, 220.0, 240.0]
                .iter()
                .map(|&y| Edge::horizontal(100.0, 300.0, y)),
        );
        edges
    }

    #[test]
    fn text_lines_become_positioned_paragraphs() {
        let mut chars = glyphs("Title", 72.0, 72.0);
        chars.extend(glyphs("Body", 90.0, 100.0));
        let (page, tables) = layout_page(&letter().with_chars(chars), &ConversionSettings::default());

        assert_eq!(tables, 0);
        assert_eq!(page.margins, Margins::default());
        let paras: Vec<&DocParagraph> = page
            .blocks
            .iter()
            .filter_map(|b| match b {
                Block::Paragraph(p) => Some(p),
                Block::Table(_) => None,
            })
            .collect();
        assert_eq!(paras.len(), 2);
        assert_eq!(paras[0].text, "Title");
        assert_eq!(paras[0].indent, 72.0);
        assert_eq!(paras[0].space_before, 72.0);
        // Title occupies 72..82, Body starts at 100.
        assert_eq!(paras[1].space_before, 18.0);
        assert_eq!(paras[1].indent, 90.0);
    }

    #[test]
    fn table_replaces_its_text_and_keeps_order() {
        let mut chars = glyphs("Above", 100.0, 150.0);
        chars.extend(glyphs("A", 105.0, 205.0));
        chars.extend(glyphs("Below", 100.0, 300.0));
        let page = letter().with_chars(chars).with_edges(grid_edges());

        let (doc, tables) = layout_page(&page, &ConversionSettings::default());
        assert_eq!(tables, 1);
        assert_eq!(doc.blocks.len(), 3);
        assert!(matches!(&doc.blocks[0], Block::Paragraph(p) if p.text == "Above"));
        let Block::Table(t) = &doc.blocks[1] else {
            panic!("expected table, got {:?}", doc.blocks[1]);
        };
        assert_eq!(t.column_widths, vec![100.0, 100.0]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0].cells[0].lines, vec!["A"]);
        assert_eq!(t.indent, 100.0);
        // "Above" ends at 160, table starts at 200.
        assert_eq!(t.space_before, 40.0);
        assert!(matches!(&doc.blocks[2], Block::Paragraph(p) if p.text == "Below"));
    }

    #[test]
    fn merged_cells_span_and_merge() {
        // Left column is one cell over two rows; right column is split.
        let edges = vec![
            Edge::vertical(0.0, 0.0, 40.0),
            Edge::vertical(50.0, 0.0, 40.0),
            Edge::vertical(100.0, 0.0, 40.0),
            Edge::horizontal(0.0, 100.0, 0.0),
            Edge::horizontal(50.0, 100.0, 20.0),
            Edge::horizontal(0.0, 100.0, 40.0),
        ];
        let table = find_tables(
            &letter().with_edges(edges),
            &ConversionSettings::default().table_settings(),
        )
        .remove(0);
        let t = doc_table(&table, &[], &TableSettings::default(), 0.0, 0.0);

        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0].cells[0].v_merge, Some(VMerge::Restart));
        assert_eq!(t.rows[1].cells[0].v_merge, Some(VMerge::Continue));
        assert_eq!(t.rows[1].cells[1].v_merge, None);
    }

    #[test]
    fn snap_picks_nearest_grid_line() {
        assert_eq!(snap_to_grid(98.0, &[100.0, 300.0], 4.0), 100.0);
        assert_eq!(snap_to_grid(90.0, &[100.0], 4.0), 90.0);
    }

    #[test]
    fn docx_page_range_out_of_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ConversionSettings::builder().pages(5, None).build().unwrap();
        let err = source_to_docx(&vec![letter()], &settings, &dir.path().join("x.docx"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::PageOutOfRange { total: 1, .. }));
        assert!(!dir.path().join("x.docx").exists());
    }

    #[test]
    fn docx_rejects_invalid_settings_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("bad.docx");
        let settings = ConversionSettings {
            snap_tolerance: -1.0,
            ..ConversionSettings::default()
        };
        let err = source_to_docx(&vec![letter()], &settings, &out).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)), "{err}");
        assert!(!out.exists());
    }

    #[test]
    fn docx_output_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let pages = vec![letter()
            .with_chars(glyphs("Repeatable", 50.0, 50.0))
            .with_edges(grid_edges())];
        let a = dir.path().join("a.docx");
        let b = dir.path().join("b.docx");
        source_to_docx(&pages, &ConversionSettings::default(), &a).unwrap();
        source_to_docx(&pages, &ConversionSettings::default(), &b).unwrap();
        assert_eq!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
    }

    #[test]
    fn xlsx_stats_record_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("book.xlsx");
        let stats = source_to_xlsx(&vec![letter()], &TableSettings::default(), &out).unwrap();
        assert_eq!(stats.output_path, out);
        assert_eq!((stats.pages, stats.tables, stats.text_pages), (1, 0, 1));
        assert!(out.exists());
    }
}
