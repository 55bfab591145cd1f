//! Spreadsheet extraction: decide, page by page, between tables and text.
//!
//! Each page yields **either** its detected tables **or** its plain text,
//! never both. A page with one (even spurious) table loses its text
//! fallback; a page with no tables becomes a single text sheet, possibly
//! with zero rows.

use crate::config::TableSettings;
use crate::error::ConvertError;
use crate::output::{ConversionStats, Sheet};
use crate::pipeline::geometry::PageContent;
use crate::pipeline::layout::extract_text;
use crate::pipeline::pdfium::PageSource;
use crate::pipeline::sanitize::clean_cell;
use crate::pipeline::table::find_tables;
use tracing::{debug, info};

/// Rows of one table; `None` marks a grid slot no cell starts in.
pub type TableRows = Vec<Vec<Option<String>>>;

/// A page's plain text split into lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBlock {
    pub lines: Vec<String>,
}

impl TextBlock {
    /// Split `text` on `'\n'`; empty text has no lines at all.
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
        }
    }
}

/// What one page contributes to the workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum PageExtraction {
    Tables(Vec<TableRows>),
    Text(TextBlock),
}

impl PageExtraction {
    /// Turn the extraction of page `page_number` (1-based) into sheets.
    ///
    /// Tables become `Page{p}_Table{n}` with missing slots written as empty
    /// strings; text becomes `Page_{p}_Text` with one single-cell row per line.
    pub fn into_sheets(self, page_number: usize) -> Vec<Sheet> {
        match self {
            PageExtraction::Tables(tables) => tables
                .into_iter()
                .enumerate()
                .map(|(i, rows)| {
                    let rows = rows
                        .into_iter()
                        .map(|row| {
                            row.into_iter()
                                .map(|cell| cell.map(|v| clean_cell(&v)).unwrap_or_default())
                                .collect()
                        })
                        .collect();
                    Sheet::new(format!("Page{}_Table{}", page_number, i + 1), rows)
                })
                .collect(),
            PageExtraction::Text(block) => {
                let rows = block
                    .lines
                    .iter()
                    .map(|line| vec![clean_cell(line)])
                    .collect();
                vec![Sheet::new(format!("Page_{}_Text", page_number), rows)]
            }
        }
    }
}

/// Extract one page: its tables if any were detected, its text otherwise.
pub fn extract_page(page: &PageContent, settings: &TableSettings) -> PageExtraction {
    let tables = find_tables(page, settings);
    if tables.is_empty() {
        let text = extract_text(&page.chars, settings.text_x_tolerance, settings.text_y_tolerance);
        debug!("Page {}: no tables, text fallback", page.page_number);
        return PageExtraction::Text(TextBlock::from_text(&text));
    }
    PageExtraction::Tables(
        tables
            .iter()
            .map(|t| t.rows(&page.chars, settings.text_x_tolerance, settings.text_y_tolerance))
            .collect(),
    )
}

/// Extract every page of `source`, in order, into workbook sheets.
///
/// Any page failure aborts the whole extraction. The returned stats count
/// pages, tables and text fallbacks; `output_path` is left for the caller.
pub fn extract_workbook<S>(
    source: &S,
    settings: &TableSettings,
) -> Result<(Vec<Sheet>, ConversionStats), ConvertError>
where
    S: PageSource + ?Sized,
{
    let total = source.page_count();
    let mut stats = ConversionStats {
        pages: total,
        ..ConversionStats::default()
    };
    let mut sheets = Vec::new();
    for index in 0..total {
        let page = source.page(index)?;
        let extraction = extract_page(&page, settings);
        match &extraction {
            PageExtraction::Tables(tables) => stats.tables += tables.len(),
            PageExtraction::Text(_) => stats.text_pages += 1,
        }
        sheets.extend(extraction.into_sheets(index + 1));
    }
    info!(
        "Extracted {} sheets from {} pages ({} tables, {} text pages)",
        sheets.len(),
        total,
        stats.tables,
        stats.text_pages
    );
    Ok((sheets, stats))
}
