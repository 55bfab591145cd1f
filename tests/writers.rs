//! Office packages read back with independent readers.
//!
//! Workbooks go through calamine; documents are unzipped and inspected as
//! XML text. No pdfium is involved: pages are built in memory.

use calamine::{open_workbook, Data, Reader, Xlsx};
use pdf2office::pipeline::geometry::{Edge, TextChar};
use pdf2office::writer::xlsx::write_workbook;
use pdf2office::{source_to_docx, source_to_xlsx, ConversionSettings, PageContent, Sheet, TableSettings};
use std::io::Read;
use std::path::Path;

fn word(text: &str, x: f64, top: f64) -> Vec<TextChar> {
    text.chars()
        .enumerate()
        .map(|(i, c)| TextChar {
            text: c.to_string(),
            x0: x + i as f64 * 5.0,
            top,
            x1: x + i as f64 * 5.0 + 5.0,
            bottom: top + 10.0,
            size: 10.0,
        })
        .collect()
}

fn grid(x: f64, top: f64, cols: usize, rows: usize) -> Vec<Edge> {
    let (w, h) = (100.0, 20.0);
    let bottom = top + rows as f64 * h;
    let right = x + cols as f64 * w;
    (0..=cols)
        .map(|c| Edge::vertical(x + c as f64 * w, top, bottom))
        .chain((0..=rows).map(|r| Edge::horizontal(x, right, top + r as f64 * h)))
        .collect()
}

fn cell(range: &calamine::Range<Data>, row: u32, col: u32) -> String {
    match range.get_value((row, col)) {
        Some(Data::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn zip_entry(path: &Path, name: &str) -> String {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut xml = String::new();
    entry.read_to_string(&mut xml).unwrap();
    xml
}

#[test]
fn workbook_reads_back_in_calamine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.xlsx");
    let sheets = vec![
        Sheet::new(
            "Page1_Table1",
            vec![
                vec!["Name".into(), "Qty".into()],
                vec!["Bolts & nuts".into(), "".into()],
            ],
        ),
        Sheet::new("Page_2_Text", vec![vec!["<hello>".into()]]),
    ];
    write_workbook(&sheets, &path).unwrap();

    let mut book: Xlsx<_> = open_workbook(&path).unwrap();
    assert_eq!(book.sheet_names(), vec!["Page1_Table1", "Page_2_Text"]);

    let table = book.worksheet_range("Page1_Table1").unwrap();
    assert_eq!(cell(&table, 0, 0), "Name");
    assert_eq!(cell(&table, 0, 1), "Qty");
    assert_eq!(cell(&table, 1, 0), "Bolts & nuts");
    assert_eq!(cell(&table, 1, 1), "");

    let text = book.worksheet_range("Page_2_Text").unwrap();
    assert_eq!(cell(&text, 0, 0), "<hello>");
}

#[test]
fn empty_workbook_still_has_a_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.xlsx");
    write_workbook(&[], &path).unwrap();

    let book: Xlsx<_> = open_workbook(&path).unwrap();
    assert_eq!(book.sheet_names(), vec!["Sheet1"]);
}

#[test]
fn pages_to_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pages.xlsx");

    let mut table_chars = word("k", 5.0, 105.0);
    table_chars.extend(word("v", 105.0, 105.0));
    let pages = vec![
        PageContent::new(1, 612.0, 792.0)
            .with_edges(grid(0.0, 100.0, 2, 2))
            .with_chars(table_chars),
        PageContent::new(2, 612.0, 792.0).with_chars(word("plain", 72.0, 72.0)),
        PageContent::new(3, 612.0, 792.0),
    ];
    let stats = source_to_xlsx(&pages, &TableSettings::default(), &path).unwrap();
    assert_eq!((stats.pages, stats.tables, stats.text_pages), (3, 1, 2));

    let mut book: Xlsx<_> = open_workbook(&path).unwrap();
    assert_eq!(
        book.sheet_names(),
        vec!["Page1_Table1", "Page_2_Text", "Page_3_Text"]
    );
    let table = book.worksheet_range("Page1_Table1").unwrap();
    assert_eq!(cell(&table, 0, 0), "k");
    assert_eq!(cell(&table, 0, 1), "v");
    let text = book.worksheet_range("Page_2_Text").unwrap();
    assert_eq!(cell(&text, 0, 0), "plain");
    assert!(book.worksheet_range("Page_3_Text").unwrap().is_empty());
}

#[test]
fn pages_to_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.docx");

    let mut chars = word("Heading", 72.0, 60.0);
    chars.extend(word("cell", 105.0, 205.0));
    let pages = vec![
        PageContent::new(1, 612.0, 792.0)
            .with_chars(chars)
            .with_edges(grid(100.0, 200.0, 3, 2)),
        PageContent::new(2, 792.0, 612.0).with_chars(word("Landscape", 72.0, 72.0)),
    ];
    let stats = source_to_docx(&pages, &ConversionSettings::default(), &path).unwrap();
    assert_eq!((stats.pages, stats.tables), (2, 1));

    let xml = zip_entry(&path, "word/document.xml");
    assert!(xml.contains("Heading"));
    assert!(xml.contains("</w:tbl>"));
    assert!(xml.contains("cell"));
    assert!(xml.contains("w:orient=\"landscape\""));
    assert_eq!(xml.matches("</w:sectPr>").count(), 2);
    assert!(xml.contains("w:top=\"0\""));
}

#[test]
fn document_selection_limits_pages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("second.docx");
    let pages = vec![
        PageContent::new(1, 612.0, 792.0).with_chars(word("one", 72.0, 72.0)),
        PageContent::new(2, 612.0, 792.0).with_chars(word("two", 72.0, 72.0)),
    ];
    let settings = ConversionSettings::builder().pages(1, Some(2)).build().unwrap();
    source_to_docx(&pages, &settings, &path).unwrap();

    let xml = zip_entry(&path, "word/document.xml");
    assert!(xml.contains("two"));
    assert!(!xml.contains(">one<"));
}
