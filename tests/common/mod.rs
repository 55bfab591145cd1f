//! Hand-assembled PDF fixtures for integration tests.
//!
//! Pages are US Letter with one Helvetica font and uncompressed content
//! streams, so every fixture is a few hundred bytes and needs no tooling.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Build a PDF whose pages carry the given content streams.
pub fn pdf_with_pages(contents: &[String]) -> Vec<u8> {
    let font_id = 3;
    let page_ids: Vec<usize> = (0..contents.len()).map(|i| 4 + 2 * i).collect();

    let mut objects: Vec<String> = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            page_ids
                .iter()
                .map(|id| format!("{id} 0 R"))
                .collect::<Vec<_>>()
                .join(" "),
            contents.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];
    for (content, page_id) in contents.iter().zip(&page_ids) {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 {font_id} 0 R >> >> /Contents {} 0 R >>",
            page_id + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }
    let xref = out.len();
    let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        table.push_str(&format!("{offset:010} 00000 n \n"));
    }
    table.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
        objects.len() + 1
    ));
    out.extend_from_slice(table.as_bytes());
    out
}

/// Content stream showing `text` at `(x, y)` in PDF user space.
pub fn text_at(text: &str, x: f64, y: f64) -> String {
    format!("BT /F1 10 Tf {x} {y} Td ({text}) Tj ET\n")
}

/// Content stream stroking a `cols × rows` grid with its top-left corner at
/// `(x, y)` in PDF user space, each cell `w × h` points.
pub fn grid_at(x: f64, y: f64, cols: usize, rows: usize, w: f64, h: f64) -> String {
    let mut s = String::from("0.5 w\n");
    for c in 0..=cols {
        let cx = x + c as f64 * w;
        s.push_str(&format!("{cx} {y} m {cx} {} l S\n", y - rows as f64 * h));
    }
    for r in 0..=rows {
        let ry = y - r as f64 * h;
        s.push_str(&format!("{x} {ry} m {} {ry} l S\n", x + cols as f64 * w));
    }
    s
}

/// Two pages: a 2×2 table with labels, then two lines of plain text.
pub fn table_then_text() -> Vec<u8> {
    let mut page1 = grid_at(100.0, 700.0, 2, 2, 100.0, 20.0);
    page1.push_str(&text_at("Name", 105.0, 685.0));
    page1.push_str(&text_at("Qty", 205.0, 685.0));
    page1.push_str(&text_at("Bolts", 105.0, 665.0));
    page1.push_str(&text_at("12", 205.0, 665.0));

    let mut page2 = text_at("First line", 72.0, 720.0);
    page2.push_str(&text_at("Second line", 72.0, 700.0));
    pdf_with_pages(&[page1, page2])
}

/// Write `bytes` to `dir/name` and return the path.
pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write fixture");
    path
}
