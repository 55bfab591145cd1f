//! SpreadsheetML (`.xlsx`) writer.
//!
//! Every cell is written as an inline string (`t="inlineStr"`), including
//! empty ones, so a sheet keeps exactly the rows and columns it was given.
//! No shared-string table and no number detection: extracted PDF text is
//! stored verbatim.

use crate::error::ConvertError;
use crate::output::Sheet;
use crate::writer::package::{Package, XmlPart};
use std::path::Path;
use tracing::info;

const FORMAT: &str = "xlsx";

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const CT_RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";
const CT_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";

/// Name of the placeholder sheet written when there is nothing to write.
pub const EMPTY_WORKBOOK_SHEET: &str = "Sheet1";

/// Write `sheets` as a workbook at `path`.
///
/// A workbook must hold at least one sheet, so an empty `sheets` produces a
/// single empty [`EMPTY_WORKBOOK_SHEET`].
pub fn write_workbook(sheets: &[Sheet], path: &Path) -> Result<(), ConvertError> {
    workbook_package(sheets)?.write_to(path)?;
    info!("Workbook written: {} ({} sheets)", path.display(), sheets.len().max(1));
    Ok(())
}

/// Build the workbook package without writing it.
pub fn workbook_package(sheets: &[Sheet]) -> Result<Package, ConvertError> {
    let placeholder;
    let sheets = if sheets.is_empty() {
        placeholder = [Sheet::new(EMPTY_WORKBOOK_SHEET, Vec::new())];
        &placeholder[..]
    } else {
        sheets
    };

    let mut pkg = Package::new(FORMAT);
    pkg.add("[Content_Types].xml", content_types(sheets.len())?);
    pkg.add("_rels/.rels", root_rels()?);
    pkg.add("xl/workbook.xml", workbook(sheets)?);
    pkg.add("xl/_rels/workbook.xml.rels", workbook_rels(sheets.len())?);
    pkg.add("xl/styles.xml", styles()?);
    for (i, sheet) in sheets.iter().enumerate() {
        pkg.add(format!("xl/worksheets/sheet{}.xml", i + 1), worksheet(sheet)?);
    }
    Ok(pkg)
}

/// Spreadsheet column letters for a 0-based index: 0 → `A`, 26 → `AA`.
pub fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

// ── Parts ────────────────────────────────────────────────────────────────────

fn content_types(sheet_count: usize) -> Result<Vec<u8>, ConvertError> {
    let mut x = XmlPart::new(FORMAT)?;
    x.start("Types", &[("xmlns", NS_TYPES)])?;
    x.empty("Default", &[("Extension", "rels"), ("ContentType", CT_RELS)])?;
    x.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    x.empty("Override", &[("PartName", "/xl/workbook.xml"), ("ContentType", CT_WORKBOOK)])?;
    x.empty("Override", &[("PartName", "/xl/styles.xml"), ("ContentType", CT_STYLES)])?;
    for i in 1..=sheet_count {
        let part = format!("/xl/worksheets/sheet{i}.xml");
        x.empty("Override", &[("PartName", part.as_str()), ("ContentType", CT_WORKSHEET)])?;
    }
    x.end("Types")?;
    Ok(x.finish())
}

fn root_rels() -> Result<Vec<u8>, ConvertError> {
    let mut x = XmlPart::new(FORMAT)?;
    x.start("Relationships", &[("xmlns", NS_PKG_REL)])?;
    x.empty(
        "Relationship",
        &[("Id", "rId1"), ("Type", REL_OFFICE_DOCUMENT), ("Target", "xl/workbook.xml")],
    )?;
    x.end("Relationships")?;
    Ok(x.finish())
}

fn workbook(sheets: &[Sheet]) -> Result<Vec<u8>, ConvertError> {
    let mut x = XmlPart::new(FORMAT)?;
    x.start("workbook", &[("xmlns", NS_MAIN), ("xmlns:r", NS_REL)])?;
    x.start("sheets", &[])?;
    for (i, sheet) in sheets.iter().enumerate() {
        let id = (i + 1).to_string();
        let rid = format!("rId{}", i + 1);
        x.empty(
            "sheet",
            &[
                ("name", sheet.name.as_str()),
                ("sheetId", id.as_str()),
                ("r:id", rid.as_str()),
            ],
        )?;
    }
    x.end("sheets")?;
    x.end("workbook")?;
    Ok(x.finish())
}

fn workbook_rels(sheet_count: usize) -> Result<Vec<u8>, ConvertError> {
    let mut x = XmlPart::new(FORMAT)?;
    x.start("Relationships", &[("xmlns", NS_PKG_REL)])?;
    for i in 1..=sheet_count {
        let rid = format!("rId{i}");
        let target = format!("worksheets/sheet{i}.xml");
        x.empty(
            "Relationship",
            &[("Id", rid.as_str()), ("Type", REL_WORKSHEET), ("Target", target.as_str())],
        )?;
    }
    let styles_rid = format!("rId{}", sheet_count + 1);
    x.empty(
        "Relationship",
        &[("Id", styles_rid.as_str()), ("Type", REL_STYLES), ("Target", "styles.xml")],
    )?;
    x.end("Relationships")?;
    Ok(x.finish())
}

/// The minimal stylesheet Excel accepts: one font, the two mandatory fills,
/// one border, one cell format.
fn styles() -> Result<Vec<u8>, ConvertError> {
    let mut x = XmlPart::new(FORMAT)?;
    x.start("styleSheet", &[("xmlns", NS_MAIN)])?;

    x.start("fonts", &[("count", "1")])?;
    x.start("font", &[])?;
    x.empty("sz", &[("val", "11")])?;
    x.empty("name", &[("val", "Calibri")])?;
    x.end("font")?;
    x.end("fonts")?;

    x.start("fills", &[("count", "2")])?;
    for pattern in ["none", "gray125"] {
        x.start("fill", &[])?;
        x.empty("patternFill", &[("patternType", pattern)])?;
        x.end("fill")?;
    }
    x.end("fills")?;

    x.start("borders", &[("count", "1")])?;
    x.start("border", &[])?;
    for side in ["left", "right", "top", "bottom", "diagonal"] {
        x.empty(side, &[])?;
    }
    x.end("border")?;
    x.end("borders")?;

    let xf = [("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")];
    x.start("cellStyleXfs", &[("count", "1")])?;
    x.empty("xf", &xf)?;
    x.end("cellStyleXfs")?;
    x.start("cellXfs", &[("count", "1")])?;
    x.empty("xf", &[xf[0], xf[1], xf[2], xf[3], ("xfId", "0")])?;
    x.end("cellXfs")?;
    x.start("cellStyles", &[("count", "1")])?;
    x.empty("cellStyle", &[("name", "Normal"), ("xfId", "0"), ("builtinId", "0")])?;
    x.end("cellStyles")?;

    x.end("styleSheet")?;
    Ok(x.finish())
}

fn worksheet(sheet: &Sheet) -> Result<Vec<u8>, ConvertError> {
    let mut x = XmlPart::new(FORMAT)?;
    x.start("worksheet", &[("xmlns", NS_MAIN), ("xmlns:r", NS_REL)])?;

    let width = sheet.width();
    let dimension = if sheet.rows.is_empty() || width == 0 {
        "A1".to_string()
    } else {
        format!("A1:{}{}", column_name(width - 1), sheet.rows.len())
    };
    x.empty("dimension", &[("ref", dimension.as_str())])?;

    if sheet.rows.is_empty() {
        x.empty("sheetData", &[])?;
    } else {
        x.start("sheetData", &[])?;
        for (r, row) in sheet.rows.iter().enumerate() {
            let row_ref = (r + 1).to_string();
            if row.is_empty() {
                x.empty("row", &[("r", row_ref.as_str())])?;
                continue;
            }
            x.start("row", &[("r", row_ref.as_str())])?;
            for (c, value) in row.iter().enumerate() {
                let cell_ref = format!("{}{}", column_name(c), r + 1);
                x.start("c", &[("r", cell_ref.as_str()), ("t", "inlineStr")])?;
                x.start("is", &[])?;
                x.element("t", &[("xml:space", "preserve")], value)?;
                x.end("is")?;
                x.end("c")?;
            }
            x.end("row")?;
        }
        x.end("sheetData")?;
    }

    x.end("worksheet")?;
    Ok(x.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(pkg: &Package, name: &str) -> String {
        let bytes = pkg.to_bytes().unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut s = String::new();
        std::io::Read::read_to_string(&mut archive.by_name(name).unwrap(), &mut s).unwrap();
        s
    }

    #[test]
    fn column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn package_lists_every_sheet() {
        let sheets = vec![
            Sheet::new("Page1_Table1", vec![vec!["a".into(), "b".into()]]),
            Sheet::new("Page_2_Text", vec![vec!["line".into()]]),
        ];
        let pkg = workbook_package(&sheets).unwrap();
        let names: Vec<&str> = pkg.part_names().collect();
        assert!(names.contains(&"xl/worksheets/sheet2.xml"));

        let wb = part(&pkg, "xl/workbook.xml");
        assert!(wb.contains("name=\"Page1_Table1\""));
        assert!(wb.contains("name=\"Page_2_Text\""));
        assert!(part(&pkg, "[Content_Types].xml").contains("/xl/worksheets/sheet2.xml"));
    }

    #[test]
    fn empty_cells_are_written() {
        let sheet = Sheet::new("S", vec![vec!["".into(), "x".into()]]);
        let pkg = workbook_package(&[sheet]).unwrap();
        let ws = part(&pkg, "xl/worksheets/sheet1.xml");
        assert!(ws.contains("<dimension ref=\"A1:B1\"/>"), "got: {ws}");
        assert!(ws.contains("r=\"A1\""));
        assert!(ws.contains("<t xml:space=\"preserve\">x</t>"));
    }

    #[test]
    fn empty_workbook_gets_placeholder_sheet() {
        let pkg = workbook_package(&[]).unwrap();
        assert!(part(&pkg, "xl/workbook.xml").contains("name=\"Sheet1\""));
        assert!(part(&pkg, "xl/worksheets/sheet1.xml").contains("<sheetData/>"));
    }
}
