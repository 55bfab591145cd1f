//! Output types: what a conversion produces before and after it hits disk.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One worksheet of the spreadsheet output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    /// Worksheet name, e.g. `Page1_Table2` or `Page_3_Text`.
    pub name: String,
    /// Row-major cell values; rows may have different lengths.
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Widest row, in cells.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Summary of a finished conversion, logged by the command-line tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Where the output was written.
    pub output_path: PathBuf,
    /// Pages read from the PDF.
    pub pages: usize,
    /// Tables written (as sheets or Word tables).
    pub tables: usize,
    /// Pages that fell back to plain text.
    pub text_pages: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_width_is_longest_row() {
        let sheet = Sheet::new(
            "Page1_Table1",
            vec![vec!["a".into()], vec!["b".into(), "c".into(), "d".into()]],
        );
        assert_eq!(sheet.width(), 3);
        assert_eq!(Sheet::new("Page_1_Text", Vec::new()).width(), 0);
    }
}
