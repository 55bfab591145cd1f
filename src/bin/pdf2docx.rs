//! `pdf2docx <input.pdf> <output.docx>`
//!
//! Converts every page with vertical and horizontal line detection on,
//! 0.5 pt border tolerance, 4 pt snap, 3 pt join and zero page margins.

use pdf2office::cli::{run, Tool};
use pdf2office::{convert_to_docx, ConversionSettings};
use std::process::ExitCode;

fn main() -> ExitCode {
    let settings = ConversionSettings::default();
    run(
        Tool {
            name: "pdf2docx",
            about: "Convert a PDF into a grid-aligned Word document",
        },
        |request| Ok(convert_to_docx(request, &settings)?),
    )
}
