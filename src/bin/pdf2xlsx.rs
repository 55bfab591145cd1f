//! `pdf2xlsx <input.pdf> <output.xlsx>`
//!
//! One sheet per detected table (`Page{p}_Table{n}`); pages without tables
//! become a single text sheet (`Page_{p}_Text`).

use pdf2office::cli::{run, Tool};
use pdf2office::convert_to_xlsx;
use std::process::ExitCode;

fn main() -> ExitCode {
    run(
        Tool {
            name: "pdf2xlsx",
            about: "Extract the tables of a PDF into an Excel workbook",
        },
        |request| Ok(convert_to_xlsx(request)?),
    )
}
