//! # pdf2office
//!
//! Convert PDF documents into Office files: tables into Excel workbooks,
//! whole pages into grid-aligned Word documents.
//!
//! ## Why a geometric pipeline?
//!
//! A PDF has no notion of tables or paragraphs, only positioned glyphs and
//! stroked paths. This crate reads both through pdfium, rebuilds ruling
//! lines into table grids (snap, join, intersect, cells) and groups glyphs
//! into words and lines. The same page model feeds both outputs.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    resolve paths, check the %PDF header
//!  ├─ 2. Pdfium   snapshot characters and ruling edges per page
//!  ├─ 3. Tables   lattice detection from edge intersections
//!  ├─ 4a. Xlsx    tables, or the page text, as worksheets
//!  ├─ 4b. Docx    positioned paragraphs and Word tables, one section per page
//!  └─ 5. Package  deterministic zip, written atomically
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2office::{convert_to_docx, convert_to_xlsx, ConversionRequest, ConversionSettings};
//!
//! fn main() -> Result<(), pdf2office::ConvertError> {
//!     let request = ConversionRequest::from_args(["report.pdf", "report.xlsx"])?;
//!     let stats = convert_to_xlsx(&request)?;
//!     eprintln!("{} tables on {} pages", stats.tables, stats.pages);
//!
//!     let request = ConversionRequest::from_args(["report.pdf", "report.docx"])?;
//!     convert_to_docx(&request, &ConversionSettings::default())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables `pdf2xlsx` and `pdf2docx` (clap + anyhow + tracing-subscriber) |
//!
//! libpdfium is loaded at runtime: set `PDFIUM_LIB_PATH`, place the library
//! next to the executable, or install it system-wide.

// ── Modules ──────────────────────────────────────────────────────────────

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod writer;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionSettings, ConversionSettingsBuilder, EdgeStrategy, TableSettings};
pub use convert::{convert_to_docx, convert_to_xlsx, layout_page, source_to_docx, source_to_xlsx};
pub use error::ConvertError;
pub use output::{ConversionStats, Sheet};
pub use pipeline::geometry::PageContent;
pub use pipeline::input::ConversionRequest;
pub use pipeline::pdfium::PageSource;
pub use report::StatusReporter;
