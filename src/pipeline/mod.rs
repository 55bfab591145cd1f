//! Pipeline stages for PDF-to-Office conversion.
//!
//! Each submodule implements exactly one transformation step. Everything
//! after [`pdfium`] works on engine-neutral [`geometry::PageContent`]
//! snapshots, which keeps every stage testable without libpdfium.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ pdfium ──▶ layout ──▶ table ──▶ extract ──▶ sanitize
//! (paths)   (pages)    (lines)    (grids)  (sheets)    (XML-safe)
//! ```
//!
//! 1. [`input`]   : turn arguments into absolute paths and validate the PDF
//! 2. [`pdfium`]  : bind the library and snapshot characters and ruling edges
//! 3. [`layout`]  : rebuild words and lines from positioned characters
//! 4. [`table`]   : lattice table detection from edges and intersections
//! 5. [`extract`] : per-page tables-or-text decision for spreadsheets
//! 6. [`sanitize`]: strip code points Office cannot store

pub mod extract;
pub mod geometry;
pub mod input;
pub mod layout;
pub mod pdfium;
pub mod sanitize;
pub mod table;
