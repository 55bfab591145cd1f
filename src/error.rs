//! Error types for the pdf2office library.
//!
//! Every failure is terminal: a conversion either produces a complete output
//! file or returns one [`ConvertError`]. There is no per-page partial
//! success, so unlike a page-tolerant pipeline there is a single error enum.
//!
//! The `Display` text of each variant is what the command-line tools print
//! after `ERROR: `, so the wording of [`ConvertError::MissingArguments`] and
//! [`ConvertError::FileNotFound`] is part of the CLI contract.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2office library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Argument / input errors ───────────────────────────────────────────
    /// Fewer than two positional arguments were supplied.
    #[error("Missing arguments")]
    MissingArguments,

    /// Input file was not found at the given path.
    #[error("File not found {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{}'", .path.display())]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{}' (first bytes: {magic:?})", .path.display())]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{}' is corrupt: {detail}", .path.display())]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password.
    #[error("PDF '{}' is encrypted and requires a password", .path.display())]
    PasswordRequired { path: PathBuf },

    /// The selected page range does not contain any page of the document.
    #[error("Page range {start}..{} selects no pages (document has {total} pages)", .end.map(|e| e.to_string()).unwrap_or_default())]
    PageOutOfRange {
        start: usize,
        end: Option<usize>,
        total: usize,
    },

    /// pdfium returned an error while reading a specific page.
    #[error("Failed to read page {page}: {detail}")]
    PageExtractionFailed { page: usize, detail: String },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, or place the library next to the executable."
    )]
    PdfiumBindingFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Serialising an Office Open XML part or the zip container failed.
    #[error("Failed to encode {format} package: {detail}")]
    PackageEncoding { format: &'static str, detail: String },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{}': {source}", .path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Wrap an XML or zip failure while building a `format` package.
    pub(crate) fn package(format: &'static str, err: impl fmt::Display) -> Self {
        ConvertError::PackageEncoding {
            format,
            detail: err.to_string(),
        }
    }
}
