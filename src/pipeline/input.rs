//! Input resolution: turn command-line arguments into a [`ConversionRequest`].
//!
//! ## Why check the magic bytes here?
//!
//! Loading pdfium is the most expensive (and most fragile) step of a run.
//! Validating existence, read permission and the `%PDF` header first lets
//! the tools fail with a precise message, and without a libpdfium on the
//! machine at all, when the input is obviously wrong.

use crate::error::ConvertError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Absolute input and output paths of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl ConversionRequest {
    /// Build a request from positional arguments (program name excluded).
    ///
    /// Only the first two arguments are used; extra ones are ignored. Both
    /// paths are made absolute against the current directory, and the input
    /// must exist.
    pub fn from_args<I, S>(args: I) -> Result<Self, ConvertError>
    where
        I: IntoIterator<Item = S>,
        S: Into<PathBuf>,
    {
        let mut args = args.into_iter();
        let (Some(input), Some(output)) = (args.next(), args.next()) else {
            return Err(ConvertError::MissingArguments);
        };

        let input_path = absolutize(&input.into())?;
        let output_path = absolutize(&output.into())?;

        if !input_path.exists() {
            return Err(ConvertError::FileNotFound { path: input_path });
        }

        debug!(
            "Resolved request: {} -> {}",
            input_path.display(),
            output_path.display()
        );
        Ok(Self {
            input_path,
            output_path,
        })
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, ConvertError> {
    std::path::absolute(path)
        .map_err(|e| ConvertError::Internal(format!("Cannot resolve '{}': {}", path.display(), e)))
}

/// Check that `path` can be opened and starts with the PDF magic bytes.
pub fn ensure_readable_pdf(path: &Path) -> Result<(), ConvertError> {
    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ConvertError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(ConvertError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
        return Err(ConvertError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}
