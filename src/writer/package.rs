//! Office Open XML packaging: XML part serialisation and the zip container.
//!
//! ## Why fixed timestamps?
//!
//! A zip entry records its modification time. Stamping every entry with the
//! zip epoch (1980-01-01) and writing parts in a fixed order makes the same
//! input produce byte-identical output, so converted files can be diffed and
//! cached.

use crate::error::ConvertError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Streaming writer for one XML part.
pub(crate) struct XmlPart {
    writer: Writer<Vec<u8>>,
    format: &'static str,
}

impl XmlPart {
    /// Start a standalone UTF-8 part; `format` labels errors.
    pub(crate) fn new(format: &'static str) -> Result<Self, ConvertError> {
        let mut part = Self {
            writer: Writer::new(Vec::new()),
            format,
        };
        part.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(part)
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), ConvertError> {
        self.writer
            .write_event(event)
            .map_err(|e| ConvertError::package(self.format, e))
    }

    pub(crate) fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), ConvertError> {
        self.event(Event::Start(
            BytesStart::new(name).with_attributes(attrs.iter().copied()),
        ))
    }

    pub(crate) fn end(&mut self, name: &str) -> Result<(), ConvertError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    /// Self-closing element.
    pub(crate) fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), ConvertError> {
        self.event(Event::Empty(
            BytesStart::new(name).with_attributes(attrs.iter().copied()),
        ))
    }

    /// Escaped character data.
    pub(crate) fn text(&mut self, text: &str) -> Result<(), ConvertError> {
        self.event(Event::Text(BytesText::new(text)))
    }

    /// `<name attrs>text</name>`.
    pub(crate) fn element(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> Result<(), ConvertError> {
        self.start(name, attrs)?;
        self.text(text)?;
        self.end(name)
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

/// A zip package under construction; parts keep their insertion order.
#[derive(Debug)]
pub struct Package {
    format: &'static str,
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn new(format: &'static str) -> Self {
        Self {
            format,
            parts: Vec::new(),
        }
    }

    pub fn add(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.parts.push((name.into(), data));
    }

    /// Names of the parts added so far, in order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    /// Serialise the package into zip bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConvertError> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in &self.parts {
            zip.start_file(name.as_str(), options)
                .map_err(|e| ConvertError::package(self.format, e))?;
            zip.write_all(data)
                .map_err(|e| ConvertError::package(self.format, e))?;
        }
        let cursor = zip
            .finish()
            .map_err(|e| ConvertError::package(self.format, e))?;
        Ok(cursor.into_inner())
    }

    /// Serialise and write atomically to `path`.
    pub fn write_to(&self, path: &Path) -> Result<(), ConvertError> {
        let bytes = self.to_bytes()?;
        write_atomic(path, &bytes)?;
        debug!(
            "Wrote {} package: {} ({} parts, {} bytes)",
            self.format,
            path.display(),
            self.parts.len(),
            bytes.len()
        );
        Ok(())
    }
}

/// Write `bytes` to a temp file next to `path`, then rename it into place.
///
/// A failed run never leaves a truncated file at `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    let io_err = |source: std::io::Error| ConvertError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
