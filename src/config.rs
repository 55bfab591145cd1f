//! Configuration types for PDF-to-Office conversion.
//!
//! Two records control the pipelines:
//!
//! * [`TableSettings`]: tuning knobs of the table finder. The spreadsheet
//!   pipeline uses [`TableSettings::default()`], which mirrors the classic
//!   lattice defaults (3 pt everywhere, ruling lines on both axes).
//! * [`ConversionSettings`]: the fixed record of the document pipeline.
//!   Its default is the "forms" profile: both border axes detected, borders
//!   joined when they come within 0.5 pt, text snapped to grid lines within
//!   4 pt, words joined within 3 pt, all margins forced to zero.
//!
//! The command-line tools never override these; the builders exist for
//! library callers and validate their input in `build()`.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};

// ── Table finder settings ────────────────────────────────────────────────

/// Where the table finder takes its edges from, per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EdgeStrategy {
    /// Ruling lines and rectangle sides drawn on the page. (default)
    #[default]
    Lines,
    /// Edges synthesised from the alignment of words.
    Text,
}

/// Tuning knobs for the lattice table finder in [`crate::pipeline::table`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSettings {
    /// Edge source for vertical borders.
    pub vertical_strategy: EdgeStrategy,
    /// Edge source for horizontal borders.
    pub horizontal_strategy: EdgeStrategy,
    /// Parallel edges closer than this are snapped onto their mean position.
    pub snap_tolerance: f64,
    /// Collinear edges whose gap is at most this are joined into one.
    pub join_tolerance: f64,
    /// Edges shorter than this are discarded before and after merging.
    pub edge_min_length: f64,
    /// A vertical and a horizontal edge intersect if they come within this distance.
    pub intersection_tolerance: f64,
    /// Horizontal gap (pt) under which two characters belong to the same word.
    pub text_x_tolerance: f64,
    /// Vertical offset (pt) under which two characters share a line.
    pub text_y_tolerance: f64,
    /// Minimum aligned words for a text-strategy vertical edge.
    pub min_words_vertical: usize,
    /// Minimum words for a text-strategy horizontal edge.
    pub min_words_horizontal: usize,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            vertical_strategy: EdgeStrategy::Lines,
            horizontal_strategy: EdgeStrategy::Lines,
            snap_tolerance: 3.0,
            join_tolerance: 3.0,
            edge_min_length: 3.0,
            intersection_tolerance: 3.0,
            text_x_tolerance: 3.0,
            text_y_tolerance: 3.0,
            min_words_vertical: 3,
            min_words_horizontal: 1,
        }
    }
}

// ── Document conversion settings ─────────────────────────────────────────

/// The settings record of the document (DOCX) pipeline.
///
/// # Example
/// ```rust
/// use pdf2office::ConversionSettings;
///
/// let settings = ConversionSettings::builder()
///     .pages(0, Some(2))
///     .snap_tolerance(2.0)
///     .build()
///     .unwrap();
/// assert_eq!(settings.end, Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionSettings {
    /// First page to convert, 0-indexed.
    pub start: usize,
    /// Page after the last page to convert, 0-indexed. `None` converts to the end.
    pub end: Option<usize>,
    /// Use vertical ruling lines as table borders.
    pub detect_vertical_lines: bool,
    /// Use horizontal ruling lines as table borders.
    pub detect_horizontal_lines: bool,
    /// Two borders are connected if the gap between them is at most this (pt).
    pub connected_border_tolerance: f64,
    /// Text and lines within this distance (pt) are snapped to the nearest grid line.
    pub snap_tolerance: f64,
    /// Words and border segments within this distance (pt) are joined.
    pub join_tolerance: f64,
    /// Top page margin (pt).
    pub margin_top: f64,
    /// Bottom page margin (pt).
    pub margin_bottom: f64,
    /// Left page margin (pt).
    pub margin_left: f64,
    /// Right page margin (pt).
    pub margin_right: f64,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            start: 0,
            end: None,
            detect_vertical_lines: true,
            detect_horizontal_lines: true,
            connected_border_tolerance: 0.5,
            snap_tolerance: 4.0,
            join_tolerance: 3.0,
            margin_top: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            margin_right: 0.0,
        }
    }
}

impl ConversionSettings {
    /// Create a new builder starting from the default record.
    pub fn builder() -> ConversionSettingsBuilder {
        ConversionSettingsBuilder {
            settings: Self::default(),
        }
    }

    /// Table finder settings implied by this record.
    ///
    /// A disabled line axis falls back to word alignment for that axis.
    pub fn table_settings(&self) -> TableSettings {
        let strategy = |detect: bool| {
            if detect {
                EdgeStrategy::Lines
            } else {
                EdgeStrategy::Text
            }
        };
        TableSettings {
            vertical_strategy: strategy(self.detect_vertical_lines),
            horizontal_strategy: strategy(self.detect_horizontal_lines),
            snap_tolerance: self.snap_tolerance,
            join_tolerance: self.join_tolerance,
            intersection_tolerance: self.connected_border_tolerance,
            text_x_tolerance: self.join_tolerance,
            ..TableSettings::default()
        }
    }

    /// Expand `[start, end)` into the 0-indexed pages of a `total_pages` document.
    pub fn page_indices(&self, total_pages: usize) -> Vec<usize> {
        let end = self.end.unwrap_or(total_pages).min(total_pages);
        (self.start..end).collect()
    }
}

/// Builder for [`ConversionSettings`].
#[derive(Debug)]
pub struct ConversionSettingsBuilder {
    settings: ConversionSettings,
}

impl ConversionSettingsBuilder {
    pub fn pages(mut self, start: usize, end: Option<usize>) -> Self {
        self.settings.start = start;
        self.settings.end = end;
        self
    }

    pub fn detect_vertical_lines(mut self, v: bool) -> Self {
        self.settings.detect_vertical_lines = v;
        self
    }

    pub fn detect_horizontal_lines(mut self, v: bool) -> Self {
        self.settings.detect_horizontal_lines = v;
        self
    }

    pub fn connected_border_tolerance(mut self, pt: f64) -> Self {
        self.settings.connected_border_tolerance = pt;
        self
    }

    pub fn snap_tolerance(mut self, pt: f64) -> Self {
        self.settings.snap_tolerance = pt;
        self
    }

    pub fn join_tolerance(mut self, pt: f64) -> Self {
        self.settings.join_tolerance = pt;
        self
    }

    /// Set all four margins (pt) in CSS order: top, right, bottom, left.
    pub fn margins(mut self, top: f64, right: f64, bottom: f64, left: f64) -> Self {
        self.settings.margin_top = top;
        self.settings.margin_right = right;
        self.settings.margin_bottom = bottom;
        self.settings.margin_left = left;
        self
    }

    /// Build the settings, validating constraints.
    pub fn build(self) -> Result<ConversionSettings, ConvertError> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

impl ConversionSettings {
    /// Reject negative or non-finite tolerances/margins and inverted page ranges.
    pub fn validate(&self) -> Result<(), ConvertError> {
        let lengths = [
            ("connected_border_tolerance", self.connected_border_tolerance),
            ("snap_tolerance", self.snap_tolerance),
            ("join_tolerance", self.join_tolerance),
            ("margin_top", self.margin_top),
            ("margin_bottom", self.margin_bottom),
            ("margin_left", self.margin_left),
            ("margin_right", self.margin_right),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(ConvertError::InvalidConfig(format!(
                    "{name} must be a finite value ≥ 0, got {value}"
                )));
            }
        }
        if let Some(end) = self.end {
            if end <= self.start {
                return Err(ConvertError::InvalidConfig(format!(
                    "page range end ({end}) must be greater than start ({})",
                    self.start
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_the_forms_profile() {
        let s = ConversionSettings::default();
        assert_eq!(s.start, 0);
        assert_eq!(s.end, None);
        assert!(s.detect_vertical_lines && s.detect_horizontal_lines);
        assert_eq!(s.connected_border_tolerance, 0.5);
        assert_eq!(s.snap_tolerance, 4.0);
        assert_eq!(s.join_tolerance, 3.0);
        assert_eq!(
            [s.margin_top, s.margin_bottom, s.margin_left, s.margin_right],
            [0.0; 4]
        );
    }

    #[test]
    fn table_settings_follow_document_settings() {
        let t = ConversionSettings::default().table_settings();
        assert_eq!(t.vertical_strategy, EdgeStrategy::Lines);
        assert_eq!(t.horizontal_strategy, EdgeStrategy::Lines);
        assert_eq!(t.intersection_tolerance, 0.5);
        assert_eq!(t.snap_tolerance, 4.0);
        assert_eq!(t.join_tolerance, 3.0);

        let t = ConversionSettings::builder()
            .detect_vertical_lines(false)
            .build()
            .unwrap()
            .table_settings();
        assert_eq!(t.vertical_strategy, EdgeStrategy::Text);
        assert_eq!(t.horizontal_strategy, EdgeStrategy::Lines);
    }

    #[test]
    fn page_indices_cover_range() {
        let all = ConversionSettings::default();
        assert_eq!(all.page_indices(3), vec![0, 1, 2]);

        let s = ConversionSettings::builder().pages(1, Some(10)).build().unwrap();
        assert_eq!(s.page_indices(3), vec![1, 2]);

        let s = ConversionSettings::builder().pages(5, None).build().unwrap();
        assert!(s.page_indices(3).is_empty());
    }

    #[test]
    fn builder_rejects_negative_tolerance() {
        let err = ConversionSettings::builder()
            .snap_tolerance(-1.0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("snap_tolerance"), "got: {err}");
    }

    #[test]
    fn builder_rejects_inverted_range() {
        assert!(ConversionSettings::builder()
            .pages(2, Some(2))
            .build()
            .is_err());
    }

    #[test]
    fn settings_serialise_to_json() {
        let json = serde_json::to_string(&ConversionSettings::default()).unwrap();
        assert!(json.contains("\"snap_tolerance\":4.0"), "got: {json}");
        let back: ConversionSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ConversionSettings::default());
    }
}
