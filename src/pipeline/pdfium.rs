//! PDF access through pdfium: binding the library and snapshotting pages.
//!
//! ## Why a `PageSource` trait?
//!
//! `pdfium-render` wraps the pdfium C++ library, which has to be present as
//! a shared object at runtime. Everything downstream of this module works on
//! [`PageContent`] snapshots, so tests (and library callers with their own
//! PDF reader) can feed synthetic pages through the same pipeline without a
//! libpdfium on the machine.
//!
//! ## Library lookup order
//!
//! 1. `PDFIUM_LIB_PATH`: a library file or a directory containing one
//! 2. The directory of the running executable
//! 3. The current directory
//! 4. The system library search path

use crate::error::ConvertError;
use crate::pipeline::geometry::{BBox, Edge, PageContent, TextChar};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable pointing at a libpdfium file or directory.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Path objects thinner than this (pt) are treated as a single ruling line.
const THIN_PATH: f64 = 2.0;

/// A segment whose ends differ by less than this (pt) on one axis is axis-aligned.
const AXIS_ALIGNED_EPSILON: f64 = 0.5;

/// Anything that can hand out page snapshots in order.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Snapshot of the page at 0-based `index`.
    fn page(&self, index: usize) -> Result<PageContent, ConvertError>;
}

/// Pre-built pages, in order.
impl PageSource for Vec<PageContent> {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn page(&self, index: usize) -> Result<PageContent, ConvertError> {
        self.get(index)
            .cloned()
            .ok_or_else(|| ConvertError::PageExtractionFailed {
                page: index + 1,
                detail: format!("document has {} pages", self.len()),
            })
    }
}

// ── Binding ──────────────────────────────────────────────────────────────────

/// Bind to libpdfium, trying each location in lookup order.
pub fn bind_pdfium() -> Result<Pdfium, ConvertError> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Some(env_path) = std::env::var_os(PDFIUM_LIB_PATH_ENV) {
        let p = PathBuf::from(env_path);
        if p.is_dir() {
            candidates.push(Pdfium::pdfium_platform_library_name_at_path(&p));
        } else {
            candidates.push(p);
        }
    }
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(Pdfium::pdfium_platform_library_name_at_path(&exe_dir));
    }
    candidates.push(Pdfium::pdfium_platform_library_name_at_path("./"));

    let mut failures = Vec::new();
    for candidate in &candidates {
        match Pdfium::bind_to_library(candidate) {
            Ok(bindings) => {
                debug!("Bound pdfium from {}", candidate.display());
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => failures.push(format!("{}: {}", candidate.display(), e)),
        }
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => {
            debug!("Bound system pdfium");
            Ok(Pdfium::new(bindings))
        }
        Err(e) => {
            failures.push(format!("system library: {}", e));
            Err(ConvertError::PdfiumBindingFailed(failures.join("; ")))
        }
    }
}

// ── Documents ────────────────────────────────────────────────────────────────

/// An open PDF document. Dropping it closes the document.
pub struct PdfiumSource<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumSource<'a> {
    /// Load the PDF at `path`.
    pub fn open(pdfium: &'a Pdfium, path: &Path) -> Result<Self, ConvertError> {
        let document = pdfium.load_pdf_from_file(path, None).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                ConvertError::PasswordRequired {
                    path: path.to_path_buf(),
                }
            } else {
                ConvertError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: err_str,
                }
            }
        })?;

        info!(
            "PDF loaded: {} ({} pages)",
            path.display(),
            document.pages().len()
        );
        Ok(Self { document })
    }
}

impl PageSource for PdfiumSource<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page(&self, index: usize) -> Result<PageContent, ConvertError> {
        let page_number = index + 1;
        let fail = |e: PdfiumError| ConvertError::PageExtractionFailed {
            page: page_number,
            detail: format!("{:?}", e),
        };

        let page = self.document.pages().get(index as u16).map_err(fail)?;
        let width = page.width().value as f64;
        let height = page.height().value as f64;

        let chars = page_chars(&page, height).map_err(fail)?;
        let edges: Vec<Edge> = page
            .objects()
            .iter()
            .flat_map(|object| object_edges(&object, height))
            .collect();

        debug!(
            "Page {}: {:.0}x{:.0} pt, {} chars, {} edges",
            page_number,
            width,
            height,
            chars.len(),
            edges.len()
        );
        Ok(PageContent::new(page_number, width, height)
            .with_chars(chars)
            .with_edges(edges))
    }
}

/// Convert a pdfium rectangle (bottom-left origin) into a top-left `BBox`.
fn to_bbox(rect: &PdfRect, page_height: f64) -> BBox {
    BBox::new(
        rect.left().value as f64,
        page_height - rect.top().value as f64,
        rect.right().value as f64,
        page_height - rect.bottom().value as f64,
    )
}

/// Positioned glyphs of `page`; control characters pdfium synthesises for
/// line breaks are skipped.
fn page_chars(page: &PdfPage, page_height: f64) -> Result<Vec<TextChar>, PdfiumError> {
    let text = page.text()?;
    let mut chars = Vec::new();
    for ch in text.chars().iter() {
        let Some(c) = ch.unicode_char() else {
            continue;
        };
        if c.is_control() {
            continue;
        }
        let Ok(rect) = ch.loose_bounds() else {
            continue;
        };
        let bbox = to_bbox(&rect, page_height);
        chars.push(TextChar {
            text: c.to_string(),
            x0: bbox.x0,
            top: bbox.top,
            x1: bbox.x1,
            bottom: bbox.bottom,
            size: ch.scaled_font_size().value as f64,
        });
    }
    Ok(chars)
}

/// Ruling edges contributed by one page object; only path objects count.
fn object_edges(object: &PdfPageObject, page_height: f64) -> Vec<Edge> {
    let Some(path) = object.as_path_object() else {
        return Vec::new();
    };
    let Ok(bounds) = object.bounds() else {
        return Vec::new();
    };
    let bbox = to_bbox(&bounds.to_rect(), page_height);

    let points: Vec<PathPoint> = path
        .segments()
        .iter()
        .map(|segment| PathPoint {
            kind: match segment.segment_type() {
                PdfPathSegmentType::MoveTo => PointKind::Move,
                PdfPathSegmentType::LineTo => PointKind::Line,
                _ => PointKind::Curve,
            },
            x: segment.x().value as f64,
            y: segment.y().value as f64,
            close: segment.is_close(),
        })
        .collect();

    path_edges(&points, bbox)
}

// ── Path geometry ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointKind {
    Move,
    Line,
    Curve,
}

/// One path segment end point in the path's own coordinate space
/// (bottom-left origin, arbitrary scale).
#[derive(Debug, Clone, Copy)]
struct PathPoint {
    kind: PointKind,
    x: f64,
    y: f64,
    close: bool,
}

/// Linear map of one axis from the path's space onto the page.
#[derive(Debug, Clone, Copy)]
struct AxisMap {
    from: (f64, f64),
    to: (f64, f64),
}

impl AxisMap {
    fn apply(&self, v: f64) -> f64 {
        let span = self.from.1 - self.from.0;
        if span.abs() < f64::EPSILON {
            (self.to.0 + self.to.1) / 2.0
        } else {
            self.to.0 + (v - self.from.0) * (self.to.1 - self.to.0) / span
        }
    }
}

/// Axis-aligned edges of a path whose page-space bounds are `bbox`.
///
/// A thin path is one ruling line. Otherwise each straight, axis-aligned
/// segment becomes an edge; diagonals and curves are ignored. Segment
/// coordinates are fitted onto `bbox` so the result does not depend on the
/// path's transformation matrix.
fn path_edges(points: &[PathPoint], bbox: BBox) -> Vec<Edge> {
    let (w, h) = (bbox.width(), bbox.height());
    if w < THIN_PATH && h < THIN_PATH {
        return Vec::new();
    }
    if h < THIN_PATH {
        let y = (bbox.top + bbox.bottom) / 2.0;
        return vec![Edge::horizontal(bbox.x0, bbox.x1, y)];
    }
    if w < THIN_PATH {
        let x = (bbox.x0 + bbox.x1) / 2.0;
        return vec![Edge::vertical(x, bbox.top, bbox.bottom)];
    }
    if points.is_empty() {
        return Edge::rect_sides(&bbox).to_vec();
    }

    let min_max = |f: fn(&PathPoint) -> f64| {
        points.iter().map(f).fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
    };
    let x_map = AxisMap {
        from: min_max(|p| p.x),
        to: (bbox.x0, bbox.x1),
    };
    // Highest path y lands on the top of the box.
    let y_map = AxisMap {
        from: min_max(|p| p.y),
        to: (bbox.bottom, bbox.top),
    };
    let scale_x = (x_map.to.1 - x_map.to.0) / (x_map.from.1 - x_map.from.0).max(f64::EPSILON);
    let scale_y = (y_map.to.0 - y_map.to.1) / (y_map.from.1 - y_map.from.0).max(f64::EPSILON);

    let mut edges = Vec::new();
    let mut push_line = |a: (f64, f64), b: (f64, f64)| {
        let dx = ((b.0 - a.0) * scale_x).abs();
        let dy = ((b.1 - a.1) * scale_y).abs();
        let (ax, ay) = (x_map.apply(a.0), y_map.apply(a.1));
        let (bx, by) = (x_map.apply(b.0), y_map.apply(b.1));
        if dy < AXIS_ALIGNED_EPSILON && dx >= AXIS_ALIGNED_EPSILON {
            edges.push(Edge::horizontal(ax, bx, (ay + by) / 2.0));
        } else if dx < AXIS_ALIGNED_EPSILON && dy >= AXIS_ALIGNED_EPSILON {
            edges.push(Edge::vertical((ax + bx) / 2.0, ay, by));
        }
    };

    let mut current: Option<(f64, f64)> = None;
    let mut subpath_start: Option<(f64, f64)> = None;
    for p in points {
        let here = (p.x, p.y);
        match p.kind {
            PointKind::Move => subpath_start = Some(here),
            PointKind::Line => {
                if let Some(from) = current {
                    push_line(from, here);
                }
            }
            PointKind::Curve => {}
        }
        if subpath_start.is_none() {
            subpath_start = Some(here);
        }
        if p.close {
            if let Some(start) = subpath_start {
                push_line(here, start);
            }
        }
        current = Some(here);
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::geometry::Orientation;

    fn pt(kind: PointKind, x: f64, y: f64) -> PathPoint {
        PathPoint {
            kind,
            x,
            y,
            close: false,
        }
    }

    #[test]
    fn thin_path_is_one_rule() {
        let edges = path_edges(&[], BBox::new(10.0, 99.5, 200.0, 100.5));
        assert_eq!(edges, vec![Edge::horizontal(10.0, 200.0, 100.0)]);

        let edges = path_edges(&[], BBox::new(49.0, 0.0, 50.5, 80.0));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].orientation, Orientation::Vertical);
    }

    #[test]
    fn dot_has_no_edges() {
        assert!(path_edges(&[], BBox::new(5.0, 5.0, 6.0, 6.0)).is_empty());
    }

    #[test]
    fn closed_rectangle_gives_four_sides() {
        // Path space is twice the page scale; y grows upwards.
        let mut points = vec![
            pt(PointKind::Move, 0.0, 0.0),
            pt(PointKind::Line, 200.0, 0.0),
            pt(PointKind::Line, 200.0, 100.0),
            pt(PointKind::Line, 0.0, 100.0),
        ];
        points[3].close = true;
        let bbox = BBox::new(10.0, 20.0, 110.0, 70.0);

        let edges = path_edges(&points, bbox);
        assert_eq!(edges.len(), 4);
        assert!(edges.contains(&Edge::horizontal(10.0, 110.0, 70.0)));
        assert!(edges.contains(&Edge::horizontal(10.0, 110.0, 20.0)));
        assert!(edges.contains(&Edge::vertical(10.0, 20.0, 70.0)));
        assert!(edges.contains(&Edge::vertical(110.0, 20.0, 70.0)));
    }

    #[test]
    fn diagonals_and_curves_are_ignored() {
        let points = vec![
            pt(PointKind::Move, 0.0, 0.0),
            pt(PointKind::Line, 50.0, 50.0),
            pt(PointKind::Curve, 60.0, 10.0),
            pt(PointKind::Line, 100.0, 10.0),
        ];
        let edges = path_edges(&points, BBox::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].orientation, Orientation::Horizontal);
        assert_eq!(edges[0].x0, 60.0);
        assert_eq!(edges[0].top, 40.0);
    }

    #[test]
    fn vec_source_reports_missing_page() {
        let pages = vec![PageContent::new(1, 100.0, 100.0)];
        assert_eq!(pages.page_count(), 1);
        assert!(pages.page(0).is_ok());
        assert!(matches!(
            pages.page(3),
            Err(ConvertError::PageExtractionFailed { page: 4, .. })
        ));
    }
}
