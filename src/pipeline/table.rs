//! Lattice table detection.
//!
//! A table is found the way a person reading a ruled form finds one: look
//! for the grid lines, see where they cross, and take every smallest box
//! closed on all four sides as a cell.
//!
//! ## Stages
//!
//! 1. **Edges.** Per axis, either the ruling lines drawn on the page
//!    ([`EdgeStrategy::Lines`]) or edges synthesised from word alignment
//!    ([`EdgeStrategy::Text`]).
//! 2. **Merge.** Short edges are dropped, parallel edges within the snap
//!    tolerance move to their mean position, collinear edges within the join
//!    tolerance fuse, and short edges are dropped again.
//! 3. **Intersections.** Every vertical/horizontal pair that crosses within
//!    the intersection tolerance.
//! 4. **Cells.** From each intersection, the nearest intersection below and
//!    to the right that closes a rectangle along existing edges.
//! 5. **Tables.** Cells sharing a corner belong to the same table; lone
//!    cells are frames, not tables, and are dropped.
//!
//! Snapping gives every edge of a cluster the exact same coordinate, so
//! intersection points can be compared with `==` afterwards.

use crate::config::{EdgeStrategy, TableSettings};
use crate::pipeline::geometry::{BBox, Edge, Orientation, PageContent, TextChar};
use crate::pipeline::layout::{cluster_by, extract_text, extract_words, Word};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Edges shorter than this never take part, whatever the settings say.
const EDGE_MIN_LENGTH_PREFILTER: f64 = 1.0;

/// Clustering tolerance used when aligning words for the text strategy.
const WORD_ALIGN_TOLERANCE: f64 = 1.0;

/// A detected table: a set of rectangular cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub cells: Vec<BBox>,
}

impl Table {
    /// Bounding box of all cells.
    pub fn bbox(&self) -> BBox {
        let first = self.cells.first().copied().unwrap_or(BBox::new(0.0, 0.0, 0.0, 0.0));
        self.cells.iter().fold(first, |acc, c| acc.union(c))
    }

    /// Cells grouped into rows by their `top`, one slot per distinct column
    /// `x0` of the table. Slots not covered by a cell starting there are `None`.
    pub fn row_cells(&self) -> Vec<Vec<Option<BBox>>> {
        let xs = sorted_unique(self.cells.iter().map(|c| c.x0));

        let mut sorted = self.cells.clone();
        sorted.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

        let mut rows: Vec<Vec<Option<BBox>>> = Vec::new();
        let mut current_top: Option<f64> = None;
        let mut by_x: HashMap<u64, BBox> = HashMap::new();
        for cell in sorted {
            if current_top.is_some_and(|top| top != cell.top) {
                rows.push(xs.iter().map(|x| by_x.get(&x.to_bits()).copied()).collect());
                by_x.clear();
            }
            current_top = Some(cell.top);
            by_x.insert(cell.x0.to_bits(), cell);
        }
        if current_top.is_some() {
            rows.push(xs.iter().map(|x| by_x.get(&x.to_bits()).copied()).collect());
        }
        rows
    }

    /// Text of every row slot.
    ///
    /// A cell's text is the layout text of its [`cell_chars`], so a cell
    /// without characters yields `Some("")` while a missing slot stays `None`.
    pub fn rows(&self, chars: &[TextChar], x_tolerance: f64, y_tolerance: f64) -> Vec<Vec<Option<String>>> {
        self.row_cells()
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|slot| {
                        slot.map(|cell| {
                            extract_text(&cell_chars(&cell, chars), x_tolerance, y_tolerance)
                        })
                    })
                    .collect()
            })
            .collect()
    }

    /// Distinct vertical grid lines (cell left and right borders), left to right.
    pub fn column_boundaries(&self) -> Vec<f64> {
        sorted_unique(self.cells.iter().flat_map(|c| [c.x0, c.x1]))
    }

    /// Distinct horizontal grid lines (cell top and bottom borders), top to bottom.
    pub fn row_boundaries(&self) -> Vec<f64> {
        sorted_unique(self.cells.iter().flat_map(|c| [c.top, c.bottom]))
    }
}

/// Characters whose centre lies inside `cell` (left/top borders inclusive,
/// right/bottom exclusive).
pub fn cell_chars(cell: &BBox, chars: &[TextChar]) -> Vec<TextChar> {
    chars
        .iter()
        .filter(|c| {
            let (h_mid, v_mid) = c.center();
            h_mid >= cell.x0 && h_mid < cell.x1 && v_mid >= cell.top && v_mid < cell.bottom
        })
        .cloned()
        .collect()
}

fn sorted_unique(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = values.collect();
    v.sort_by(f64::total_cmp);
    v.dedup();
    v
}

/// Find every table on `page`, ordered top to bottom then left to right.
pub fn find_tables(page: &PageContent, settings: &TableSettings) -> Vec<Table> {
    let edges = table_edges(page, settings);
    let intersections = find_intersections(&edges, settings.intersection_tolerance);
    let cells = intersections_to_cells(&intersections);
    let tables = cells_to_tables(cells);
    debug!(
        "Page {}: {} edges, {} intersections, {} tables",
        page.page_number,
        edges.len(),
        intersections.points.len(),
        tables.len()
    );
    tables
}

// ── Stage 1: edge collection ─────────────────────────────────────────────────

/// Candidate edges for `page` after merging and length filtering.
pub fn table_edges(page: &PageContent, settings: &TableSettings) -> Vec<Edge> {
    let words = if settings.vertical_strategy == EdgeStrategy::Text
        || settings.horizontal_strategy == EdgeStrategy::Text
    {
        extract_words(&page.chars, settings.text_x_tolerance, settings.text_y_tolerance)
    } else {
        Vec::new()
    };

    let mut edges: Vec<Edge> = match settings.vertical_strategy {
        EdgeStrategy::Lines => page
            .edges
            .iter()
            .filter(|e| e.orientation == Orientation::Vertical)
            .copied()
            .collect(),
        EdgeStrategy::Text => words_to_edges_v(&words, settings.min_words_vertical),
    };
    match settings.horizontal_strategy {
        EdgeStrategy::Lines => edges.extend(
            page.edges
                .iter()
                .filter(|e| e.orientation == Orientation::Horizontal)
                .copied(),
        ),
        EdgeStrategy::Text => edges.extend(words_to_edges_h(&words, settings.min_words_horizontal)),
    }

    edges.retain(|e| e.length() >= EDGE_MIN_LENGTH_PREFILTER);
    let merged = merge_edges(edges, settings.snap_tolerance, settings.join_tolerance);
    merged
        .into_iter()
        .filter(|e| e.length() >= settings.edge_min_length)
        .collect()
}

fn words_bbox(words: &[&Word]) -> Option<BBox> {
    let first = words.first()?.bbox;
    Some(words.iter().fold(first, |acc, w| acc.union(&w.bbox)))
}

/// One horizontal edge above and one below each line of words, spanning the
/// whole text block.
fn words_to_edges_h(words: &[Word], min_words: usize) -> Vec<Edge> {
    let rows = cluster_by(words.iter().collect::<Vec<_>>(), |w| w.bbox.top, WORD_ALIGN_TOLERANCE);
    let rects: Vec<BBox> = rows
        .iter()
        .filter(|row| row.len() >= min_words)
        .filter_map(|row| words_bbox(row))
        .collect();
    if rects.is_empty() {
        return Vec::new();
    }

    let min_x0 = rects.iter().map(|r| r.x0).fold(f64::INFINITY, f64::min);
    let max_x1 = rects.iter().map(|r| r.x1).fold(f64::NEG_INFINITY, f64::max);
    rects
        .iter()
        .flat_map(|r| {
            [
                Edge::horizontal(min_x0, max_x1, r.top),
                Edge::horizontal(min_x0, max_x1, r.bottom),
            ]
        })
        .collect()
}

fn bboxes_overlap(a: &BBox, b: &BBox) -> bool {
    let w = a.x1.min(b.x1) - a.x0.max(b.x0);
    let h = a.bottom.min(b.bottom) - a.top.max(b.top);
    w >= 0.0 && h >= 0.0 && w + h > 0.0
}

/// Vertical edges at the left of every column of words aligned on their left
/// edge, right edge or centre, plus one closing edge on the right.
fn words_to_edges_v(words: &[Word], min_words: usize) -> Vec<Edge> {
    let refs = || words.iter().collect::<Vec<_>>();
    let mut clusters = cluster_by(refs(), |w| w.bbox.x0, WORD_ALIGN_TOLERANCE);
    clusters.extend(cluster_by(refs(), |w| w.bbox.x1, WORD_ALIGN_TOLERANCE));
    clusters.extend(cluster_by(
        refs(),
        |w| (w.bbox.x0 + w.bbox.x1) / 2.0,
        WORD_ALIGN_TOLERANCE,
    ));
    // Largest clusters claim their area first.
    clusters.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut condensed: Vec<BBox> = Vec::new();
    for bbox in clusters
        .iter()
        .filter(|c| c.len() >= min_words)
        .filter_map(|c| words_bbox(c))
    {
        if !condensed.iter().any(|c| bboxes_overlap(&bbox, c)) {
            condensed.push(bbox);
        }
    }
    if condensed.is_empty() {
        return Vec::new();
    }

    condensed.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    let max_x1 = condensed.iter().map(|r| r.x1).fold(f64::NEG_INFINITY, f64::max);
    let min_top = condensed.iter().map(|r| r.top).fold(f64::INFINITY, f64::min);
    let max_bottom = condensed.iter().map(|r| r.bottom).fold(f64::NEG_INFINITY, f64::max);

    condensed
        .iter()
        .map(|r| Edge::vertical(r.x0, min_top, max_bottom))
        .chain(std::iter::once(Edge::vertical(max_x1, min_top, max_bottom)))
        .collect()
}

// ── Stage 2: snapping and joining ────────────────────────────────────────────

/// Snap parallel edges onto shared positions, then join collinear pieces.
pub fn merge_edges(edges: Vec<Edge>, snap_tolerance: f64, join_tolerance: f64) -> Vec<Edge> {
    let (horizontal, vertical): (Vec<Edge>, Vec<Edge>) = edges
        .into_iter()
        .partition(|e| e.orientation == Orientation::Horizontal);

    let mut merged = Vec::new();
    for group in snap(horizontal, Orientation::Horizontal, snap_tolerance) {
        merged.extend(join_collinear(group, Orientation::Horizontal, join_tolerance));
    }
    for group in snap(vertical, Orientation::Vertical, snap_tolerance) {
        merged.extend(join_collinear(group, Orientation::Vertical, join_tolerance));
    }
    merged
}

fn position(e: &Edge, orientation: Orientation) -> f64 {
    match orientation {
        Orientation::Horizontal => e.top,
        Orientation::Vertical => e.x0,
    }
}

/// Cluster edges by position; each cluster moves to its mean position.
fn snap(edges: Vec<Edge>, orientation: Orientation, tolerance: f64) -> Vec<Vec<Edge>> {
    cluster_by(edges, |e| position(e, orientation), tolerance)
        .into_iter()
        .map(|mut cluster| {
            let mean =
                cluster.iter().map(|e| position(e, orientation)).sum::<f64>() / cluster.len() as f64;
            for e in &mut cluster {
                match orientation {
                    Orientation::Horizontal => {
                        e.top = mean;
                        e.bottom = mean;
                    }
                    Orientation::Vertical => {
                        e.x0 = mean;
                        e.x1 = mean;
                    }
                }
            }
            cluster
        })
        .collect()
}

/// Fuse edges on one line whose gaps are at most `tolerance`.
fn join_collinear(mut edges: Vec<Edge>, orientation: Orientation, tolerance: f64) -> Vec<Edge> {
    let span = |e: &Edge| match orientation {
        Orientation::Horizontal => (e.x0, e.x1),
        Orientation::Vertical => (e.top, e.bottom),
    };
    edges.sort_by(|a, b| span(a).0.total_cmp(&span(b).0));

    let mut joined: Vec<Edge> = Vec::with_capacity(edges.len());
    for e in edges {
        let (start, end) = span(&e);
        match joined.last_mut() {
            Some(last) if start <= span(last).1 + tolerance => match orientation {
                Orientation::Horizontal => last.x1 = last.x1.max(end),
                Orientation::Vertical => last.bottom = last.bottom.max(end),
            },
            _ => joined.push(e),
        }
    }
    joined
}

// ── Stage 3: intersections ───────────────────────────────────────────────────

type PointKey = (u64, u64);

fn key(x: f64, y: f64) -> PointKey {
    (x.to_bits(), y.to_bits())
}

/// Crossing points and the edges meeting at each of them.
#[derive(Debug, Default)]
struct Intersections {
    /// Points sorted by x, then y.
    points: Vec<(f64, f64)>,
    /// Indices of the vertical edges through each point.
    vertical: HashMap<PointKey, HashSet<usize>>,
    /// Indices of the horizontal edges through each point.
    horizontal: HashMap<PointKey, HashSet<usize>>,
}

impl Intersections {
    fn contains(&self, x: f64, y: f64) -> bool {
        self.vertical.contains_key(&key(x, y))
    }

    /// Whether two points on a common line are linked by a single edge.
    fn connected(&self, a: (f64, f64), b: (f64, f64)) -> bool {
        let shares = |map: &HashMap<PointKey, HashSet<usize>>| {
            match (map.get(&key(a.0, a.1)), map.get(&key(b.0, b.1))) {
                (Some(ea), Some(eb)) => !ea.is_disjoint(eb),
                _ => false,
            }
        };
        if a.0 == b.0 {
            shares(&self.vertical)
        } else if a.1 == b.1 {
            shares(&self.horizontal)
        } else {
            false
        }
    }
}

fn find_intersections(edges: &[Edge], tolerance: f64) -> Intersections {
    let mut out = Intersections::default();
    for (vi, v) in edges.iter().enumerate() {
        if v.orientation != Orientation::Vertical {
            continue;
        }
        for (hi, h) in edges.iter().enumerate() {
            if h.orientation != Orientation::Horizontal {
                continue;
            }
            let crosses = v.top <= h.top + tolerance
                && v.bottom >= h.top - tolerance
                && v.x0 >= h.x0 - tolerance
                && v.x0 <= h.x1 + tolerance;
            if !crosses {
                continue;
            }
            let k = key(v.x0, h.top);
            if !out.vertical.contains_key(&k) {
                out.points.push((v.x0, h.top));
            }
            out.vertical.entry(k).or_default().insert(vi);
            out.horizontal.entry(k).or_default().insert(hi);
        }
    }
    out.points
        .sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    out
}

// ── Stage 4: cells ───────────────────────────────────────────────────────────

fn intersections_to_cells(ix: &Intersections) -> Vec<BBox> {
    let points = &ix.points;
    let mut cells = Vec::new();

    for (i, &pt) in points.iter().enumerate() {
        let rest = &points[i + 1..];
        let below: Vec<(f64, f64)> = rest.iter().copied().filter(|p| p.0 == pt.0).collect();
        let right: Vec<(f64, f64)> = rest.iter().copied().filter(|p| p.1 == pt.1).collect();

        'search: for &b in &below {
            if !ix.connected(pt, b) {
                continue;
            }
            for &r in &right {
                if !ix.connected(pt, r) {
                    continue;
                }
                let corner = (r.0, b.1);
                if ix.contains(corner.0, corner.1)
                    && ix.connected(corner, r)
                    && ix.connected(corner, b)
                {
                    cells.push(BBox::new(pt.0, pt.1, corner.0, corner.1));
                    break 'search;
                }
            }
        }
    }
    cells
}

// ── Stage 5: tables ──────────────────────────────────────────────────────────

fn corners(c: &BBox) -> [PointKey; 4] {
    [
        key(c.x0, c.top),
        key(c.x0, c.bottom),
        key(c.x1, c.top),
        key(c.x1, c.bottom),
    ]
}

fn cells_to_tables(cells: Vec<BBox>) -> Vec<Table> {
    let mut remaining = cells;
    let mut groups: Vec<Vec<BBox>> = Vec::new();

    while let Some(seed) = remaining.pop() {
        let mut group = vec![seed];
        let mut seen: HashSet<PointKey> = corners(&seed).into_iter().collect();
        loop {
            let before = group.len();
            let mut i = 0;
            while i < remaining.len() {
                if corners(&remaining[i]).iter().any(|k| seen.contains(k)) {
                    let cell = remaining.swap_remove(i);
                    seen.extend(corners(&cell));
                    group.push(cell);
                } else {
                    i += 1;
                }
            }
            if group.len() == before {
                break;
            }
        }
        groups.push(group);
    }

    let mut tables: Vec<Table> = groups
        .into_iter()
        .filter(|g| g.len() > 1)
        .map(|cells| Table { cells })
        .collect();
    tables.sort_by(|a, b| {
        let ka = a.bbox();
        let kb = b.bbox();
        ka.top.total_cmp(&kb.top).then(ka.x0.total_cmp(&kb.x0))
    });
    tables
}
