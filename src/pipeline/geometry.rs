//! Engine-neutral page snapshot: positioned characters and ruling edges.
//!
//! Every coordinate is in PDF points with a **top-left** origin (`top` grows
//! downwards), regardless of how the engine reports them. Keeping pdfium
//! types out of this module lets the layout and table stages run on
//! synthetic pages in tests.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl BBox {
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Whether the point lies inside, borders included.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.top && y <= self.bottom
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// One glyph on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChar {
    pub text: String,
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
    /// Font size in points.
    pub size: f64,
}

impl TextChar {
    pub fn bbox(&self) -> BBox {
        BBox::new(self.x0, self.top, self.x1, self.bottom)
    }

    /// Centre point, used to decide which table cell owns the glyph.
    pub fn center(&self) -> (f64, f64) {
        ((self.x0 + self.x1) / 2.0, (self.top + self.bottom) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A horizontal or vertical ruling segment.
///
/// Horizontal edges have `top == bottom`; vertical edges have `x0 == x1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
    pub orientation: Orientation,
}

impl Edge {
    /// Horizontal edge at `y` from `x0` to `x1` (endpoints in any order).
    pub fn horizontal(x0: f64, x1: f64, y: f64) -> Self {
        Self {
            x0: x0.min(x1),
            top: y,
            x1: x0.max(x1),
            bottom: y,
            orientation: Orientation::Horizontal,
        }
    }

    /// Vertical edge at `x` from `top` to `bottom` (endpoints in any order).
    pub fn vertical(x: f64, top: f64, bottom: f64) -> Self {
        Self {
            x0: x,
            top: top.min(bottom),
            x1: x,
            bottom: top.max(bottom),
            orientation: Orientation::Vertical,
        }
    }

    pub fn length(&self) -> f64 {
        match self.orientation {
            Orientation::Horizontal => self.x1 - self.x0,
            Orientation::Vertical => self.bottom - self.top,
        }
    }

    /// The four sides of a rectangle.
    pub fn rect_sides(rect: &BBox) -> [Edge; 4] {
        [
            Edge::horizontal(rect.x0, rect.x1, rect.top),
            Edge::horizontal(rect.x0, rect.x1, rect.bottom),
            Edge::vertical(rect.x0, rect.top, rect.bottom),
            Edge::vertical(rect.x1, rect.top, rect.bottom),
        ]
    }
}

/// Everything the extraction stages need to know about one page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageContent {
    /// 1-indexed page number.
    pub page_number: usize,
    pub width: f64,
    pub height: f64,
    pub chars: Vec<TextChar>,
    pub edges: Vec<Edge>,
}

impl PageContent {
    pub fn new(page_number: usize, width: f64, height: f64) -> Self {
        Self {
            page_number,
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_chars(mut self, chars: Vec<TextChar>) -> Self {
        self.chars = chars;
        self
    }

    pub fn with_edges(mut self, edges: Vec<Edge>) -> Self {
        self.edges = edges;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_normalise_endpoint_order() {
        let h = Edge::horizontal(50.0, 10.0, 5.0);
        assert_eq!((h.x0, h.x1), (10.0, 50.0));
        assert_eq!(h.length(), 40.0);

        let v = Edge::vertical(3.0, 90.0, 30.0);
        assert_eq!((v.top, v.bottom), (30.0, 90.0));
        assert_eq!(v.length(), 60.0);
    }

    #[test]
    fn rect_sides_cover_all_four_borders() {
        let sides = Edge::rect_sides(&BBox::new(0.0, 0.0, 10.0, 20.0));
        let h = sides
            .iter()
            .filter(|e| e.orientation == Orientation::Horizontal)
            .count();
        assert_eq!(h, 2);
        assert!(sides.iter().any(|e| e.x0 == 10.0 && e.length() == 20.0));
    }

    #[test]
    fn bbox_union_and_containment() {
        let a = BBox::new(0.0, 0.0, 5.0, 5.0);
        let b = BBox::new(3.0, 4.0, 9.0, 6.0);
        let u = a.union(&b);
        assert_eq!(u, BBox::new(0.0, 0.0, 9.0, 6.0));
        assert!(u.contains_point(9.0, 6.0));
        assert!(!a.contains_point(5.1, 1.0));
    }
}
