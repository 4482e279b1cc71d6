// THEORY:
// `BoundingBox` is the currency passed between every stage after the masks:
// region boxes, inflated candidates, cluster boxes and final detections are all
// axis-aligned rectangles in pixel units. The box is half-open: it covers
// columns `x..x + width` and rows `y..y + height`, so two boxes that merely
// touch along an edge do not intersect.
//
// Coordinates are signed. Candidate inflation can push a box past the frame
// edge before it is clamped back, and keeping that intermediate state
// representable is simpler than saturating at every step.

use serde::{Deserialize, Serialize};

/// A pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle; `width` or `height` <= 0 means the box is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box covering every point. Each point covers one pixel, so a
    /// single point yields a 1x1 box.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for point in &points[1..] {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn area(&self) -> i64 {
        if self.is_empty() {
            return 0;
        }
        self.width as i64 * self.height as i64
    }

    /// Height divided by width. `None` for an empty box, so callers treat a
    /// degenerate box as failing any ratio test.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.height as f64 / self.width as f64)
    }

    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        let overlap = BoundingBox::new(x0, y0, x1 - x0, y1 - y0);
        (!overlap.is_empty()).then_some(overlap)
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.intersection(other).is_some()
    }

    /// Minimal box enclosing both. An empty operand contributes nothing.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        BoundingBox::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Shrinks the box from whichever edges fall outside `[0, width) x [0, height)`.
    /// A box lying entirely outside collapses to zero size instead of going negative.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> BoundingBox {
        let frame_width = frame_width.min(i32::MAX as u32) as i32;
        let frame_height = frame_height.min(i32::MAX as u32) as i32;

        let x0 = self.x.clamp(0, frame_width);
        let y0 = self.y.clamp(0, frame_height);
        let x1 = self.right().clamp(0, frame_width);
        let y1 = self.bottom().clamp(0, frame_height);
        BoundingBox::new(x0, y0, (x1 - x0).max(0), (y1 - y0).max(0))
    }

    pub fn translate(&self, dx: i32, dy: i32) -> BoundingBox {
        BoundingBox::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// True when the box is non-empty and lies inside `[0, width) x [0, height)`.
    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        !self.is_empty()
            && self.x >= 0
            && self.y >= 0
            && self.right() as i64 <= frame_width as i64
            && self.bottom() as i64 <= frame_height as i64
    }
}
