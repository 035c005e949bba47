//! Geometric primitives for page-coordinate reasoning.
//!
//! Coordinates use a top-left origin with y growing downwards, the convention
//! page-layout engines report blocks in.

use serde::{Deserialize, Serialize};

/// A rectangle in page space.
///
/// Serialized as `[x0, y0, x1, y1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Rect {
    /// X coordinate of top-left corner
    pub x: f32,
    /// Y coordinate of top-left corner
    pub y: f32,
    /// Width of rectangle
    pub width: f32,
    /// Height of rectangle
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle from position and dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use filing_extract::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
    /// assert_eq!(rect.width, 100.0);
    /// assert_eq!(rect.height, 50.0);
    /// ```
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from two corner points.
    ///
    /// # Examples
    ///
    /// ```
    /// use filing_extract::geometry::Rect;
    ///
    /// let rect = Rect::from_points(10.0, 20.0, 110.0, 70.0);
    /// assert_eq!(rect.x, 10.0);
    /// assert_eq!(rect.width, 100.0);
    /// assert_eq!(rect.height, 50.0);
    /// ```
    pub fn from_points(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    /// Get the left edge x-coordinate.
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Get the top edge y-coordinate.
    pub fn top(&self) -> f32 {
        self.y
    }

    /// Get the bottom edge y-coordinate.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Compute the union of this rectangle with another.
    ///
    /// # Examples
    ///
    /// ```
    /// use filing_extract::geometry::Rect;
    ///
    /// let r1 = Rect::new(0.0, 0.0, 50.0, 50.0);
    /// let r2 = Rect::new(25.0, 25.0, 50.0, 50.0);
    /// let union = r1.union(&r2);
    ///
    /// assert_eq!(union.right(), 75.0);
    /// assert_eq!(union.bottom(), 75.0);
    /// ```
    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.left().min(other.left());
        let y0 = self.top().min(other.top());
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Rect::from_points(x0, y0, x1, y1)
    }

    /// Corners as `[x0, y0, x1, y1]`.
    pub fn to_array(&self) -> [f32; 4] {
        [self.left(), self.top(), self.right(), self.bottom()]
    }

    /// Position of this rectangle as percentages of the page, clamped to `[0, 100]`.
    ///
    /// Returns `[x_start, y_start, x_end, y_end]`. A degenerate page size yields zeros.
    ///
    /// # Examples
    ///
    /// ```
    /// use filing_extract::geometry::Rect;
    ///
    /// let rect = Rect::from_points(50.0, 100.0, 700.0, 200.0);
    /// let pct = rect.page_percentages(500.0, 1000.0);
    /// assert_eq!(pct, [10.0, 10.0, 100.0, 20.0]);
    /// ```
    pub fn page_percentages(&self, page_width: f32, page_height: f32) -> [f32; 4] {
        let ratio = |value: f32, extent: f32| {
            if extent <= 0.0 || !value.is_finite() {
                0.0
            } else {
                (value / extent * 100.0).clamp(0.0, 100.0)
            }
        };
        [
            ratio(self.left(), page_width),
            ratio(self.top(), page_height),
            ratio(self.right(), page_width),
            ratio(self.bottom(), page_height),
        ]
    }
}

impl From<[f32; 4]> for Rect {
    fn from(c: [f32; 4]) -> Self {
        Rect::from_points(c[0], c[1], c[2], c[3])
    }
}

impl From<Rect> for [f32; 4] {
    fn from(r: Rect) -> Self {
        r.to_array()
    }
}
