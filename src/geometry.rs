//! Geometric primitives used by the content emitters.
//!
//! Coordinates and sizes are in user-space units (1/72 inch) with the origin
//! at the bottom-left of the page.

/// A 2D point in user-space units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_scribe::Point;
    ///
    /// let point = Point::new(10.0, 20.0);
    /// assert_eq!(point.x, 10.0);
    /// ```
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A bounding rectangle in user-space units.
///
/// `x`/`y` name the *top-left* corner and `h` extends downward from `y`, even
/// though the page origin is bottom-left. Every site that emits PDF corner
/// pairs documents the translation out of this convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// X coordinate of the left edge
    pub x: f32,
    /// Y coordinate of the top edge
    pub y: f32,
    /// Width of the rectangle
    pub w: f32,
    /// Height, extending downward from `y`
    pub h: f32,
}

impl Rect {
    /// Create a new rectangle from the top-left corner and dimensions.
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Compute the bounding rectangle of a set of points.
    ///
    /// The fold is seeded from the first point, so boxes of geometry that
    /// sits entirely in positive space do not spuriously include the origin.
    ///
    /// # Panics
    ///
    /// Panics if `points` is empty.
    pub fn bounds_of(points: &[Point]) -> Self {
        assert!(!points.is_empty(), "bounding box of an empty point set");
        let mut min_x = points[0].x;
        let mut max_x = points[0].x;
        let mut min_y = points[0].y;
        let mut max_y = points[0].y;
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        Self {
            x: min_x,
            y: max_y,
            w: max_x - min_x,
            h: max_y - min_y,
        }
    }

    /// The bottom edge (`y - h`, since `h` grows downward).
    pub fn bottom(&self) -> f32 {
        self.y - self.h
    }

    /// The right edge.
    pub fn right(&self) -> f32 {
        self.x + self.w
    }
}
