//! Points and small geometry helpers shared by the shape algorithms

use serde::{Deserialize, Serialize};

/// A point in buffer space. Coordinates may be fractional (interpolated
/// points); they are rounded to a pixel only when a write is staged.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Nearest integer pixel, rounding half away from zero
    #[inline]
    pub fn to_pixel(self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }

    /// Linear interpolation towards `other` at parameter `t`
    #[inline]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(f64::from(x), f64::from(y))
    }
}

/// Get the bounding box (min_x, min_y, max_x, max_y)
pub fn bounds(points: &[Point]) -> Option<(f64, f64, f64, f64)> {
    if points.is_empty() {
        return None;
    }

    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;

    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Some((min_x, min_y, max_x, max_y))
}

/// Reduce a control polygon to the single point at parameter `t` by
/// repeated pairwise interpolation (De Casteljau).
///
/// `scratch` is reused between calls to avoid reallocating per sample.
pub fn de_casteljau(points: &[Point], t: f64, scratch: &mut Vec<Point>) -> Point {
    scratch.clear();
    scratch.extend_from_slice(points);

    let mut n = scratch.len();
    while n > 1 {
        for i in 0..n - 1 {
            scratch[i] = scratch[i].lerp(scratch[i + 1], t);
        }
        n -= 1;
    }

    scratch.first().copied().unwrap_or_default()
}
