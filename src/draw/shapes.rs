//! Shape rasterizers
//!
//! Every shape stages pixels through the engine and flushes once, via the
//! deferred scope it opens. Composite shapes call other shapes inside that
//! scope so the nested flushes are suppressed.

use log::warn;

use super::DrawEngine;
use crate::color::Color;
use crate::error::{Error, Result};
use crate::geometry::{bounds, de_casteljau, Point};

/// Paths and curves need at least two points
fn require_points(points: &[Point], what: &str) -> Result<()> {
    if points.len() < 2 {
        return Err(Error::InvalidInput(format!(
            "{} needs at least 2 points, got {}",
            what,
            points.len()
        )));
    }
    Ok(())
}

/// X range covered by edge `a`-`b` on scanline `y`.
/// Horizontal edges cover their whole extent.
#[inline]
fn edge_span(a: Point, b: Point, y: f64) -> (f64, f64) {
    let dy = b.y - a.y;
    if dy.abs() < f64::EPSILON {
        return (a.x.min(b.x), a.x.max(b.x));
    }
    let x = a.x + (y - a.y) * (b.x - a.x) / dy;
    (x, x)
}

/// Upper bound on samples per curve; finer steps are coarsened to this
const MAX_CURVE_SAMPLES: u64 = 1 << 16;

/// Liang-Barsky clip of segment `a`-`b` to the box `[min, max]` on both axes.
/// Endpoints already inside are returned untouched. `None` when the segment
/// misses the box entirely.
fn clip_segment(a: Point, b: Point, min: Point, max: Point) -> Option<(Point, Point)> {
    if ![a.x, a.y, b.x, b.y].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    for (p, q) in [
        (-dx, a.x - min.x),
        (dx, max.x - a.x),
        (-dy, a.y - min.y),
        (dy, max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let start = if t0 > 0.0 { a.lerp(b, t0) } else { a };
    let end = if t1 < 1.0 { a.lerp(b, t1) } else { b };
    Some((start, end))
}

/// Default curve step: one sample per pixel of the larger bounding-box span
fn default_curve_step(points: &[Point]) -> f64 {
    let span = bounds(points).map_or(0.0, |(min_x, min_y, max_x, max_y)| {
        (max_x - min_x).max(max_y - min_y)
    });
    if span > 0.0 {
        (1.0 / span).min(1.0)
    } else {
        warn!("curve control points coincide, sampling only the endpoint");
        1.0
    }
}

impl DrawEngine<'_> {
    /// Draw a single pixel
    pub fn point(&mut self, point: Point, color: Color) {
        let mut scope = self.defer();
        scope.stage(point, color);
    }

    /// Bresenham line, both endpoints inclusive.
    ///
    /// With a line thickness above 1, every step stamps a filled circle of
    /// that diameter instead of a single pixel.
    ///
    /// Segments are clipped to the buffer, grown by the stamp radius, before
    /// stepping, so far off-screen endpoints cost nothing.
    pub fn line(&mut self, start: Point, end: Point, color: Color) {
        let stamp = (self.line_thickness > 1.0).then(|| (self.line_thickness / 2.0).floor() as u32);

        let margin = f64::from(stamp.unwrap_or(0)) + 1.0;
        let min = Point::new(-margin, -margin);
        let max = Point::new(
            f64::from(self.buffer.width()) - 1.0 + margin,
            f64::from(self.buffer.height()) - 1.0 + margin,
        );
        let Some((start, end)) = clip_segment(start, end, min, max) else {
            return;
        };

        let (x0, y0) = start.to_pixel();
        let (x1, y1) = end.to_pixel();

        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx - dy;

        let mut scope = self.defer();
        let (mut x, mut y) = (x0, y0);
        loop {
            match stamp {
                Some(radius) => {
                    scope.fill_circle(Point::new(x as f64, y as f64), radius, color);
                },
                None => scope.stage_at(x, y, color),
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Rectangle outline between two opposite corners (inclusive)
    pub fn rect(&mut self, a: Point, b: Point, color: Color) {
        let (ax, ay) = a.to_pixel();
        let (bx, by) = b.to_pixel();
        let (min_x, max_x) = (ax.min(bx), ax.max(bx));
        let (min_y, max_y) = (ay.min(by), ay.max(by));
        let rows = min_y.max(0)..=max_y.min(i64::from(self.buffer.height()) - 1);

        let mut scope = self.defer();
        scope.stage_span(min_x, max_x, min_y, color);
        scope.stage_span(min_x, max_x, max_y, color);
        for y in rows {
            scope.stage_at(min_x, y, color);
            scope.stage_at(max_x, y, color);
        }
    }

    /// Filled rectangle between two opposite corners (inclusive)
    pub fn fill_rect(&mut self, a: Point, b: Point, color: Color) {
        let (ax, ay) = a.to_pixel();
        let (bx, by) = b.to_pixel();
        let min_y = ay.min(by).max(0);
        let max_y = ay.max(by).min(i64::from(self.buffer.height()) - 1);

        let mut scope = self.defer();
        for y in min_y..=max_y {
            scope.stage_span(ax, bx, y, color);
        }
    }

    /// Pixel center of a circle that can touch the buffer. Far off-screen
    /// circles yield `None`, which also keeps `c ± r` within range.
    fn circle_center(&self, center: Point, radius: u32) -> Option<(i64, i64)> {
        let (cx, cy) = center.to_pixel();
        let r = i64::from(radius);
        let w = i64::from(self.buffer.width());
        let h = i64::from(self.buffer.height());
        if cx < -r || cy < -r || cx > w - 1 + r || cy > h - 1 + r {
            return None;
        }
        Some((cx, cy))
    }

    /// Circle outline (Bresenham midpoint, 8-way symmetry)
    pub fn circle(&mut self, center: Point, radius: u32, color: Color) {
        let Some((cx, cy)) = self.circle_center(center, radius) else {
            return;
        };
        let mut x = 0i64;
        let mut y = i64::from(radius);
        let mut d = 3 - 2 * y;

        let mut scope = self.defer();
        while y >= x {
            scope.stage_at(cx + x, cy + y, color);
            scope.stage_at(cx - x, cy + y, color);
            scope.stage_at(cx + x, cy - y, color);
            scope.stage_at(cx - x, cy - y, color);
            scope.stage_at(cx + y, cy + x, color);
            scope.stage_at(cx - y, cy + x, color);
            scope.stage_at(cx + y, cy - x, color);
            scope.stage_at(cx - y, cy - x, color);

            x += 1;
            if d > 0 {
                y -= 1;
                d += 4 * (x - y) + 10;
            } else {
                d += 4 * x + 6;
            }
        }
    }

    /// Filled circle: same stepping as [`circle`](Self::circle), staging the
    /// horizontal spans between symmetric points instead of the points
    pub fn fill_circle(&mut self, center: Point, radius: u32, color: Color) {
        let Some((cx, cy)) = self.circle_center(center, radius) else {
            return;
        };
        let mut x = 0i64;
        let mut y = i64::from(radius);
        let mut d = 3 - 2 * y;

        let mut scope = self.defer();
        while y >= x {
            scope.stage_span(cx - x, cx + x, cy + y, color);
            scope.stage_span(cx - x, cx + x, cy - y, color);
            scope.stage_span(cx - y, cx + y, cy + x, color);
            scope.stage_span(cx - y, cx + y, cy - x, color);

            x += 1;
            if d > 0 {
                y -= 1;
                d += 4 * (x - y) + 10;
            } else {
                d += 4 * x + 6;
            }
        }
    }

    /// Filled triangle by scanline. Vertices may come in any order; they are
    /// sorted by y first.
    pub fn triangle(&mut self, a: Point, b: Point, c: Point, color: Color) {
        let mut v = [a, b, c];
        v.sort_by(|p, q| p.y.total_cmp(&q.y));
        let [top, mid, bottom] = v;

        // rows outside the buffer would be dropped anyway
        let y_start = (top.y.round() as i64).max(0);
        let y_end = (bottom.y.round() as i64).min(i64::from(self.buffer.height()) - 1);

        let mut scope = self.defer();
        for y in y_start..=y_end {
            let yf = (y as f64).clamp(top.y, bottom.y);
            let (long_lo, long_hi) = edge_span(top, bottom, yf);
            let (short_lo, short_hi) = if yf < mid.y {
                edge_span(top, mid, yf)
            } else {
                edge_span(mid, bottom, yf)
            };
            let lo = long_lo.min(short_lo).round() as i64;
            let hi = long_hi.max(short_hi).round() as i64;
            scope.stage_span(lo, hi, y, color);
        }
    }

    /// Open polyline through `points`. Shared vertices are blended once.
    pub fn path(&mut self, points: &[Point], color: Color) -> Result<()> {
        require_points(points, "path")?;

        let mut scope = self.defer();
        for seg in points.windows(2) {
            scope.line(seg[0], seg[1], color);
        }
        Ok(())
    }

    /// Filled polygon. The path is treated as closed; the interior is filled
    /// with the even-odd scanline rule sampled at pixel centers, and the
    /// outline is staged in the same batch.
    pub fn fill_path(&mut self, points: &[Point], color: Color) -> Result<()> {
        require_points(points, "fill_path")?;

        let Some((_, min_y, _, max_y)) = bounds(points) else {
            return Ok(());
        };
        let min_y = (min_y.floor() as i64).max(0);
        let max_y = (max_y.ceil() as i64).min(i64::from(self.buffer.height()) - 1);

        let mut scope = self.defer();

        // Preallocate intersection buffer (reused per scanline)
        let mut intersections: Vec<f64> = Vec::with_capacity(points.len());
        let n = points.len();

        for y in min_y..=max_y {
            intersections.clear();
            let yf = y as f64 + 0.5;

            for i in 0..n {
                let p1 = points[i];
                let p2 = points[(i + 1) % n];

                if (p1.y <= yf && p2.y > yf) || (p2.y <= yf && p1.y > yf) {
                    intersections.push(p1.x + (yf - p1.y) / (p2.y - p1.y) * (p2.x - p1.x));
                }
            }

            intersections.sort_unstable_by(f64::total_cmp);
            for pair in intersections.chunks_exact(2) {
                scope.stage_span(pair[0].round() as i64, pair[1].round() as i64, y, color);
            }
        }

        for i in 0..n {
            scope.line(points[i], points[(i + 1) % n], color);
        }
        Ok(())
    }

    /// Bezier curve through the control polygon `points`, sampled with the
    /// default step (about one sample per pixel of the larger bbox span)
    pub fn bezier(&mut self, points: &[Point], color: Color) -> Result<()> {
        require_points(points, "bezier")?;
        self.bezier_with_step(points, default_curve_step(points), color)
    }

    /// Bezier curve sampled every `step` in t, joined with line segments.
    /// t = 1 is always sampled. Steps finer than `1 / MAX_CURVE_SAMPLES`
    /// are coarsened to it.
    pub fn bezier_with_step(&mut self, points: &[Point], step: f64, color: Color) -> Result<()> {
        require_points(points, "bezier")?;
        if !step.is_finite() || step <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "curve step must be positive, got {}",
                step
            )));
        }

        let min_step = 1.0 / MAX_CURVE_SAMPLES as f64;
        let step = if step < min_step {
            warn!("curve step {} too fine, using {}", step, min_step);
            min_step
        } else {
            step
        };
        let samples = (1.0 / step).ceil() as u64;

        let mut scratch = Vec::with_capacity(points.len());
        let mut scope = self.defer();

        let mut prev = points[0];
        for i in 1..samples {
            let p = de_casteljau(points, i as f64 * step, &mut scratch);
            scope.line(prev, p, color);
            prev = p;
        }
        let last = de_casteljau(points, 1.0, &mut scratch);
        scope.line(prev, last, color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::color::Color;
    use crate::display::PixelBuffer;
    use crate::draw::DrawEngine;
    use crate::error::Error;
    use crate::geometry::Point;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn buf(w: u32, h: u32) -> PixelBuffer {
        PixelBuffer::new(w, h).unwrap()
    }

    /// Coordinates of every pixel whose color differs from `bg`
    fn painted(b: &PixelBuffer, bg: Color) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        for y in 0..b.height() {
            for x in 0..b.width() {
                if b.get(p(f64::from(x), f64::from(y))) != bg {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn test_diagonal_line_scenario() {
        let mut b = buf(10, 10);
        b.fill("#000000".parse().unwrap());
        let mut engine = DrawEngine::new(&mut b);
        engine.line(p(0.0, 0.0), p(9.0, 9.0), "#FFFFFF".parse().unwrap());

        let expected: Vec<(u32, u32)> = (0..10).map(|i| (i, i)).collect();
        assert_eq!(painted(engine.buffer(), Color::BLACK), expected);
        assert_eq!(engine.buffer().get(p(4.0, 4.0)), Color::WHITE);
    }

    #[test]
    fn test_line_includes_endpoints_any_direction() {
        let mut b = buf(8, 8);
        let mut engine = DrawEngine::new(&mut b);
        engine.line(p(6.0, 1.0), p(1.0, 3.0), Color::WHITE);
        let px = painted(engine.buffer(), Color::TRANSPARENT);
        assert!(px.contains(&(6, 1)));
        assert!(px.contains(&(1, 3)));
        // x-major: one pixel per column
        assert_eq!(px.len(), 6);
    }

    #[test]
    fn test_single_point_line() {
        let mut b = buf(3, 3);
        let mut engine = DrawEngine::new(&mut b);
        engine.line(p(1.0, 1.0), p(1.2, 0.9), Color::WHITE);
        assert_eq!(painted(engine.buffer(), Color::TRANSPARENT), vec![(1, 1)]);
    }

    #[test]
    fn test_thick_line_blends_once() {
        let mut b = buf(12, 12);
        b.fill(Color::BLACK);
        let mut engine = DrawEngine::new(&mut b);
        engine.set_line_thickness(4.0);
        let half = Color::rgba(255, 255, 255, 128);
        engine.line(p(2.0, 6.0), p(9.0, 6.0), half);

        // stamped circles overlap heavily, yet every pixel got one blend
        let px = painted(engine.buffer(), Color::BLACK);
        assert!(px.len() > 8);
        for (x, y) in px {
            assert_eq!(
                engine.buffer().get(p(f64::from(x), f64::from(y))),
                Color::rgba(128, 128, 128, 255)
            );
        }
        assert!(engine.buffer().get(p(5.0, 8.0)) != Color::BLACK);
    }

    #[test]
    fn test_fill_rect_scenario() {
        let mut b = buf(4, 4);
        let mut engine = DrawEngine::new(&mut b);
        engine.fill_rect(p(1.0, 1.0), p(2.0, 2.0), "#FF0000FF".parse().unwrap());

        assert_eq!(
            painted(engine.buffer(), Color::TRANSPARENT),
            vec![(1, 1), (2, 1), (1, 2), (2, 2)]
        );
        // opaque source over transparent black: rgb replaced, alpha 0 + 255 * 0
        assert_eq!(engine.buffer().get(p(2.0, 2.0)), Color::rgba(255, 0, 0, 0));
    }

    #[test]
    fn test_rect_outline() {
        let mut b = buf(5, 5);
        let mut engine = DrawEngine::new(&mut b);
        engine.set_blending(false);
        engine.rect(p(3.0, 3.0), p(0.0, 0.0), Color::WHITE);
        let px = painted(engine.buffer(), Color::TRANSPARENT);
        assert_eq!(px.len(), 12);
        assert!(!px.contains(&(1, 1)));
        assert!(!px.contains(&(2, 2)));
        assert!(px.contains(&(3, 0)));
        assert!(!px.contains(&(4, 4)));
    }

    #[test]
    fn test_fill_circle_radius_zero_stages_center() {
        let mut b = buf(5, 5);
        let mut engine = DrawEngine::new(&mut b);
        {
            let mut scope = engine.defer();
            scope.fill_circle(p(2.0, 2.0), 0, Color::WHITE);
            assert_eq!(scope.pending_len(), 1);
        }
        assert_eq!(painted(engine.buffer(), Color::TRANSPARENT), vec![(2, 2)]);
    }

    #[test]
    fn test_circle_radius_two_exact() {
        let mut b = buf(5, 5);
        let mut engine = DrawEngine::new(&mut b);
        engine.circle(p(2.0, 2.0), 2, Color::WHITE);
        assert_eq!(
            painted(engine.buffer(), Color::TRANSPARENT),
            vec![
                (1, 0),
                (2, 0),
                (3, 0),
                (0, 1),
                (4, 1),
                (0, 2),
                (4, 2),
                (0, 3),
                (4, 3),
                (1, 4),
                (2, 4),
                (3, 4),
            ]
        );
    }

    #[test]
    fn test_circle_outline_symmetric() {
        let mut b = buf(11, 11);
        let mut engine = DrawEngine::new(&mut b);
        engine.circle(p(5.0, 5.0), 4, Color::WHITE);
        let px = painted(engine.buffer(), Color::TRANSPARENT);

        for &(x, y) in &px {
            assert!(px.contains(&(10 - x, y)));
            assert!(px.contains(&(x, 10 - y)));
            assert!(px.contains(&(y, x)));
        }
        for q in [(9, 5), (1, 5), (5, 9), (5, 1)] {
            assert!(px.contains(&q));
        }
        assert!(!px.contains(&(5, 5)));
    }

    #[test]
    fn test_fill_circle_covers_interior() {
        let mut b = buf(21, 21);
        let mut engine = DrawEngine::new(&mut b);
        engine.fill_circle(p(10.0, 10.0), 8, Color::WHITE);
        let px = painted(engine.buffer(), Color::TRANSPARENT);

        for y in 0..21i64 {
            for x in 0..21i64 {
                let d2 = (x - 10).pow(2) + (y - 10).pow(2);
                if d2 <= 7 * 7 {
                    assert!(px.contains(&(x as u32, y as u32)), "hole at {},{}", x, y);
                }
                if d2 > 9 * 9 {
                    assert!(!px.contains(&(x as u32, y as u32)), "spill at {},{}", x, y);
                }
            }
        }
    }

    #[test]
    fn test_overlapping_translucent_circles_accumulate_alpha() {
        let mut b = buf(9, 9);
        let mut engine = DrawEngine::new(&mut b);
        let half_white = Color::rgba(255, 255, 255, 128);

        engine.fill_circle(p(4.0, 4.0), 3, half_white);
        assert_eq!(engine.buffer().get(p(4.0, 4.0)), Color::rgba(128, 128, 128, 64));

        engine.fill_circle(p(4.0, 4.0), 3, half_white);
        // a3 = 64 + 128 * (1 - 128/255), not an average of 64 and 128
        let c = engine.buffer().get(p(4.0, 4.0));
        assert_eq!(c.a, 128);
        assert_eq!(c.r, 192);
    }

    #[test]
    fn test_triangle_fills_and_ignores_vertex_order() {
        let tri = [p(1.0, 1.0), p(8.0, 1.0), p(1.0, 8.0)];

        let mut reference = buf(10, 10);
        DrawEngine::new(&mut reference).triangle(tri[0], tri[1], tri[2], Color::WHITE);

        for order in [[2, 0, 1], [1, 2, 0], [2, 1, 0]] {
            let mut b = buf(10, 10);
            DrawEngine::new(&mut b).triangle(tri[order[0]], tri[order[1]], tri[order[2]], Color::WHITE);
            assert_eq!(b, reference);
        }

        let px = painted(&reference, Color::TRANSPARENT);
        assert!(px.contains(&(1, 1)));
        assert!(px.contains(&(8, 1)));
        assert!(px.contains(&(1, 8)));
        assert!(px.contains(&(3, 3)));
        assert!(!px.contains(&(7, 7)));
        assert!(!px.contains(&(0, 0)));
    }

    #[test]
    fn test_flat_triangle_is_a_span() {
        let mut b = buf(10, 3);
        let mut engine = DrawEngine::new(&mut b);
        engine.triangle(p(2.0, 1.0), p(7.0, 1.0), p(4.0, 1.0), Color::WHITE);
        let expected: Vec<(u32, u32)> = (2..=7).map(|x| (x, 1)).collect();
        assert_eq!(painted(engine.buffer(), Color::TRANSPARENT), expected);
    }

    #[test]
    fn test_path_requires_two_points() {
        let mut b = buf(3, 3);
        let mut engine = DrawEngine::new(&mut b);
        assert!(matches!(engine.path(&[], Color::WHITE), Err(Error::InvalidInput(_))));
        assert!(matches!(
            engine.path(&[p(1.0, 1.0)], Color::WHITE),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            engine.fill_path(&[p(1.0, 1.0)], Color::WHITE),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            engine.bezier(&[p(1.0, 1.0)], Color::WHITE),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(engine.pending_len(), 0);
        assert!(painted(engine.buffer(), Color::TRANSPARENT).is_empty());
    }

    #[test]
    fn test_path_blends_shared_vertex_once() {
        let mut b = buf(10, 10);
        b.fill(Color::BLACK);
        let mut engine = DrawEngine::new(&mut b);
        let half = Color::rgba(255, 255, 255, 128);
        engine
            .path(&[p(1.0, 1.0), p(5.0, 1.0), p(5.0, 5.0)], half)
            .unwrap();

        let once = Color::rgba(128, 128, 128, 255);
        assert_eq!(engine.buffer().get(p(5.0, 1.0)), once);
        assert_eq!(engine.buffer().get(p(3.0, 1.0)), once);
        assert_eq!(engine.buffer().get(p(5.0, 3.0)), once);
    }

    #[test]
    fn test_path_repeated_points_same_result() {
        let half = Color::rgba(200, 50, 10, 100);
        let mut a = buf(10, 10);
        DrawEngine::new(&mut a)
            .path(&[p(0.0, 0.0), p(6.0, 2.0), p(3.0, 8.0)], half)
            .unwrap();

        let mut b = buf(10, 10);
        DrawEngine::new(&mut b)
            .path(
                &[p(0.0, 0.0), p(0.0, 0.0), p(6.0, 2.0), p(6.0, 2.0), p(3.0, 8.0)],
                half,
            )
            .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_fill_path_square() {
        let mut b = buf(8, 8);
        let mut engine = DrawEngine::new(&mut b);
        let square = [p(1.0, 1.0), p(5.0, 1.0), p(5.0, 5.0), p(1.0, 5.0), p(1.0, 1.0)];
        engine.fill_path(&square, Color::WHITE).unwrap();

        let mut expected = Vec::new();
        for y in 1..=5 {
            for x in 1..=5 {
                expected.push((x, y));
            }
        }
        assert_eq!(painted(engine.buffer(), Color::TRANSPARENT), expected);
    }

    #[test]
    fn test_fill_path_implicitly_closed() {
        let closed = [p(1.0, 1.0), p(7.0, 1.0), p(4.0, 7.0), p(1.0, 1.0)];
        let open = [p(1.0, 1.0), p(7.0, 1.0), p(4.0, 7.0)];

        let mut a = buf(9, 9);
        DrawEngine::new(&mut a).fill_path(&closed, Color::WHITE).unwrap();
        let mut b = buf(9, 9);
        DrawEngine::new(&mut b).fill_path(&open, Color::WHITE).unwrap();

        assert_eq!(a, b);
        assert!(painted(&b, Color::TRANSPARENT).contains(&(4, 3)));
    }

    #[test]
    fn test_fill_path_concave_leaves_notch() {
        let mut b = buf(10, 10);
        let mut engine = DrawEngine::new(&mut b);
        let arch = [
            p(0.0, 0.0),
            p(8.0, 0.0),
            p(8.0, 8.0),
            p(6.0, 8.0),
            p(6.0, 3.0),
            p(2.0, 3.0),
            p(2.0, 8.0),
            p(0.0, 8.0),
        ];
        engine.fill_path(&arch, Color::WHITE).unwrap();

        let mut expected = Vec::new();
        for y in 0..=8 {
            for x in 0..=8 {
                let notch = (3..=5).contains(&x) && y >= 4;
                if !notch {
                    expected.push((x, y));
                }
            }
        }
        assert_eq!(painted(engine.buffer(), Color::TRANSPARENT), expected);
    }

    #[test]
    fn test_fill_path_self_intersecting_even_odd() {
        let mut b = buf(21, 21);
        let mut engine = DrawEngine::new(&mut b);
        // five-pointed star drawn as one self-crossing loop
        let star = [
            p(10.0, 0.0),
            p(15.88, 18.09),
            p(0.49, 6.91),
            p(19.51, 6.91),
            p(4.12, 18.09),
        ];
        engine.fill_path(&star, Color::WHITE).unwrap();
        let px = painted(engine.buffer(), Color::TRANSPARENT);

        // the pentagon in the middle is crossed twice, so it stays empty
        for y in 8..=12 {
            for x in 9..=11 {
                assert!(!px.contains(&(x, y)), "center filled at {},{}", x, y);
            }
        }
        for q in [(10, 3), (3, 7), (17, 7), (7, 15), (13, 15)] {
            assert!(px.contains(&q), "arm missing at {:?}", q);
        }
    }

    #[test]
    fn test_far_off_screen_line_is_clipped() {
        let mut b = buf(4, 4);
        let mut engine = DrawEngine::new(&mut b);
        engine.line(p(-5e18, 1.0), p(5e18, 1.0), Color::WHITE);
        assert_eq!(
            painted(engine.buffer(), Color::TRANSPARENT),
            vec![(0, 1), (1, 1), (2, 1), (3, 1)]
        );

        engine.line(p(-1e18, -1e18), p(-1e18, 1e18), Color::WHITE);
        engine.set_line_thickness(3.0);
        engine.line(p(0.0, 1e18), p(3.0, 2e18), Color::WHITE);
        assert_eq!(painted(engine.buffer(), Color::TRANSPARENT).len(), 4);
        assert_eq!(engine.pending_len(), 0);
    }

    #[test]
    fn test_clipped_line_keeps_its_pixels() {
        let mut b = buf(10, 10);
        let mut engine = DrawEngine::new(&mut b);
        engine.line(p(-10.0, -10.0), p(20.0, 20.0), Color::WHITE);
        let expected: Vec<(u32, u32)> = (0..10).map(|i| (i, i)).collect();
        assert_eq!(painted(engine.buffer(), Color::TRANSPARENT), expected);
    }

    #[test]
    fn test_far_off_screen_circles_are_dropped() {
        let mut b = buf(4, 4);
        let mut engine = DrawEngine::new(&mut b);
        engine.circle(p(1e19, 0.0), u32::MAX, Color::WHITE);
        engine.fill_circle(p(-1e19, -1e19), u32::MAX, Color::WHITE);
        engine.fill_rect(p(-1e19, -1e19), p(1e19, -5.0), Color::WHITE);
        assert!(painted(engine.buffer(), Color::TRANSPARENT).is_empty());
    }

    #[test]
    fn test_bezier_two_points_is_a_line() {
        let mut a = buf(10, 10);
        DrawEngine::new(&mut a)
            .bezier(&[p(0.0, 2.0), p(9.0, 6.0)], Color::WHITE)
            .unwrap();
        let mut b = buf(10, 10);
        DrawEngine::new(&mut b).line(p(0.0, 2.0), p(9.0, 6.0), Color::WHITE);

        let pa = painted(&a, Color::TRANSPARENT);
        let pb = painted(&b, Color::TRANSPARENT);
        assert!(pa.contains(&(0, 2)));
        assert!(pa.contains(&(9, 6)));
        for px in &pb {
            assert!(pa.contains(px));
        }
    }

    #[test]
    fn test_bezier_quadratic_hits_apex() {
        let mut b = buf(21, 12);
        let mut engine = DrawEngine::new(&mut b);
        engine
            .bezier(&[p(0.0, 10.0), p(10.0, -10.0), p(20.0, 10.0)], Color::WHITE)
            .unwrap();
        let px = painted(engine.buffer(), Color::TRANSPARENT);
        // apex of the curve at t = 0.5 is (10, 0)
        assert!(px.contains(&(10, 0)));
        assert!(px.contains(&(0, 10)));
        assert!(px.contains(&(20, 10)));
        assert!(!px.contains(&(10, 10)));
    }

    #[test]
    fn test_bezier_step_validation() {
        let mut b = buf(4, 4);
        let mut engine = DrawEngine::new(&mut b);
        engine.set_blending(false);
        let pts = [p(0.0, 0.0), p(3.0, 3.0)];
        assert!(engine.bezier_with_step(&pts, 0.0, Color::WHITE).is_err());
        assert!(engine.bezier_with_step(&pts, -0.1, Color::WHITE).is_err());
        assert!(engine.bezier_with_step(&pts, f64::NAN, Color::WHITE).is_err());
        assert!(engine.bezier_with_step(&pts, 2.0, Color::WHITE).is_ok());
        assert_eq!(engine.buffer().get(p(3.0, 3.0)), Color::WHITE);
    }

    #[test_log::test]
    fn test_bezier_tiny_step_terminates() {
        let mut b = buf(4, 4);
        let mut engine = DrawEngine::new(&mut b);
        engine
            .bezier_with_step(&[p(0.0, 0.0), p(0.0, 0.0)], 1e-17, Color::WHITE)
            .unwrap();
        assert_eq!(painted(engine.buffer(), Color::TRANSPARENT), vec![(0, 0)]);

        // default step of a huge curve is just as fine
        engine
            .bezier(&[p(0.0, 3.0), p(1e16, 3.0)], Color::WHITE)
            .unwrap();
        let px = painted(engine.buffer(), Color::TRANSPARENT);
        assert_eq!(px, vec![(0, 0), (0, 3), (1, 3), (2, 3), (3, 3)]);
    }

    #[test_log::test]
    fn test_bezier_degenerate_control_points() {
        let mut b = buf(4, 4);
        let mut engine = DrawEngine::new(&mut b);
        engine
            .bezier(&[p(2.0, 2.0), p(2.0, 2.0), p(2.0, 2.0)], Color::WHITE)
            .unwrap();
        assert_eq!(painted(engine.buffer(), Color::TRANSPARENT), vec![(2, 2)]);
    }

    #[test]
    fn test_point() {
        let mut b = buf(3, 3);
        let mut engine = DrawEngine::new(&mut b);
        engine.point(p(0.6, 2.4), Color::WHITE);
        engine.point(p(-3.0, 0.0), Color::WHITE);
        assert_eq!(painted(engine.buffer(), Color::TRANSPARENT), vec![(1, 2)]);
    }
}
