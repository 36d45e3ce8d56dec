use log::debug;

use crate::color::Color;
use crate::error::{Error, Result};
use crate::geometry::Point;

// ============================================================================
// Utility Functions
// ============================================================================

/// Source-over blend of a single color channel
/// `alpha` is the incoming alpha in [0, 1]
#[inline]
fn blend_channel(dst: u8, src: u8, alpha: f64) -> u8 {
    let inv = 1.0 - alpha;
    (f64::from(dst) * inv + f64::from(src) * alpha)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Alpha accumulates toward 255 as layers are composited: a + a2 * (1 - a2/255)
#[inline]
fn accumulate_alpha(dst: u8, src: u8) -> u8 {
    let inv = 1.0 - f64::from(src) / 255.0;
    (f64::from(dst) + f64::from(src) * inv)
        .round()
        .clamp(0.0, 255.0) as u8
}

// ============================================================================
// PixelBuffer
// ============================================================================

/// RGBA8 pixel buffer, row-major, 4 bytes per pixel.
///
/// Dimensions are fixed at construction and the backing storage is never
/// resized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Create a transparent-black buffer
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let len = Self::byte_len(width, height)?;
        debug!("allocating {}x{} pixel buffer ({} bytes)", width, height, len);
        Ok(Self {
            pixels: vec![0; len],
            width,
            height,
        })
    }

    /// Wrap existing RGBA bytes; the length must be exactly width * height * 4
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = Self::byte_len(width, height)?;
        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            pixels: data,
            width,
            height,
        })
    }

    fn byte_len(width: u32, height: u32) -> Result<usize> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        Ok(width as usize * height as usize * 4)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels (not bytes)
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check if coordinates are within bounds
    #[inline]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && x < i64::from(self.width) && y >= 0 && y < i64::from(self.height)
    }

    /// Linear pixel index y * width + x; `None` when out of bounds
    #[inline]
    pub fn linear_index(&self, x: i64, y: i64) -> Option<usize> {
        self.in_bounds(x, y)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    /// Inverse of [`linear_index`](Self::linear_index)
    #[inline]
    pub fn coords_of(&self, index: usize) -> (i64, i64) {
        let w = self.width as usize;
        ((index % w) as i64, (index / w) as i64)
    }

    /// Calculate byte offset for in-bounds pixel at (x, y)
    #[inline]
    fn pixel_index(&self, x: i64, y: i64) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Read the raw color at `point` (rounded).
    ///
    /// The point must be in bounds; the core only reads pixels it has
    /// already bounds-checked. Use [`get_checked`](Self::get_checked) otherwise.
    #[inline]
    pub fn get(&self, point: Point) -> Color {
        let (x, y) = point.to_pixel();
        debug_assert!(self.in_bounds(x, y), "get({}, {}) out of bounds", x, y);
        self.get_at(x, y)
    }

    /// Bounds-checked read
    #[inline]
    pub fn get_checked(&self, point: Point) -> Option<Color> {
        let (x, y) = point.to_pixel();
        self.in_bounds(x, y).then(|| self.get_at(x, y))
    }

    #[inline]
    fn get_at(&self, x: i64, y: i64) -> Color {
        let idx = self.pixel_index(x, y);
        let p = &self.pixels[idx..idx + 4];
        Color::rgba(p[0], p[1], p[2], p[3])
    }

    /// Overwrite a single pixel. Out-of-bounds points are ignored.
    #[inline]
    pub fn set(&mut self, point: Point, color: Color) {
        let (x, y) = point.to_pixel();
        self.set_at(x, y, color);
    }

    /// Overwrite the pixel at integer coordinates (bounds checked)
    #[inline]
    pub fn set_at(&mut self, x: i64, y: i64, color: Color) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x, y);
            self.pixels[idx..idx + 4].copy_from_slice(&color.to_array());
        }
    }

    /// Alpha-blend `color` over the pixel at `point`. Out-of-bounds points
    /// are ignored.
    #[inline]
    pub fn add(&mut self, point: Point, color: Color) {
        let (x, y) = point.to_pixel();
        self.add_at(x, y, color);
    }

    /// Alpha-blend at integer coordinates (bounds checked)
    ///
    /// RGB is source-over: `dst * (1 - a2) + src * a2`. Alpha is
    /// `a + a2 * (1 - a2/255)` (clamped), so repeated translucent layers push it up.
    pub fn add_at(&mut self, x: i64, y: i64, color: Color) {
        if !self.in_bounds(x, y) {
            return;
        }
        let dst = self.get_at(x, y);
        let alpha = f64::from(color.a) / 255.0;
        let blended = Color::rgba(
            blend_channel(dst.r, color.r, alpha),
            blend_channel(dst.g, color.g, alpha),
            blend_channel(dst.b, color.b, alpha),
            accumulate_alpha(dst.a, color.a),
        );
        self.set_at(x, y, blended);
    }

    /// Overwrite every pixel with `color`
    pub fn fill(&mut self, color: Color) {
        let bytes = color.to_array();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
    }

    /// Raw RGBA bytes, row-major. This is what the encoder consumes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Raw mutable access to the backing bytes.
    ///
    /// Low-level escape hatch for the export boundary. Writes made through
    /// this slice bypass any `DrawEngine` batching, so a pending batch
    /// flushed afterwards may blend against pixels it never staged.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Consume the buffer, returning its RGBA bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }
}
