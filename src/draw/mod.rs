//! Batched drawing on top of a [`PixelBuffer`]
//!
//! Shape algorithms never touch the buffer directly. They *stage* writes
//! into a map keyed by linear pixel index, so a pixel hit several times by
//! one shape (overlapping circle spans, shared path vertices) keeps only its
//! last staged color. When the outermost operation finishes, the batch is
//! *flushed*: each staged pixel is blended (or overwritten) exactly once.
//!
//! Composite shapes (thick lines, paths, curves) delegate to other shapes
//! inside a [`DeferredScope`]. Each scope bumps a depth counter; flushing is
//! a no-op while the depth is non-zero, and dropping the last scope flushes.

mod shapes;

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use log::trace;

use crate::color::Color;
use crate::display::PixelBuffer;
use crate::geometry::Point;

// ============================================================================
// DrawEngine
// ============================================================================

/// Drawing front-end for one pixel buffer
pub struct DrawEngine<'b> {
    buffer: &'b mut PixelBuffer,
    pending: HashMap<usize, Color>,
    depth: usize,
    blending: bool,
    line_thickness: f64,
}

impl<'b> DrawEngine<'b> {
    /// Blending on, 1px lines
    pub fn new(buffer: &'b mut PixelBuffer) -> Self {
        Self {
            buffer,
            pending: HashMap::new(),
            depth: 0,
            blending: true,
            line_thickness: 1.0,
        }
    }

    #[inline]
    pub fn buffer(&self) -> &PixelBuffer {
        self.buffer
    }

    #[inline]
    pub fn blending(&self) -> bool {
        self.blending
    }

    /// `true`: flushed pixels are alpha-blended; `false`: overwritten
    pub fn set_blending(&mut self, blending: bool) {
        self.blending = blending;
    }

    #[inline]
    pub fn line_thickness(&self) -> f64 {
        self.line_thickness
    }

    /// Line diameter in pixels. Values of 1 or less draw single-pixel lines.
    pub fn set_line_thickness(&mut self, thickness: f64) {
        self.line_thickness = thickness;
    }

    /// Number of staged, not yet flushed, pixels
    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Current nesting depth of deferred scopes
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Stage a write for the pixel nearest `point`. Out-of-bounds points are
    /// dropped. A later stage of the same pixel replaces this one.
    #[inline]
    pub fn stage(&mut self, point: Point, color: Color) {
        let (x, y) = point.to_pixel();
        self.stage_at(x, y, color);
    }

    #[inline]
    fn stage_at(&mut self, x: i64, y: i64, color: Color) {
        if let Some(index) = self.buffer.linear_index(x, y) {
            self.pending.insert(index, color);
        }
    }

    /// Stage the inclusive horizontal span [x0, x1] (either order) on row y
    fn stage_span(&mut self, x0: i64, x1: i64, y: i64, color: Color) {
        if y < 0 || y >= i64::from(self.buffer.height()) {
            return;
        }
        let (lo, hi) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        let lo = lo.max(0);
        let hi = hi.min(i64::from(self.buffer.width()) - 1);
        if lo > hi {
            return;
        }

        let row = y as usize * self.buffer.width() as usize;
        for x in lo..=hi {
            self.pending.insert(row + x as usize, color);
        }
    }

    /// Apply every staged write to the buffer and clear the batch.
    ///
    /// No-op while a [`DeferredScope`] is open.
    pub fn flush(&mut self) {
        if self.depth != 0 || self.pending.is_empty() {
            return;
        }

        trace!(
            "flushing {} staged pixels ({})",
            self.pending.len(),
            if self.blending { "blend" } else { "overwrite" }
        );

        for (index, color) in self.pending.drain() {
            let (x, y) = self.buffer.coords_of(index);
            if self.blending {
                self.buffer.add_at(x, y, color);
            } else {
                self.buffer.set_at(x, y, color);
            }
        }
    }

    /// Open a deferred scope. Staged writes are held until the outermost
    /// scope is dropped, on every exit path.
    pub fn defer(&mut self) -> DeferredScope<'_, 'b> {
        self.depth += 1;
        DeferredScope { engine: self }
    }

    /// Run `f` inside one deferred scope, so every shape it draws is
    /// composited as a single logical operation.
    pub fn batch<T>(&mut self, f: impl FnOnce(&mut DrawEngine<'b>) -> T) -> T {
        let mut scope = self.defer();
        f(&mut scope)
    }

    /// Fill the whole buffer with `color`, bypassing blending. Any staged
    /// writes are discarded, not applied.
    pub fn fill(&mut self, color: Color) {
        if !self.pending.is_empty() {
            trace!("discarding {} staged pixels before fill", self.pending.len());
        }
        self.pending.clear();
        self.buffer.fill(color);
    }
}

// ============================================================================
// DeferredScope
// ============================================================================

/// Guard returned by [`DrawEngine::defer`]. Derefs to the engine; on drop it
/// closes the scope and flushes if it was the outermost one.
pub struct DeferredScope<'e, 'b> {
    engine: &'e mut DrawEngine<'b>,
}

impl<'b> Deref for DeferredScope<'_, 'b> {
    type Target = DrawEngine<'b>;

    fn deref(&self) -> &Self::Target {
        self.engine
    }
}

impl<'b> DerefMut for DeferredScope<'_, 'b> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.engine
    }
}

impl Drop for DeferredScope<'_, '_> {
    fn drop(&mut self) {
        self.engine.depth -= 1;
        self.engine.flush();
    }
}
