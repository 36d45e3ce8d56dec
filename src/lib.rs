//! stipple: a software rasterizer
//!
//! An RGBA8 [`PixelBuffer`] plus a [`DrawEngine`] that rasterizes lines,
//! rectangles, circles, triangles, paths and bezier curves into it. Each
//! shape stages its pixels into a deduplicating batch and composites the
//! batch once, so no destination pixel is blended twice by one shape.
//!
//! ```no_run
//! use stipple::{Color, DrawEngine, PixelBuffer, Point};
//!
//! let mut buffer = PixelBuffer::new(64, 64)?;
//! let mut engine = DrawEngine::new(&mut buffer);
//! engine.fill("#000000".parse()?);
//! engine.fill_circle(Point::new(32.0, 32.0), 20, "#ff000080".parse()?);
//! engine.line(Point::new(0.0, 0.0), Point::new(63.0, 63.0), Color::WHITE);
//! # Ok::<(), stipple::Error>(())
//! ```

pub mod color;
pub mod display;
pub mod draw;
pub mod encode;
pub mod error;
pub mod geometry;
pub mod scene;

pub use color::{Color, ColorSpec};
pub use display::PixelBuffer;
pub use draw::{DeferredScope, DrawEngine};
pub use encode::{Codec, Encoder};
pub use error::{Error, Result};
pub use geometry::Point;
pub use scene::{Scene, Shape};
