//! Pixel storage

mod pixel_buffer;

pub use pixel_buffer::PixelBuffer;

pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;
