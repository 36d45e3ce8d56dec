//! Crate-wide error type

/// Errors produced by color parsing, drawing, scene loading and encoding
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed channel array, hex string or `hsl()` string
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// Shape operation given unusable input (too few points, bad curve step)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid dimensions {width}x{height}: width and height must be positive")]
    InvalidDimensions { width: u32, height: u32 },

    /// Raw RGBA byte count does not match width * height * 4
    #[error("expected {expected} bytes of RGBA data, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("encoder failed: {0}")]
    EncoderFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
