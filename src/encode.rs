//! Export boundary: hands raw RGBA bytes to an external `ffmpeg` process and
//! streams the encoded still image into a caller-supplied sink.

use std::ffi::OsString;
use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::thread;

use log::debug;

use crate::display::PixelBuffer;
use crate::error::{Error, Result};

const DEFAULT_PROGRAM: &str = "ffmpeg";

/// Still-image codecs the encoder can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    Png,
    Jpeg,
    Bmp,
    Tiff,
    Webp,
}

impl Codec {
    pub const ALL: [Self; 5] = [Self::Png, Self::Jpeg, Self::Bmp, Self::Tiff, Self::Webp];

    /// ffmpeg encoder name passed to `-c:v`
    pub fn encoder_name(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "mjpeg",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Webp => "libwebp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Webp => "webp",
        }
    }
}

impl FromStr for Codec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "bmp" => Ok(Self::Bmp),
            "tiff" | "tif" => Ok(Self::Tiff),
            "webp" => Ok(Self::Webp),
            other => Err(Error::InvalidInput(format!("unknown codec '{}'", other))),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Check that `rgba` holds exactly width * height * 4 bytes
pub fn validate_raw(rgba: &[u8], width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(Error::SizeMismatch {
            expected,
            actual: rgba.len(),
        });
    }
    Ok(())
}

/// Runs an external encoder process
#[derive(Debug, Clone)]
pub struct Encoder {
    program: PathBuf,
}

impl Encoder {
    /// Use `ffmpeg` from `PATH`
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command-line arguments: raw RGBA on stdin, one encoded frame on stdout
    pub fn args(&self, width: u32, height: u32, codec: Codec) -> Vec<OsString> {
        let size = format!("{}x{}", width, height);
        [
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            size.as_str(),
            "-i",
            "-",
            "-frames:v",
            "1",
            "-c:v",
            codec.encoder_name(),
            "-f",
            "image2pipe",
            "-",
        ]
        .iter()
        .map(OsString::from)
        .collect()
    }

    /// Encode a pixel buffer
    pub fn encode_buffer<W: Write + ?Sized>(
        &self,
        buffer: &PixelBuffer,
        codec: Codec,
        sink: &mut W,
    ) -> Result<()> {
        self.encode(buffer.as_bytes(), buffer.width(), buffer.height(), codec, sink)
    }

    /// Encode raw row-major RGBA bytes and write the result to `sink`.
    ///
    /// Fails on a size mismatch, non-positive dimensions, a process that
    /// cannot be started, or a non-zero exit status.
    pub fn encode<W: Write + ?Sized>(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        codec: Codec,
        sink: &mut W,
    ) -> Result<()> {
        validate_raw(rgba, width, height)?;

        debug!(
            "encoding {}x{} as {} via {}",
            width,
            height,
            codec,
            self.program.display()
        );

        let mut child = Command::new(&self.program)
            .args(self.args(width, height, codec))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::EncoderFailed(format!("cannot start {}: {}", self.program.display(), e))
            })?;

        let missing = |what: &str| Error::EncoderFailed(format!("encoder {} not captured", what));
        let mut stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let mut stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let mut stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

        // stdin and stderr are pumped on their own threads so a chatty or
        // early-exiting encoder cannot deadlock the copy to `sink`
        let (written, copied, diagnostics) = thread::scope(|s| {
            let writer = s.spawn(move || stdin.write_all(rgba));
            let reader = s.spawn(move || {
                let mut text = String::new();
                stderr.read_to_string(&mut text).map(|_| text)
            });
            let copied = io::copy(&mut stdout, sink);
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            let diagnostics = reader.join().ok().and_then(|r| r.ok()).unwrap_or_default();
            (written, copied, diagnostics)
        });

        let status = child.wait()?;
        if !status.success() {
            return Err(Error::EncoderFailed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                status,
                diagnostics.trim()
            )));
        }
        written?;
        let bytes = copied?;
        debug!("encoder produced {} bytes", bytes);
        Ok(())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
