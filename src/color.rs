//! Color model
//!
//! Every color representation the drawing layer accepts (channel arrays,
//! `#RRGGBB[AA]` hex strings, `hsl(h, s, l)` strings) is parsed once at the
//! boundary into a [`ColorSpec`] and then flattened into the canonical
//! [`Color`], an RGBA8 tuple. Nothing past this module re-validates colors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Canonical Color
// ============================================================================

/// Canonical RGBA color, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "RawColor", into = "RawColor")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from an `hsl()` triple; alpha is always 255
    pub fn hsl(hue: u16, saturation: u8, lightness: u8) -> Result<Self> {
        ColorSpec::hsl(hue, saturation, lightness).map(ColorSpec::to_color)
    }

    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub const fn from_array(bytes: [u8; 4]) -> Self {
        Self::rgba(bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

impl From<[u8; 3]> for Color {
    fn from(c: [u8; 3]) -> Self {
        Self::rgb(c[0], c[1], c[2])
    }
}

impl From<[u8; 4]> for Color {
    fn from(c: [u8; 4]) -> Self {
        Self::from_array(c)
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::rgb(r, g, b)
    }
}

impl From<(u8, u8, u8, u8)> for Color {
    fn from((r, g, b, a): (u8, u8, u8, u8)) -> Self {
        Self::rgba(r, g, b, a)
    }
}

impl From<Color> for [u8; 4] {
    fn from(c: Color) -> Self {
        c.to_array()
    }
}

impl TryFrom<&[f64]> for Color {
    type Error = Error;

    fn try_from(values: &[f64]) -> Result<Self> {
        ColorSpec::from_channels(values).map(ColorSpec::to_color)
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ColorSpec::parse(s).map(ColorSpec::to_color)
    }
}

/// Formats as `#rrggbbaa`
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

// ============================================================================
// Surface representations
// ============================================================================

/// A parsed color in one of the accepted surface forms.
///
/// Payloads are already validated: converting to [`Color`] cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpec {
    /// Numeric channel array, saturated to 0-255 (alpha defaults to 255)
    Channels([u8; 4]),
    /// `#RRGGBB` or `#RRGGBBAA`
    Hex([u8; 4]),
    /// `hsl(h, s, l)`: hue in [0, 360), saturation/lightness in [0, 100]
    Hsl {
        hue: u16,
        saturation: u8,
        lightness: u8,
    },
}

impl ColorSpec {
    /// Validate a 3- or 4-element channel array, clamping each value to 0-255
    pub fn from_channels(values: &[f64]) -> Result<Self> {
        if values.len() != 3 && values.len() != 4 {
            return Err(Error::InvalidColor(format!(
                "channel array must have 3 or 4 elements, got {}",
                values.len()
            )));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(Error::InvalidColor(format!("non-finite channel value {}", bad)));
        }

        let mut channels = [255u8; 4];
        for (slot, v) in channels.iter_mut().zip(values) {
            *slot = v.round().clamp(0.0, 255.0) as u8;
        }
        Ok(Self::Channels(channels))
    }

    pub fn hsl(hue: u16, saturation: u8, lightness: u8) -> Result<Self> {
        if hue >= 360 || saturation > 100 || lightness > 100 {
            return Err(Error::InvalidColor(format!(
                "hsl({}, {}, {}) out of range",
                hue, saturation, lightness
            )));
        }
        Ok(Self::Hsl {
            hue,
            saturation,
            lightness,
        })
    }

    /// Parse a hex or `hsl()` string
    pub fn parse(input: &str) -> Result<Self> {
        if input.starts_with('#') {
            parse_hex(input)
        } else if input.starts_with("hsl(") {
            parse_hsl(input)
        } else {
            Err(Error::InvalidColor(format!("unrecognized color '{}'", input)))
        }
    }

    /// Flatten into the canonical RGBA tuple
    pub fn to_color(self) -> Color {
        match self {
            Self::Channels(c) | Self::Hex(c) => Color::from_array(c),
            Self::Hsl {
                hue,
                saturation,
                lightness,
            } => {
                let (r, g, b) = hsl_to_rgb(hue, saturation, lightness);
                Color::rgb(r, g, b)
            },
        }
    }
}

fn parse_hex(input: &str) -> Result<ColorSpec> {
    let digits = &input[1..];
    if (digits.len() != 6 && digits.len() != 8) || !digits.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(Error::InvalidColor(format!("malformed hex color '{}'", input)));
    }

    let mut channels = [255u8; 4];
    for (i, slot) in channels.iter_mut().enumerate().take(digits.len() / 2) {
        let pair = &digits[i * 2..i * 2 + 2];
        *slot = u8::from_str_radix(pair, 16)
            .map_err(|e| Error::InvalidColor(format!("malformed hex color '{}': {}", input, e)))?;
    }
    Ok(ColorSpec::Hex(channels))
}

fn parse_hsl(input: &str) -> Result<ColorSpec> {
    let malformed = || Error::InvalidColor(format!("malformed hsl color '{}'", input));

    let body = input
        .strip_prefix("hsl(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(malformed)?;

    let mut parts = [0u32; 3];
    let mut fields = body.split(',');
    for (i, slot) in parts.iter_mut().enumerate() {
        let field = fields.next().ok_or_else(malformed)?;
        // A single space is allowed after each separating comma
        let field = if i > 0 {
            field.strip_prefix(' ').unwrap_or(field)
        } else {
            field
        };
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        *slot = field.parse().map_err(|_| malformed())?;
    }
    if fields.next().is_some() {
        return Err(malformed());
    }

    let [h, s, l] = parts;
    if h >= 360 || s > 100 || l > 100 {
        return Err(Error::InvalidColor(format!("hsl component out of range in '{}'", input)));
    }
    ColorSpec::hsl(h as u16, s as u8, l as u8)
}

/// HSL to RGB color conversion
/// h: 0-359, s: 0-100, l: 0-100
fn hsl_to_rgb(h: u16, s: u8, l: u8) -> (u8, u8, u8) {
    let s = f64::from(s) / 100.0;
    let l = f64::from(l) / 100.0;
    let h_prime = f64::from(h) / 60.0;

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h_prime % 2.0) - 1.0).abs());
    let m = l - c / 2.0;

    let (r1, g1, b1) = match h_prime as i32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let scale = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (scale(r1), scale(g1), scale(b1))
}

// ============================================================================
// Serde bridge
// ============================================================================

/// Wire form of a color: either a channel array or a hex/hsl string
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawColor {
    Channels(Vec<f64>),
    Text(String),
}

impl TryFrom<RawColor> for Color {
    type Error = Error;

    fn try_from(raw: RawColor) -> Result<Self> {
        match raw {
            RawColor::Channels(values) => Self::try_from(values.as_slice()),
            RawColor::Text(s) => s.parse(),
        }
    }
}

impl From<Color> for RawColor {
    fn from(c: Color) -> Self {
        Self::Text(c.to_string())
    }
}
