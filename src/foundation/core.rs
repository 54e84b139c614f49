use crate::foundation::error::{ReelError, ReelResult};

pub use kurbo::{Point, Rect, Size, Vec2};

/// Normalized position within a bound scroll region, always in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Progress(f64);

impl Progress {
    /// Progress at the start of a region.
    pub const START: Self = Self(0.0);
    /// Progress at the end of a region.
    pub const END: Self = Self(1.0);

    /// Build a progress value, clamping into `[0, 1]`. `NaN` maps to `0`.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::START;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Raw value in `[0, 1]`.
    pub fn get(self) -> f64 {
        self.0
    }

    /// `true` when strictly inside the region (the open interval `(0, 1)`).
    pub fn is_inside(self) -> bool {
        self.0 > 0.0 && self.0 < 1.0
    }
}

impl From<f64> for Progress {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Progress> for f64 {
    fn from(p: Progress) -> Self {
        p.0
    }
}

/// Direction of the latest scroll movement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// No movement since the previous tick.
    #[default]
    Idle,
    /// Offset increased.
    Forward,
    /// Offset decreased.
    Backward,
}

impl Direction {
    /// Classify the movement from `prev` to `next`.
    pub fn between(prev: f64, next: f64) -> Self {
        if next > prev {
            Self::Forward
        } else if next < prev {
            Self::Backward
        } else {
            Self::Idle
        }
    }
}

/// Visible page area in CSS pixels plus device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels.
    pub width: f64,
    /// Height in CSS pixels.
    pub height: f64,
    /// Device pixel ratio (backing store pixels per CSS pixel).
    #[serde(default = "default_dpr")]
    pub dpr: f64,
}

fn default_dpr() -> f64 {
    1.0
}

impl Viewport {
    /// Create a validated viewport.
    pub fn new(width: f64, height: f64, dpr: f64) -> ReelResult<Self> {
        let vp = Self { width, height, dpr };
        vp.validate()?;
        Ok(vp)
    }

    /// Reject non-finite or non-positive dimensions.
    pub fn validate(&self) -> ReelResult<()> {
        for (name, v) in [("width", self.width), ("height", self.height), ("dpr", self.dpr)] {
            if !v.is_finite() || v <= 0.0 {
                return Err(ReelError::validation(format!(
                    "viewport {name} must be finite and > 0, got {v}"
                )));
            }
        }
        Ok(())
    }

    /// CSS size as a kurbo [`Size`].
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Backing store size in device pixels, rounded.
    pub fn device_pixels(&self) -> (u32, u32) {
        let w = (self.width * self.dpr).round().max(1.0) as u32;
        let h = (self.height * self.dpr).round().max(1.0) as u32;
        (w, h)
    }
}

/// Straight (non-premultiplied) RGBA8 color, parsed from CSS hex notation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque black.
    pub const BLACK: Self = Self::opaque(0, 0, 0);

    /// Build an opaque color.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse_hex(s: &str) -> ReelResult<Self> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| ReelError::validation(format!("color '{s}' must start with '#'")))?;
        let digit = |i: usize, len: usize| -> ReelResult<u8> {
            let part = hex.get(i..i + len).unwrap_or_default();
            let v = u8::from_str_radix(part, 16)
                .map_err(|_| ReelError::validation(format!("invalid hex color '{s}'")))?;
            Ok(if len == 1 { v * 17 } else { v })
        };
        match hex.len() {
            3 => Ok(Self::opaque(digit(0, 1)?, digit(1, 1)?, digit(2, 1)?)),
            6 => Ok(Self::opaque(digit(0, 2)?, digit(2, 2)?, digit(4, 2)?)),
            8 => Ok(Self {
                r: digit(0, 2)?,
                g: digit(2, 2)?,
                b: digit(4, 2)?,
                a: digit(6, 2)?,
            }),
            _ => Err(ReelError::validation(format!(
                "hex color '{s}' must have 3, 6 or 8 digits"
            ))),
        }
    }

    /// Channels as an array, in `[r, g, b, a]` order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl TryFrom<String> for Rgba8 {
    type Error = ReelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&s)
    }
}

impl From<Rgba8> for String {
    fn from(c: Rgba8) -> Self {
        if c.a == 255 {
            format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
