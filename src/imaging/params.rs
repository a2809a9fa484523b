//! Parameter types for the lossy compression pass.
//!
//! These describe *what* the encoder should aim for, not how it gets there.
//! The [`backend`](super::backend) turns them into quantizer settings.
//!
//! ## Types
//!
//! - [`QualityRange`]: closed `[min, max]` window of acceptable quality,
//!   expressed as fractions (`0.6..=0.95` by default).
//! - [`Speed`]: quantizer speed/quality trade-off (1 = slowest/best, 10 = fastest).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum QualityError {
    #[error("quality bounds must be within 0.0-1.0, got [{min}, {max}]")]
    OutOfRange { min: f32, max: f32 },
    #[error("quality minimum {min} is greater than maximum {max}")]
    Inverted { min: f32, max: f32 },
}

/// Acceptable quality window for palette quantization.
///
/// `min` is the floor below which quantization is considered a failure and the
/// lossless render is kept instead; `max` is the target the quantizer stops at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f32; 2]", into = "[f32; 2]")]
pub struct QualityRange {
    min: f32,
    max: f32,
}

impl QualityRange {
    /// Build a window from two fractions in `0.0..=1.0` with `min <= max`.
    pub fn new(min: f32, max: f32) -> Result<Self, QualityError> {
        if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) {
            return Err(QualityError::OutOfRange { min, max });
        }
        if min > max {
            return Err(QualityError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(self) -> f32 {
        self.min
    }

    pub fn max(self) -> f32 {
        self.max
    }

    /// The window as whole percentages, the unit libimagequant works in.
    pub fn as_percent(self) -> (u8, u8) {
        (to_percent(self.min), to_percent(self.max))
    }
}

fn to_percent(fraction: f32) -> u8 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

impl Default for QualityRange {
    fn default() -> Self {
        Self {
            min: 0.6,
            max: 0.95,
        }
    }
}

impl TryFrom<[f32; 2]> for QualityRange {
    type Error = QualityError;

    fn try_from([min, max]: [f32; 2]) -> Result<Self, Self::Error> {
        Self::new(min, max)
    }
}

impl From<QualityRange> for [f32; 2] {
    fn from(range: QualityRange) -> Self {
        [range.min, range.max]
    }
}

/// Quantizer speed (1-10). Clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Speed(u8);

impl Speed {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 10))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self(4)
    }
}

impl From<u8> for Speed {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<Speed> for u8 {
    fn from(speed: Speed) -> Self {
        speed.0
    }
}

/// Everything the compression pass needs for one image.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompressionParams {
    pub quality: QualityRange,
    pub speed: Speed,
}
