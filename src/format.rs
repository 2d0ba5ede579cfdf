//! Sample formats and full-scale amplitudes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SonoError};

/// Full-scale value of signed 16-bit PCM.
pub const INT16_FULL_SCALE: f64 = i16::MAX as f64;
/// Full-scale value of signed 32-bit PCM.
pub const INT32_FULL_SCALE: f64 = i32::MAX as f64;

/// Encoding of samples in an exported WAV file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    #[default]
    Int16,
    Int32,
    Float32,
}

impl SampleFormat {
    /// Largest representable magnitude; floats are written in `[-1, 1]`.
    pub fn full_scale(self) -> f64 {
        match self {
            SampleFormat::Int16 => INT16_FULL_SCALE,
            SampleFormat::Int32 => INT32_FULL_SCALE,
            SampleFormat::Float32 => 1.0,
        }
    }

    pub fn bits_per_sample(self) -> u16 {
        match self {
            SampleFormat::Int16 => 16,
            SampleFormat::Int32 | SampleFormat::Float32 => 32,
        }
    }

    /// Mono WAV header parameters for this format.
    pub fn wav_spec(self, sample_rate: u32) -> hound::WavSpec {
        hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: self.bits_per_sample(),
            sample_format: match self {
                SampleFormat::Float32 => hound::SampleFormat::Float,
                _ => hound::SampleFormat::Int,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SampleFormat::Int16 => "int16",
            SampleFormat::Int32 => "int32",
            SampleFormat::Float32 => "float32",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleFormat {
    type Err = SonoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "int16" => Ok(SampleFormat::Int16),
            "int32" => Ok(SampleFormat::Int32),
            "float32" => Ok(SampleFormat::Float32),
            other => Err(SonoError::invalid(format!(
                "cannot infer a wave format for data type {other:?}"
            ))),
        }
    }
}

/// Full-scale amplitude of a track: a positive number or a data-type alias.
///
/// | alias | value |
/// |---|---|
/// | `int16` | 32767 |
/// | `int32` | 2147483647 |
/// | `float`, `float32`, `float64` | 1 |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxAmplitude {
    Value(f64),
    Alias(String),
}

impl MaxAmplitude {
    pub fn resolve(&self) -> Result<f64> {
        let value = match self {
            MaxAmplitude::Value(v) => *v,
            MaxAmplitude::Alias(alias) => match alias.as_str() {
                "int16" => INT16_FULL_SCALE,
                "int32" => INT32_FULL_SCALE,
                "float" | "float32" | "float64" => 1.0,
                other => {
                    return Err(SonoError::invalid(format!(
                        "the maximum amplitude cannot be inferred from the data type {other:?}"
                    )));
                }
            },
        };
        if !value.is_finite() || value <= 0.0 {
            return Err(SonoError::invalid(format!(
                "maximum amplitude must be positive, got {value}"
            )));
        }
        Ok(value)
    }
}

impl Default for MaxAmplitude {
    fn default() -> Self {
        MaxAmplitude::Value(1.0)
    }
}

impl From<f64> for MaxAmplitude {
    fn from(v: f64) -> Self {
        MaxAmplitude::Value(v)
    }
}

impl From<&str> for MaxAmplitude {
    fn from(alias: &str) -> Self {
        MaxAmplitude::Alias(alias.to_string())
    }
}
