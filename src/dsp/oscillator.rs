//! Stateless waveform generators.
//!
//! Every generated segment starts at phase 0, so consecutive tones do not
//! share an oscillator. Concatenating different frequencies therefore has
//! phase discontinuities at the joins.

use std::f64::consts::PI;

use crate::error::{Result, SonoError};

/// Largest number of samples a track can address.
pub const MAX_SAMPLES: usize = isize::MAX as usize / std::mem::size_of::<f64>();

/// Supported waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    Sine,
    Silence,
}

/// A fully resolved segment to generate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformSpec {
    pub waveform: Waveform,
    pub frequency_hz: f64,
    pub duration_s: f64,
    /// Absolute peak value, already scaled by the track's max amplitude.
    pub amplitude: f64,
    pub sample_rate: u32,
}

impl WaveformSpec {
    pub fn sine(frequency_hz: f64, duration_s: f64, amplitude: f64, sample_rate: u32) -> Self {
        WaveformSpec {
            waveform: Waveform::Sine,
            frequency_hz,
            duration_s,
            amplitude,
            sample_rate,
        }
    }

    pub fn silence(duration_s: f64, sample_rate: u32) -> Self {
        WaveformSpec {
            waveform: Waveform::Silence,
            frequency_hz: 0.0,
            duration_s,
            amplitude: 0.0,
            sample_rate,
        }
    }

    /// `round(duration * sample_rate)`.
    pub fn sample_count(&self) -> Result<usize> {
        sample_count(self.duration_s, self.sample_rate, "duration")
    }

    pub fn generate(&self) -> Result<Vec<f64>> {
        let n = self.sample_count()?;
        let mut out = Vec::new();
        out.try_reserve_exact(n)
            .map_err(|e| SonoError::invalid(format!("cannot allocate {n} samples: {e}")))?;
        match self.waveform {
            Waveform::Sine => out.extend(sine(self.frequency_hz, self.amplitude, self.sample_rate, n)),
            Waveform::Silence => out.resize(n, 0.0),
        }
        Ok(out)
    }
}

/// Number of samples covering `seconds`. `what` names the quantity in errors.
pub fn sample_count(seconds: f64, sample_rate: u32, what: &str) -> Result<usize> {
    if !seconds.is_finite() {
        return Err(SonoError::invalid(format!("{what} must be finite, got {seconds}")));
    }
    if seconds < 0.0 {
        return Err(SonoError::invalid(format!("negative {what} value: {seconds}")));
    }
    let n = (seconds * sample_rate as f64).round();
    if n > MAX_SAMPLES as f64 {
        return Err(SonoError::invalid(format!(
            "{what} of {seconds} s exceeds the longest track at {sample_rate} Hz"
        )));
    }
    Ok(n as usize)
}

/// `amplitude * sin(2π f t)` for `t = i / sample_rate`, `i` in `0..n`.
pub fn sine(frequency_hz: f64, amplitude: f64, sample_rate: u32, n: usize) -> impl Iterator<Item = f64> {
    let w = 2.0 * PI * frequency_hz / sample_rate as f64;
    (0..n).map(move |i| amplitude * (w * i as f64).sin())
}
