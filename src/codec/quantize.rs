//! Saturating float-to-integer quantization.
//!
//! Samples are scaled by `full_scale / max_amplitude`, rounded to nearest,
//! and clamped to the target range. Overflow never wraps.

use tracing::warn;

/// Quantize to signed 16-bit PCM.
pub fn quantize_i16(samples: &[f64], max_amplitude: f64) -> Vec<i16> {
    let scale = i16::MAX as f64 / max_amplitude;
    let mut clipped = 0usize;
    let out = samples
        .iter()
        .map(|&s| saturate(s * scale, i16::MIN as f64, i16::MAX as f64, &mut clipped) as i16)
        .collect();
    report_clipping(clipped, samples.len());
    out
}

/// Quantize to signed 32-bit PCM.
pub fn quantize_i32(samples: &[f64], max_amplitude: f64) -> Vec<i32> {
    let scale = i32::MAX as f64 / max_amplitude;
    let mut clipped = 0usize;
    let out = samples
        .iter()
        .map(|&s| saturate(s * scale, i32::MIN as f64, i32::MAX as f64, &mut clipped) as i32)
        .collect();
    report_clipping(clipped, samples.len());
    out
}

/// Normalise to `[-1, 1]` floats without clipping.
pub fn normalize_f32(samples: &[f64], max_amplitude: f64) -> Vec<f32> {
    samples.iter().map(|&s| (s / max_amplitude) as f32).collect()
}

fn saturate(value: f64, lo: f64, hi: f64, clipped: &mut usize) -> f64 {
    let rounded = value.round();
    if rounded < lo || rounded > hi {
        *clipped += 1;
    }
    rounded.clamp(lo, hi)
}

fn report_clipping(clipped: usize, total: usize) {
    if clipped > 0 {
        warn!(clipped, total, "samples exceed the maximum amplitude and were saturated");
    }
}
