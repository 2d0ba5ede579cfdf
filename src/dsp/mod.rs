//! DSP — sample storage and waveform generation.
//!
//! Pure Rust, deterministic: identical inputs give bit-identical samples.

pub mod buffer;
pub mod oscillator;

pub use buffer::SampleBuffer;
pub use oscillator::{Waveform, WaveformSpec};
