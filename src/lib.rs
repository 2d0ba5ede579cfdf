//! sonoUno core — time-domain sample buffers for data sonification.
//!
//! A [`Track`] is a growable mono buffer with a rewindable write cursor.
//! Tones are mixed additively at the cursor, so rewinding it overlays new
//! material onto existing audio. Tracks quantize with saturation on export
//! and round-trip through WAV.

pub mod codec;
pub mod config;
pub mod dsp;
pub mod error;
pub mod format;
pub mod note;
pub mod playback;
pub mod score;
pub mod track;

pub use crate::config::TrackConfig;
pub use crate::error::SonoError;
pub use crate::format::{MaxAmplitude, SampleFormat};
pub use crate::note::Pitch;
pub use crate::playback::{Dispatcher, Pcm, Sink};
pub use crate::score::Score;
pub use crate::track::{Cue, Track};

use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn to_js(e: SonoError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-exposed: return the sonouno-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: frequency in Hz of a note such as `"F#4"`.
#[wasm_bindgen]
pub fn note_frequency(note: &str) -> Result<f64, JsValue> {
    note::note_to_frequency(note).map_err(to_js)
}

/// WASM-exposed: render a score object to a 16-bit WAV byte array, ready to
/// be wrapped in a `Blob` for an `<audio>` element.
#[wasm_bindgen]
pub fn render_score_wav(score: JsValue) -> Result<Vec<u8>, JsValue> {
    let score: Score = serde_wasm_bindgen::from_value(score)?;
    let track = score.render().map_err(to_js)?;
    track.to_wav_bytes(SampleFormat::Int16).map_err(to_js)
}

/// WASM-exposed: render a JSON score to mono f32 samples in `[-1, 1]`
/// for AudioWorklet playback.
#[wasm_bindgen]
pub fn render_score_samples(source: &str) -> Result<Vec<f32>, JsValue> {
    let track = Score::from_json(source).and_then(|s| s.render()).map_err(to_js)?;
    Ok(codec::quantize::normalize_f32(&track.samples(), track.max_amplitude()))
}
