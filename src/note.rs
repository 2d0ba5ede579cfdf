//! Note Resolver — scientific pitch notation to frequency.
//!
//! Twelve-tone equal temperament referenced to A4 (MIDI 69). Names follow
//! `[A-G][#b]?-?\d+`, so `C-1` is MIDI 0 and `B#4` is the same pitch as `C5`.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SonoError};

/// Concert pitch: frequency of A4 in Hz.
pub const CONCERT_PITCH: f64 = 440.0;

/// Parse a note name (e.g. "C4", "F#3", "Bb5") into a MIDI note number.
pub fn note_to_midi(note: &str) -> Option<i32> {
    let bytes = note.as_bytes();
    let (&name, rest) = bytes.split_first()?;

    let mut semitone = match name {
        b'C' => 0,
        b'D' => 2,
        b'E' => 4,
        b'F' => 5,
        b'G' => 7,
        b'A' => 9,
        b'B' => 11,
        _ => return None,
    };

    let rest = match rest.first() {
        Some(b'#') => {
            semitone += 1;
            &rest[1..]
        }
        Some(b'b') => {
            semitone -= 1;
            &rest[1..]
        }
        _ => rest,
    };

    let digits = rest.strip_prefix(b"-").unwrap_or(rest);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    // Both slices are ASCII at this point.
    let octave: i32 = std::str::from_utf8(rest).ok()?.parse().ok()?;

    // MIDI note number: C4 = 60
    octave.checked_add(1)?.checked_mul(12)?.checked_add(semitone)
}

/// Convert a MIDI note number to frequency using the given tuning pitch.
///
/// `tuning_pitch` is the frequency of A4 (MIDI 69).
/// Formula: `tuning_pitch * 2^((midi - 69) / 12)`
pub fn midi_to_frequency(midi: i32, tuning_pitch: f64) -> f64 {
    tuning_pitch * 2.0_f64.powf((midi as f64 - 69.0) / 12.0)
}

/// Resolve a note name against A4 = 440 Hz.
pub fn note_to_frequency(note: &str) -> Result<f64> {
    note_to_frequency_with_tuning(note, CONCERT_PITCH)
}

/// Resolve a note name against a custom A4 reference (e.g. 432 Hz).
pub fn note_to_frequency_with_tuning(note: &str, tuning_pitch: f64) -> Result<f64> {
    let midi = note_to_midi(note).ok_or_else(|| SonoError::InvalidPitchName(note.to_string()))?;
    Ok(midi_to_frequency(midi, tuning_pitch))
}

/// Pitch argument of a tone: a frequency in Hz or a note name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pitch {
    Frequency(f64),
    Name(String),
}

impl Pitch {
    /// Resolve to a strictly positive, finite frequency in Hz.
    pub fn resolve(&self) -> Result<f64> {
        let frequency = match self {
            Pitch::Frequency(hz) => *hz,
            Pitch::Name(name) => note_to_frequency(name)?,
        };
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(SonoError::invalid(format!(
                "frequency must be positive, got {frequency}"
            )));
        }
        Ok(frequency)
    }
}

impl From<f64> for Pitch {
    fn from(hz: f64) -> Self {
        Pitch::Frequency(hz)
    }
}

impl From<&str> for Pitch {
    fn from(name: &str) -> Self {
        Pitch::Name(name.to_string())
    }
}

impl From<String> for Pitch {
    fn from(name: String) -> Self {
        Pitch::Name(name)
    }
}
