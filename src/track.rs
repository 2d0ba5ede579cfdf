//! Track — the sample buffer, its write cursor and the mixing operations.
//!
//! Every `add_*` call mixes its samples additively at `cue_write` and then
//! advances the cursor, so successive calls compose a melody and rewinding
//! the cursor overlays new material onto what is already there.
//!
//! ```
//! use sonouno_core::Track;
//!
//! let mut track = Track::new(8000, 1.0)?;
//! track
//!     .add_sine_wave("A4", 0.5, 0.5)?
//!     .set_cue_write(0.0)?
//!     .add_sine_wave("A5", 0.5, 0.25)?;
//! assert_eq!(track.len(), 4000);
//! # Ok::<(), sonouno_core::SonoError>(())
//! ```

use tracing::trace;

use crate::config::DEFAULT_SAMPLE_RATE;
use crate::dsp::buffer::SampleBuffer;
use crate::dsp::oscillator::{self, MAX_SAMPLES, WaveformSpec};
use crate::error::{Result, SonoError};
use crate::format::MaxAmplitude;
use crate::note::Pitch;

/// Position of the write cursor, in seconds or in samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cue {
    Time(f64),
    Index(usize),
}

impl From<f64> for Cue {
    fn from(seconds: f64) -> Self {
        Cue::Time(seconds)
    }
}

impl From<usize> for Cue {
    fn from(index: usize) -> Self {
        Cue::Index(index)
    }
}

/// Mono audio track at a fixed sampling rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    sample_rate: u32,
    max_amplitude: f64,
    buffer: SampleBuffer,
    cue_write: usize,
}

impl Default for Track {
    fn default() -> Self {
        Track {
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_amplitude: 1.0,
            buffer: SampleBuffer::new(),
            cue_write: 0,
        }
    }
}

impl Track {
    /// Peak of a tone when no amplitude is given, relative to `max_amplitude`.
    pub const DEFAULT_AMPLITUDE: f64 = 1.0;

    pub fn new(sample_rate: u32, max_amplitude: impl Into<MaxAmplitude>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(SonoError::invalid("sample rate must be positive"));
        }
        Ok(Track {
            sample_rate,
            max_amplitude: max_amplitude.into().resolve()?,
            ..Track::default()
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn max_amplitude(&self) -> f64 {
        self.max_amplitude
    }

    /// Logical length in samples, including trailing blanks.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Start time of the next write, in seconds.
    pub fn cue_write(&self) -> f64 {
        self.cue_write as f64 / self.sample_rate as f64
    }

    pub fn cue_write_index(&self) -> usize {
        self.cue_write
    }

    /// All samples, with trailing blanks as zeros.
    pub fn samples(&self) -> Vec<f64> {
        self.buffer.to_vec()
    }

    fn samples_in(&self, seconds: f64, what: &str) -> Result<usize> {
        oscillator::sample_count(seconds, self.sample_rate, what)
    }

    /// Move the write cursor. It may point past the end (a silent gap) or
    /// back into written audio (an overlay).
    pub fn set_cue_write(&mut self, cue: impl Into<Cue>) -> Result<&mut Self> {
        self.cue_write = match cue.into() {
            Cue::Time(seconds) => self.samples_in(seconds, "cue write")?,
            Cue::Index(index) => index,
        };
        Ok(self)
    }

    /// Mix a sine tone at the cursor.
    ///
    /// `amplitude` is relative to `max_amplitude` and is not clamped; values
    /// beyond 1 saturate only when the track is quantized.
    pub fn add_sine_wave(
        &mut self,
        pitch: impl Into<Pitch>,
        duration: f64,
        amplitude: f64,
    ) -> Result<&mut Self> {
        let frequency = pitch.into().resolve()?;
        if !amplitude.is_finite() {
            return Err(SonoError::invalid(format!("amplitude must be finite, got {amplitude}")));
        }
        let spec = WaveformSpec::sine(
            frequency,
            duration,
            amplitude * self.max_amplitude,
            self.sample_rate,
        );
        self.write(&spec.generate()?)?;
        Ok(self)
    }

    /// Advance the cursor by `duration` seconds of silence. Samples already
    /// in that region are kept as they are.
    pub fn add_blank(&mut self, duration: f64) -> Result<&mut Self> {
        let n = WaveformSpec::silence(duration, self.sample_rate).sample_count()?;
        self.cue_write = self.advance(n)?;
        self.buffer.extend_to(self.cue_write);
        Ok(self)
    }

    /// Mix arbitrary samples at the cursor.
    pub fn add_raw_data(&mut self, data: &[f64]) -> Result<&mut Self> {
        if let Some(bad) = data.iter().find(|v| !v.is_finite()) {
            return Err(SonoError::invalid(format!("samples must be finite, got {bad}")));
        }
        self.write(data)?;
        Ok(self)
    }

    /// Mix another track, read from `cue_read` seconds onwards, at the cursor.
    /// Its samples are rescaled to this track's max amplitude.
    pub fn add_track(&mut self, other: &Track, cue_read: f64) -> Result<&mut Self> {
        if self.sample_rate != other.sample_rate {
            return Err(SonoError::invalid(format!(
                "cannot mix tracks with different sampling rates ({} Hz and {} Hz)",
                self.sample_rate, other.sample_rate
            )));
        }
        let mut data = other.get_data(cue_read, None)?;
        if self.max_amplitude != other.max_amplitude {
            let scale = self.max_amplitude / other.max_amplitude;
            data.iter_mut().for_each(|v| *v *= scale);
        }
        self.write(&data)?;
        Ok(self)
    }

    /// Repeat the whole content so it plays `n` times in total. The copies are
    /// appended after the logical end, which is where the cursor is left.
    pub fn repeat(&mut self, n: usize) -> Result<&mut Self> {
        if n < 1 {
            return Err(SonoError::invalid(format!(
                "the number of repeats is less than one: {n}"
            )));
        }
        if n == 1 {
            return Ok(self);
        }
        if self.len().checked_mul(n).is_none_or(|total| total > MAX_SAMPLES) {
            return Err(SonoError::invalid(format!(
                "repeating {} samples {n} times exceeds the longest track",
                self.len()
            )));
        }
        let data = self.samples();
        self.cue_write = self.len();
        for _ in 1..n {
            self.write(&data)?;
        }
        Ok(self)
    }

    /// Copy of the samples from `cue_read` seconds, limited to `duration`
    /// seconds when given.
    pub fn get_data(&self, cue_read: f64, duration: Option<f64>) -> Result<Vec<f64>> {
        let start = self.samples_in(cue_read, "cue read")?;
        let end = match duration {
            Some(d) => start.saturating_add(self.samples_in(d, "duration")?),
            None => self.len(),
        };
        Ok(self.buffer.slice(start, end))
    }

    /// Cursor position `n` samples ahead.
    fn advance(&self, n: usize) -> Result<usize> {
        self.cue_write
            .checked_add(n)
            .filter(|&end| end <= MAX_SAMPLES)
            .ok_or_else(|| {
                SonoError::invalid(format!(
                    "cannot move the cursor {n} samples past index {}",
                    self.cue_write
                ))
            })
    }

    fn write(&mut self, values: &[f64]) -> Result<()> {
        let end = self.advance(values.len())?;
        trace!(offset = self.cue_write, len = values.len(), "mixing samples");
        self.buffer.mix(self.cue_write, values)?;
        self.cue_write = end;
        self.buffer.extend_to(end);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
        }
    }

    #[test]
    fn track_init() {
        let track = Track::default();
        assert_eq!(track.sample_rate(), 44_100);
        assert_eq!(track.max_amplitude(), 1.0);
        assert_eq!(track.duration(), 0.0);
        assert_eq!(track.cue_write(), 0.0);
        assert!(track.is_empty());
        assert!(track.samples().is_empty());
    }

    #[test]
    fn track_init_max_amplitude() {
        assert_eq!(Track::new(44_100, "int16").unwrap().max_amplitude(), 32767.0);
        assert_eq!(Track::new(44_100, 14.0).unwrap().max_amplitude(), 14.0);
        let err = Track::new(44_100, "unknown type").unwrap_err();
        assert!(err.to_string().contains("cannot be inferred"));
        assert!(Track::new(0, 1.0).is_err());
    }

    #[test]
    fn set_cue_write_inside() {
        let mut track = Track::new(4, 1.0).unwrap();
        track.add_raw_data(&[1.0; 4]).unwrap();
        track.set_cue_write(0.25).unwrap().add_raw_data(&[2.0, 2.0]).unwrap();
        assert_close(&track.samples(), &[1.0, 3.0, 3.0, 1.0]);
        assert_eq!(track.cue_write_index(), 3);
        assert_eq!(track.len(), 4);
    }

    #[test]
    fn set_cue_write_extend() {
        let mut track = Track::new(4, 1.0).unwrap();
        track.add_raw_data(&[1.0; 4]).unwrap();
        track.set_cue_write(0.75).unwrap().add_raw_data(&[2.0, 2.0]).unwrap();
        assert_close(&track.samples(), &[1.0, 1.0, 1.0, 3.0, 2.0]);
        assert_eq!(track.cue_write_index(), 5);
        assert_eq!(track.len(), 5);
    }

    #[test]
    fn set_cue_write_by_index_past_end() {
        let mut track = Track::new(4, 1.0).unwrap();
        track.set_cue_write(6usize).unwrap().add_raw_data(&[1.0]).unwrap();
        assert_close(&track.samples(), &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn set_cue_write_negative() {
        let mut track = Track::default();
        let err = track.set_cue_write(-1.0).unwrap_err();
        assert!(matches!(err, SonoError::InvalidParameter(_)));
        assert!(err.to_string().contains("negative cue write value"));
    }

    #[test]
    fn add_blank_is_a_cursor_advance() {
        let mut track = Track::new(2, 1.0).unwrap();
        track.add_blank(2.0).unwrap();
        assert_close(&track.samples(), &[0.0; 4]);
        assert_eq!(track.buffer.allocated(), 0);
        assert_eq!(track.cue_write_index(), 4);
    }

    #[test]
    fn add_blank_keeps_existing_audio() {
        let mut track = Track::new(4, 1.0).unwrap();
        track.add_raw_data(&[1.0, -1.0, 0.5, -0.5]).unwrap();
        let before = track.samples();
        for d in [0.0, 0.25, 0.5, 1.0] {
            let cue = track.cue_write_index();
            track.set_cue_write(0.0).unwrap().add_blank(d).unwrap();
            assert_eq!(track.cue_write_index(), (d * 4.0).round() as usize);
            assert_eq!(track.samples(), before);
            track.set_cue_write(cue).unwrap();
        }
    }

    #[test]
    fn add_after_blank() {
        let mut track = Track::new(2, 1.0).unwrap();
        track.add_blank(2.0).unwrap().add_raw_data(&[1.0, -1.0]).unwrap();
        assert_close(&track.samples(), &[0.0, 0.0, 0.0, 0.0, 1.0, -1.0]);
    }

    #[test]
    fn zero_duration_is_a_noop() {
        let mut track = Track::new(8000, 1.0).unwrap();
        track.add_sine_wave(440.0, 0.0, 1.0).unwrap().add_blank(0.0).unwrap();
        assert_eq!(track.cue_write_index(), 0);
        assert!(track.is_empty());
    }

    #[test]
    fn invalid_parameters() {
        let mut track = Track::new(8000, 1.0).unwrap();
        assert!(matches!(track.add_sine_wave(440.0, -1.0, 1.0), Err(SonoError::InvalidParameter(_))));
        assert!(matches!(track.add_sine_wave(0.0, 1.0, 1.0), Err(SonoError::InvalidParameter(_))));
        assert!(matches!(track.add_sine_wave(-440.0, 1.0, 1.0), Err(SonoError::InvalidParameter(_))));
        assert!(matches!(track.add_sine_wave(440.0, 1.0, f64::NAN), Err(SonoError::InvalidParameter(_))));
        assert!(matches!(track.add_sine_wave("H2", 1.0, 1.0), Err(SonoError::InvalidPitchName(_))));
        assert!(matches!(track.add_blank(-0.5), Err(SonoError::InvalidParameter(_))));
        assert!(matches!(track.add_raw_data(&[1.0, f64::INFINITY]), Err(SonoError::InvalidParameter(_))));
        assert!(track.is_empty());
        assert_eq!(track.cue_write_index(), 0);
    }

    #[test]
    fn add_sine_wave() {
        let mut track = Track::new(4, 1.0).unwrap();
        track.add_sine_wave(1.0, 1.0, 1.0).unwrap();
        assert_close(&track.samples(), &[0.0, 1.0, 0.0, -1.0]);
    }

    #[test]
    fn add_sine_wave_max_amplitude() {
        let mut track = Track::new(4, 2.0).unwrap();
        track.add_sine_wave(1.0, 1.0, 1.0).unwrap();
        assert_close(&track.samples(), &[0.0, 2.0, 0.0, -2.0]);
    }

    #[test]
    fn amplitude_beyond_max_is_not_clamped() {
        let mut track = Track::new(4, 2.0).unwrap();
        track.add_sine_wave(1.0, 1.0, 1.5).unwrap();
        assert_close(&track.samples(), &[0.0, 3.0, 0.0, -3.0]);
    }

    #[test]
    fn a440_at_8000_hz() {
        let mut track = Track::new(8000, 1.0).unwrap();
        track.add_sine_wave(440.0, 1.0, 1.0).unwrap();
        let samples = track.samples();
        assert_eq!(samples.len(), 8000);
        assert!(samples[0].abs() < 1e-12);
        let quarter = 8000 / 440 / 4;
        let peak = samples[quarter].max(samples[quarter + 1]);
        assert!((peak - 1.0).abs() < 0.02, "quarter period sample {peak}");
    }

    #[test]
    fn chained_melody_appends() {
        let mut track = Track::new(100, 1.0).unwrap();
        track
            .add_sine_wave("C4", 0.5, 0.5)
            .unwrap()
            .add_blank(0.25)
            .unwrap()
            .add_sine_wave("E4", 0.5, 0.5)
            .unwrap();
        assert_eq!(track.len(), 125);
        assert_eq!(track.cue_write_index(), 125);
        assert!((track.duration() - 1.25).abs() < 1e-12);
        assert!((track.cue_write() - 1.25).abs() < 1e-12);
    }

    #[test]
    fn length_is_max_extent_of_writes() {
        let mut track = Track::new(10, 1.0).unwrap();
        track.add_sine_wave(1.0, 1.0, 1.0).unwrap();
        track.set_cue_write(3.0).unwrap().add_sine_wave(2.0, 0.5, 1.0).unwrap();
        track.set_cue_write(2.0).unwrap().add_blank(0.2).unwrap();
        assert_eq!(track.len(), 35);
        track.set_cue_write(5.0).unwrap().add_blank(0.4).unwrap();
        assert_eq!(track.len(), 54);
    }

    #[test]
    fn opposite_phase_overlay_cancels() {
        let mut track = Track::new(8000, 1.0).unwrap();
        track
            .add_sine_wave("A4", 0.5, 0.8)
            .unwrap()
            .set_cue_write(0.0)
            .unwrap()
            .add_sine_wave("A4", 0.5, -0.8)
            .unwrap();
        assert_eq!(track.len(), 4000);
        assert!(track.samples().iter().all(|s| s.abs() < 1e-12));
    }

    #[test]
    fn overlay_is_the_sum_of_both_waves() {
        let rate = 1000;
        let mut a = Track::new(rate, 1.0).unwrap();
        a.add_sine_wave(50.0, 0.2, 0.5).unwrap();
        let mut b = Track::new(rate, 1.0).unwrap();
        b.add_sine_wave(120.0, 0.1, 0.3).unwrap();

        let mut mixed = Track::new(rate, 1.0).unwrap();
        mixed
            .add_sine_wave(50.0, 0.2, 0.5)
            .unwrap()
            .set_cue_write(0.05)
            .unwrap()
            .add_sine_wave(120.0, 0.1, 0.3)
            .unwrap();

        let (sa, sb, sm) = (a.samples(), b.samples(), mixed.samples());
        for (i, &m) in sm.iter().enumerate() {
            let expected = sa[i] + if (50..150).contains(&i) { sb[i - 50] } else { 0.0 };
            assert!((m - expected).abs() < 1e-12, "sample {i}");
        }
    }

    #[test]
    fn add_track_extend() {
        let mut sound = Track::new(2, 1.0).unwrap();
        sound.add_raw_data(&[1.0, -1.0]).unwrap();
        assert_eq!(sound.duration(), 1.0);
        assert_eq!(sound.cue_write(), 1.0);

        let mut track = Track::new(2, 1.0).unwrap();
        track.add_track(&sound, 0.0).unwrap();
        assert_close(&track.samples(), &[1.0, -1.0]);
        track.add_track(&sound, 0.0).unwrap();
        assert_close(&track.samples(), &[1.0, -1.0, 1.0, -1.0]);
        track.add_blank(1.0).unwrap().add_blank(1.0).unwrap();
        assert_close(&track.samples(), &[1.0, -1.0, 1.0, -1.0, 0.0, 0.0, 0.0, 0.0]);
        track.add_track(&sound, 0.0).unwrap();
        assert_close(&track.samples(), &[1.0, -1.0, 1.0, -1.0, 0.0, 0.0, 0.0, 0.0, 1.0, -1.0]);
        assert_eq!(track.cue_write_index(), 10);
        assert_eq!(sound.cue_write_index(), 2);
    }

    #[test]
    fn add_track_from_cue_read() {
        let mut sound = Track::new(2, 1.0).unwrap();
        sound.add_raw_data(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut track = Track::new(2, 1.0).unwrap();
        track.add_track(&sound, 1.0).unwrap();
        assert_close(&track.samples(), &[3.0, 4.0]);
    }

    #[test]
    fn add_track_incompatible_rate() {
        let mut track = Track::new(2, 1.0).unwrap();
        let other = Track::new(4, 1.0).unwrap();
        let err = track.add_track(&other, 0.0).unwrap_err();
        assert!(err.to_string().contains("different sampling rates"));
    }

    #[test]
    fn add_track_different_max_amplitude() {
        let mut track = Track::new(2, 1.0).unwrap();
        let mut other = Track::new(2, 10.0).unwrap();
        other.add_raw_data(&[10.0, -10.0]).unwrap();
        track.add_track(&other, 0.0).unwrap();
        assert_close(&track.samples(), &[1.0, -1.0]);
    }

    #[test]
    fn repeat() {
        for n in 1..=3 {
            let mut track = Track::new(100, 1.0).unwrap();
            track.add_sine_wave(440.0, 0.1, 1.0).unwrap();
            let data = track.samples();
            track.repeat(n).unwrap();
            let repeated = track.samples();
            assert_eq!(repeated.len(), n * data.len());
            for chunk in repeated.chunks(data.len()) {
                assert_eq!(chunk, &data[..]);
            }
        }
    }

    #[test]
    fn repeat_from_rewound_cursor_appends() {
        let mut track = Track::new(2, 1.0).unwrap();
        track.add_raw_data(&[1.0, 2.0]).unwrap().set_cue_write(0.0).unwrap();
        track.repeat(2).unwrap();
        assert_close(&track.samples(), &[1.0, 2.0, 1.0, 2.0]);
        assert_eq!(track.cue_write_index(), 4);
    }

    #[test]
    fn repeat_empty_and_invalid() {
        let mut track = Track::default();
        track.repeat(3).unwrap();
        assert!(track.is_empty());
        let err = track.repeat(0).unwrap_err();
        assert!(err.to_string().contains("less than one"));
    }

    #[test]
    fn get_data_window() {
        let mut track = Track::new(4, 1.0).unwrap();
        track.add_raw_data(&[1.0, 2.0, 3.0, 4.0]).unwrap().add_blank(0.5).unwrap();
        assert_close(&track.get_data(0.5, None).unwrap(), &[3.0, 4.0, 0.0, 0.0]);
        assert_close(&track.get_data(0.25, Some(0.5)).unwrap(), &[2.0, 3.0]);
        assert_close(&track.get_data(1.0, Some(10.0)).unwrap(), &[0.0, 0.0]);
        assert!(track.get_data(5.0, None).unwrap().is_empty());
        let err = track.get_data(-1.0, None).unwrap_err();
        assert!(err.to_string().contains("negative cue read value"));
        assert!(track.get_data(0.0, Some(-1.0)).is_err());
    }

    #[test]
    fn huge_durations_are_rejected() {
        let mut track = Track::new(44_100, 1.0).unwrap();
        let err = track.add_blank(1e30).unwrap_err();
        assert!(matches!(err, SonoError::InvalidParameter(_)));
        assert!(track.add_sine_wave(440.0, 1e15, 1.0).is_err());
        assert!(track.set_cue_write(1e30).is_err());
        assert!(track.get_data(0.0, Some(1e30)).is_err());
        assert!(track.is_empty());
        assert_eq!(track.cue_write_index(), 0);
    }

    #[test]
    fn cursor_overflow_is_an_error() {
        let mut track = Track::new(44_100, 1.0).unwrap();
        track.add_blank(2e13).unwrap();
        let cue = track.cue_write_index();
        let err = track.add_blank(2e13).unwrap_err();
        assert!(matches!(err, SonoError::InvalidParameter(_)));
        assert_eq!(track.cue_write_index(), cue);

        track.set_cue_write(usize::MAX).unwrap();
        let err = track.add_raw_data(&[1.0]).unwrap_err();
        assert!(matches!(err, SonoError::InvalidParameter(_)));
        assert_eq!(track.len(), cue);
    }

    #[test]
    fn oversized_repeat_is_an_error() {
        let mut track = Track::new(4, 1.0).unwrap();
        track.add_raw_data(&[1.0, 2.0]).unwrap();
        assert!(track.repeat(usize::MAX).is_err());
        assert_eq!(track.len(), 2);
    }

    #[test]
    fn non_finite_positions_have_their_own_message() {
        let mut track = Track::default();
        let err = track.add_blank(f64::NAN).unwrap_err();
        assert!(err.to_string().contains("duration must be finite"));
        let err = track.set_cue_write(f64::INFINITY).unwrap_err();
        assert!(err.to_string().contains("cue write must be finite"));
    }
}
