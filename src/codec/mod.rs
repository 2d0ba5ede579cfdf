//! Codec — WAV import and export for tracks.
//!
//! Exports are mono. Integer formats go through [`quantize`], which
//! saturates samples that exceed the track's max amplitude. Imports accept
//! mono integer PCM at any bit depth hound reads, and 32-bit float.

pub mod quantize;
pub mod remote;

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Result, SonoError};
use crate::format::{MaxAmplitude, SampleFormat};
use crate::track::Track;

/// Write `track` as a mono WAV stream.
pub fn write_wav<W: Write + Seek>(writer: W, track: &Track, format: SampleFormat) -> Result<()> {
    let samples = track.samples();
    let max = track.max_amplitude();
    let mut wav = hound::WavWriter::new(writer, format.wav_spec(track.sample_rate()))?;
    match format {
        SampleFormat::Int16 => {
            for s in quantize::quantize_i16(&samples, max) {
                wav.write_sample(s)?;
            }
        }
        SampleFormat::Int32 => {
            for s in quantize::quantize_i32(&samples, max) {
                wav.write_sample(s)?;
            }
        }
        SampleFormat::Float32 => {
            for s in quantize::normalize_f32(&samples, max) {
                wav.write_sample(s)?;
            }
        }
    }
    wav.finalize()?;
    Ok(())
}

/// Read a mono WAV stream into a new track whose cursor sits at the end.
pub fn read_wav<R: Read>(reader: R, max_amplitude: impl Into<MaxAmplitude>) -> Result<Track> {
    let wav = hound::WavReader::new(reader)?;
    let spec = wav.spec();
    if spec.channels != 1 {
        return Err(SonoError::UnsupportedFormat(format!(
            "expected a mono stream, found {} channels",
            spec.channels
        )));
    }

    let mut track = Track::new(spec.sample_rate, max_amplitude)?;
    let max = track.max_amplitude();
    let data: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Int => {
            if !(1..=32).contains(&spec.bits_per_sample) {
                return Err(SonoError::UnsupportedFormat(format!(
                    "unsupported bit depth {}",
                    spec.bits_per_sample
                )));
            }
            let full_scale = ((1u64 << (spec.bits_per_sample - 1)) - 1) as f64;
            wav.into_samples::<i32>()
                .map(|s| s.map(|v| v as f64 / full_scale * max))
                .collect::<std::result::Result<_, _>>()?
        }
        hound::SampleFormat::Float => wav
            .into_samples::<f32>()
            .map(|s| s.map(|v| v as f64 * max))
            .collect::<std::result::Result<_, _>>()?,
    };
    debug!(
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        samples = data.len(),
        "decoded WAV stream"
    );
    track.add_raw_data(&data)?;
    Ok(track)
}

/// Load a track from a file path or an `http(s)://` URL.
pub fn load(source: &str, max_amplitude: impl Into<MaxAmplitude>) -> Result<Track> {
    if remote::is_remote(source) {
        let bytes = remote::fetch(source)?;
        return read_wav(Cursor::new(bytes), max_amplitude);
    }
    debug!(path = source, "loading WAV file");
    let file = File::open(source)?;
    read_wav(BufReader::new(file), max_amplitude)
}

impl Track {
    /// Load a WAV file or URL. Samples are rescaled from the file's full
    /// scale to `max_amplitude`, and the cursor is left at the end so later
    /// writes append.
    pub fn load(source: &str, max_amplitude: impl Into<MaxAmplitude>) -> Result<Track> {
        load(source, max_amplitude)
    }

    pub fn from_wav_reader<R: Read>(reader: R, max_amplitude: impl Into<MaxAmplitude>) -> Result<Track> {
        read_wav(reader, max_amplitude)
    }

    pub fn from_wav_bytes(bytes: &[u8], max_amplitude: impl Into<MaxAmplitude>) -> Result<Track> {
        read_wav(Cursor::new(bytes), max_amplitude)
    }

    /// Write the track to a WAV file.
    pub fn export(&self, path: impl AsRef<Path>, format: SampleFormat) -> Result<()> {
        let path = path.as_ref();
        debug!(path = %path.display(), %format, samples = self.len(), "exporting track");
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        write_wav(&mut writer, self, format)?;
        writer.flush()?;
        Ok(())
    }

    /// Encode the track as WAV bytes.
    pub fn to_wav_bytes(&self, format: SampleFormat) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        write_wav(Cursor::new(&mut bytes), self, format)?;
        Ok(bytes)
    }
}
