//! Playback dispatch.
//!
//! A [`Track`] only knows how to render itself to 16-bit PCM. Choosing where
//! that PCM goes (an audio device, a notebook widget, a browser blob) is the
//! job of a [`Dispatcher`] holding an ordered list of [`Sink`]s; the first
//! available one wins.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::codec::quantize;
use crate::error::{Result, SonoError};
use crate::format::SampleFormat;
use crate::track::Track;

/// Quantized mono audio handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pcm {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl Pcm {
    /// Encode as a mono 16-bit WAV file.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let mut writer = hound::WavWriter::new(
            std::io::Cursor::new(&mut bytes),
            SampleFormat::Int16.wav_spec(self.sample_rate),
        )?;
        for &s in &self.samples {
            writer.write_sample(s)?;
        }
        writer.finalize()?;
        Ok(bytes)
    }
}

impl Track {
    /// Quantize the whole track to 16-bit PCM, saturating on overflow.
    pub fn render(&self) -> Pcm {
        Pcm {
            sample_rate: self.sample_rate(),
            samples: quantize::quantize_i16(&self.samples(), self.max_amplitude()),
        }
    }

    /// Quantize `duration` seconds (or everything) from `cue_read`.
    pub fn render_window(&self, cue_read: f64, duration: Option<f64>) -> Result<Pcm> {
        let data = self.get_data(cue_read, duration)?;
        Ok(Pcm {
            sample_rate: self.sample_rate(),
            samples: quantize::quantize_i16(&data, self.max_amplitude()),
        })
    }
}

/// An audio output.
pub trait Sink {
    fn name(&self) -> &'static str;

    /// Whether the sink can play in the current environment.
    fn is_available(&self) -> bool {
        true
    }

    fn play(&mut self, pcm: &Pcm) -> Result<()>;
}

/// Encodes the audio as a `data:audio/wav;base64,…` URL, the form a
/// browser `<audio>` element or a notebook widget can load directly.
#[derive(Debug, Default)]
pub struct DataUrlSink {
    url: Option<String>,
}

impl DataUrlSink {
    pub fn new() -> Self {
        DataUrlSink::default()
    }

    /// URL of the last played audio.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn take_url(&mut self) -> Option<String> {
        self.url.take()
    }
}

impl Sink for DataUrlSink {
    fn name(&self) -> &'static str {
        "data-url"
    }

    fn play(&mut self, pcm: &Pcm) -> Result<()> {
        let wav = pcm.to_wav_bytes()?;
        self.url = Some(format!("data:audio/wav;base64,{}", STANDARD.encode(wav)));
        Ok(())
    }
}

/// Ordered set of sinks; plays through the first available one.
#[derive(Default)]
pub struct Dispatcher {
    sinks: Vec<Box<dyn Sink>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher::default()
    }

    /// The sinks compiled into this build, native device first.
    pub fn with_default_sinks() -> Self {
        let dispatcher = Dispatcher::new();
        #[cfg(feature = "native")]
        let dispatcher = dispatcher.with_sink(device::DeviceSink::new());
        dispatcher
    }

    pub fn with_sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn push(&mut self, sink: Box<dyn Sink>) {
        self.sinks.push(sink);
    }

    /// First sink that reports itself available.
    pub fn select(&mut self) -> Result<&mut dyn Sink> {
        let tried: Vec<&'static str> = self.sinks.iter().map(|s| s.name()).collect();
        match self.sinks.iter_mut().find(|s| s.is_available()) {
            Some(sink) => {
                debug!(sink = sink.name(), "selected playback sink");
                Ok(sink.as_mut())
            }
            None if tried.is_empty() => Err(SonoError::BackendUnavailable(
                "no playback sink is registered".to_string(),
            )),
            None => Err(SonoError::BackendUnavailable(format!(
                "none of the sinks is available: {}",
                tried.join(", ")
            ))),
        }
    }

    /// Render `track` from `cue_read` and play it. Returns the sink used.
    pub fn play(&mut self, track: &Track, cue_read: f64, duration: Option<f64>) -> Result<&'static str> {
        let pcm = track.render_window(cue_read, duration)?;
        let sink = self.select()?;
        sink.play(&pcm)?;
        Ok(sink.name())
    }
}

#[cfg(feature = "native")]
pub mod device {
    //! Native output through the default cpal device.

    use std::sync::mpsc;
    use std::time::Duration;

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{SampleRate, SupportedBufferSize, SupportedStreamConfig, SupportedStreamConfigRange};
    use tracing::{debug, error};

    use super::{Pcm, Sink};
    use crate::error::{Result, SonoError};

    fn device_error(context: &str, e: impl std::fmt::Display) -> SonoError {
        SonoError::BackendUnavailable(format!("{context}: {e}"))
    }

    /// First range that can run at `sample_rate`, preferring f32 over i16.
    fn select_output_config(
        ranges: impl IntoIterator<Item = SupportedStreamConfigRange>,
        sample_rate: u32,
    ) -> Option<SupportedStreamConfig> {
        let usable: Vec<_> = ranges
            .into_iter()
            .filter(|range| {
                range.min_sample_rate().0 <= sample_rate && sample_rate <= range.max_sample_rate().0
            })
            .collect();
        [cpal::SampleFormat::F32, cpal::SampleFormat::I16]
            .into_iter()
            .find_map(|format| usable.iter().find(|range| range.sample_format() == format))
            .map(|range| range.clone().with_sample_rate(SampleRate(sample_rate)))
    }

    /// Plays on the default output device at the track's own rate and blocks
    /// until the audio ends.
    #[derive(Debug, Default)]
    pub struct DeviceSink;

    impl DeviceSink {
        pub fn new() -> Self {
            DeviceSink
        }
    }

    impl Sink for DeviceSink {
        fn name(&self) -> &'static str {
            "device"
        }

        fn is_available(&self) -> bool {
            cpal::default_host().default_output_device().is_some()
        }

        fn play(&mut self, pcm: &Pcm) -> Result<()> {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or_else(|| SonoError::BackendUnavailable("There is no output device available.".into()))?;
            let ranges = device
                .supported_output_configs()
                .map_err(|e| device_error("failed to query output configs", e))?;
            let config = select_output_config(ranges, pcm.sample_rate).ok_or_else(|| {
                SonoError::BackendUnavailable(format!(
                    "the output device cannot play at {} Hz",
                    pcm.sample_rate
                ))
            })?;
            let channels = config.channels() as usize;
            debug!(rate = pcm.sample_rate, channels, format = ?config.sample_format(), "opening output stream");

            let samples: Vec<f32> = pcm.samples.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
            let total = samples.len();
            let (done_tx, done_rx) = mpsc::channel();
            let mut position = 0usize;

            let stream = match config.sample_format() {
                cpal::SampleFormat::F32 => device.build_output_stream(
                    &config.into(),
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        for frame in data.chunks_mut(channels) {
                            let value = samples.get(position).copied().unwrap_or(0.0);
                            frame.fill(value);
                            position += 1;
                        }
                        if position >= total {
                            let _ = done_tx.send(());
                        }
                    },
                    |err| error!("Audio stream error: {}", err),
                    None,
                ),
                cpal::SampleFormat::I16 => {
                    let pcm_samples = pcm.samples.clone();
                    device.build_output_stream(
                        &config.into(),
                        move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                            for frame in data.chunks_mut(channels) {
                                let value = pcm_samples.get(position).copied().unwrap_or(0);
                                frame.fill(value);
                                position += 1;
                            }
                            if position >= total {
                                let _ = done_tx.send(());
                            }
                        },
                        |err| error!("Audio stream error: {}", err),
                        None,
                    )
                }
                other => {
                    return Err(SonoError::BackendUnavailable(format!(
                        "unsupported device sample format: {other:?}"
                    )));
                }
            }
            .map_err(|e| device_error("failed to build audio stream", e))?;

            stream.play().map_err(|e| device_error("failed to play audio stream", e))?;
            debug!(samples = total, "device playback started");

            let expected = Duration::from_secs_f64(total as f64 / pcm.sample_rate.max(1) as f64);
            // A stalled device never drains the buffer; give up after twice the length.
            let _ = done_rx.recv_timeout(expected * 2 + Duration::from_millis(500));
            Ok(())
        }
    }

}
