//! Track configuration, deserializable from JSON.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::format::MaxAmplitude;
use crate::track::Track;

/// Default sampling rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

/// Construction parameters of a [`Track`].
///
/// ```json
/// { "sample_rate": 8000, "max_amplitude": "int16" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default)]
    pub max_amplitude: MaxAmplitude,
}

impl Default for TrackConfig {
    fn default() -> Self {
        TrackConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_amplitude: MaxAmplitude::default(),
        }
    }
}

impl TrackConfig {
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Create an empty track with these settings.
    pub fn build(&self) -> Result<Track> {
        Track::new(self.sample_rate, self.max_amplitude.clone())
    }
}
