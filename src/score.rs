//! Score — a serialisable list of track operations.
//!
//! A score is how non-Rust callers (the browser, notebooks, config files)
//! describe a sonification:
//!
//! ```json
//! {
//!   "track": { "sample_rate": 8000 },
//!   "events": [
//!     { "op": "sine", "pitch": "C4", "duration": 0.5 },
//!     { "op": "cue", "time": 0 },
//!     { "op": "sine", "pitch": 659.25, "duration": 0.5, "amplitude": 0.5 },
//!     { "op": "blank", "duration": 0.25 },
//!     { "op": "repeat", "times": 2 }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TrackConfig;
use crate::error::Result;
use crate::note::Pitch;
use crate::track::Track;

fn default_amplitude() -> f64 {
    Track::DEFAULT_AMPLITUDE
}

/// One track operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScoreEvent {
    Sine {
        pitch: Pitch,
        duration: f64,
        #[serde(default = "default_amplitude")]
        amplitude: f64,
    },
    Blank {
        duration: f64,
    },
    /// Move the write cursor, in seconds.
    Cue {
        time: f64,
    },
    Repeat {
        times: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    #[serde(default)]
    pub track: TrackConfig,
    pub events: Vec<ScoreEvent>,
}

impl Score {
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Build a track by applying the events in order.
    pub fn render(&self) -> Result<Track> {
        let mut track = self.track.build()?;
        for event in &self.events {
            event.apply(&mut track)?;
        }
        debug!(events = self.events.len(), samples = track.len(), "rendered score");
        Ok(track)
    }
}

impl ScoreEvent {
    pub fn apply(&self, track: &mut Track) -> Result<()> {
        match self {
            ScoreEvent::Sine { pitch, duration, amplitude } => {
                track.add_sine_wave(pitch.clone(), *duration, *amplitude)?;
            }
            ScoreEvent::Blank { duration } => {
                track.add_blank(*duration)?;
            }
            ScoreEvent::Cue { time } => {
                track.set_cue_write(*time)?;
            }
            ScoreEvent::Repeat { times } => {
                track.repeat(*times)?;
            }
        }
        Ok(())
    }
}
