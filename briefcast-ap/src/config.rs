//! Player configuration
//!
//! Tunable parameters with compiled defaults, overridable from the TOML
//! config file resolved by `briefcast_common::config`.

use crate::error::Result;
use serde::Deserialize;

/// Playback tunables
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Live manifest poll cadence in milliseconds
    pub manifest_poll_interval_ms: u64,

    /// Topic feed poll cadence in milliseconds
    pub feed_poll_interval_ms: u64,

    /// Forward buffer from "now" for newly scheduled segments, in seconds.
    /// Guarantees the decode+schedule round trip completes before the
    /// audio engine needs the first sample.
    pub pre_buffer_seconds: f64,

    /// Crossfade window in seconds (fade-in length = fade-out length =
    /// segment overlap)
    pub crossfade_seconds: f64,

    /// Per-request timeout for manifest, segment, feed, and track fetches
    pub fetch_timeout_seconds: u64,

    /// Audio output device name (None = platform default)
    pub audio_device: Option<String>,

    /// Ring buffer capacity in frames between mixer and audio callback
    pub ring_buffer_frames: usize,

    /// Progress event cadence in milliseconds (on-demand path)
    pub progress_interval_ms: u64,

    /// Event bus channel capacity
    pub event_capacity: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            manifest_poll_interval_ms: 500,
            feed_poll_interval_ms: 1000,
            pre_buffer_seconds: 0.5,
            crossfade_seconds: 0.03,
            fetch_timeout_seconds: 10,
            audio_device: None,
            ring_buffer_frames: 4096,
            progress_interval_ms: 1000,
            event_capacity: 1000,
        }
    }
}

impl PlayerConfig {
    /// Load configuration, merging the platform config file over defaults
    /// when one exists.
    pub fn load() -> Result<Self> {
        if let Some(path) = briefcast_common::config::config_file_path() {
            if path.exists() {
                let config: PlayerConfig = briefcast_common::config::load_toml_file(&path)
                    .map_err(|e| crate::error::Error::Config(e.to_string()))?;
                return Ok(config);
            }
        }
        Ok(Self::default())
    }

    /// Crossfade window, clamped to sane bounds (1 ms ..= 1 s)
    pub fn crossfade_window(&self) -> f64 {
        self.crossfade_seconds.clamp(0.001, 1.0)
    }
}
