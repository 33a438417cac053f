//! Core types for playback management

use cadenza_core::RepeatMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    /// Nothing is playing (initial state, after stop, or after the queue ran out)
    #[default]
    Idle,

    /// A track was handed to a sink and playback was requested
    Loading,

    /// The sink reported that media is playing
    Playing,

    /// Loaded but paused (user pause or refused autoplay)
    Paused,
}

/// Result of a load request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The track was loaded and playback requested
    Started,

    /// The track was loaded but left paused; the user paused while it was
    /// still loading
    Held,

    /// A newer load request arrived while this one was in flight
    Superseded,

    /// The queue has nothing to advance to; playback stopped
    Stopped,

    /// The current track was restarted instead of moving back
    Restarted,

    /// The request referenced an index or track that no longer exists
    Ignored,
}

/// Configuration for the playback controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Maximum recently-played history size (default: 50)
    pub history_size: usize,

    /// Initial volume (0-100, default: 80)
    pub volume: u8,

    /// Initial shuffle flag (default: false)
    pub shuffle: bool,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Initial playback rate (default: 1.0)
    pub playback_rate: f64,

    /// Start playing when the first entry is added to an empty queue (default: true)
    pub autoplay_on_first_add: bool,

    /// Delay before a session snapshot is written (default: 500 ms)
    pub session_debounce_ms: u64,

    /// Minimum interval between resume-position writes (default: 5000 ms)
    pub position_save_interval_ms: u64,

    /// When set, "previous" restarts the current track if it has played
    /// for longer than this many seconds (default: disabled)
    pub prev_restart_threshold_secs: Option<f64>,
}

impl PlaybackConfig {
    /// Session debounce delay
    pub fn session_debounce(&self) -> Duration {
        Duration::from_millis(self.session_debounce_ms)
    }

    /// Resume position write interval
    pub fn position_save_interval(&self) -> Duration {
        Duration::from_millis(self.position_save_interval_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            history_size: 50,
            volume: 80,
            shuffle: false,
            repeat: RepeatMode::Off,
            playback_rate: 1.0,
            autoplay_on_first_add: true,
            session_debounce_ms: 500,
            position_save_interval_ms: 5000,
            prev_restart_threshold_secs: None,
        }
    }
}
