//! Playback Events
//!
//! Event-based communication for UI synchronization. The controller queues
//! events as it changes state; the host drains them after each call or on
//! its own tick.

use crate::types::PlayerState;
use cadenza_core::{RepeatMode, SinkKind, TrackId};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Controller state changed
    StateChanged {
        /// The new state
        state: PlayerState,
    },

    /// A different track was handed to a sink
    TrackChanged {
        /// ID of the new (current) track
        track_id: TrackId,
        /// ID of the previous track (if any)
        previous_track_id: Option<TrackId>,
        /// Queue index of the new track
        index: usize,
    },

    /// The active sink switched between media element and remote widget
    SinkChanged {
        /// Newly active sink
        kind: SinkKind,
    },

    /// Track finished playing naturally (reached end)
    TrackFinished {
        /// ID of the finished track
        track_id: TrackId,
    },

    /// Queue contents or cursor changed
    QueueChanged {
        /// New queue length
        length: usize,
        /// New cursor
        cursor: Option<usize>,
    },

    /// Shuffle or repeat changed
    ModeChanged {
        /// Shuffle flag
        shuffle: bool,
        /// Repeat mode
        repeat: RepeatMode,
    },

    /// Volume changed
    VolumeChanged {
        /// New volume level (0-100)
        level: u8,
        /// Whether audio is muted
        is_muted: bool,
    },

    /// Playback rate changed
    RateChanged {
        /// New rate
        rate: f64,
    },

    /// A resume position was written to the catalog
    PositionSaved {
        /// Track whose position was saved
        track_id: TrackId,
        /// Saved offset in seconds
        position_seconds: f64,
    },

    /// Recoverable error (load failure, autoplay refusal, storage failure)
    Error {
        /// Error message
        message: String,
    },
}
