/// Core traits for Cadenza
///
/// `MediaSink` and `RemoteVideoWidget` are the host-shaped capabilities the
/// embedding environment provides. The playback controller never talks to
/// them directly; it drives the uniform [`Sink`] contract, which adapters in
/// `cadenza-playback` implement on top of the host capabilities.
use crate::error::Result;
use crate::types::BlobRef;
use serde::{Deserialize, Serialize};

/// Host media element (audio/video tag or equivalent)
///
/// Notifications (`playing`, `paused`, `ended`, `timeupdate`, `error`) are
/// delivered to the controller by the host as [`SinkEvent`]s while listening
/// is enabled.
pub trait MediaSink: Send {
    /// Register binary content and return a URL the element can load
    ///
    /// # Errors
    /// Returns an error if the host cannot allocate a handle for the content
    fn create_object_url(&mut self, bytes: &[u8], mime: Option<&str>) -> Result<String>;

    /// Release a URL previously returned by `create_object_url`
    fn revoke_object_url(&mut self, url: &str);

    /// Set (or clear) the element source
    ///
    /// # Errors
    /// Returns an error if the element rejects the source
    fn set_source(&mut self, url: Option<&str>) -> Result<()>;

    /// Start playback
    ///
    /// # Errors
    /// Returns an error if the host refuses to start (e.g. autoplay policy)
    fn play(&mut self) -> Result<()>;

    /// Pause playback
    fn pause(&mut self);

    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Seek to a position in seconds
    fn set_current_time(&mut self, seconds: f64);

    /// Media duration in seconds, `None` (or non-finite) until metadata loads
    fn duration(&self) -> Option<f64>;

    /// Set output volume (0.0 - 1.0)
    fn set_volume(&mut self, volume: f64);

    /// Set playback rate (1.0 = normal speed)
    fn set_playback_rate(&mut self, rate: f64);

    /// Enable or disable delivery of notifications to the controller
    fn set_listening(&mut self, enabled: bool);
}

/// Third-party remote video widget (e.g. an embedded YouTube player)
pub trait RemoteVideoWidget: Send {
    /// Load a video by its remote-service id
    ///
    /// # Errors
    /// Returns an error if the widget cannot be created or rejects the id
    fn load(&mut self, video_id: &str) -> Result<()>;

    /// Start playback
    ///
    /// # Errors
    /// Returns an error if the widget refuses to start
    fn play(&mut self) -> Result<()>;

    /// Pause playback
    fn pause(&mut self);

    /// Seek to a position in seconds
    fn seek_to(&mut self, seconds: f64);

    /// Video duration in seconds, if known
    fn duration(&self) -> Option<f64>;

    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Set volume (0-100); widgets without volume control ignore this
    fn set_volume(&mut self, _percent: u8) {}

    /// Set playback rate; widgets without rate control ignore this
    fn set_playback_rate(&mut self, _rate: f64) {}

    /// Enable or disable delivery of `stateChange` notifications
    fn set_listening(&mut self, enabled: bool);
}

/// State reported by a remote widget's `stateChange` notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteState {
    /// Video is playing
    Playing,
    /// Video is paused
    Paused,
    /// Video reached its end
    Ended,
}

/// Which sink implementation is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Host media element (local blobs and URLs)
    Media,
    /// Remote video widget
    Remote,
}

/// What a sink is asked to load
#[derive(Debug, Clone, PartialEq)]
pub enum SinkSource {
    /// Binary content held by the catalog
    Blob {
        /// Catalog handle of the content
        handle: BlobRef,
        /// The content itself
        bytes: Vec<u8>,
        /// MIME type, if known
        mime: Option<String>,
    },
    /// Remote address the media element fetches itself
    Url(String),
    /// Remote-service video id
    RemoteVideo(String),
}

/// Notification from a sink, normalised across sink kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SinkEvent {
    /// Media actually started playing
    Playing,
    /// Media paused (user or host initiated)
    Paused,
    /// Media reached its end
    Ended,
    /// Periodic position report
    TimeUpdate {
        /// Position in seconds
        position: f64,
    },
    /// Sink-side failure (decode error, network error, ...)
    Error {
        /// Host-provided description
        message: String,
    },
}

impl From<RemoteState> for SinkEvent {
    fn from(state: RemoteState) -> Self {
        match state {
            RemoteState::Playing => SinkEvent::Playing,
            RemoteState::Paused => SinkEvent::Paused,
            RemoteState::Ended => SinkEvent::Ended,
        }
    }
}

/// Uniform playback sink contract
///
/// The controller holds one implementation per [`SinkKind`] and only ever
/// drives the active one. `detach` must stop the sink, disable its
/// notifications and release any resources tied to the loaded source.
pub trait Sink: Send {
    /// Which kind of sink this is
    fn kind(&self) -> SinkKind;

    /// Enable notifications; called when the sink becomes active
    fn attach(&mut self);

    /// Stop, disable notifications and release held resources
    fn detach(&mut self);

    /// Load a new source, replacing (and releasing) the previous one
    ///
    /// # Errors
    /// Returns an error if the source is not supported or the host rejects it
    fn load(&mut self, source: SinkSource) -> Result<()>;

    /// Start playback
    ///
    /// # Errors
    /// Returns an error if the host refuses to start playback
    fn play(&mut self) -> Result<()>;

    /// Pause playback
    fn pause(&mut self);

    /// Seek to a position in seconds
    fn seek(&mut self, seconds: f64);

    /// Duration in seconds; `None` when unknown
    fn duration(&self) -> Option<f64>;

    /// Current position in seconds
    fn current_time(&self) -> f64;

    /// Set volume (0.0 - 1.0)
    fn set_volume(&mut self, volume: f64);

    /// Set playback rate
    fn set_playback_rate(&mut self, rate: f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_states_map_to_sink_events() {
        assert_eq!(SinkEvent::from(RemoteState::Playing), SinkEvent::Playing);
        assert_eq!(SinkEvent::from(RemoteState::Paused), SinkEvent::Paused);
        assert_eq!(SinkEvent::from(RemoteState::Ended), SinkEvent::Ended);
    }

    #[test]
    fn sink_kind_serializes_lowercase() {
        let json = serde_json::to_string(&SinkKind::Remote).unwrap();
        assert_eq!(json, "\"remote\"");
    }
}
