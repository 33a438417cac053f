/// Track domain type
use crate::types::{BlobRef, TrackId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of media a track points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    /// Binary content stored in the catalog
    Local,
    /// Remote address played by the media element
    Url,
    /// Remote-service video played by the widget
    Remote,
}

impl TrackKind {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Url => "url",
            Self::Remote => "remote",
        }
    }

    /// Whether the engine tracks a resume position for this kind
    ///
    /// Remote widgets manage their own position, so only `local` and `url`
    /// tracks resume.
    pub fn tracks_resume_position(&self) -> bool {
        matches!(self, Self::Local | Self::Url)
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a track's media lives
///
/// The variant *is* the track kind, so kind and payload cannot disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Payload {
    /// Binary content owned by the catalog
    Local {
        /// Handle of the stored content
        blob: BlobRef,
        /// MIME type, if known
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime: Option<String>,
    },
    /// Remote media address
    Url {
        /// Address string
        url: String,
    },
    /// Remote-service video
    Remote {
        /// Remote-service video id
        video_id: String,
    },
}

impl Payload {
    /// Local payload for an already-stored blob
    pub fn local(blob: BlobRef, mime: Option<String>) -> Self {
        Self::Local { blob, mime }
    }

    /// URL payload
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    /// Remote video payload
    pub fn remote(video_id: impl Into<String>) -> Self {
        Self::Remote {
            video_id: video_id.into(),
        }
    }

    /// The track kind this payload implies
    pub fn kind(&self) -> TrackKind {
        match self {
            Self::Local { .. } => TrackKind::Local,
            Self::Url { .. } => TrackKind::Url,
            Self::Remote { .. } => TrackKind::Remote,
        }
    }
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Display name
    pub title: String,

    /// Media location; carries the immutable kind
    #[serde(flatten)]
    pub payload: Payload,

    /// Duration in seconds, once known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,

    /// Video width in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Video height in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Thumbnail (data URL or remote address)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    /// Size of the binary content in bytes (local tracks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    /// Last known playback offset in seconds
    #[serde(default)]
    pub resume_position_seconds: f64,

    /// Marked as favorite
    #[serde(default)]
    pub favorite: bool,

    /// When the track was added to the catalog
    pub added_at: DateTime<Utc>,
}

impl Track {
    /// Create a new track with a fresh id
    pub fn new(title: impl Into<String>, payload: Payload) -> Self {
        Self {
            id: TrackId::generate(),
            title: title.into(),
            payload,
            duration_seconds: None,
            width: None,
            height: None,
            thumbnail: None,
            size_bytes: None,
            resume_position_seconds: 0.0,
            favorite: false,
            added_at: Utc::now(),
        }
    }

    /// Track kind
    pub fn kind(&self) -> TrackKind {
        self.payload.kind()
    }

    /// Blob handle for local tracks
    pub fn blob(&self) -> Option<&BlobRef> {
        match &self.payload {
            Payload::Local { blob, .. } => Some(blob),
            _ => None,
        }
    }

    /// Merge lazily-extracted media information into the record
    ///
    /// Only fields present in `info` are overwritten.
    pub fn apply_media_info(&mut self, info: &MediaInfo) {
        if let Some(duration) = info.duration_seconds.filter(|d| d.is_finite() && *d >= 0.0) {
            self.duration_seconds = Some(duration);
        }
        if info.width.is_some() {
            self.width = info.width;
        }
        if info.height.is_some() {
            self.height = info.height;
        }
        if info.thumbnail.is_some() {
            self.thumbnail.clone_from(&info.thumbnail);
        }
    }
}

/// Derived media information reported by the host after extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration_seconds: Option<f64>,
    /// Width in pixels
    pub width: Option<u32>,
    /// Height in pixels
    pub height: Option<u32>,
    /// Thumbnail
    pub thumbnail: Option<String>,
}

/// Source content for a track being added to the catalog
#[derive(Debug, Clone, PartialEq)]
pub enum NewSource {
    /// Binary content to be stored by the catalog
    Local {
        /// Raw bytes
        bytes: Vec<u8>,
        /// MIME type, if known
        mime: Option<String>,
    },
    /// Remote address
    Url(String),
    /// Remote-service video id
    Remote(String),
}

/// Request to add a track to the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrack {
    /// Display name
    pub title: String,
    /// Media content or location
    pub source: NewSource,
}

impl NewTrack {
    /// Local binary track
    pub fn local(title: impl Into<String>, bytes: Vec<u8>, mime: Option<String>) -> Self {
        Self {
            title: title.into(),
            source: NewSource::Local { bytes, mime },
        }
    }

    /// URL track
    pub fn url(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: NewSource::Url(url.into()),
        }
    }

    /// Remote video track
    pub fn remote(title: impl Into<String>, video_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: NewSource::Remote(video_id.into()),
        }
    }

    /// Kind of the track this request creates
    pub fn kind(&self) -> TrackKind {
        match self.source {
            NewSource::Local { .. } => TrackKind::Local,
            NewSource::Url(_) => TrackKind::Url,
            NewSource::Remote(_) => TrackKind::Remote,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_determines_kind() {
        let track = Track::new("clip", Payload::remote("dQw4w9WgXcQ"));
        assert_eq!(track.kind(), TrackKind::Remote);
        assert!(!track.kind().tracks_resume_position());
        assert!(track.blob().is_none());
    }

    #[test]
    fn track_json_carries_kind_at_top_level() {
        let track = Track::new("song", Payload::url("https://example.com/a.mp3"));
        let json = serde_json::to_value(&track).unwrap();
        assert_eq!(json["kind"], "url");
        assert_eq!(json["url"], "https://example.com/a.mp3");

        let back: Track = serde_json::from_value(json).unwrap();
        assert_eq!(back, track);
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let json = serde_json::json!({
            "id": "t1",
            "title": "Old record",
            "kind": "local",
            "blob": "b1",
            "added_at": "2024-01-01T00:00:00Z"
        });
        let track: Track = serde_json::from_value(json).unwrap();
        assert_eq!(track.resume_position_seconds, 0.0);
        assert!(!track.favorite);
        assert_eq!(track.blob(), Some(&BlobRef::new("b1")));
    }

    #[test]
    fn media_info_only_overwrites_present_fields() {
        let mut track = Track::new("v", Payload::url("u"));
        track.width = Some(640);
        track.apply_media_info(&MediaInfo {
            duration_seconds: Some(12.5),
            height: Some(360),
            ..MediaInfo::default()
        });
        assert_eq!(track.duration_seconds, Some(12.5));
        assert_eq!(track.width, Some(640));
        assert_eq!(track.height, Some(360));
    }

    #[test]
    fn media_info_ignores_non_finite_duration() {
        let mut track = Track::new("v", Payload::url("u"));
        track.apply_media_info(&MediaInfo {
            duration_seconds: Some(f64::NAN),
            ..MediaInfo::default()
        });
        assert_eq!(track.duration_seconds, None);
    }
}
