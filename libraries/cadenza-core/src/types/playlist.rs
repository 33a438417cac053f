/// Playlist domain type
use crate::types::{PlaylistId, TrackId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named, ordered list of track references
///
/// Like the queue, a playlist stores ids only; entries whose track has left
/// the catalog are dropped when the playlist is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Unique playlist identifier
    pub id: PlaylistId,

    /// Playlist name
    pub name: String,

    /// Track references in play order (duplicates allowed)
    #[serde(default)]
    pub track_ids: Vec<TrackId>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Playlist {
    /// Create a new playlist
    pub fn new(name: impl Into<String>, track_ids: Vec<TrackId>) -> Self {
        Self {
            id: PlaylistId::generate(),
            name: name.into(),
            track_ids,
            created_at: Utc::now(),
        }
    }
}
