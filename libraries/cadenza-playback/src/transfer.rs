//! Library export/import document
//!
//! A single JSON document carrying track metadata, the session and saved
//! playlists. Local binary content is never exported, so a local track
//! imported into a fresh library stays unplayable until its file is added
//! again.

use cadenza_core::{CadenzaError, Playlist, Result, Session, Track};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current document format version
pub const FORMAT_VERSION: u32 = 1;

/// Exported library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// Format version
    pub version: u32,

    /// When the export was taken
    pub exported_at: DateTime<Utc>,

    /// Track metadata (no binary payloads)
    pub tracks: Vec<Track>,

    /// Queue and playback settings
    pub queue: Session,

    /// Saved playlists
    #[serde(default)]
    pub playlists: Vec<Playlist>,
}

impl ExportDocument {
    /// Assemble a document stamped with the current time
    pub fn new(tracks: Vec<Track>, queue: Session, playlists: Vec<Playlist>) -> Self {
        Self {
            version: FORMAT_VERSION,
            exported_at: Utc::now(),
            tracks,
            queue,
            playlists,
        }
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document
    ///
    /// # Errors
    /// Returns `Serialization` for malformed JSON and `InvalidInput` for a
    /// document written by a newer format version
    pub fn from_json(json: &str) -> Result<Self> {
        let document: Self = serde_json::from_str(json)?;
        if document.version > FORMAT_VERSION {
            return Err(CadenzaError::invalid_input(format!(
                "export format version {} is newer than supported version {FORMAT_VERSION}",
                document.version
            )));
        }
        Ok(document)
    }
}

/// How an import treats existing data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Upsert tracks and playlists by id; keep everything else and the
    /// current session
    #[default]
    Merge,

    /// Drop the existing library and session first
    Replace,
}

/// What an import did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Tracks written
    pub tracks: usize,

    /// Playlists written
    pub playlists: usize,

    /// Local tracks whose content is not in this library
    pub unplayable_local: usize,

    /// Document tracks skipped because an existing track with the same id
    /// has a different kind
    #[serde(default)]
    pub kind_conflicts: usize,

    /// Whether the imported session replaced the current one
    pub session_replaced: bool,
}
