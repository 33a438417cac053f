//! Recently played tracks
//!
//! Bounded ring of track ids, most recent last. Fed by the controller each
//! time a load is committed to a sink.

use cadenza_core::TrackId;
use std::collections::VecDeque;

/// Recently played history with bounded size
#[derive(Debug, Clone)]
pub struct History {
    /// History buffer (most recent = back)
    tracks: VecDeque<TrackId>,

    /// Maximum history size
    max_size: usize,
}

impl History {
    /// Create new history with specified maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            tracks: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Record a played track
    ///
    /// Replaying the most recent track does not add a second entry. If
    /// history is full, the oldest entry is discarded.
    pub fn push(&mut self, track_id: TrackId) {
        if self.max_size == 0 || self.tracks.back() == Some(&track_id) {
            return;
        }
        if self.tracks.len() >= self.max_size {
            self.tracks.pop_front();
        }
        self.tracks.push_back(track_id);
    }

    /// Most recent track
    pub fn peek(&self) -> Option<&TrackId> {
        self.tracks.back()
    }

    /// All entries, oldest first
    pub fn get_all(&self) -> Vec<TrackId> {
        self.tracks.iter().cloned().collect()
    }

    /// Drop every entry referencing `track_id`
    pub fn forget(&mut self, track_id: &TrackId) {
        self.tracks.retain(|id| id != track_id);
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether history is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Maximum history size
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(50)
    }
}
