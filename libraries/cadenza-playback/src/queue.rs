//! Play queue
//!
//! Ordered list of track references with a cursor:
//!
//! ```text
//!   index:   0        1        2        3
//!          [ A ]    [ B ]    [ C ]    [ B ]     (duplicates allowed)
//!                     ^
//!                  cursor
//! ```
//!
//! Invariant: the cursor is either `None` or a valid index. Every mutation
//! keeps it pointing at the *same entry* it pointed at before, or clears it
//! when that entry is removed.

use crate::shuffle::random_index;
use cadenza_core::{CadenzaError, RepeatMode, Result, TrackId};
use serde::{Deserialize, Serialize};

/// One slot in the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Referenced catalog track
    pub track_id: TrackId,
}

impl QueueEntry {
    /// Create an entry for a track
    pub fn new(track_id: TrackId) -> Self {
        Self { track_id }
    }
}

/// Navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the end of the queue
    Next,
    /// Towards the start of the queue
    Prev,
}

/// Result of [`Queue::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Added {
    /// Index of the new entry
    pub index: usize,

    /// The queue was empty with no cursor, and the cursor now points at the
    /// new entry. The caller decides whether to start playback.
    pub started: bool,
}

/// Result of a removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removed {
    /// Entries that were removed
    pub entries: Vec<QueueEntry>,

    /// The cursor entry was among them; playback of it must stop
    pub stop: bool,
}

/// Ordered play queue with cursor, shuffle flag and repeat mode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Queue {
    entries: Vec<QueueEntry>,
    cursor: Option<usize>,
    shuffle: bool,
    repeat: RepeatMode,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue from track ids
    ///
    /// An out-of-range cursor is dropped rather than rejected.
    pub fn from_track_ids(track_ids: Vec<TrackId>, cursor: Option<usize>) -> Self {
        let entries: Vec<QueueEntry> = track_ids.into_iter().map(QueueEntry::new).collect();
        let cursor = cursor.filter(|&c| c < entries.len());
        Self {
            entries,
            cursor,
            ..Self::default()
        }
    }

    // ===== Mutation =====

    /// Append an entry
    pub fn add(&mut self, track_id: TrackId) -> Added {
        let started = self.entries.is_empty() && self.cursor.is_none();
        self.entries.push(QueueEntry::new(track_id));
        if started {
            self.cursor = Some(0);
        }
        Added {
            index: self.entries.len() - 1,
            started,
        }
    }

    /// Remove the entry at `index`
    ///
    /// Returns `None` (and changes nothing) when `index` is out of range.
    pub fn remove_at(&mut self, index: usize) -> Option<Removed> {
        if index >= self.entries.len() {
            return None;
        }

        let entry = self.entries.remove(index);
        let stop = match self.cursor {
            Some(c) if c == index => {
                self.cursor = None;
                true
            }
            Some(c) if index < c => {
                self.cursor = Some(c - 1);
                false
            }
            _ => false,
        };

        Some(Removed {
            entries: vec![entry],
            stop,
        })
    }

    /// Remove every entry referencing `track_id`
    pub fn remove_track(&mut self, track_id: &TrackId) -> Removed {
        let mut removed = Removed {
            entries: Vec::new(),
            stop: false,
        };

        // Highest index first so earlier indices stay valid
        for index in (0..self.entries.len()).rev() {
            if &self.entries[index].track_id != track_id {
                continue;
            }
            if let Some(r) = self.remove_at(index) {
                removed.stop |= r.stop;
                removed.entries.extend(r.entries);
            }
        }

        removed
    }

    /// Move the entry at `from` so that it ends up at index `to`
    ///
    /// The cursor follows the entry it pointed at. Returns `false` (and
    /// changes nothing) if either index is out of range.
    pub fn move_to(&mut self, from: usize, to: usize) -> bool {
        let len = self.entries.len();
        if from >= len || to >= len {
            return false;
        }
        if from == to {
            return true;
        }

        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);

        self.cursor = self.cursor.map(|c| {
            if c == from {
                to
            } else if from < c && c <= to {
                c - 1
            } else if to <= c && c < from {
                c + 1
            } else {
                c
            }
        });

        true
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    /// Replace the contents (e.g. when a playlist is loaded); cursor is cleared
    pub fn replace(&mut self, track_ids: Vec<TrackId>) {
        self.entries = track_ids.into_iter().map(QueueEntry::new).collect();
        self.cursor = None;
    }

    // ===== Cursor =====

    /// Point the cursor at `index`
    ///
    /// # Errors
    /// Returns `OutOfRange` if `index >= len`
    pub fn set_cursor(&mut self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(CadenzaError::out_of_range(index, self.entries.len()));
        }
        self.cursor = Some(index);
        Ok(())
    }

    /// Clear the cursor
    pub fn clear_cursor(&mut self) {
        self.cursor = None;
    }

    /// Current cursor
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Entry under the cursor
    pub fn current(&self) -> Option<&QueueEntry> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    /// Compute the index to move to, without changing the queue
    ///
    /// - next with shuffle: uniformly random index (may be the current one)
    /// - next with repeat one: the cursor
    /// - next with repeat all: `(cursor + 1) % len`
    /// - next with repeat off: `cursor + 1`, or `None` past the end
    /// - prev: `cursor - 1`, or `None` at the start; never wraps
    ///
    /// Without a cursor, next starts at index 0 and prev yields `None`.
    pub fn advance(&self, direction: Direction) -> Option<usize> {
        self.advance_with(direction, &mut rand::thread_rng())
    }

    /// [`advance`](Self::advance) with a caller-supplied random source
    pub fn advance_with<R: rand::Rng>(
        &self,
        direction: Direction,
        rng: &mut R,
    ) -> Option<usize> {
        let len = self.entries.len();
        if len == 0 {
            return None;
        }

        match direction {
            Direction::Prev => self.cursor.and_then(|c| c.checked_sub(1)),
            Direction::Next if self.shuffle => random_index(len, rng),
            Direction::Next => {
                let Some(cursor) = self.cursor else {
                    return Some(0);
                };
                match self.repeat {
                    RepeatMode::One => Some(cursor),
                    RepeatMode::All => Some((cursor + 1) % len),
                    RepeatMode::Off => Some(cursor + 1).filter(|&next| next < len),
                }
            }
        }
    }

    // ===== Modes =====

    /// Shuffle flag
    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Set shuffle flag (does not reorder entries)
    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.shuffle = shuffle;
    }

    /// Repeat mode
    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    /// Set repeat mode
    pub fn set_repeat(&mut self, repeat: RepeatMode) {
        self.repeat = repeat;
    }

    // ===== Queries =====

    /// All entries in order
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Entry at `index`
    pub fn get(&self, index: usize) -> Option<&QueueEntry> {
        self.entries.get(index)
    }

    /// Track ids in order
    pub fn track_ids(&self) -> Vec<TrackId> {
        self.entries.iter().map(|e| e.track_id.clone()).collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
