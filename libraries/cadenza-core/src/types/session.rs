/// Session snapshot types
use crate::types::TrackId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Repeat mode for playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when the queue ends
    #[default]
    Off,
    /// Loop the entire queue
    All,
    /// Loop the current entry
    One,
}

impl RepeatMode {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::All => "all",
            Self::One => "one",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "off" | "none" => Some(Self::Off),
            "all" => Some(Self::All),
            "one" => Some(Self::One),
            _ => None,
        }
    }

    /// Next mode in the repeat button cycle: off -> all -> one -> off
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted playback session
///
/// The queue is stored as bare track ids; it is rehydrated against the
/// catalog on startup. `cursor` serializes as `-1` when nothing is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Queue contents in order
    #[serde(default)]
    pub queue_entries: Vec<TrackId>,

    /// Index of the current entry
    #[serde(default, with = "cursor_index")]
    pub cursor: Option<usize>,

    /// Volume level (0-100)
    #[serde(default = "default_volume")]
    pub volume: u8,

    /// Whether output is muted
    #[serde(default)]
    pub muted: bool,

    /// Shuffle flag
    #[serde(default)]
    pub shuffle: bool,

    /// Repeat mode
    #[serde(default)]
    pub repeat_mode: RepeatMode,

    /// Playback rate (1.0 = normal)
    #[serde(default = "default_playback_rate")]
    pub playback_rate: f64,

    /// Track that was loaded most recently
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played: Option<TrackId>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            queue_entries: Vec::new(),
            cursor: None,
            volume: default_volume(),
            muted: false,
            shuffle: false,
            repeat_mode: RepeatMode::Off,
            playback_rate: default_playback_rate(),
            last_played: None,
        }
    }
}

fn default_volume() -> u8 {
    80
}

fn default_playback_rate() -> f64 {
    1.0
}

mod cursor_index {
    use super::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(cursor: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        match cursor {
            Some(index) => serializer.serialize_i64(*index as i64),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        let raw = Option::<i64>::deserialize(deserializer)?;
        Ok(raw.and_then(|index| usize::try_from(index).ok()))
    }
}
