//! Domain types for Cadenza

mod ids;
mod playlist;
mod session;
mod track;

pub use ids::{BlobRef, PlaylistId, TrackId};
pub use playlist::Playlist;
pub use session::{RepeatMode, Session};
pub use track::{MediaInfo, NewSource, NewTrack, Payload, Track, TrackKind};
