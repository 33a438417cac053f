//! Cadenza Core
//!
//! Platform-agnostic types, collaborator traits, and error handling for the
//! Cadenza playback engine.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `Session`, `Playlist`, ids and `RepeatMode`
//! - **Collaborator Traits**: `Store` (async document store), `MediaSink`,
//!   `RemoteVideoWidget`, and the uniform `Sink` contract the controller drives
//! - **Error Handling**: Unified `CadenzaError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use cadenza_core::types::{Payload, Track, TrackKind};
//!
//! let track = Track::new("Lecture 4", Payload::url("https://example.com/l4.mp4"));
//! assert_eq!(track.kind(), TrackKind::Url);
//! assert_eq!(track.resume_position_seconds, 0.0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod storage;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CadenzaError, Result};
pub use storage::Store;
pub use traits::{MediaSink, RemoteState, RemoteVideoWidget, Sink, SinkEvent, SinkKind, SinkSource};

pub use types::{
    BlobRef, MediaInfo, NewSource, NewTrack, Payload, Playlist, PlaylistId, RepeatMode, Session, Track,
    TrackId, TrackKind,
};
