//! Cadenza - Playback Engine
//!
//! Queue, session and playback control for a media player whose tracks are
//! local files, remote URLs or embedded remote videos.
//!
//! This crate provides:
//! - Media catalog over an async document store (tracks, blobs, favorites)
//! - Play queue with cursor, shuffle and three repeat modes
//! - Debounced session persistence and restore against the catalog
//! - Playback controller driving a media element or a remote video widget
//! - Playlists, recently played history, export/import and reset
//!
//! # Architecture
//!
//! `cadenza-playback` never touches a real player. The host provides:
//! - a [`Store`](cadenza_core::Store) (in memory, SQLite, browser storage)
//! - a [`MediaSink`](cadenza_core::MediaSink) and a
//!   [`RemoteVideoWidget`](cadenza_core::RemoteVideoWidget), wrapped in the
//!   [`MediaElementSink`] and [`RemoteWidgetSink`] adapters
//!
//! and forwards their notifications to
//! [`PlaybackController::handle_sink_event`].
//!
//! # Example: Queue Policy
//!
//! ```rust
//! use cadenza_core::{RepeatMode, TrackId};
//! use cadenza_playback::{Direction, Queue};
//!
//! let ids = ["a", "b", "c"].map(TrackId::new).to_vec();
//! let mut queue = Queue::from_track_ids(ids, Some(2));
//!
//! assert_eq!(queue.advance(Direction::Next), None);
//!
//! queue.set_repeat(RepeatMode::All);
//! assert_eq!(queue.advance(Direction::Next), Some(0));
//!
//! // prev never wraps
//! queue.set_cursor(0).unwrap();
//! assert_eq!(queue.advance(Direction::Prev), None);
//! ```
//!
//! # Example: Platform Integration
//!
//! ```rust,ignore
//! let library = Library::open(store, &config);
//! let controller = library.controller(
//!     Box::new(MediaElementSink::new(video_element)),
//!     Box::new(RemoteWidgetSink::new(embed_widget)),
//!     config,
//! );
//! controller.restore_session().await?;
//!
//! // host notification loop
//! while let Some((kind, event)) = notifications.recv().await {
//!     controller.handle_sink_event(kind, event).await.ok();
//!     for event in controller.drain_events() {
//!         ui.apply(event);
//!     }
//! }
//! ```

pub mod catalog;
pub mod collections;
pub mod controller;
pub mod events;
mod history;
pub mod library;
pub mod playlists;
pub mod queue;
pub mod remote;
pub mod session;
mod shuffle;
pub mod sink;
pub mod transfer;
pub mod types;
mod volume;

// Public exports
pub use catalog::{ListenerId, MediaCatalog, RemovalListener};
pub use controller::{sink_kind_for, PlaybackController, MAX_PLAYBACK_RATE, MIN_PLAYBACK_RATE};
pub use events::PlaybackEvent;
pub use history::History;
pub use library::Library;
pub use playlists::PlaylistStore;
pub use queue::{Added, Direction, Queue, QueueEntry, Removed};
pub use remote::extract_video_id;
pub use session::{rehydrate, RestoredSession, SessionStore};
pub use sink::{MediaElementSink, RemoteWidgetSink};
pub use transfer::{ExportDocument, ImportMode, ImportSummary, FORMAT_VERSION};
pub use types::{LoadOutcome, PlaybackConfig, PlayerState};
pub use volume::Volume;
