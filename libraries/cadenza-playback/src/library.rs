//! Library facade
//!
//! Wires the catalog, session store and playlist store over one shared
//! [`Store`], and implements the operations that span them: export, import
//! and reset.

use crate::catalog::MediaCatalog;
use crate::collections;
use crate::controller::PlaybackController;
use crate::playlists::PlaylistStore;
use crate::session::SessionStore;
use crate::transfer::{ExportDocument, ImportMode, ImportSummary};
use crate::types::PlaybackConfig;
use cadenza_core::{Result, Sink, Store};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything the engine persists, over one store
pub struct Library {
    store: Arc<dyn Store>,
    catalog: Arc<MediaCatalog>,
    sessions: Arc<SessionStore>,
    playlists: PlaylistStore,
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

impl Library {
    /// Open a library over a store
    pub fn open(store: Arc<dyn Store>, config: &PlaybackConfig) -> Self {
        Self {
            catalog: Arc::new(MediaCatalog::new(Arc::clone(&store))),
            sessions: Arc::new(SessionStore::new(
                Arc::clone(&store),
                config.session_debounce(),
            )),
            playlists: PlaylistStore::new(Arc::clone(&store)),
            store,
        }
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Track catalog
    pub fn catalog(&self) -> &Arc<MediaCatalog> {
        &self.catalog
    }

    /// Session store
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Playlist store
    pub fn playlists(&self) -> &PlaylistStore {
        &self.playlists
    }

    /// Build a controller persisting into this library
    pub fn controller(
        &self,
        media_sink: Box<dyn Sink>,
        remote_sink: Box<dyn Sink>,
        config: PlaybackConfig,
    ) -> PlaybackController {
        PlaybackController::new(
            Arc::clone(&self.catalog),
            Some(Arc::clone(&self.sessions)),
            media_sink,
            remote_sink,
            config,
        )
    }

    // ===== Export / Import =====

    /// Snapshot track metadata, the session and playlists
    pub async fn export(&self) -> Result<ExportDocument> {
        let tracks = self.catalog.list_all().await?;
        let queue = self.sessions.load().await?;
        let playlists = self.playlists.list().await?;
        info!(
            tracks = tracks.len(),
            playlists = playlists.len(),
            "Library exported"
        );
        Ok(ExportDocument::new(tracks, queue, playlists))
    }

    /// Import a document
    ///
    /// Tracks and playlists are upserted by id. A document track whose id
    /// already exists with a different kind is skipped, since a track's kind
    /// never changes. `Replace` clears the library first and installs the
    /// document's session; `Merge` keeps the current session. A running
    /// controller picks up an imported session through `restore_session`.
    pub async fn import(&self, document: ExportDocument, mode: ImportMode) -> Result<ImportSummary> {
        if mode == ImportMode::Replace {
            self.reset().await?;
        }

        let mut summary = ImportSummary::default();
        for track in &document.tracks {
            if let Some(existing) = self.catalog.find(&track.id).await? {
                if existing.kind() != track.kind() {
                    warn!(
                        track_id = %track.id,
                        existing = %existing.kind(),
                        imported = %track.kind(),
                        "Skipping imported track that would change kind"
                    );
                    summary.kind_conflicts += 1;
                    continue;
                }
            }
            self.catalog.put_track(track).await?;
            summary.tracks += 1;
            if let Some(blob) = track.blob() {
                if !self.catalog.has_blob(blob).await? {
                    summary.unplayable_local += 1;
                }
            }
        }

        for playlist in &document.playlists {
            self.playlists.put(playlist).await?;
            summary.playlists += 1;
        }

        if mode == ImportMode::Replace {
            self.sessions.save_now(&document.queue).await?;
            summary.session_replaced = true;
        }

        info!(
            ?mode,
            tracks = summary.tracks,
            playlists = summary.playlists,
            unplayable_local = summary.unplayable_local,
            kind_conflicts = summary.kind_conflicts,
            "Library imported"
        );
        Ok(summary)
    }

    /// Clear every collection the engine owns
    ///
    /// Catalog listeners are notified, so attached controllers empty their
    /// queues.
    pub async fn reset(&self) -> Result<()> {
        self.catalog.clear().await?;
        self.sessions.clear().await?;
        for collection in collections::ALL {
            self.store.clear(collection).await?;
        }
        info!("Library reset");
        Ok(())
    }
}
