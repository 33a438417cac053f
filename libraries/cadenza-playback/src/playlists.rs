//! Saved playlists
//!
//! Named, ordered lists of track ids kept in the `playlists` collection.
//! Playlists hold references only; ids that stop resolving are filtered out
//! when a playlist is loaded into the queue, not when it is stored.

use crate::collections::PLAYLISTS;
use cadenza_core::{CadenzaError, Playlist, PlaylistId, Result, Store, TrackId};
use std::sync::Arc;
use tracing::{info, warn};

/// Playlist persistence over a [`Store`]
pub struct PlaylistStore {
    store: Arc<dyn Store>,
}

impl std::fmt::Debug for PlaylistStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaylistStore").finish_non_exhaustive()
    }
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CadenzaError::invalid_input("playlist name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

impl PlaylistStore {
    /// Create a playlist store
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create a playlist
    ///
    /// # Errors
    /// Returns `InvalidInput` for a blank name
    pub async fn create(&self, name: &str, track_ids: Vec<TrackId>) -> Result<Playlist> {
        let playlist = Playlist::new(validate_name(name)?, track_ids);
        self.put(&playlist).await?;
        info!(playlist_id = %playlist.id, name = %playlist.name, "Playlist created");
        Ok(playlist)
    }

    /// All playlists, oldest first
    pub async fn list(&self) -> Result<Vec<Playlist>> {
        let records = self.store.get_all(PLAYLISTS).await?;
        let mut playlists = Vec::with_capacity(records.len());
        for record in records {
            match serde_json::from_value::<Playlist>(record) {
                Ok(playlist) => playlists.push(playlist),
                Err(err) => warn!(error = %err, "Skipping unreadable playlist record"),
            }
        }
        Ok(playlists)
    }

    /// Get a playlist
    ///
    /// # Errors
    /// Returns `NotFound` if the playlist does not exist
    pub async fn get(&self, id: &PlaylistId) -> Result<Playlist> {
        let value = self
            .store
            .get(PLAYLISTS, id.as_str())
            .await?
            .ok_or_else(|| CadenzaError::not_found("Playlist", id.as_str()))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Rename a playlist
    pub async fn rename(&self, id: &PlaylistId, name: &str) -> Result<Playlist> {
        let name = validate_name(name)?;
        let mut playlist = self.get(id).await?;
        playlist.name = name;
        self.put(&playlist).await?;
        Ok(playlist)
    }

    /// Append a track to a playlist
    pub async fn add_track(&self, id: &PlaylistId, track_id: TrackId) -> Result<Playlist> {
        let mut playlist = self.get(id).await?;
        playlist.track_ids.push(track_id);
        self.put(&playlist).await?;
        Ok(playlist)
    }

    /// Remove the entry at `index`; out-of-range indices change nothing
    pub async fn remove_at(&self, id: &PlaylistId, index: usize) -> Result<Playlist> {
        let mut playlist = self.get(id).await?;
        if index < playlist.track_ids.len() {
            playlist.track_ids.remove(index);
            self.put(&playlist).await?;
        }
        Ok(playlist)
    }

    /// Delete a playlist (idempotent)
    pub async fn delete(&self, id: &PlaylistId) -> Result<()> {
        self.store.delete(PLAYLISTS, id.as_str()).await
    }

    /// Drop every playlist
    pub async fn clear(&self) -> Result<()> {
        self.store.clear(PLAYLISTS).await
    }

    /// Write a playlist as-is (upsert by id)
    pub(crate) async fn put(&self, playlist: &Playlist) -> Result<()> {
        self.store
            .put(PLAYLISTS, playlist.id.as_str(), serde_json::to_value(playlist)?)
            .await
    }
}
