//! Media catalog
//!
//! Reference data for every known track. Track metadata lives in the
//! `tracks` collection; local binary payloads live separately in `blobs`
//! (base64 inside a JSON record) so listing the library never touches them.

use crate::collections::{BLOBS, TRACKS};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cadenza_core::{
    BlobRef, CadenzaError, MediaInfo, NewSource, NewTrack, Payload, Result, Store, Track, TrackId,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Callback invoked after a track is removed from the catalog
pub type RemovalListener = Arc<dyn Fn(&TrackId) + Send + Sync>;

/// Registration handle returned by [`MediaCatalog::on_remove`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, RemovalListener)>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BlobRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mime: Option<String>,
    data: String,
}

/// Catalog of known tracks backed by a [`Store`]
pub struct MediaCatalog {
    store: Arc<dyn Store>,
    listeners: RwLock<Listeners>,
}

impl std::fmt::Debug for MediaCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaCatalog").finish_non_exhaustive()
    }
}

impl MediaCatalog {
    /// Create a catalog over a store
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            listeners: RwLock::new(Listeners::default()),
        }
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Register a listener notified (synchronously) after each removal
    ///
    /// Queues register here so entries referencing a removed track are pruned.
    /// The listener stays registered until passed to [`Self::remove_listener`].
    pub fn on_remove(&self, listener: impl Fn(&TrackId) + Send + Sync + 'static) -> ListenerId {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        listeners.next_id += 1;
        let id = ListenerId(listeners.next_id);
        listeners.entries.push((id, Arc::new(listener)));
        id
    }

    /// Unregister a removal listener; unknown ids are ignored
    pub fn remove_listener(&self, id: ListenerId) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .retain(|(entry, _)| *entry != id);
    }

    /// Number of registered removal listeners
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    // ===== Create / Read =====

    /// Add a track and return its fresh id
    ///
    /// For local tracks the binary content is written first; if the track
    /// record then fails to write, the blob is deleted again so no orphan
    /// remains.
    ///
    /// # Errors
    /// Returns `Storage` if the store rejects either write (e.g. quota)
    pub async fn add(&self, new_track: NewTrack) -> Result<TrackId> {
        let kind = new_track.kind();
        let (payload, size) = match new_track.source {
            NewSource::Local { bytes, mime } => {
                let blob = BlobRef::generate();
                let record = BlobRecord {
                    mime: mime.clone(),
                    data: BASE64.encode(&bytes),
                };
                self.store
                    .put(BLOBS, blob.as_str(), serde_json::to_value(&record)?)
                    .await?;
                (Payload::local(blob, mime), Some(bytes.len() as u64))
            }
            NewSource::Url(url) => (Payload::url(url), None),
            NewSource::Remote(video_id) => (Payload::remote(video_id), None),
        };

        let mut track = Track::new(new_track.title, payload);
        track.size_bytes = size;

        if let Err(err) = self.put_track(&track).await {
            if let Some(blob) = track.blob() {
                if let Err(cleanup) = self.store.delete(BLOBS, blob.as_str()).await {
                    warn!(blob = %blob, error = %cleanup, "Failed to clean up orphaned blob");
                }
            }
            return Err(err);
        }

        info!(track_id = %track.id, kind = %kind, title = %track.title, "Track added");
        Ok(track.id)
    }

    /// Get a track by id
    ///
    /// # Errors
    /// Returns `NotFound` if no such track exists
    pub async fn get(&self, id: &TrackId) -> Result<Track> {
        self.find(id)
            .await?
            .ok_or_else(|| CadenzaError::not_found("Track", id.as_str()))
    }

    /// Get a track by id, `None` if absent
    pub async fn find(&self, id: &TrackId) -> Result<Option<Track>> {
        match self.store.get(TRACKS, id.as_str()).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// All tracks in store order
    ///
    /// Records that no longer deserialize are skipped with a warning rather
    /// than failing the whole listing.
    pub async fn list_all(&self) -> Result<Vec<Track>> {
        let records = self.store.get_all(TRACKS).await?;
        let mut tracks = Vec::with_capacity(records.len());
        for record in records {
            match serde_json::from_value::<Track>(record) {
                Ok(track) => tracks.push(track),
                Err(err) => warn!(error = %err, "Skipping unreadable track record"),
            }
        }
        Ok(tracks)
    }

    /// Tracks marked as favorite
    pub async fn favorites(&self) -> Result<Vec<Track>> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|t| t.favorite)
            .collect())
    }

    /// Read the binary content behind a blob handle
    ///
    /// # Errors
    /// Returns `NotFound` if the blob is missing (e.g. after an import that
    /// carried metadata only)
    pub async fn read_blob(&self, blob: &BlobRef) -> Result<Vec<u8>> {
        let value = self
            .store
            .get(BLOBS, blob.as_str())
            .await?
            .ok_or_else(|| CadenzaError::not_found("Blob", blob.as_str()))?;
        let record: BlobRecord = serde_json::from_value(value)?;
        BASE64
            .decode(record.data)
            .map_err(|e| CadenzaError::storage(format!("corrupt blob {blob}: {e}")))
    }

    /// Whether a blob handle resolves
    pub async fn has_blob(&self, blob: &BlobRef) -> Result<bool> {
        Ok(self.store.get(BLOBS, blob.as_str()).await?.is_some())
    }

    // ===== Update =====

    /// Replace a track record
    ///
    /// # Errors
    /// Returns `NotFound` if the track does not exist, `InvalidInput` if the
    /// update would change the track's kind
    pub async fn update(&self, track: &Track) -> Result<()> {
        let existing = self.get(&track.id).await?;
        if existing.kind() != track.kind() {
            return Err(CadenzaError::invalid_input(format!(
                "track {} is {}; kind cannot change to {}",
                track.id,
                existing.kind(),
                track.kind()
            )));
        }
        self.put_track(track).await
    }

    /// Record the last known playback offset
    ///
    /// Ignored for remote tracks, whose widget tracks its own position.
    pub async fn set_resume_position(&self, id: &TrackId, seconds: f64) -> Result<()> {
        let mut track = self.get(id).await?;
        if !track.kind().tracks_resume_position() {
            return Ok(());
        }
        track.resume_position_seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self.put_track(&track).await
    }

    /// Merge extracted media information (duration, size, thumbnail)
    pub async fn record_media_info(&self, id: &TrackId, info: &MediaInfo) -> Result<Track> {
        let mut track = self.get(id).await?;
        track.apply_media_info(info);
        self.put_track(&track).await?;
        Ok(track)
    }

    /// Rename a track
    pub async fn rename(&self, id: &TrackId, title: impl Into<String>) -> Result<Track> {
        let mut track = self.get(id).await?;
        track.title = title.into();
        self.put_track(&track).await?;
        Ok(track)
    }

    /// Flip the favorite flag, returning the new value
    pub async fn toggle_favorite(&self, id: &TrackId) -> Result<bool> {
        let mut track = self.get(id).await?;
        track.favorite = !track.favorite;
        self.put_track(&track).await?;
        Ok(track.favorite)
    }

    /// Write a track record as-is (upsert by id)
    pub(crate) async fn put_track(&self, track: &Track) -> Result<()> {
        self.store
            .put(TRACKS, track.id.as_str(), serde_json::to_value(track)?)
            .await
    }

    // ===== Delete =====

    /// Remove a track and its payload
    ///
    /// Idempotent: removing an unknown id succeeds. Listeners are notified
    /// as soon as the track record is gone, before the payload is deleted.
    /// A payload that fails to delete is left behind as an orphan and
    /// logged; the removal itself still succeeds.
    ///
    /// # Errors
    /// Returns `Storage` if the track record cannot be read or deleted; no
    /// listener is notified in that case
    pub async fn remove(&self, id: &TrackId) -> Result<()> {
        let Some(track) = self.find(id).await? else {
            debug!(track_id = %id, "Remove of unknown track");
            self.notify_removed(id);
            return Ok(());
        };

        self.store.delete(TRACKS, id.as_str()).await?;
        self.notify_removed(id);

        if let Some(blob) = track.blob() {
            if let Err(err) = self.store.delete(BLOBS, blob.as_str()).await {
                warn!(track_id = %id, blob = %blob, error = %err, "Failed to delete track content");
            }
        }
        info!(track_id = %id, "Track removed");
        Ok(())
    }

    /// Remove every track and payload
    pub async fn clear(&self) -> Result<()> {
        let ids: Vec<TrackId> = self.list_all().await?.into_iter().map(|t| t.id).collect();
        self.store.clear(TRACKS).await?;
        self.store.clear(BLOBS).await?;
        for id in &ids {
            self.notify_removed(id);
        }
        info!(count = ids.len(), "Catalog cleared");
        Ok(())
    }

    fn notify_removed(&self, id: &TrackId) {
        let listeners: Vec<RemovalListener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(id);
        }
    }
}
