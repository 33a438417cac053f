//! Session persistence
//!
//! Saves are debounced on the trailing edge: each `save` replaces the pending
//! snapshot and restarts the delay, so a burst of changes produces a single
//! write of the latest state. Timers run on the tokio clock, which tests
//! pause and advance by hand.

use crate::catalog::MediaCatalog;
use crate::collections::{SESSION, SESSION_KEY};
use crate::queue::Queue;
use cadenza_core::{Result, Session, Store, TrackId};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct Pending {
    snapshot: Option<Session>,
    generation: u64,
}

/// Debounced session store
pub struct SessionStore {
    store: Arc<dyn Store>,
    delay: Duration,
    pending: Arc<Mutex<Pending>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

/// A session rebuilt against the current catalog
#[derive(Debug, Clone)]
pub struct RestoredSession {
    /// Snapshot as loaded, with `queue_entries` and `cursor` already reconciled
    pub session: Session,

    /// Queue rebuilt from the reconciled entries, with modes applied
    pub queue: Queue,

    /// Number of entries dropped because their track no longer exists
    pub dropped: usize,
}

impl SessionStore {
    /// Create a session store with the given debounce delay
    pub fn new(store: Arc<dyn Store>, delay: Duration) -> Self {
        Self {
            store,
            delay,
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    /// Debounce delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn lock_pending(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedule a snapshot to be written after the debounce delay
    ///
    /// Outside a tokio runtime the snapshot stays pending until `flush`.
    pub fn save(&self, session: Session) {
        let generation = {
            let mut pending = self.lock_pending();
            pending.generation += 1;
            pending.snapshot = Some(session);
            pending.generation
        };

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime; session snapshot kept until flush");
            return;
        };

        let store = Arc::clone(&self.store);
        let pending = Arc::clone(&self.pending);
        let delay = self.delay;
        handle.spawn(async move {
            tokio::time::sleep(delay).await;

            let snapshot = {
                let mut guard = pending.lock().unwrap_or_else(PoisonError::into_inner);
                if guard.generation != generation {
                    return;
                }
                guard.snapshot.take()
            };

            if let Some(snapshot) = snapshot {
                if let Err(err) = write(store.as_ref(), &snapshot).await {
                    warn!(error = %err, "Debounced session write failed");
                    // Keep it for the next flush unless a newer one arrived
                    let mut guard = pending.lock().unwrap_or_else(PoisonError::into_inner);
                    if guard.generation == generation && guard.snapshot.is_none() {
                        guard.snapshot = Some(snapshot);
                    }
                }
            }
        });
    }

    /// Whether a snapshot is waiting to be written
    pub fn has_pending(&self) -> bool {
        self.lock_pending().snapshot.is_some()
    }

    /// Write the pending snapshot now (graceful shutdown)
    ///
    /// # Errors
    /// Returns `Storage` if the write fails; the snapshot stays pending
    pub async fn flush(&self) -> Result<()> {
        let (snapshot, generation) = {
            let mut pending = self.lock_pending();
            pending.generation += 1;
            (pending.snapshot.take(), pending.generation)
        };

        let Some(snapshot) = snapshot else {
            return Ok(());
        };

        if let Err(err) = write(self.store.as_ref(), &snapshot).await {
            let mut pending = self.lock_pending();
            if pending.generation == generation && pending.snapshot.is_none() {
                pending.snapshot = Some(snapshot);
            }
            return Err(err);
        }
        debug!("Session flushed");
        Ok(())
    }

    /// Write a snapshot immediately, discarding anything pending
    pub async fn save_now(&self, session: &Session) -> Result<()> {
        {
            let mut pending = self.lock_pending();
            pending.generation += 1;
            pending.snapshot = None;
        }
        write(self.store.as_ref(), session).await
    }

    /// Last saved snapshot, `None` if nothing readable was ever saved
    ///
    /// A pending (not yet written) snapshot takes precedence so callers see
    /// the most recent state.
    pub async fn load_saved(&self) -> Result<Option<Session>> {
        let pending = self.lock_pending().snapshot.clone();
        if pending.is_some() {
            return Ok(pending);
        }

        match self.store.get(SESSION, SESSION_KEY).await? {
            Some(value) => match serde_json::from_value(value) {
                Ok(session) => Ok(Some(session)),
                Err(err) => {
                    warn!(error = %err, "Unreadable session snapshot; starting fresh");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Last saved snapshot, or the default session if none was saved
    pub async fn load(&self) -> Result<Session> {
        Ok(self.load_saved().await?.unwrap_or_default())
    }

    /// Load the snapshot and reconcile it with the catalog
    ///
    /// Entries whose track no longer resolves are dropped. The cursor follows
    /// the entry it pointed at, or is cleared if that entry was dropped.
    /// Returns `None` when there is no saved snapshot to restore.
    pub async fn restore(&self, catalog: &MediaCatalog) -> Result<Option<RestoredSession>> {
        let Some(session) = self.load_saved().await? else {
            debug!("No saved session");
            return Ok(None);
        };
        let known: HashSet<TrackId> = catalog.list_all().await?.into_iter().map(|t| t.id).collect();

        let restored = rehydrate(session, |id| known.contains(id));
        if restored.dropped > 0 {
            info!(dropped = restored.dropped, "Dropped queue entries for removed tracks");
        }
        Ok(Some(restored))
    }

    /// Delete the stored snapshot and anything pending
    pub async fn clear(&self) -> Result<()> {
        {
            let mut pending = self.lock_pending();
            pending.generation += 1;
            pending.snapshot = None;
        }
        self.store.delete(SESSION, SESSION_KEY).await
    }
}

async fn write(store: &dyn Store, session: &Session) -> Result<()> {
    store
        .put(SESSION, SESSION_KEY, serde_json::to_value(session)?)
        .await
}

/// Reconcile a session with the set of tracks that still exist
pub fn rehydrate(mut session: Session, exists: impl Fn(&TrackId) -> bool) -> RestoredSession {
    let original_len = session.queue_entries.len();
    let mut cursor = None;
    let mut kept = Vec::with_capacity(original_len);

    for (index, track_id) in session.queue_entries.drain(..).enumerate() {
        if !exists(&track_id) {
            continue;
        }
        if session.cursor == Some(index) {
            cursor = Some(kept.len());
        }
        kept.push(track_id);
    }

    let dropped = original_len - kept.len();
    session.queue_entries = kept;
    session.cursor = cursor;
    if session.last_played.as_ref().is_some_and(|id| !exists(id)) {
        session.last_played = None;
    }

    let mut queue = Queue::from_track_ids(session.queue_entries.clone(), session.cursor);
    queue.set_shuffle(session.shuffle);
    queue.set_repeat(session.repeat_mode);

    RestoredSession {
        session,
        queue,
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::RepeatMode;

    fn ids(names: &[&str]) -> Vec<TrackId> {
        names.iter().map(|n| TrackId::new(*n)).collect()
    }

    #[test]
    fn rehydrate_keeps_everything_when_catalog_is_intact() {
        let session = Session {
            queue_entries: ids(&["a", "b", "c"]),
            cursor: Some(2),
            repeat_mode: RepeatMode::All,
            ..Session::default()
        };
        let restored = rehydrate(session.clone(), |_| true);
        assert_eq!(restored.session, session);
        assert_eq!(restored.dropped, 0);
        assert_eq!(restored.queue.cursor(), Some(2));
        assert_eq!(restored.queue.repeat(), RepeatMode::All);
    }

    #[test]
    fn rehydrate_remaps_cursor_past_dropped_entries() {
        let session = Session {
            queue_entries: ids(&["gone", "a", "gone", "b"]),
            cursor: Some(3),
            ..Session::default()
        };
        let restored = rehydrate(session, |id| id.as_str() != "gone");
        assert_eq!(restored.session.queue_entries, ids(&["a", "b"]));
        assert_eq!(restored.session.cursor, Some(1));
        assert_eq!(restored.dropped, 2);
    }

    #[test]
    fn rehydrate_clears_cursor_when_its_entry_is_dropped() {
        let session = Session {
            queue_entries: ids(&["a", "gone", "b"]),
            cursor: Some(1),
            last_played: Some(TrackId::new("gone")),
            ..Session::default()
        };
        let restored = rehydrate(session, |id| id.as_str() != "gone");
        assert_eq!(restored.session.cursor, None);
        assert_eq!(restored.session.last_played, None);
        assert_eq!(restored.queue.len(), 2);
    }
}
