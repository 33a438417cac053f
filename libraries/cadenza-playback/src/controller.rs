//! Playback controller - core orchestration
//!
//! Binds one queue entry at a time to the sink matching its track kind,
//! mediates transport commands and routes sink notifications back into queue
//! advancement.
//!
//! The controller is a cheap `Clone` handle; every clone drives the same
//! state. State lives behind a `std::sync::Mutex` that is only held between
//! suspension points, never across an `.await`. Loads are two-phase: the
//! cursor and a fresh request token are committed first, the catalog is read
//! without the lock, and the result is applied only if the token is still
//! current. A newer load, a stop or a queue change that removes the current
//! entry all bump the token, so late completions are discarded.

use crate::catalog::{ListenerId, MediaCatalog};
use crate::events::PlaybackEvent;
use crate::history::History;
use crate::playlists::PlaylistStore;
use crate::queue::{Added, Direction, Queue};
use crate::session::{RestoredSession, SessionStore};
use crate::types::{LoadOutcome, PlaybackConfig, PlayerState};
use crate::volume::Volume;
use cadenza_core::{
    CadenzaError, Payload, Playlist, PlaylistId, RepeatMode, Result, Session, Sink, SinkEvent,
    SinkKind, SinkSource, Track, TrackId, TrackKind,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Slowest accepted playback rate
pub const MIN_PLAYBACK_RATE: f64 = 0.25;

/// Fastest accepted playback rate
pub const MAX_PLAYBACK_RATE: f64 = 4.0;

/// Which sink plays a given track kind
pub fn sink_kind_for(kind: TrackKind) -> SinkKind {
    match kind {
        TrackKind::Local | TrackKind::Url => SinkKind::Media,
        TrackKind::Remote => SinkKind::Remote,
    }
}

struct Inner {
    queue: Queue,
    state: PlayerState,
    media_sink: Box<dyn Sink>,
    remote_sink: Box<dyn Sink>,
    active: Option<SinkKind>,
    current: Option<Track>,
    load_token: u64,
    hold_load: bool,
    volume: Volume,
    playback_rate: f64,
    last_position_save: Option<Instant>,
    history: History,
    pending_events: Vec<PlaybackEvent>,
}

impl Inner {
    fn sink_mut(&mut self, kind: SinkKind) -> &mut dyn Sink {
        match kind {
            SinkKind::Media => self.media_sink.as_mut(),
            SinkKind::Remote => self.remote_sink.as_mut(),
        }
    }

    fn sink(&self, kind: SinkKind) -> &dyn Sink {
        match kind {
            SinkKind::Media => self.media_sink.as_ref(),
            SinkKind::Remote => self.remote_sink.as_ref(),
        }
    }

    fn active_sink_mut(&mut self) -> Option<&mut dyn Sink> {
        let kind = self.active?;
        Some(self.sink_mut(kind))
    }

    fn active_sink(&self) -> Option<&dyn Sink> {
        self.active.map(|kind| self.sink(kind))
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.pending_events.push(event);
    }

    fn set_state(&mut self, state: PlayerState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "Player state");
            self.state = state;
            self.emit(PlaybackEvent::StateChanged { state });
        }
    }

    fn emit_queue_changed(&mut self) {
        let event = PlaybackEvent::QueueChanged {
            length: self.queue.len(),
            cursor: self.queue.cursor(),
        };
        self.emit(event);
    }

    fn emit_mode_changed(&mut self) {
        let event = PlaybackEvent::ModeChanged {
            shuffle: self.queue.shuffle(),
            repeat: self.queue.repeat(),
        };
        self.emit(event);
    }

    fn emit_volume_changed(&mut self) {
        let event = PlaybackEvent::VolumeChanged {
            level: self.volume.level(),
            is_muted: self.volume.is_muted(),
        };
        self.emit(event);
    }

    fn apply_volume(&mut self) {
        let fraction = self.volume.fraction();
        if let Some(sink) = self.active_sink_mut() {
            sink.set_volume(fraction);
        }
    }

    /// Invalidate in-flight loads and go idle
    ///
    /// With `release` the active sink is detached and the current track
    /// dropped; otherwise the sink is only paused and keeps its last frame.
    fn halt(&mut self, release: bool) {
        self.load_token += 1;
        self.hold_load = false;
        self.last_position_save = None;
        if release {
            if let Some(kind) = self.active.take() {
                self.sink_mut(kind).detach();
            }
            self.current = None;
        } else if let Some(sink) = self.active_sink_mut() {
            sink.pause();
        }
        self.set_state(PlayerState::Idle);
    }

    /// Make `kind` the active sink, detaching the other one
    fn activate(&mut self, kind: SinkKind) {
        if self.active == Some(kind) {
            return;
        }
        if let Some(previous) = self.active.take() {
            debug!(from = ?previous, to = ?kind, "Switching sink");
            self.sink_mut(previous).detach();
        }
        self.sink_mut(kind).attach();
        self.active = Some(kind);
        self.emit(PlaybackEvent::SinkChanged { kind });
    }

    fn snapshot(&self) -> Session {
        Session {
            queue_entries: self.queue.track_ids(),
            cursor: self.queue.cursor(),
            volume: self.volume.level(),
            muted: self.volume.is_muted(),
            shuffle: self.queue.shuffle(),
            repeat_mode: self.queue.repeat(),
            playback_rate: self.playback_rate,
            last_played: self
                .current
                .as_ref()
                .map(|t| t.id.clone())
                .or_else(|| self.history.peek().cloned()),
        }
    }
}

struct Shared {
    catalog: Arc<MediaCatalog>,
    session: Option<Arc<SessionStore>>,
    config: PlaybackConfig,
    inner: Mutex<Inner>,
    removal_listener: ListenerId,
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.catalog.remove_listener(self.removal_listener);
    }
}

/// Playback controller
///
/// Owns both sinks exclusively; everything else talks to them through the
/// controller's commands.
#[derive(Clone)]
pub struct PlaybackController {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("PlaybackController")
            .field("state", &inner.state)
            .field("active", &inner.active)
            .field("queue_len", &inner.queue.len())
            .field("cursor", &inner.queue.cursor())
            .finish_non_exhaustive()
    }
}

impl PlaybackController {
    /// Create a controller
    ///
    /// `media_sink` plays local and url tracks, `remote_sink` plays remote
    /// videos. When `session` is given every queue or settings change is
    /// handed to it for debounced persistence. The controller registers
    /// itself with the catalog so removed tracks are pruned from the queue;
    /// the registration is released when the last clone is dropped.
    pub fn new(
        catalog: Arc<MediaCatalog>,
        session: Option<Arc<SessionStore>>,
        media_sink: Box<dyn Sink>,
        remote_sink: Box<dyn Sink>,
        config: PlaybackConfig,
    ) -> Self {
        if media_sink.kind() != SinkKind::Media || remote_sink.kind() != SinkKind::Remote {
            warn!("Sinks were passed in an unexpected order");
        }

        let mut queue = Queue::new();
        queue.set_shuffle(config.shuffle);
        queue.set_repeat(config.repeat);

        let inner = Inner {
            queue,
            state: PlayerState::Idle,
            media_sink,
            remote_sink,
            active: None,
            current: None,
            load_token: 0,
            hold_load: false,
            volume: Volume::new(config.volume),
            playback_rate: clamp_rate(config.playback_rate),
            last_position_save: None,
            history: History::new(config.history_size),
            pending_events: Vec::new(),
        };

        let shared = Arc::new_cyclic(|weak: &Weak<Shared>| {
            let weak = weak.clone();
            let removal_listener = catalog.on_remove(move |track_id| {
                if let Some(shared) = weak.upgrade() {
                    PlaybackController { shared }.prune_track(track_id);
                }
            });
            Shared {
                catalog: Arc::clone(&catalog),
                session,
                config,
                inner: Mutex::new(inner),
                removal_listener,
            }
        });

        Self { shared }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, inner: &Inner) {
        if let Some(session) = &self.shared.session {
            session.save(inner.snapshot());
        }
    }

    /// Catalog this controller resolves tracks against
    pub fn catalog(&self) -> &Arc<MediaCatalog> {
        &self.shared.catalog
    }

    /// Controller configuration
    pub fn config(&self) -> &PlaybackConfig {
        &self.shared.config
    }

    // ===== Playback Control =====

    /// Load the queue entry at `index` into its sink and start playback
    ///
    /// The cursor moves to `index` immediately. For `local` and `url` tracks
    /// the sink seeks to the stored resume position before `play` is issued.
    /// The state becomes `Playing` only when the sink reports it. If the user
    /// pauses while the track is still loading, it is loaded without `play`
    /// and the outcome is [`LoadOutcome::Held`].
    ///
    /// # Errors
    /// Returns `Playback` if the sink rejects the source or refuses to start
    /// (the latter leaves the track loaded and `Paused`), or `Storage` if the
    /// catalog cannot be read. An out-of-range index is not an error; it
    /// yields [`LoadOutcome::Ignored`].
    pub async fn load_and_play(&self, index: usize) -> Result<LoadOutcome> {
        let (token, track_id) = {
            let mut inner = self.lock();
            let Some(entry) = inner.queue.get(index) else {
                debug!(index, len = inner.queue.len(), "Load of out-of-range index ignored");
                return Ok(LoadOutcome::Ignored);
            };
            let track_id = entry.track_id.clone();
            inner.queue.set_cursor(index)?;

            inner.load_token += 1;
            inner.hold_load = false;
            let token = inner.load_token;
            if let Some(sink) = inner.active_sink_mut() {
                sink.pause();
            }
            inner.set_state(PlayerState::Loading);
            inner.emit_queue_changed();
            self.persist(&inner);
            (token, track_id)
        };

        let track = match self.shared.catalog.find(&track_id).await {
            Ok(Some(track)) => track,
            Ok(None) => return Ok(self.drop_missing(token, &track_id)),
            Err(err) => return self.fail_load(token, err),
        };

        let source = match &track.payload {
            Payload::Local { blob, mime } => match self.shared.catalog.read_blob(blob).await {
                Ok(bytes) => SinkSource::Blob {
                    handle: blob.clone(),
                    bytes,
                    mime: mime.clone(),
                },
                Err(err) if err.is_not_found() => {
                    let err = CadenzaError::playback(format!(
                        "track {} has no stored content; add the file again",
                        track.id
                    ));
                    return self.fail_load(token, err);
                }
                Err(err) => return self.fail_load(token, err),
            },
            Payload::Url { url } => SinkSource::Url(url.clone()),
            Payload::Remote { video_id } => SinkSource::RemoteVideo(video_id.clone()),
        };

        let mut inner = self.lock();
        if inner.load_token != token {
            debug!(track_id = %track.id, "Load superseded");
            return Ok(LoadOutcome::Superseded);
        }

        let kind = sink_kind_for(track.kind());
        inner.activate(kind);
        let volume = inner.volume.fraction();
        let rate = inner.playback_rate;
        let resume = track.kind().tracks_resume_position() && track.resume_position_seconds > 0.0;
        let hold = std::mem::take(&mut inner.hold_load);

        let sink = inner.sink_mut(kind);
        if let Err(err) = sink.load(source) {
            drop(inner);
            return self.fail_load(token, err);
        }
        sink.set_volume(volume);
        sink.set_playback_rate(rate);
        if resume {
            sink.seek(track.resume_position_seconds);
        }
        let started = if hold { Ok(()) } else { sink.play() };

        let previous_track_id = inner.current.take().map(|t| t.id);
        inner.emit(PlaybackEvent::TrackChanged {
            track_id: track.id.clone(),
            previous_track_id,
            index,
        });
        inner.history.push(track.id.clone());
        inner.last_position_save = None;
        info!(track_id = %track.id, kind = %track.kind(), index, "Track loaded");
        inner.current = Some(track);

        match started {
            Ok(()) if hold => {
                debug!("Paused during load; not starting");
                inner.set_state(PlayerState::Paused);
                self.persist(&inner);
                Ok(LoadOutcome::Held)
            }
            Ok(()) => {
                self.persist(&inner);
                Ok(LoadOutcome::Started)
            }
            Err(err) => {
                warn!(error = %err, "Sink refused to start playback");
                inner.set_state(PlayerState::Paused);
                let message = err.to_string();
                inner.emit(PlaybackEvent::Error {
                    message: message.clone(),
                });
                self.persist(&inner);
                Err(CadenzaError::playback(message))
            }
        }
    }

    fn fail_load(&self, token: u64, err: CadenzaError) -> Result<LoadOutcome> {
        let mut inner = self.lock();
        if inner.load_token != token {
            return Ok(LoadOutcome::Superseded);
        }
        warn!(error = %err, "Load failed");
        inner.set_state(PlayerState::Idle);
        inner.emit(PlaybackEvent::Error {
            message: err.to_string(),
        });
        Err(err)
    }

    fn drop_missing(&self, token: u64, track_id: &TrackId) -> LoadOutcome {
        let mut inner = self.lock();
        if inner.load_token != token {
            return LoadOutcome::Superseded;
        }
        info!(track_id = %track_id, "Queued track no longer exists; pruning");
        inner.queue.remove_track(track_id);
        inner.history.forget(track_id);
        inner.halt(true);
        inner.emit_queue_changed();
        self.persist(&inner);
        LoadOutcome::Ignored
    }

    /// Pause when playing (or loading), resume when paused; no-op when idle
    ///
    /// Pausing a track that is still loading makes the load finish paused.
    /// Toggling again before it finishes lets it start as usual.
    ///
    /// # Errors
    /// Returns `Playback` if the sink refuses to resume
    pub fn toggle_play_pause(&self) -> Result<()> {
        let mut inner = self.lock();
        match inner.state {
            PlayerState::Idle => Ok(()),
            PlayerState::Playing | PlayerState::Loading => {
                if inner.state == PlayerState::Loading {
                    inner.hold_load = true;
                }
                if let Some(sink) = inner.active_sink_mut() {
                    sink.pause();
                }
                inner.set_state(PlayerState::Paused);
                Ok(())
            }
            PlayerState::Paused if inner.hold_load => {
                inner.hold_load = false;
                inner.set_state(PlayerState::Loading);
                Ok(())
            }
            PlayerState::Paused => {
                let Some(sink) = inner.active_sink_mut() else {
                    return Ok(());
                };
                if let Err(err) = sink.play() {
                    let message = err.to_string();
                    inner.emit(PlaybackEvent::Error {
                        message: message.clone(),
                    });
                    return Err(CadenzaError::playback(message));
                }
                Ok(())
            }
        }
    }

    /// Stop playback, keeping the queue and cursor
    ///
    /// Any load still in flight is abandoned.
    pub fn stop(&self) {
        let mut inner = self.lock();
        inner.halt(false);
    }

    /// Seek to a fraction of the duration
    ///
    /// `fraction` is clamped to `[0, 1]`. No-op while the duration is unknown.
    pub fn seek_to_fraction(&self, fraction: f64) {
        if fraction.is_nan() {
            return;
        }
        let mut inner = self.lock();
        let Some(sink) = inner.active_sink_mut() else {
            return;
        };
        let Some(duration) = sink.duration() else {
            debug!("Seek ignored; duration unknown");
            return;
        };
        sink.seek(duration * fraction.clamp(0.0, 1.0));
    }

    /// Seek relative to the current position
    ///
    /// The target is clamped to the start and, when known, the duration.
    pub fn seek_by(&self, delta_seconds: f64) {
        if !delta_seconds.is_finite() {
            return;
        }
        let mut inner = self.lock();
        let Some(sink) = inner.active_sink_mut() else {
            return;
        };
        let mut target = (sink.current_time() + delta_seconds).max(0.0);
        if let Some(duration) = sink.duration() {
            target = target.min(duration);
        }
        sink.seek(target);
    }

    /// Current position of the active sink, in seconds
    pub fn position(&self) -> Option<f64> {
        self.lock().active_sink().map(|sink| sink.current_time())
    }

    /// Duration reported by the active sink, if known
    pub fn duration(&self) -> Option<f64> {
        self.lock().active_sink().and_then(|sink| sink.duration())
    }

    // ===== Sink Notifications =====

    /// Route a notification from a sink into the controller
    ///
    /// Notifications from a sink that is not currently active are ignored,
    /// so a late event from a detached sink cannot affect playback.
    pub async fn handle_sink_event(&self, kind: SinkKind, event: SinkEvent) -> Result<()> {
        {
            let mut inner = self.lock();
            if inner.active != Some(kind) {
                debug!(?kind, ?event, "Ignoring event from inactive sink");
                return Ok(());
            }

            match &event {
                SinkEvent::Playing => {
                    if inner.current.is_some() && inner.state != PlayerState::Idle {
                        inner.set_state(PlayerState::Playing);
                    }
                    return Ok(());
                }
                SinkEvent::Paused => {
                    if matches!(inner.state, PlayerState::Playing | PlayerState::Loading) {
                        inner.set_state(PlayerState::Paused);
                    }
                    return Ok(());
                }
                SinkEvent::Error { message } => {
                    warn!(error = %message, "Sink reported an error");
                    if inner.state != PlayerState::Idle {
                        inner.set_state(PlayerState::Paused);
                    }
                    inner.emit(PlaybackEvent::Error {
                        message: message.clone(),
                    });
                    return Ok(());
                }
                SinkEvent::Ended | SinkEvent::TimeUpdate { .. } => {}
            }
        }

        match event {
            SinkEvent::Ended => self.on_sink_ended().await.map(|_| ()),
            SinkEvent::TimeUpdate { position } => self.report_position(position).await,
            _ => Ok(()),
        }
    }

    /// The active sink reached the end of its media
    ///
    /// Moves to the next entry per the queue policy, or goes idle (keeping
    /// the last frame) when there is none.
    pub async fn on_sink_ended(&self) -> Result<LoadOutcome> {
        let (token, finished, next) = {
            let mut inner = self.lock();
            let Some(track) = inner.current.as_ref() else {
                return Ok(LoadOutcome::Ignored);
            };
            let finished = (track.id.clone(), track.kind());
            inner.emit(PlaybackEvent::TrackFinished {
                track_id: finished.0.clone(),
            });
            inner.last_position_save = None;
            (inner.load_token, finished, inner.queue.advance(Direction::Next))
        };

        let (track_id, kind) = finished;
        if kind.tracks_resume_position() {
            if let Err(err) = self.shared.catalog.set_resume_position(&track_id, 0.0).await {
                if !err.is_not_found() {
                    warn!(track_id = %track_id, error = %err, "Failed to reset resume position");
                }
            }
        }

        if self.lock().load_token != token {
            return Ok(LoadOutcome::Superseded);
        }
        self.go_to(next).await
    }

    /// User pressed "next"
    pub async fn on_transport_next(&self) -> Result<LoadOutcome> {
        let next = self.lock().queue.advance(Direction::Next);
        self.go_to(next).await
    }

    /// User pressed "previous"
    ///
    /// Never wraps. With `prev_restart_threshold_secs` configured, a track
    /// that has played longer than the threshold restarts instead.
    pub async fn on_transport_prev(&self) -> Result<LoadOutcome> {
        let prev = {
            let mut inner = self.lock();
            if let Some(threshold) = self.shared.config.prev_restart_threshold_secs {
                let restart = inner.current.is_some()
                    && inner.state != PlayerState::Idle
                    && inner.active_sink().is_some_and(|s| s.current_time() > threshold);
                if restart {
                    if let Some(sink) = inner.active_sink_mut() {
                        sink.seek(0.0);
                    }
                    return Ok(LoadOutcome::Restarted);
                }
            }
            inner.queue.advance(Direction::Prev)
        };
        self.go_to(prev).await
    }

    async fn go_to(&self, index: Option<usize>) -> Result<LoadOutcome> {
        match index {
            Some(index) => self.load_and_play(index).await,
            None => {
                let mut inner = self.lock();
                inner.halt(false);
                debug!("Nothing to advance to; stopped");
                Ok(LoadOutcome::Stopped)
            }
        }
    }

    /// Record the playback position of the current track
    ///
    /// Only `local` and `url` tracks are tracked, only while playing, and at
    /// most once per `position_save_interval`.
    pub async fn report_position(&self, position: f64) -> Result<()> {
        if !position.is_finite() {
            return Ok(());
        }

        let track_id = {
            let mut inner = self.lock();
            if inner.state != PlayerState::Playing {
                return Ok(());
            }
            let Some(track) = inner.current.as_ref() else {
                return Ok(());
            };
            if !track.kind().tracks_resume_position() {
                return Ok(());
            }
            let track_id = track.id.clone();

            let now = Instant::now();
            let interval = self.shared.config.position_save_interval();
            if inner
                .last_position_save
                .is_some_and(|last| now.duration_since(last) < interval)
            {
                return Ok(());
            }
            inner.last_position_save = Some(now);
            if let Some(track) = inner.current.as_mut() {
                track.resume_position_seconds = position.max(0.0);
            }
            track_id
        };

        match self
            .shared
            .catalog
            .set_resume_position(&track_id, position)
            .await
        {
            Ok(()) => {
                self.lock().emit(PlaybackEvent::PositionSaved {
                    track_id,
                    position_seconds: position.max(0.0),
                });
                Ok(())
            }
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => {
                warn!(track_id = %track_id, error = %err, "Failed to save resume position");
                self.lock().emit(PlaybackEvent::Error {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    // ===== Queue Management =====

    /// Append a catalog track to the queue
    ///
    /// When this is the first entry of an empty queue the cursor moves to it
    /// and, with `autoplay_on_first_add`, playback starts. A refused autoplay
    /// does not fail the enqueue; it is reported through the event stream.
    ///
    /// # Errors
    /// Returns `NotFound` if the track is not in the catalog
    pub async fn enqueue(&self, track_id: &TrackId) -> Result<Added> {
        self.shared.catalog.get(track_id).await?;

        let added = {
            let mut inner = self.lock();
            let added = inner.queue.add(track_id.clone());
            inner.emit_queue_changed();
            self.persist(&inner);
            added
        };

        if added.started && self.shared.config.autoplay_on_first_add {
            if let Err(err) = self.load_and_play(added.index).await {
                warn!(error = %err, "Autoplay of first queue entry failed");
            }
        }
        Ok(added)
    }

    /// Remove the entry at `index`
    ///
    /// Removing the current entry stops playback. Returns `false` for an
    /// out-of-range index.
    pub fn remove_at(&self, index: usize) -> bool {
        let mut inner = self.lock();
        let Some(removed) = inner.queue.remove_at(index) else {
            return false;
        };
        if removed.stop {
            inner.halt(true);
        }
        inner.emit_queue_changed();
        self.persist(&inner);
        true
    }

    /// Move an entry; the cursor keeps following its entry
    pub fn move_to(&self, from: usize, to: usize) -> bool {
        let mut inner = self.lock();
        if !inner.queue.move_to(from, to) {
            return false;
        }
        inner.emit_queue_changed();
        self.persist(&inner);
        true
    }

    /// Empty the queue and stop playback
    pub fn clear_queue(&self) {
        let mut inner = self.lock();
        inner.halt(true);
        inner.queue.clear();
        inner.emit_queue_changed();
        self.persist(&inner);
    }

    /// Replace the queue contents, stopping playback
    ///
    /// Ids missing from the catalog are dropped. Returns how many were
    /// dropped.
    pub async fn replace_queue(&self, track_ids: Vec<TrackId>) -> Result<usize> {
        let known: HashSet<TrackId> = self
            .shared
            .catalog
            .list_all()
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        let total = track_ids.len();
        let kept: Vec<TrackId> = track_ids.into_iter().filter(|id| known.contains(id)).collect();
        let dropped = total - kept.len();

        let mut inner = self.lock();
        inner.halt(true);
        inner.queue.replace(kept);
        inner.emit_queue_changed();
        self.persist(&inner);
        Ok(dropped)
    }

    /// Replace the queue with a saved playlist and play it from the top
    pub async fn play_playlist(
        &self,
        playlists: &PlaylistStore,
        id: &PlaylistId,
    ) -> Result<LoadOutcome> {
        let playlist = playlists.get(id).await?;
        let dropped = self.replace_queue(playlist.track_ids).await?;
        if dropped > 0 {
            info!(playlist_id = %id, dropped, "Playlist references removed tracks");
        }
        if self.lock().queue.is_empty() {
            return Ok(LoadOutcome::Ignored);
        }
        self.load_and_play(0).await
    }

    /// Save the current queue as a new playlist
    pub async fn save_queue_as_playlist(
        &self,
        playlists: &PlaylistStore,
        name: &str,
    ) -> Result<Playlist> {
        let track_ids = self.lock().queue.track_ids();
        playlists.create(name, track_ids).await
    }

    /// Remove every queue and history reference to a track
    ///
    /// Called by the catalog after a removal. If the current entry was among
    /// them playback stops and the cursor is cleared.
    pub fn prune_track(&self, track_id: &TrackId) {
        let mut inner = self.lock();
        inner.history.forget(track_id);
        let playing_removed = inner.current.as_ref().is_some_and(|t| &t.id == track_id);
        let removed = inner.queue.remove_track(track_id);
        if removed.stop || playing_removed {
            inner.halt(true);
        }
        if !removed.entries.is_empty() {
            debug!(track_id = %track_id, count = removed.entries.len(), "Pruned queue entries");
            inner.emit_queue_changed();
            self.persist(&inner);
        }
    }

    // ===== Shuffle & Repeat =====

    /// Set the shuffle flag
    pub fn set_shuffle(&self, shuffle: bool) {
        let mut inner = self.lock();
        inner.queue.set_shuffle(shuffle);
        inner.emit_mode_changed();
        self.persist(&inner);
    }

    /// Flip the shuffle flag, returning the new value
    pub fn toggle_shuffle(&self) -> bool {
        let mut inner = self.lock();
        let shuffle = !inner.queue.shuffle();
        inner.queue.set_shuffle(shuffle);
        inner.emit_mode_changed();
        self.persist(&inner);
        shuffle
    }

    /// Set the repeat mode
    pub fn set_repeat(&self, repeat: RepeatMode) {
        let mut inner = self.lock();
        inner.queue.set_repeat(repeat);
        inner.emit_mode_changed();
        self.persist(&inner);
    }

    /// Off → All → One → Off
    pub fn cycle_repeat(&self) -> RepeatMode {
        let mut inner = self.lock();
        let repeat = inner.queue.repeat().cycle();
        inner.queue.set_repeat(repeat);
        inner.emit_mode_changed();
        self.persist(&inner);
        repeat
    }

    // ===== Volume & Rate =====

    /// Set volume level (0-100)
    pub fn set_volume(&self, level: u8) {
        self.update_volume(|v| v.set_level(level));
    }

    /// Change volume by `delta` steps
    pub fn change_volume(&self, delta: i16) -> u8 {
        self.update_volume(|v| v.adjust(delta)).level()
    }

    /// Mute output
    pub fn mute(&self) {
        self.update_volume(Volume::mute);
    }

    /// Unmute output, restoring the previous level
    pub fn unmute(&self) {
        self.update_volume(Volume::unmute);
    }

    /// Toggle mute, returning the new mute state
    pub fn toggle_mute(&self) -> bool {
        self.update_volume(Volume::toggle_mute).is_muted()
    }

    fn update_volume(&self, change: impl FnOnce(&mut Volume)) -> Volume {
        let mut inner = self.lock();
        change(&mut inner.volume);
        inner.apply_volume();
        inner.emit_volume_changed();
        self.persist(&inner);
        inner.volume
    }

    /// Set the playback rate, clamped to the supported range
    ///
    /// # Errors
    /// Returns `InvalidInput` for a non-finite rate
    pub fn set_playback_rate(&self, rate: f64) -> Result<f64> {
        if !rate.is_finite() {
            return Err(CadenzaError::invalid_input(format!("invalid playback rate {rate}")));
        }
        let rate = clamp_rate(rate);
        let mut inner = self.lock();
        inner.playback_rate = rate;
        if let Some(sink) = inner.active_sink_mut() {
            sink.set_playback_rate(rate);
        }
        inner.emit(PlaybackEvent::RateChanged { rate });
        self.persist(&inner);
        Ok(rate)
    }

    // ===== State Queries =====

    /// Controller state
    pub fn state(&self) -> PlayerState {
        self.lock().state
    }

    /// Track currently loaded into a sink
    pub fn current_track(&self) -> Option<Track> {
        self.lock().current.clone()
    }

    /// Active sink kind
    pub fn active_sink_kind(&self) -> Option<SinkKind> {
        self.lock().active
    }

    /// Copy of the queue
    pub fn queue(&self) -> Queue {
        self.lock().queue.clone()
    }

    /// Queue cursor
    pub fn cursor(&self) -> Option<usize> {
        self.lock().queue.cursor()
    }

    /// Volume settings
    pub fn volume(&self) -> Volume {
        self.lock().volume
    }

    /// Playback rate
    pub fn playback_rate(&self) -> f64 {
        self.lock().playback_rate
    }

    /// Recently played track ids, oldest first
    pub fn recently_played(&self) -> Vec<TrackId> {
        self.lock().history.get_all()
    }

    /// Session snapshot of the current queue and settings
    pub fn snapshot(&self) -> Session {
        self.lock().snapshot()
    }

    /// Take all queued events
    pub fn drain_events(&self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.lock().pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.lock().pending_events.is_empty()
    }

    // ===== Session =====

    /// Rebuild queue and settings from the persisted session
    ///
    /// Does not start playback. Returns `None`, leaving the configured
    /// volume, modes and rate untouched, when the controller has no session
    /// store or nothing has been saved yet.
    pub async fn restore_session(&self) -> Result<Option<RestoredSession>> {
        let Some(session) = &self.shared.session else {
            return Ok(None);
        };
        let Some(restored) = session.restore(&self.shared.catalog).await? else {
            return Ok(None);
        };

        let mut inner = self.lock();
        inner.halt(true);
        inner.queue = restored.queue.clone();
        let mut volume = Volume::new(restored.session.volume);
        volume.set_muted(restored.session.muted);
        inner.volume = volume;
        inner.playback_rate = clamp_rate(restored.session.playback_rate);
        if let Some(last) = &restored.session.last_played {
            inner.history.push(last.clone());
        }
        inner.emit_queue_changed();
        inner.emit_mode_changed();
        inner.emit_volume_changed();
        if restored.dropped > 0 {
            self.persist(&inner);
        }
        info!(
            entries = inner.queue.len(),
            cursor = ?inner.queue.cursor(),
            dropped = restored.dropped,
            "Session restored"
        );
        Ok(Some(restored))
    }

    /// Graceful shutdown: save the playing position, write the session now
    /// and release the sinks
    pub async fn shutdown(&self) -> Result<()> {
        let (position, snapshot) = {
            let inner = self.lock();
            let position = inner
                .current
                .as_ref()
                .filter(|t| t.kind().tracks_resume_position())
                .filter(|_| matches!(inner.state, PlayerState::Playing | PlayerState::Paused))
                .zip(inner.active_sink())
                .map(|(track, sink)| (track.id.clone(), sink.current_time()));
            (position, inner.snapshot())
        };

        if let Some((track_id, seconds)) = position {
            if let Err(err) = self.shared.catalog.set_resume_position(&track_id, seconds).await {
                warn!(track_id = %track_id, error = %err, "Failed to save final position");
            }
        }

        self.lock().halt(true);

        if let Some(session) = &self.shared.session {
            session.save_now(&snapshot).await?;
        }
        info!("Playback controller shut down");
        Ok(())
    }
}

fn clamp_rate(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_kind_follows_track_kind() {
        assert_eq!(sink_kind_for(TrackKind::Local), SinkKind::Media);
        assert_eq!(sink_kind_for(TrackKind::Url), SinkKind::Media);
        assert_eq!(sink_kind_for(TrackKind::Remote), SinkKind::Remote);
    }

    #[test]
    fn rates_are_clamped() {
        assert_eq!(clamp_rate(10.0), MAX_PLAYBACK_RATE);
        assert_eq!(clamp_rate(0.0), MIN_PLAYBACK_RATE);
        assert_eq!(clamp_rate(1.5), 1.5);
        assert_eq!(clamp_rate(f64::NAN), 1.0);
    }
}
