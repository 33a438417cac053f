//! Shared test doubles for the playback integration tests
//!
//! The fake host element and widget record every command they receive into
//! a shared log so tests can assert on ordering (e.g. seek before play).

#![allow(dead_code)]

use async_trait::async_trait;
use cadenza_core::{CadenzaError, MediaSink, RemoteVideoWidget, Result, Store};
use cadenza_playback::{
    Library, MediaElementSink, PlaybackConfig, PlaybackController, RemoteWidgetSink,
};
use cadenza_storage::MemoryStore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

// ===== Host Doubles =====

/// Command received by a fake host player
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Source(Option<String>),
    LoadVideo(String),
    Play,
    Pause,
    Seek(f64),
    Volume(f64),
    Rate(f64),
}

#[derive(Debug, Default)]
pub struct HostState {
    pub commands: Vec<Command>,
    pub live_urls: Vec<String>,
    pub listening: bool,
    pub duration: Option<f64>,
    pub position: f64,
    pub refuse_play: bool,
    pub reject_source: bool,
    next_url: u32,
}

impl HostState {
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn position_of(&self, command: &Command) -> Option<usize> {
        self.commands.iter().position(|c| c == command)
    }
}

/// Shared handle to a fake host's state
#[derive(Debug, Clone, Default)]
pub struct Host(Arc<Mutex<HostState>>);

impl Host {
    pub fn state(&self) -> MutexGuard<'_, HostState> {
        self.0.lock().unwrap()
    }
}

pub struct FakeElement(pub Host);

impl MediaSink for FakeElement {
    fn create_object_url(&mut self, bytes: &[u8], _mime: Option<&str>) -> Result<String> {
        let mut state = self.0.state();
        state.next_url += 1;
        let url = format!("blob:test/{}-{}", state.next_url, bytes.len());
        state.live_urls.push(url.clone());
        Ok(url)
    }

    fn revoke_object_url(&mut self, url: &str) {
        self.0.state().live_urls.retain(|u| u != url);
    }

    fn set_source(&mut self, url: Option<&str>) -> Result<()> {
        let mut state = self.0.state();
        if state.reject_source && url.is_some() {
            return Err(CadenzaError::playback("unsupported format"));
        }
        state.commands.push(Command::Source(url.map(str::to_string)));
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let mut state = self.0.state();
        if state.refuse_play {
            return Err(CadenzaError::playback("play() request was denied"));
        }
        state.commands.push(Command::Play);
        Ok(())
    }

    fn pause(&mut self) {
        self.0.state().commands.push(Command::Pause);
    }

    fn current_time(&self) -> f64 {
        self.0.state().position
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut state = self.0.state();
        state.position = seconds;
        state.commands.push(Command::Seek(seconds));
    }

    fn duration(&self) -> Option<f64> {
        self.0.state().duration
    }

    fn set_volume(&mut self, volume: f64) {
        self.0.state().commands.push(Command::Volume(volume));
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.0.state().commands.push(Command::Rate(rate));
    }

    fn set_listening(&mut self, enabled: bool) {
        self.0.state().listening = enabled;
    }
}

pub struct FakeWidget(pub Host);

impl RemoteVideoWidget for FakeWidget {
    fn load(&mut self, video_id: &str) -> Result<()> {
        self.0
            .state()
            .commands
            .push(Command::LoadVideo(video_id.to_string()));
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let mut state = self.0.state();
        if state.refuse_play {
            return Err(CadenzaError::playback("widget blocked autoplay"));
        }
        state.commands.push(Command::Play);
        Ok(())
    }

    fn pause(&mut self) {
        self.0.state().commands.push(Command::Pause);
    }

    fn seek_to(&mut self, seconds: f64) {
        let mut state = self.0.state();
        state.position = seconds;
        state.commands.push(Command::Seek(seconds));
    }

    fn duration(&self) -> Option<f64> {
        self.0.state().duration
    }

    fn current_time(&self) -> f64 {
        self.0.state().position
    }

    fn set_volume(&mut self, percent: u8) {
        self.0
            .state()
            .commands
            .push(Command::Volume(f64::from(percent)));
    }

    fn set_listening(&mut self, enabled: bool) {
        self.0.state().listening = enabled;
    }
}

// ===== Store Doubles =====

/// Memory store with per-key read delays, write counters and a failure switch
#[derive(Default)]
pub struct InstrumentedStore {
    inner: MemoryStore,
    read_delays: Mutex<HashMap<String, Duration>>,
    puts: Mutex<HashMap<String, usize>>,
    fail_writes: AtomicBool,
    fail_deletes_in: Mutex<Option<String>>,
}

impl InstrumentedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every read of `key` by `delay`
    pub fn delay_reads_of(&self, key: &str, delay: Duration) {
        self.read_delays
            .lock()
            .unwrap()
            .insert(key.to_string(), delay);
    }

    pub fn put_count(&self, collection: &str) -> usize {
        self.puts
            .lock()
            .unwrap()
            .get(collection)
            .copied()
            .unwrap_or(0)
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every delete in `collection` fail
    pub fn fail_deletes_in(&self, collection: &str) {
        *self.fail_deletes_in.lock().unwrap() = Some(collection.to_string());
    }
}

#[async_trait]
impl Store for InstrumentedStore {
    async fn put(&self, collection: &str, key: &str, record: Value) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CadenzaError::storage("store unavailable"));
        }
        *self
            .puts
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default() += 1;
        self.inner.put(collection, key, record).await
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let delay = self.read_delays.lock().unwrap().get(key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.get(collection, key).await
    }

    async fn get_all(&self, collection: &str) -> Result<Vec<Value>> {
        self.inner.get_all(collection).await
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<()> {
        if self.fail_deletes_in.lock().unwrap().as_deref() == Some(collection) {
            return Err(CadenzaError::storage("delete rejected"));
        }
        self.inner.delete(collection, key).await
    }

    async fn clear(&self, collection: &str) -> Result<()> {
        self.inner.clear(collection).await
    }
}

// ===== Harness =====

pub struct Harness {
    pub library: Library,
    pub controller: PlaybackController,
    pub media: Host,
    pub remote: Host,
}

pub fn harness(config: PlaybackConfig) -> Harness {
    harness_with_store(Arc::new(MemoryStore::new()), config)
}

pub fn harness_with_store(store: Arc<dyn Store>, config: PlaybackConfig) -> Harness {
    let library = Library::open(store, &config);
    let media = Host::default();
    let remote = Host::default();
    let controller = library.controller(
        Box::new(MediaElementSink::new(FakeElement(media.clone()))),
        Box::new(RemoteWidgetSink::new(FakeWidget(remote.clone()))),
        config,
    );
    Harness {
        library,
        controller,
        media,
        remote,
    }
}

/// Another controller over the same library, with throwaway hosts
pub fn spare_controller(library: &Library, config: PlaybackConfig) -> PlaybackController {
    library.controller(
        Box::new(MediaElementSink::new(FakeElement(Host::default()))),
        Box::new(RemoteWidgetSink::new(FakeWidget(Host::default()))),
        config,
    )
}

/// Controller config without autoplay, so tests start transport explicitly
pub fn manual_config() -> PlaybackConfig {
    PlaybackConfig {
        autoplay_on_first_add: false,
        ..PlaybackConfig::default()
    }
}
