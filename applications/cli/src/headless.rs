//! Silent sinks for driving the controller from a terminal
//!
//! The CLI edits the queue and session but has no output device. These sinks
//! accept every source and transport command and only remember enough to
//! answer position and duration queries.

use cadenza_core::{Result, Sink, SinkKind, SinkSource};
use tracing::debug;

/// A sink that plays nothing
#[derive(Debug)]
pub struct HeadlessSink {
    kind: SinkKind,
    loaded: Option<String>,
    position: f64,
}

impl HeadlessSink {
    pub fn new(kind: SinkKind) -> Self {
        Self {
            kind,
            loaded: None,
            position: 0.0,
        }
    }

    /// Description of the loaded source, if any
    pub fn loaded(&self) -> Option<&str> {
        self.loaded.as_deref()
    }
}

impl Sink for HeadlessSink {
    fn kind(&self) -> SinkKind {
        self.kind
    }

    fn attach(&mut self) {}

    fn detach(&mut self) {
        self.loaded = None;
        self.position = 0.0;
    }

    fn load(&mut self, source: SinkSource) -> Result<()> {
        let label = match source {
            SinkSource::Blob { handle, bytes, .. } => format!("blob {handle} ({} bytes)", bytes.len()),
            SinkSource::Url(url) => url,
            SinkSource::RemoteVideo(id) => format!("video {id}"),
        };
        debug!(sink = ?self.kind, source = %label, "Headless sink loaded");
        self.loaded = Some(label);
        self.position = 0.0;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        Ok(())
    }

    fn pause(&mut self) {}

    fn seek(&mut self, seconds: f64) {
        self.position = seconds.max(0.0);
    }

    fn duration(&self) -> Option<f64> {
        None
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn set_volume(&mut self, _volume: f64) {}

    fn set_playback_rate(&mut self, _rate: f64) {}
}
