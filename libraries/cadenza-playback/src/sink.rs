//! Sink adapters
//!
//! Wrap the host capabilities ([`MediaSink`], [`RemoteVideoWidget`]) in the
//! uniform [`Sink`] contract the controller drives. The media adapter owns
//! the object URL of the loaded blob: it is revoked as soon as another
//! source replaces it, when the sink is detached, or when the adapter drops.

use cadenza_core::{
    CadenzaError, MediaSink, RemoteVideoWidget, Result, Sink, SinkKind, SinkSource,
};
use tracing::debug;

fn known_duration(duration: Option<f64>) -> Option<f64> {
    duration.filter(|d| d.is_finite() && *d > 0.0)
}

/// [`Sink`] over a host media element
#[derive(Debug)]
pub struct MediaElementSink<M: MediaSink> {
    element: M,
    object_url: Option<String>,
}

impl<M: MediaSink> MediaElementSink<M> {
    /// Wrap a host media element
    pub fn new(element: M) -> Self {
        Self {
            element,
            object_url: None,
        }
    }

    /// The wrapped element
    pub fn element(&self) -> &M {
        &self.element
    }

    /// Object URL of the currently loaded blob, if any
    pub fn object_url(&self) -> Option<&str> {
        self.object_url.as_deref()
    }

    fn release_object_url(&mut self) {
        if let Some(url) = self.object_url.take() {
            debug!(url, "Revoking object URL");
            self.element.revoke_object_url(&url);
        }
    }
}

impl<M: MediaSink> Sink for MediaElementSink<M> {
    fn kind(&self) -> SinkKind {
        SinkKind::Media
    }

    fn attach(&mut self) {
        self.element.set_listening(true);
    }

    fn detach(&mut self) {
        self.element.pause();
        self.element.set_listening(false);
        if let Err(err) = self.element.set_source(None) {
            debug!(error = %err, "Clearing media source failed");
        }
        self.release_object_url();
    }

    fn load(&mut self, source: SinkSource) -> Result<()> {
        match source {
            SinkSource::Blob { bytes, mime, .. } => {
                let url = self.element.create_object_url(&bytes, mime.as_deref())?;
                if let Err(err) = self.element.set_source(Some(&url)) {
                    self.element.revoke_object_url(&url);
                    return Err(err);
                }
                self.release_object_url();
                self.object_url = Some(url);
            }
            SinkSource::Url(url) => {
                self.element.set_source(Some(&url))?;
                self.release_object_url();
            }
            SinkSource::RemoteVideo(id) => {
                return Err(CadenzaError::playback(format!(
                    "media element cannot play remote video {id}"
                )));
            }
        }
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.element.play()
    }

    fn pause(&mut self) {
        self.element.pause();
    }

    fn seek(&mut self, seconds: f64) {
        self.element.set_current_time(seconds.max(0.0));
    }

    fn duration(&self) -> Option<f64> {
        known_duration(self.element.duration())
    }

    fn current_time(&self) -> f64 {
        self.element.current_time()
    }

    fn set_volume(&mut self, volume: f64) {
        self.element.set_volume(volume.clamp(0.0, 1.0));
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.element.set_playback_rate(rate);
    }
}

impl<M: MediaSink> Drop for MediaElementSink<M> {
    fn drop(&mut self) {
        self.release_object_url();
    }
}

/// [`Sink`] over a remote video widget
#[derive(Debug)]
pub struct RemoteWidgetSink<W: RemoteVideoWidget> {
    widget: W,
}

impl<W: RemoteVideoWidget> RemoteWidgetSink<W> {
    /// Wrap a host widget
    pub fn new(widget: W) -> Self {
        Self { widget }
    }

    /// The wrapped widget
    pub fn widget(&self) -> &W {
        &self.widget
    }
}

impl<W: RemoteVideoWidget> Sink for RemoteWidgetSink<W> {
    fn kind(&self) -> SinkKind {
        SinkKind::Remote
    }

    fn attach(&mut self) {
        self.widget.set_listening(true);
    }

    fn detach(&mut self) {
        self.widget.pause();
        self.widget.set_listening(false);
    }

    fn load(&mut self, source: SinkSource) -> Result<()> {
        match source {
            SinkSource::RemoteVideo(id) => self.widget.load(&id),
            SinkSource::Blob { handle, .. } => Err(CadenzaError::playback(format!(
                "remote widget cannot play local blob {handle}"
            ))),
            SinkSource::Url(url) => Err(CadenzaError::playback(format!(
                "remote widget cannot play url {url}"
            ))),
        }
    }

    fn play(&mut self) -> Result<()> {
        self.widget.play()
    }

    fn pause(&mut self) {
        self.widget.pause();
    }

    fn seek(&mut self, seconds: f64) {
        self.widget.seek_to(seconds.max(0.0));
    }

    fn duration(&self) -> Option<f64> {
        known_duration(self.widget.duration())
    }

    fn current_time(&self) -> f64 {
        self.widget.current_time()
    }

    fn set_volume(&mut self, volume: f64) {
        self.widget.set_volume((volume.clamp(0.0, 1.0) * 100.0).round() as u8);
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.widget.set_playback_rate(rate);
    }
}
