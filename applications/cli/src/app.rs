/// Engine wiring for one CLI invocation
use crate::config::CadenzaConfig;
use crate::error::Result;
use crate::headless::HeadlessSink;
use cadenza_core::{SinkKind, Store};
use cadenza_playback::{Library, PlaybackConfig, PlaybackController};
use cadenza_storage::SqliteStore;
use std::path::Path;
use std::sync::Arc;

/// Library plus a controller over silent sinks, restored from the last session
pub struct App {
    library: Library,
    controller: PlaybackController,
}

impl App {
    /// Connect to the configured database and restore the saved session
    pub async fn open(config: &CadenzaConfig) -> Result<Self> {
        ensure_database_dir(&config.storage.database_url).await?;
        let store = SqliteStore::connect(&config.storage.database_url).await?;
        tracing::debug!(database_url = %config.storage.database_url, "Database connected");
        Self::with_store(Arc::new(store), config.playback.clone()).await
    }

    /// Build over an arbitrary store
    pub async fn with_store(store: Arc<dyn Store>, mut playback: PlaybackConfig) -> Result<Self> {
        // nothing is audible from a terminal
        playback.autoplay_on_first_add = false;

        let library = Library::open(store, &playback);
        let controller = library.controller(
            Box::new(HeadlessSink::new(SinkKind::Media)),
            Box::new(HeadlessSink::new(SinkKind::Remote)),
            playback,
        );

        if let Some(restored) = controller.restore_session().await? {
            if restored.dropped > 0 {
                tracing::info!(dropped = restored.dropped, "Dropped queue entries for removed tracks");
            }
        }

        Ok(Self {
            library,
            controller,
        })
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    /// Write the session and release the sinks
    pub async fn close(&self) -> Result<()> {
        self.controller.shutdown().await?;
        Ok(())
    }
}

/// Create the parent directory of a file-backed SQLite URL
async fn ensure_database_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}
