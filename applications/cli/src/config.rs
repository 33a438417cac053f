/// CLI configuration
use crate::error::{CliError, Result};
use cadenza_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file, read from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "cadenza.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CadenzaConfig {
    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

impl CadenzaConfig {
    /// Load configuration from file and environment
    ///
    /// Without an explicit path, `cadenza.toml` is used if it exists.
    /// Environment variables override the file: `CADENZA_STORAGE__DATABASE_URL`,
    /// `CADENZA_PLAYBACK__VOLUME` and so on.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, environment())
    }

    /// Load with a caller-supplied environment source
    pub fn load_with(path: Option<&Path>, environment: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "config file {} does not exist",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(environment);

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.database_url.trim().is_empty() {
            return Err(CliError::Config(
                "storage.database_url must not be empty".to_string(),
            ));
        }

        if self.playback.volume > 100 {
            return Err(CliError::Config(format!(
                "playback.volume must be 0-100, got {}",
                self.playback.volume
            )));
        }

        if self.playback.history_size == 0 {
            return Err(CliError::Config(
                "playback.history_size must be at least 1".to_string(),
            ));
        }

        if !self.playback.playback_rate.is_finite() || self.playback.playback_rate <= 0.0 {
            return Err(CliError::Config(
                "playback.playback_rate must be a positive number".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for CadenzaConfig {
    fn default() -> Self {
        Self {
            storage: default_storage(),
            playback: PlaybackConfig::default(),
        }
    }
}

/// `CADENZA_`-prefixed environment source; `__` separates nested keys
pub fn environment() -> config::Environment {
    config::Environment::with_prefix("CADENZA")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

// Default value functions
fn default_storage() -> StorageSettings {
    StorageSettings {
        database_url: default_database_url(),
    }
}

fn default_database_url() -> String {
    "sqlite://./data/cadenza.db".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CadenzaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.database_url, "sqlite://./data/cadenza.db");
    }

    #[test]
    fn rejects_loud_volume() {
        let mut config = CadenzaConfig::default();
        config.playback.volume = 101;
        assert!(matches!(config.validate(), Err(CliError::Config(_))));
    }

    #[test]
    fn rejects_empty_database_url() {
        let mut config = CadenzaConfig::default();
        config.storage.database_url = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
