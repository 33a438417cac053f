//! Cadenza CLI Library
//!
//! Terminal front end over the Cadenza engine: manage the library, the
//! persisted play queue, playlists, and export/import against a SQLite
//! store.
//!
//! This library exposes the command handlers for testing purposes.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod headless;

// Re-export commonly used types for convenience
pub use app::App;
pub use cli::{Cli, Command};
pub use config::CadenzaConfig;
pub use error::{CliError, Result};
pub use headless::HeadlessSink;
