/// Command-line definitions
use cadenza_core::RepeatMode;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cadenza")]
#[command(about = "Cadenza media library, queue and playlist manager", long_about = None)]
pub struct Cli {
    /// Configuration file path (defaults to ./cadenza.toml when present)
    #[arg(short, long, global = true, env = "CADENZA_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a track to the library
    #[command(subcommand)]
    Add(AddCommand),
    /// List library tracks
    List {
        /// Only show favorites
        #[arg(short, long)]
        favorites: bool,
    },
    /// Show one track as JSON
    Show {
        /// Track id
        id: String,
    },
    /// Rename a track
    Rename {
        /// Track id
        id: String,
        /// New title
        title: String,
    },
    /// Toggle a track's favorite flag
    Fav {
        /// Track id
        id: String,
    },
    /// Remove a track from the library (and from the queue)
    Remove {
        /// Track id
        id: String,
    },
    /// Inspect or edit the play queue
    #[command(subcommand)]
    Queue(QueueCommand),
    /// Manage playlists
    #[command(subcommand)]
    Playlist(PlaylistCommand),
    /// Export library metadata, queue and playlists as JSON
    Export {
        /// Output file (stdout when omitted)
        path: Option<PathBuf>,
    },
    /// Import a previously exported document
    Import {
        /// Export file to read
        path: PathBuf,
        /// Drop the current library before importing
        #[arg(long)]
        replace: bool,
    },
    /// Delete every track, playlist and the saved session
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum AddCommand {
    /// Stream from a remote address
    Url {
        /// Media URL
        url: String,
        /// Display title (defaults to the last path segment)
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Remote-service video, by link or 11-character id
    Remote {
        /// Watch link, short link, embed link or bare id
        link: String,
        /// Display title (defaults to the video id)
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Copy a local file into the library
    File {
        /// File to import
        path: PathBuf,
        /// Display title (defaults to the file name)
        #[arg(short, long)]
        title: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum QueueCommand {
    /// Print the queue and play modes
    List,
    /// Append a track
    Add {
        /// Track id
        id: String,
    },
    /// Remove the entry at a position
    Remove {
        /// Zero-based position
        index: usize,
    },
    /// Move an entry to a new position
    Move {
        /// Current position
        from: usize,
        /// Target position
        to: usize,
    },
    /// Empty the queue
    Clear,
    /// Set shuffle, or toggle it when no value is given
    Shuffle {
        #[arg(value_enum)]
        value: Option<Switch>,
    },
    /// Set the repeat mode, or cycle it when no value is given
    Repeat {
        #[arg(value_enum)]
        mode: Option<RepeatArg>,
    },
}

#[derive(Debug, Subcommand)]
pub enum PlaylistCommand {
    /// Create a playlist, optionally with initial tracks
    Create {
        /// Playlist name
        name: String,
        /// Track ids
        tracks: Vec<String>,
    },
    /// List playlists
    List,
    /// Show a playlist's tracks
    Show {
        /// Playlist id
        id: String,
    },
    /// Rename a playlist
    Rename {
        /// Playlist id
        id: String,
        /// New name
        name: String,
    },
    /// Delete a playlist
    Delete {
        /// Playlist id
        id: String,
    },
    /// Append a track to a playlist
    Add {
        /// Playlist id
        id: String,
        /// Track id
        track: String,
    },
    /// Remove the entry at a position
    Remove {
        /// Playlist id
        id: String,
        /// Zero-based position
        index: usize,
    },
    /// Save the current queue as a new playlist
    SaveQueue {
        /// Playlist name
        name: String,
    },
    /// Replace the queue with a playlist's tracks
    Load {
        /// Playlist id
        id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RepeatArg {
    Off,
    All,
    One,
}

impl From<RepeatArg> for RepeatMode {
    fn from(arg: RepeatArg) -> Self {
        match arg {
            RepeatArg::Off => RepeatMode::Off,
            RepeatArg::All => RepeatMode::All,
            RepeatArg::One => RepeatMode::One,
        }
    }
}
