//! Store collection names owned by the engine

/// Track metadata records, keyed by track id
pub const TRACKS: &str = "tracks";

/// Binary payloads of local tracks, keyed by blob handle
pub const BLOBS: &str = "blobs";

/// Session snapshot (single record)
pub const SESSION: &str = "session";

/// Key of the session record
pub const SESSION_KEY: &str = "current";

/// Named playlists, keyed by playlist id
pub const PLAYLISTS: &str = "playlists";

/// Every collection, in the order a reset clears them
pub const ALL: [&str; 4] = [SESSION, PLAYLISTS, TRACKS, BLOBS];
