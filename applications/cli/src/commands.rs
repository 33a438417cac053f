//! Command handlers
//!
//! Each handler works against an open [`App`] and writes human-readable
//! output to `out`, so the binary prints to stdout and tests capture a
//! buffer.

use crate::app::App;
use crate::cli::{AddCommand, Command, PlaylistCommand, QueueCommand, Switch};
use crate::error::{CliError, Result};
use cadenza_core::{NewTrack, PlaylistId, RepeatMode, Track, TrackId};
use cadenza_playback::{extract_video_id, ExportDocument, ImportMode};
use std::io::Write;
use std::path::Path;

/// Run one command
pub async fn run(app: &App, command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Add(add) => add_track(app, add, out).await,
        Command::List { favorites } => list_tracks(app, favorites, out).await,
        Command::Show { id } => {
            let track = app.library().catalog().get(&TrackId::new(id)).await?;
            writeln!(out, "{}", serde_json::to_string_pretty(&track)?)?;
            Ok(())
        }
        Command::Rename { id, title } => {
            let track = app.library().catalog().rename(&TrackId::new(id), title).await?;
            writeln!(out, "Renamed {} to \"{}\"", track.id, track.title)?;
            Ok(())
        }
        Command::Fav { id } => {
            let id = TrackId::new(id);
            let favorite = app.library().catalog().toggle_favorite(&id).await?;
            let verb = if favorite { "Added" } else { "Removed" };
            writeln!(out, "{verb} {id} {} favorites", if favorite { "to" } else { "from" })?;
            Ok(())
        }
        Command::Remove { id } => {
            let id = TrackId::new(id);
            app.library().catalog().remove(&id).await?;
            writeln!(out, "Removed {id}")?;
            Ok(())
        }
        Command::Queue(queue) => queue_command(app, queue, out).await,
        Command::Playlist(playlist) => playlist_command(app, playlist, out).await,
        Command::Export { path } => export(app, path.as_deref(), out).await,
        Command::Import { path, replace } => import(app, &path, replace, out).await,
        Command::Reset { yes } => {
            if !yes {
                return Err(CliError::InvalidArgument(
                    "reset deletes the whole library; pass --yes to confirm".to_string(),
                ));
            }
            app.library().reset().await?;
            writeln!(out, "Library reset")?;
            Ok(())
        }
    }
}

// ===== Library =====

async fn add_track(app: &App, add: AddCommand, out: &mut impl Write) -> Result<()> {
    let new_track = match add {
        AddCommand::Url { url, title } => {
            let title = title.unwrap_or_else(|| title_from_url(&url));
            NewTrack::url(title, url)
        }
        AddCommand::Remote { link, title } => {
            let video_id = extract_video_id(&link)?;
            NewTrack::remote(title.unwrap_or_else(|| video_id.clone()), video_id)
        }
        AddCommand::File { path, title } => {
            let bytes = tokio::fs::read(&path).await?;
            let mime = mime_guess::from_path(&path)
                .first()
                .map(|m| m.essence_str().to_string());
            let title = title.unwrap_or_else(|| title_from_path(&path));
            NewTrack::local(title, bytes, mime)
        }
    };

    let id = app.library().catalog().add(new_track).await?;
    writeln!(out, "{id}")?;
    Ok(())
}

async fn list_tracks(app: &App, favorites: bool, out: &mut impl Write) -> Result<()> {
    let catalog = app.library().catalog();
    let tracks = if favorites {
        catalog.favorites().await?
    } else {
        catalog.list_all().await?
    };

    if tracks.is_empty() {
        writeln!(out, "No tracks")?;
        return Ok(());
    }
    for track in &tracks {
        writeln!(out, "{}", track_line(track))?;
    }
    Ok(())
}

fn track_line(track: &Track) -> String {
    let star = if track.favorite { "*" } else { " " };
    format!("{} {star} {:<6} {}", track.id, track.kind().as_str(), track.title)
}

fn title_from_url(url: &str) -> String {
    url.split(['?', '#'])
        .next()
        .and_then(|base| base.trim_end_matches('/').rsplit('/').next())
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
        .map_or_else(|| url.to_string(), str::to_string)
}

fn title_from_path(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ===== Queue =====

async fn queue_command(app: &App, command: QueueCommand, out: &mut impl Write) -> Result<()> {
    let controller = app.controller();
    match command {
        QueueCommand::List => print_queue(app, out).await?,
        QueueCommand::Add { id } => {
            let added = controller.enqueue(&TrackId::new(id)).await?;
            writeln!(out, "Queued at position {}", added.index)?;
        }
        QueueCommand::Remove { index } => {
            if !controller.remove_at(index) {
                return Err(no_queue_entry(index));
            }
            writeln!(out, "Removed queue entry {index}")?;
        }
        QueueCommand::Move { from, to } => {
            if !controller.move_to(from, to) {
                return Err(CliError::InvalidArgument(format!(
                    "cannot move entry {from} to {to} in a queue of {}",
                    controller.queue().len()
                )));
            }
            writeln!(out, "Moved queue entry {from} to {to}")?;
        }
        QueueCommand::Clear => {
            controller.clear_queue();
            writeln!(out, "Queue cleared")?;
        }
        QueueCommand::Shuffle { value } => {
            let shuffle = match value {
                Some(Switch::On) => {
                    controller.set_shuffle(true);
                    true
                }
                Some(Switch::Off) => {
                    controller.set_shuffle(false);
                    false
                }
                None => controller.toggle_shuffle(),
            };
            writeln!(out, "Shuffle {}", if shuffle { "on" } else { "off" })?;
        }
        QueueCommand::Repeat { mode } => {
            let repeat: RepeatMode = match mode {
                Some(mode) => {
                    controller.set_repeat(mode.into());
                    mode.into()
                }
                None => controller.cycle_repeat(),
            };
            writeln!(out, "Repeat {repeat}")?;
        }
    }
    Ok(())
}

fn no_queue_entry(index: usize) -> CliError {
    CliError::InvalidArgument(format!("no queue entry at position {index}"))
}

async fn print_queue(app: &App, out: &mut impl Write) -> Result<()> {
    let queue = app.controller().queue();
    writeln!(
        out,
        "Shuffle {} | Repeat {}",
        if queue.shuffle() { "on" } else { "off" },
        queue.repeat()
    )?;

    if queue.is_empty() {
        writeln!(out, "Queue is empty")?;
        return Ok(());
    }

    let catalog = app.library().catalog();
    for (index, entry) in queue.entries().iter().enumerate() {
        let marker = if queue.cursor() == Some(index) { ">" } else { " " };
        let title = catalog
            .find(&entry.track_id)
            .await?
            .map_or_else(|| "(missing)".to_string(), |t| t.title);
        writeln!(out, "{marker} {index:>3}  {}  {title}", entry.track_id)?;
    }
    Ok(())
}

// ===== Playlists =====

async fn playlist_command(app: &App, command: PlaylistCommand, out: &mut impl Write) -> Result<()> {
    let playlists = app.library().playlists();
    match command {
        PlaylistCommand::Create { name, tracks } => {
            let catalog = app.library().catalog();
            let mut track_ids = Vec::with_capacity(tracks.len());
            for id in tracks {
                track_ids.push(catalog.get(&TrackId::new(id)).await?.id);
            }
            let playlist = playlists.create(&name, track_ids).await?;
            writeln!(out, "{}", playlist.id)?;
        }
        PlaylistCommand::List => {
            let all = playlists.list().await?;
            if all.is_empty() {
                writeln!(out, "No playlists")?;
            }
            for playlist in all {
                writeln!(
                    out,
                    "{}  {} ({} tracks)",
                    playlist.id,
                    playlist.name,
                    playlist.track_ids.len()
                )?;
            }
        }
        PlaylistCommand::Show { id } => {
            let playlist = playlists.get(&PlaylistId::new(id)).await?;
            writeln!(out, "{}", playlist.name)?;
            let catalog = app.library().catalog();
            for (index, track_id) in playlist.track_ids.iter().enumerate() {
                let title = catalog
                    .find(track_id)
                    .await?
                    .map_or_else(|| "(missing)".to_string(), |t| t.title);
                writeln!(out, "  {index:>3}  {track_id}  {title}")?;
            }
        }
        PlaylistCommand::Rename { id, name } => {
            let playlist = playlists.rename(&PlaylistId::new(id), &name).await?;
            writeln!(out, "Renamed {} to \"{}\"", playlist.id, playlist.name)?;
        }
        PlaylistCommand::Delete { id } => {
            let id = PlaylistId::new(id);
            playlists.delete(&id).await?;
            writeln!(out, "Deleted {id}")?;
        }
        PlaylistCommand::Add { id, track } => {
            let track = app.library().catalog().get(&TrackId::new(track)).await?;
            let playlist = playlists.add_track(&PlaylistId::new(id), track.id).await?;
            writeln!(out, "{} now has {} tracks", playlist.name, playlist.track_ids.len())?;
        }
        PlaylistCommand::Remove { id, index } => {
            let playlist = playlists.remove_at(&PlaylistId::new(id), index).await?;
            writeln!(out, "{} now has {} tracks", playlist.name, playlist.track_ids.len())?;
        }
        PlaylistCommand::SaveQueue { name } => {
            let playlist = app.controller().save_queue_as_playlist(playlists, &name).await?;
            writeln!(out, "{}", playlist.id)?;
        }
        PlaylistCommand::Load { id } => {
            let playlist = playlists.get(&PlaylistId::new(id)).await?;
            let dropped = app.controller().replace_queue(playlist.track_ids).await?;
            writeln!(
                out,
                "Queue replaced with {} ({} entries)",
                playlist.name,
                app.controller().queue().len()
            )?;
            if dropped > 0 {
                writeln!(out, "Skipped {dropped} removed tracks")?;
            }
        }
    }
    Ok(())
}

// ===== Export / Import =====

async fn export(app: &App, path: Option<&Path>, out: &mut impl Write) -> Result<()> {
    // pending queue edits from this process belong in the export
    app.library().sessions().flush().await?;
    let json = app.library().export().await?.to_json()?;

    match path {
        Some(path) => {
            tokio::fs::write(path, json).await?;
            writeln!(out, "Exported to {}", path.display())?;
        }
        None => writeln!(out, "{json}")?,
    }
    Ok(())
}

async fn import(app: &App, path: &Path, replace: bool, out: &mut impl Write) -> Result<()> {
    let json = tokio::fs::read_to_string(path).await?;
    let document = ExportDocument::from_json(&json)?;
    let mode = if replace {
        ImportMode::Replace
    } else {
        ImportMode::Merge
    };

    let summary = app.library().import(document, mode).await?;
    if summary.session_replaced {
        // the live queue predates the import
        app.controller().restore_session().await?;
    }

    writeln!(
        out,
        "Imported {} tracks and {} playlists",
        summary.tracks, summary.playlists
    )?;
    if summary.unplayable_local > 0 {
        writeln!(
            out,
            "{} local tracks have no stored content and cannot be played",
            summary.unplayable_local
        )?;
    }
    if summary.kind_conflicts > 0 {
        writeln!(
            out,
            "{} tracks skipped because they would change an existing track's kind",
            summary.kind_conflicts
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_titles_use_last_segment() {
        assert_eq!(title_from_url("https://cdn.example/talks/intro.mp4?t=3"), "intro.mp4");
        assert_eq!(title_from_url("https://cdn.example/talks/"), "talks");
        assert_eq!(title_from_url("https://cdn.example"), "cdn.example");
    }
}
