//! Export / import / reset integration tests

mod common;

use cadenza_core::{NewTrack, Payload, RepeatMode, Session, TrackKind};
use cadenza_playback::{ExportDocument, ImportMode, Library, PlaybackConfig};
use cadenza_storage::MemoryStore;
use common::{harness, manual_config};
use std::sync::Arc;

// ===== Test Helpers =====

fn empty_library() -> Library {
    Library::open(Arc::new(MemoryStore::new()), &PlaybackConfig::default())
}

async fn populated_library() -> Library {
    let library = empty_library();
    let catalog = library.catalog();
    let local = catalog
        .add(NewTrack::local("home video", vec![1, 2, 3, 4], None))
        .await
        .unwrap();
    let url = catalog.add(NewTrack::url("talk", "https://a/talk.mp4")).await.unwrap();
    let remote = catalog.add(NewTrack::remote("clip", "dQw4w9WgXcQ")).await.unwrap();
    catalog.toggle_favorite(&url).await.unwrap();

    library
        .playlists()
        .create("Mix", vec![url.clone(), remote.clone()])
        .await
        .unwrap();
    library
        .sessions()
        .save_now(&Session {
            queue_entries: vec![local, url, remote],
            cursor: Some(1),
            repeat_mode: RepeatMode::All,
            ..Session::default()
        })
        .await
        .unwrap();
    library
}

// ===== Export Tests =====

#[tokio::test]
async fn export_contains_metadata_only() {
    let library = populated_library().await;

    let document = library.export().await.unwrap();

    assert_eq!(document.tracks.len(), 3);
    assert_eq!(document.playlists.len(), 1);
    assert_eq!(document.queue.cursor, Some(1));
    let json = document.to_json().unwrap();
    // blob content is base64 in the store; it must not leak into the export
    assert!(!json.contains("AQIDBA=="));
}

// ===== Import Tests =====

#[tokio::test]
async fn replace_import_into_fresh_library() {
    let source = populated_library().await;
    let json = source.export().await.unwrap().to_json().unwrap();

    let target = empty_library();
    let summary = target
        .import(ExportDocument::from_json(&json).unwrap(), ImportMode::Replace)
        .await
        .unwrap();

    assert_eq!(summary.tracks, 3);
    assert_eq!(summary.playlists, 1);
    assert_eq!(summary.unplayable_local, 1);
    assert!(summary.session_replaced);

    let imported = target.catalog().list_all().await.unwrap();
    assert_eq!(imported, source.catalog().list_all().await.unwrap());
    assert_eq!(target.catalog().favorites().await.unwrap().len(), 1);

    let restored = target.sessions().restore(target.catalog()).await.unwrap().unwrap();
    assert_eq!(restored.session.queue_entries.len(), 3);
    assert_eq!(restored.session.cursor, Some(1));
    assert_eq!(restored.queue.repeat(), RepeatMode::All);
}

#[tokio::test]
async fn reimport_into_same_library_keeps_content_playable() {
    let library = populated_library().await;
    let document = library.export().await.unwrap();

    let summary = library.import(document, ImportMode::Merge).await.unwrap();

    assert_eq!(summary.tracks, 3);
    assert_eq!(summary.unplayable_local, 0);
    assert!(!summary.session_replaced);
    assert_eq!(library.catalog().list_all().await.unwrap().len(), 3);
}

#[tokio::test]
async fn merge_keeps_existing_tracks_and_session() {
    let source = populated_library().await;
    let document = source.export().await.unwrap();

    let target = empty_library();
    let own = target
        .catalog()
        .add(NewTrack::url("mine", "https://mine"))
        .await
        .unwrap();
    target
        .sessions()
        .save_now(&Session {
            queue_entries: vec![own.clone()],
            cursor: Some(0),
            ..Session::default()
        })
        .await
        .unwrap();

    target.import(document, ImportMode::Merge).await.unwrap();

    assert_eq!(target.catalog().list_all().await.unwrap().len(), 4);
    let session = target.sessions().load().await.unwrap();
    assert_eq!(session.queue_entries, vec![own]);
}

#[tokio::test]
async fn merge_never_changes_an_existing_track_kind() {
    let library = populated_library().await;
    let mut document = library.export().await.unwrap();
    let talk = document
        .tracks
        .iter_mut()
        .find(|t| t.kind() == TrackKind::Url)
        .unwrap();
    talk.payload = Payload::remote("dQw4w9WgXcQ");
    talk.title = "renamed".into();
    let talk_id = talk.id.clone();

    let summary = library.import(document, ImportMode::Merge).await.unwrap();

    assert_eq!(summary.kind_conflicts, 1);
    assert_eq!(summary.tracks, 2);
    let kept = library.catalog().get(&talk_id).await.unwrap();
    assert_eq!(kept.kind(), TrackKind::Url);
    assert_eq!(kept.title, "talk");
}

#[tokio::test]
async fn replace_import_drops_previous_library() {
    let source = populated_library().await;
    let document = source.export().await.unwrap();

    let target = empty_library();
    let old = target
        .catalog()
        .add(NewTrack::url("old", "https://old"))
        .await
        .unwrap();

    target.import(document, ImportMode::Replace).await.unwrap();

    assert!(target.catalog().find(&old).await.unwrap().is_none());
    let kinds: Vec<TrackKind> = target
        .catalog()
        .list_all()
        .await
        .unwrap()
        .iter()
        .map(|t| t.kind())
        .collect();
    assert_eq!(kinds, vec![TrackKind::Local, TrackKind::Url, TrackKind::Remote]);
}

// ===== Reset Tests =====

#[tokio::test]
async fn reset_clears_everything_and_empties_live_queue() {
    let h = harness(manual_config());
    let a = h
        .library
        .catalog()
        .add(NewTrack::local("a", vec![9; 8], None))
        .await
        .unwrap();
    h.controller.enqueue(&a).await.unwrap();
    h.controller.load_and_play(0).await.unwrap();
    h.library.playlists().create("p", vec![a]).await.unwrap();

    h.library.reset().await.unwrap();

    assert!(h.library.catalog().list_all().await.unwrap().is_empty());
    assert!(h.library.playlists().list().await.unwrap().is_empty());
    assert_eq!(h.library.sessions().load().await.unwrap(), Session::default());
    assert!(h.controller.queue().is_empty());
    assert!(h.media.state().live_urls.is_empty());
}
