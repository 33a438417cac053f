//! Session persistence integration tests
//!
//! Debounce timing runs on tokio's paused clock.

mod common;

use cadenza_core::{NewTrack, RepeatMode, Session, Store, TrackId};
use cadenza_playback::collections::SESSION;
use cadenza_playback::{MediaCatalog, PlaybackConfig, SessionStore};
use common::{harness_with_store, manual_config, InstrumentedStore};
use std::sync::Arc;
use std::time::Duration;

// ===== Test Helpers =====

const DEBOUNCE: Duration = Duration::from_millis(500);

fn session_with(entries: &[&TrackId], cursor: Option<usize>) -> Session {
    Session {
        queue_entries: entries.iter().map(|id| (*id).clone()).collect(),
        cursor,
        ..Session::default()
    }
}

async fn settle(duration: Duration) {
    tokio::time::sleep(duration).await;
    tokio::task::yield_now().await;
}

// ===== Debounce Tests =====

#[tokio::test(start_paused = true)]
async fn burst_of_saves_is_written_once() {
    let store = Arc::new(InstrumentedStore::new());
    let sessions = SessionStore::new(store.clone(), DEBOUNCE);

    for volume in [10, 20, 30] {
        sessions.save(Session {
            volume,
            ..Session::default()
        });
        settle(Duration::from_millis(100)).await;
    }
    assert_eq!(store.put_count(SESSION), 0);

    settle(Duration::from_millis(350)).await;
    assert_eq!(store.put_count(SESSION), 0);

    settle(Duration::from_millis(100)).await;
    assert_eq!(store.put_count(SESSION), 1);
    assert!(!sessions.has_pending());

    let fresh = SessionStore::new(store.clone(), DEBOUNCE);
    assert_eq!(fresh.load().await.unwrap().volume, 30);
}

#[tokio::test(start_paused = true)]
async fn load_sees_pending_snapshot() {
    let store = Arc::new(InstrumentedStore::new());
    let sessions = SessionStore::new(store.clone(), DEBOUNCE);

    sessions.save(Session {
        shuffle: true,
        ..Session::default()
    });

    assert!(sessions.has_pending());
    assert!(sessions.load().await.unwrap().shuffle);
    assert_eq!(store.put_count(SESSION), 0);
}

#[tokio::test(start_paused = true)]
async fn flush_writes_immediately() {
    let store = Arc::new(InstrumentedStore::new());
    let sessions = SessionStore::new(store.clone(), DEBOUNCE);

    sessions.save(Session {
        repeat_mode: RepeatMode::One,
        ..Session::default()
    });
    sessions.flush().await.unwrap();
    assert_eq!(store.put_count(SESSION), 1);

    // the debounced task finds nothing left to write
    settle(DEBOUNCE * 2).await;
    assert_eq!(store.put_count(SESSION), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_write_stays_pending_until_flush() {
    let store = Arc::new(InstrumentedStore::new());
    let sessions = SessionStore::new(store.clone(), DEBOUNCE);

    store.set_fail_writes(true);
    sessions.save(Session {
        volume: 55,
        ..Session::default()
    });
    settle(DEBOUNCE * 2).await;
    assert!(sessions.has_pending());

    assert!(sessions.flush().await.is_err());
    assert!(sessions.has_pending());

    store.set_fail_writes(false);
    sessions.flush().await.unwrap();
    assert!(!sessions.has_pending());
    assert_eq!(
        SessionStore::new(store, DEBOUNCE).load().await.unwrap().volume,
        55
    );
}

// ===== Round Trip Tests =====

#[tokio::test]
async fn load_without_snapshot_is_default() {
    let sessions = SessionStore::new(Arc::new(InstrumentedStore::new()), DEBOUNCE);
    assert_eq!(sessions.load_saved().await.unwrap(), None);
    assert_eq!(sessions.load().await.unwrap(), Session::default());
}

#[tokio::test]
async fn unreadable_snapshot_falls_back_to_default() {
    let store = Arc::new(InstrumentedStore::new());
    store
        .put(SESSION, "current", serde_json::json!({"volume": "loud"}))
        .await
        .unwrap();

    let sessions = SessionStore::new(store, DEBOUNCE);
    assert_eq!(sessions.load_saved().await.unwrap(), None);
    assert_eq!(sessions.load().await.unwrap(), Session::default());
}

#[tokio::test]
async fn save_and_restore_round_trip() {
    let store = Arc::new(InstrumentedStore::new());
    let catalog = MediaCatalog::new(store.clone());
    let a = catalog.add(NewTrack::url("A", "https://a")).await.unwrap();
    let b = catalog.add(NewTrack::url("B", "https://b")).await.unwrap();
    let c = catalog.add(NewTrack::remote("C", "dQw4w9WgXcQ")).await.unwrap();

    let mut saved = session_with(&[&a, &b, &c, &a], Some(2));
    saved.volume = 35;
    saved.repeat_mode = RepeatMode::All;
    saved.shuffle = true;
    saved.last_played = Some(c.clone());

    let sessions = SessionStore::new(store.clone(), DEBOUNCE);
    sessions.save_now(&saved).await.unwrap();

    let restored = SessionStore::new(store, DEBOUNCE)
        .restore(&catalog)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(restored.session, saved);
    assert_eq!(restored.dropped, 0);
    assert_eq!(restored.queue.cursor(), Some(2));
    assert!(restored.queue.shuffle());
}

#[tokio::test]
async fn restore_prunes_removed_tracks() {
    let store = Arc::new(InstrumentedStore::new());
    let catalog = MediaCatalog::new(store.clone());
    let a = catalog.add(NewTrack::url("A", "https://a")).await.unwrap();
    let b = catalog.add(NewTrack::url("B", "https://b")).await.unwrap();
    let c = catalog.add(NewTrack::url("C", "https://c")).await.unwrap();

    let sessions = SessionStore::new(store, DEBOUNCE);
    sessions
        .save_now(&session_with(&[&a, &b, &c], Some(2)))
        .await
        .unwrap();
    catalog.remove(&a).await.unwrap();

    let restored = sessions.restore(&catalog).await.unwrap().unwrap();
    assert_eq!(restored.session.queue_entries, vec![b, c]);
    assert_eq!(restored.session.cursor, Some(1));
    assert_eq!(restored.dropped, 1);
}

// ===== Controller Persistence Tests =====

#[tokio::test(start_paused = true)]
async fn controller_state_survives_restart() {
    let store = Arc::new(InstrumentedStore::new());

    let first = harness_with_store(store.clone(), manual_config());
    let a = first
        .library
        .catalog()
        .add(NewTrack::url("A", "https://a"))
        .await
        .unwrap();
    let b = first
        .library
        .catalog()
        .add(NewTrack::url("B", "https://b"))
        .await
        .unwrap();
    first.controller.enqueue(&a).await.unwrap();
    first.controller.enqueue(&b).await.unwrap();
    first.controller.load_and_play(1).await.unwrap();
    first.controller.set_repeat(RepeatMode::All);
    first.controller.set_volume(40);
    first.controller.mute();
    first.controller.shutdown().await.unwrap();

    let second = harness_with_store(store, manual_config());
    let restored = second.controller.restore_session().await.unwrap().unwrap();

    assert_eq!(restored.dropped, 0);
    assert_eq!(second.controller.queue().track_ids(), vec![a, b.clone()]);
    assert_eq!(second.controller.cursor(), Some(1));
    assert_eq!(second.controller.queue().repeat(), RepeatMode::All);
    assert_eq!(second.controller.volume().level(), 40);
    assert!(second.controller.volume().is_muted());
    assert_eq!(second.controller.recently_played(), vec![b]);
    assert!(second.controller.current_track().is_none());
}

#[tokio::test]
async fn first_start_keeps_configured_settings() {
    let config = PlaybackConfig {
        volume: 40,
        shuffle: true,
        repeat: RepeatMode::All,
        playback_rate: 1.5,
        ..manual_config()
    };
    let h = harness_with_store(Arc::new(InstrumentedStore::new()), config);

    assert!(h.controller.restore_session().await.unwrap().is_none());

    let queue = h.controller.queue();
    assert_eq!(queue.repeat(), RepeatMode::All);
    assert!(queue.shuffle());
    assert_eq!(h.controller.volume().level(), 40);
    assert_eq!(h.controller.playback_rate(), 1.5);
}

#[tokio::test(start_paused = true)]
async fn controller_mutations_are_debounced() {
    let store = Arc::new(InstrumentedStore::new());
    let h = harness_with_store(store.clone(), manual_config());
    let a = h
        .library
        .catalog()
        .add(NewTrack::url("A", "https://a"))
        .await
        .unwrap();

    h.controller.enqueue(&a).await.unwrap();
    h.controller.enqueue(&a).await.unwrap();
    h.controller.set_shuffle(true);
    h.controller.set_volume(10);
    assert_eq!(store.put_count(SESSION), 0);

    settle(DEBOUNCE + Duration::from_millis(10)).await;
    assert_eq!(store.put_count(SESSION), 1);

    let persisted = SessionStore::new(store, DEBOUNCE).load().await.unwrap();
    assert_eq!(persisted.queue_entries.len(), 2);
    assert!(persisted.shuffle);
    assert_eq!(persisted.volume, 10);
}
