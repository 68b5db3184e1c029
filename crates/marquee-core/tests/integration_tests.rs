//! Integration tests for Marquee Core

use std::sync::{Arc, Mutex};

use marquee_core::host::EndedCallback;
use marquee_core::media::resolve_startup_source;
use marquee_core::{
    action_for_key, HistoryStore, JsonFileStore, KeyPhase, ListenerGuard, MediaHost, MediaSource,
    MemoryStore, NotificationStore, PlaybackController, PlaybackPhase, PlayerAction, Severity,
    StateStore,
};

// =============================================================================
// Test host
// =============================================================================

#[derive(Default)]
struct RecordingHost {
    loaded: Mutex<Vec<String>>,
    ended: Mutex<Vec<EndedCallback>>,
}

impl RecordingHost {
    fn loaded(&self) -> Vec<String> {
        self.loaded.lock().unwrap().clone()
    }
}

impl MediaHost for RecordingHost {
    fn load(&self, location: &str) {
        self.loaded.lock().unwrap().push(location.to_string());
    }

    fn play(&self) -> marquee_core::Result<()> {
        Ok(())
    }

    fn pause(&self) {}
    fn seek(&self, _seconds: f64) {}
    fn set_volume(&self, _volume: f64) {}
    fn set_rate(&self, _rate: f64) {}
    fn set_fullscreen(&self, _on: bool) {}

    fn on_ended(&self, callback: EndedCallback) -> ListenerGuard {
        self.ended.lock().unwrap().push(callback);
        ListenerGuard::noop()
    }
}

fn controller_on(store: Arc<dyn StateStore>) -> (Arc<RecordingHost>, PlaybackController) {
    let host = Arc::new(RecordingHost::default());
    let controller =
        PlaybackController::new(Arc::clone(&host) as Arc<dyn MediaHost>, HistoryStore::new(store)).unwrap();
    (host, controller)
}

// =============================================================================
// Startup resolution
// =============================================================================

#[test]
fn test_startup_with_missing_cli_path_falls_back_to_chooser() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let (_, mut controller) = controller_on(store);

    match resolve_startup_source(Some("/no/such/file.mp4")) {
        Some(source) => {
            controller.open(source).unwrap();
        }
        None => controller.enter_chooser(),
    }

    assert_eq!(controller.phase(), PlaybackPhase::ChoosingSource);
}

#[test]
fn test_startup_with_valid_cli_path_opens_directly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("intro.webm");
    std::fs::write(&path, b"x").unwrap();

    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let (host, mut controller) = controller_on(store);

    let source = resolve_startup_source(path.to_str()).expect("existing allowed file resolves");
    controller.open(source).unwrap();

    assert_eq!(controller.phase(), PlaybackPhase::Loaded);
    assert_eq!(host.loaded(), vec![path.to_str().unwrap().to_string()]);
}

// =============================================================================
// Resume flow across sessions
// =============================================================================

#[test]
fn test_resume_record_survives_store_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    // First session: open a video, watch a bit, adjust volume.
    {
        let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::open(&path).unwrap());
        let (_, mut controller) = controller_on(store);
        controller.set_source("/videos/lecture.mkv", None).unwrap();
        controller.duration_changed(600.0);
        controller.position_changed(120.0).unwrap();
        controller.set_volume(0.2).unwrap();
    }

    // Second session: volume is seeded and the saved video resumes.
    let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::open(&path).unwrap());
    let (host, mut controller) = controller_on(store);
    assert_eq!(controller.state().volume, 0.2);

    controller.continue_from_previous().unwrap();
    assert_eq!(controller.state().current_time, 120.0);
    assert_eq!(
        controller.state().source.as_ref().map(|s| s.title.as_str()),
        Some("lecture")
    );
    assert_eq!(host.loaded(), vec!["/videos/lecture.mkv".to_string()]);
}

// =============================================================================
// Notifications shared through the persisted layer
// =============================================================================

#[test]
fn test_notification_order_preserved_across_windows() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());

    // Two windows sharing the same persisted key.
    let window_a = NotificationStore::new(store.clone());
    let window_b = NotificationStore::new(store.clone());

    let first = window_a.add("download started", Severity::Info, 3000).unwrap();
    let second = window_b.add("download failed", Severity::Error, 10_000).unwrap();
    let third = window_a.add("retrying", Severity::Warning, 3000).unwrap();

    let seen_by_b = window_b.list().unwrap();
    assert_eq!(
        seen_by_b.iter().map(|n| n.id).collect::<Vec<_>>(),
        vec![first, second, third]
    );

    window_b.remove(second).unwrap();
    let seen_by_a = window_a.list().unwrap();
    assert_eq!(
        seen_by_a.iter().map(|n| n.id).collect::<Vec<_>>(),
        vec![first, third]
    );
}

#[test]
fn test_store_change_events_name_the_key() {
    let store = Arc::new(MemoryStore::new());
    let mut changes = store.subscribe();

    let notifications = NotificationStore::new(store.clone());
    notifications.add("hello", Severity::Info, 0).unwrap();

    assert_eq!(changes.try_recv().unwrap().key, "notifications");
}

// =============================================================================
// Downloaded-video handoff
// =============================================================================

#[test]
fn test_downloaded_video_opens_with_stripped_title() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let history = HistoryStore::new(store.clone());
    let (_, mut controller) = controller_on(store);

    controller
        .open(MediaSource::youtube("/dl/Conference Talk [x9y8z7].mp4", "x9y8z7"))
        .unwrap();

    assert_eq!(
        controller.state().source.as_ref().map(|s| s.title.as_str()),
        Some("Conference Talk")
    );

    let record = history.load().unwrap();
    assert!(record.is_youtube);
    assert_eq!(record.youtube_code.as_deref(), Some("x9y8z7"));
}

// =============================================================================
// Keyboard routing end to end
// =============================================================================

#[test]
fn test_key_routing_drives_controller() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let (_, mut controller) = controller_on(store);
    controller.set_source("/v/clip.mp4", None).unwrap();
    controller.duration_changed(200.0);

    match action_for_key("5", false, KeyPhase::Down) {
        Some(PlayerAction::SeekTenths(n)) => {
            controller.seek_to(f64::from(n) / 10.0).unwrap();
        }
        other => panic!("expected SeekTenths, got {other:?}"),
    }
    assert_eq!(controller.state().current_time, 100.0);

    match action_for_key(" ", false, KeyPhase::Up) {
        Some(PlayerAction::TogglePlayback) => {
            controller.toggle_playback();
        }
        other => panic!("expected TogglePlayback, got {other:?}"),
    }
    assert!(!controller.state().playing);
}
