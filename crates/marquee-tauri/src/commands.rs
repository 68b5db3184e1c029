//! Tauri IPC commands
//!
//! The webview forwards raw input (keys, wheel, pointer, media-element
//! feedback) and renders state pushed back over `player-state`. Every timed
//! effect is a tokio sleep carrying the generation token the controller
//! handed out, so a superseded timer is a no-op.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tauri::{AppHandle, Emitter, Manager, State};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex as AsyncMutex;
use tracing::warn;
use uuid::Uuid;

use marquee_core::{
    action_for_key, AlertToken, CloseOnBlur, ControlsToken, HistoryStore, JsonFileStore, KeyPhase,
    MediaHost, MediaSource, Notification, NotificationStore, PlaybackController, PlaybackState,
    PlayerAction, RateDirection, Severity, StateStore, WheelDirection, WindowSystem,
};
use marquee_core::controller::{ALERT_CLEAR_DELAY, CONTROLS_HIDE_DELAY};

use crate::host::{EventMediaHost, TauriWindows};
use crate::{download, window};

/// Shared application state
pub struct AppState {
    controller: Arc<AsyncMutex<PlaybackController>>,
    pub notifications: NotificationStore,
    store: Arc<dyn StateStore>,
    media: Arc<EventMediaHost>,
    windows: Arc<TauriWindows>,
    pub help_policy: Arc<Mutex<Option<CloseOnBlur>>>,
    pub youtube_policy: Arc<Mutex<Option<CloseOnBlur>>>,
    /// Live flag suppressing the YouTube modal's blur-close while the native
    /// save dialog holds focus.
    pub modal_suppress: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(app: &AppHandle) -> anyhow::Result<Self> {
        let config_dir = app.path().app_config_dir()?;
        let store: Arc<dyn StateStore> =
            Arc::new(JsonFileStore::open(config_dir.join("state.json"))?);

        let history = HistoryStore::new(Arc::clone(&store));
        let notifications = NotificationStore::new(Arc::clone(&store));
        let media = Arc::new(EventMediaHost::new(app.clone()));
        let controller = PlaybackController::new(
            Arc::clone(&media) as Arc<dyn MediaHost>,
            history.clone(),
        )?;

        Ok(Self {
            controller: Arc::new(AsyncMutex::new(controller)),
            notifications,
            store,
            media,
            windows: Arc::new(TauriWindows::new(app.clone())),
            help_policy: Arc::new(Mutex::new(None)),
            youtube_policy: Arc::new(Mutex::new(None)),
            modal_suppress: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn controller(&self) -> Arc<AsyncMutex<PlaybackController>> {
        Arc::clone(&self.controller)
    }

    pub fn windows(&self) -> Arc<dyn WindowSystem> {
        Arc::clone(&self.windows) as Arc<dyn WindowSystem>
    }

    /// Watch the persisted layer: another window rewriting `history` or
    /// `notifications` is reflected here without an explicit IPC round trip.
    pub fn spawn_store_watcher(&self, app: AppHandle) {
        let mut changes = self.store.subscribe();
        let controller = self.controller();

        tauri::async_runtime::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => match change.key.as_str() {
                        "history" => {
                            let mut ctrl = controller.lock().await;
                            if let Err(err) = ctrl.handle_history_change() {
                                warn!(%err, "Failed to react to history change");
                            }
                            push_state(&app, &ctrl);
                        }
                        "notifications" => {
                            let _ = app.emit("notifications-changed", ());
                        }
                        _ => {}
                    },
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }
}

/// Push the current state snapshot to the webview.
pub fn push_state(app: &AppHandle, controller: &PlaybackController) {
    let _ = app.emit("player-state", controller.state().clone());
}

fn schedule_alert_clear(
    app: AppHandle,
    controller: Arc<AsyncMutex<PlaybackController>>,
    token: AlertToken,
) {
    tauri::async_runtime::spawn(async move {
        tokio::time::sleep(ALERT_CLEAR_DELAY).await;
        let mut ctrl = controller.lock().await;
        ctrl.clear_alert(token);
        push_state(&app, &ctrl);
    });
}

fn schedule_controls_hide(
    app: AppHandle,
    controller: Arc<AsyncMutex<PlaybackController>>,
    token: ControlsToken,
) {
    tauri::async_runtime::spawn(async move {
        tokio::time::sleep(CONTROLS_HIDE_DELAY).await;
        let mut ctrl = controller.lock().await;
        ctrl.hide_controls(token);
        push_state(&app, &ctrl);
    });
}

/// Expiry timer scheduled at add-time; the store itself never expires
/// entries. Zero and "effectively infinite" timeouts get no timer.
fn schedule_notification_expiry(
    app: AppHandle,
    notifications: NotificationStore,
    id: Uuid,
    timeout_ms: i64,
) {
    if timeout_ms <= 0 || timeout_ms == i64::MAX {
        return;
    }
    tauri::async_runtime::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(timeout_ms as u64)).await;
        if let Err(err) = notifications.remove(id) {
            warn!(%id, %err, "Failed to expire notification");
        }
        let _ = app.emit("notifications-changed", ());
    });
}

/// Surface an error as a notification with a 10s display time.
fn notify_error(app: &AppHandle, state: &AppState, err: &marquee_core::Error) {
    match state.notifications.add(err.to_string(), err.severity(), 10_000) {
        Ok(id) => {
            schedule_notification_expiry(app.clone(), state.notifications.clone(), id, 10_000);
        }
        Err(store_err) => warn!(%store_err, "Failed to store error notification"),
    }
}

// ============================================================================
// Playback commands
// ============================================================================

/// Open a media file, deriving the title from the filename when not given.
#[tauri::command]
pub async fn open_video(
    app: AppHandle,
    state: State<'_, AppState>,
    path: String,
    title: Option<String>,
) -> Result<(), String> {
    let mut ctrl = state.controller.lock().await;
    ctrl.set_source(path, title).map_err(|e| e.to_string())?;
    push_state(&app, &ctrl);
    Ok(())
}

/// Resume the last session, or fall back to the chooser.
#[tauri::command]
pub async fn continue_previous(app: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    let mut ctrl = state.controller.lock().await;
    ctrl.continue_from_previous().map_err(|e| e.to_string())?;
    push_state(&app, &ctrl);
    Ok(())
}

/// Drop the current source and show the chooser.
#[tauri::command]
pub async fn change_video(app: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    let mut ctrl = state.controller.lock().await;
    ctrl.change_video();
    push_state(&app, &ctrl);
    Ok(())
}

#[tauri::command]
pub async fn toggle_playback(app: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    let mut ctrl = state.controller.lock().await;
    let token = ctrl.toggle_playback();
    push_state(&app, &ctrl);
    schedule_alert_clear(app, state.controller(), token);
    Ok(())
}

/// Absolute seek as a fraction of the duration (drag handler input).
#[tauri::command]
pub async fn seek_to(
    app: AppHandle,
    state: State<'_, AppState>,
    fraction: f64,
) -> Result<(), String> {
    let mut ctrl = state.controller.lock().await;
    ctrl.seek_to(fraction).map_err(|e| e.to_string())?;
    push_state(&app, &ctrl);
    Ok(())
}

/// Relative seek; positive is forward.
#[tauri::command]
pub async fn seek_by(
    app: AppHandle,
    state: State<'_, AppState>,
    seconds: f64,
) -> Result<(), String> {
    let mut ctrl = state.controller.lock().await;
    let token = if seconds >= 0.0 {
        ctrl.forward(seconds)
    } else {
        ctrl.rewind(-seconds)
    }
    .map_err(|e| e.to_string())?;
    push_state(&app, &ctrl);
    schedule_alert_clear(app, state.controller(), token);
    Ok(())
}

#[tauri::command]
pub async fn step_volume(
    app: AppHandle,
    state: State<'_, AppState>,
    up: bool,
) -> Result<(), String> {
    let mut ctrl = state.controller.lock().await;
    let token = if up {
        ctrl.increase_volume()
    } else {
        ctrl.decrease_volume()
    }
    .map_err(|e| e.to_string())?;
    push_state(&app, &ctrl);
    schedule_alert_clear(app, state.controller(), token);
    Ok(())
}

#[tauri::command]
pub async fn set_volume(
    app: AppHandle,
    state: State<'_, AppState>,
    volume: f64,
) -> Result<(), String> {
    let mut ctrl = state.controller.lock().await;
    ctrl.set_volume(volume).map_err(|e| e.to_string())?;
    push_state(&app, &ctrl);
    Ok(())
}

#[tauri::command]
pub async fn toggle_mute(app: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    let mut ctrl = state.controller.lock().await;
    let token = ctrl.toggle_mute().map_err(|e| e.to_string())?;
    push_state(&app, &ctrl);
    schedule_alert_clear(app, state.controller(), token);
    Ok(())
}

#[tauri::command]
pub async fn change_rate(
    app: AppHandle,
    state: State<'_, AppState>,
    direction: RateDirection,
) -> Result<(), String> {
    let mut ctrl = state.controller.lock().await;
    let (alert, controls) = ctrl.change_rate(direction);
    push_state(&app, &ctrl);
    schedule_alert_clear(app.clone(), state.controller(), alert);
    if let Some(token) = controls {
        schedule_controls_hide(app, state.controller(), token);
    }
    Ok(())
}

#[tauri::command]
pub async fn toggle_loop(app: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    let mut ctrl = state.controller.lock().await;
    ctrl.toggle_loop();
    push_state(&app, &ctrl);
    Ok(())
}

#[tauri::command]
pub async fn toggle_fullscreen(app: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    let mut ctrl = state.controller.lock().await;
    ctrl.toggle_fullscreen();
    push_state(&app, &ctrl);
    Ok(())
}

#[tauri::command]
pub async fn get_playback_state(state: State<'_, AppState>) -> Result<PlaybackState, String> {
    Ok(state.controller.lock().await.state().clone())
}

// ============================================================================
// Input routing
// ============================================================================

/// Keyboard input from the main window.
#[tauri::command]
pub async fn key_input(
    app: AppHandle,
    state: State<'_, AppState>,
    key: String,
    ctrl: bool,
    phase: KeyPhase,
) -> Result<(), String> {
    let Some(action) = action_for_key(&key, ctrl, phase) else {
        return Ok(());
    };
    dispatch_action(&app, &state, action).await
}

async fn dispatch_action(
    app: &AppHandle,
    state: &AppState,
    action: PlayerAction,
) -> Result<(), String> {
    match action {
        PlayerAction::TogglePlayback => {
            let mut ctrl = state.controller.lock().await;
            let token = ctrl.toggle_playback();
            push_state(app, &ctrl);
            schedule_alert_clear(app.clone(), state.controller(), token);
        }
        PlayerAction::Forward(seconds) => {
            let mut ctrl = state.controller.lock().await;
            let token = ctrl.forward(seconds).map_err(|e| e.to_string())?;
            push_state(app, &ctrl);
            schedule_alert_clear(app.clone(), state.controller(), token);
        }
        PlayerAction::Rewind(seconds) => {
            let mut ctrl = state.controller.lock().await;
            let token = ctrl.rewind(seconds).map_err(|e| e.to_string())?;
            push_state(app, &ctrl);
            schedule_alert_clear(app.clone(), state.controller(), token);
        }
        PlayerAction::SeekTenths(n) => {
            let mut ctrl = state.controller.lock().await;
            ctrl.seek_to(f64::from(n) / 10.0).map_err(|e| e.to_string())?;
            push_state(app, &ctrl);
        }
        PlayerAction::IncreaseVolume | PlayerAction::DecreaseVolume => {
            let mut ctrl = state.controller.lock().await;
            let token = if action == PlayerAction::IncreaseVolume {
                ctrl.increase_volume()
            } else {
                ctrl.decrease_volume()
            }
            .map_err(|e| e.to_string())?;
            push_state(app, &ctrl);
            schedule_alert_clear(app.clone(), state.controller(), token);
        }
        PlayerAction::ToggleMute => {
            let mut ctrl = state.controller.lock().await;
            let token = ctrl.toggle_mute().map_err(|e| e.to_string())?;
            push_state(app, &ctrl);
            schedule_alert_clear(app.clone(), state.controller(), token);
        }
        PlayerAction::ChangeRate(direction) => {
            let mut ctrl = state.controller.lock().await;
            let (alert, controls) = ctrl.change_rate(direction);
            push_state(app, &ctrl);
            schedule_alert_clear(app.clone(), state.controller(), alert);
            if let Some(token) = controls {
                schedule_controls_hide(app.clone(), state.controller(), token);
            }
        }
        PlayerAction::ToggleLoop => {
            let mut ctrl = state.controller.lock().await;
            ctrl.toggle_loop();
            push_state(app, &ctrl);
        }
        PlayerAction::ToggleFullscreen => {
            let mut ctrl = state.controller.lock().await;
            ctrl.toggle_fullscreen();
            push_state(app, &ctrl);
        }
        PlayerAction::OpenFileDialog => {
            // The file dialog lives in the frontend.
            let _ = app.emit("open-file-dialog", ());
        }
        PlayerAction::ShowHelp => {
            window::show_help_window(app, state).map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

/// Throttled mouse-wheel volume step.
#[tauri::command]
pub async fn wheel_input(
    app: AppHandle,
    state: State<'_, AppState>,
    direction: WheelDirection,
) -> Result<(), String> {
    let mut ctrl = state.controller.lock().await;
    if let Some(token) = ctrl.wheel(direction).map_err(|e| e.to_string())? {
        push_state(&app, &ctrl);
        schedule_alert_clear(app, state.controller(), token);
    }
    Ok(())
}

/// Pointer activity: reveal the controls and restart the auto-hide timer.
#[tauri::command]
pub async fn pointer_moved(app: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    let mut ctrl = state.controller.lock().await;
    if let Some(token) = ctrl.touch_controls() {
        push_state(&app, &ctrl);
        schedule_controls_hide(app, state.controller(), token);
    } else {
        push_state(&app, &ctrl);
    }
    Ok(())
}

// ============================================================================
// Media-element feedback
// ============================================================================

#[tauri::command]
pub async fn media_position(state: State<'_, AppState>, seconds: f64) -> Result<(), String> {
    let mut ctrl = state.controller.lock().await;
    ctrl.position_changed(seconds).map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn media_duration(
    app: AppHandle,
    state: State<'_, AppState>,
    seconds: f64,
) -> Result<(), String> {
    let mut ctrl = state.controller.lock().await;
    ctrl.duration_changed(seconds);
    push_state(&app, &ctrl);
    Ok(())
}

#[tauri::command]
pub async fn media_ended(app: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    // Loop listeners restart playback before the transport settles.
    state.media.fire_ended();
    let mut ctrl = state.controller.lock().await;
    ctrl.playback_ended();
    push_state(&app, &ctrl);
    Ok(())
}

// ============================================================================
// Notifications
// ============================================================================

/// Queue a notification; negative timeouts become "effectively infinite".
#[tauri::command]
pub async fn notify(
    app: AppHandle,
    state: State<'_, AppState>,
    text: String,
    severity: Severity,
    timeout: i64,
) -> Result<Uuid, String> {
    let id = state
        .notifications
        .add(text, severity, timeout)
        .map_err(|e| e.to_string())?;
    schedule_notification_expiry(app.clone(), state.notifications.clone(), id, timeout);
    let _ = app.emit("notifications-changed", ());
    Ok(id)
}

#[tauri::command]
pub async fn dismiss_notification(
    app: AppHandle,
    state: State<'_, AppState>,
    id: Uuid,
) -> Result<(), String> {
    state.notifications.remove(id).map_err(|e| e.to_string())?;
    let _ = app.emit("notifications-changed", ());
    Ok(())
}

#[tauri::command]
pub async fn list_notifications(state: State<'_, AppState>) -> Result<Vec<Notification>, String> {
    state.notifications.list().map_err(|e| e.to_string())
}

// ============================================================================
// Windows
// ============================================================================

#[tauri::command]
pub async fn show_help_window(app: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    window::show_help_window(&app, &state).map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn show_youtube_modal(app: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    window::show_youtube_modal(&app, &state).map_err(|e| e.to_string())
}

/// Escape pressed inside a secondary window.
#[tauri::command]
pub async fn window_escape(state: State<'_, AppState>, label: String) -> Result<(), String> {
    window::escape_pressed(&state, &label);
    Ok(())
}

/// Suppress or release the YouTube modal's blur-close (native save dialog).
#[tauri::command]
pub async fn set_modal_suppression(
    state: State<'_, AppState>,
    suppress: bool,
) -> Result<(), String> {
    state.modal_suppress.store(suppress, Ordering::SeqCst);
    Ok(())
}

/// Close every window and exit.
#[tauri::command]
pub async fn close_main_window(app: AppHandle) -> Result<(), String> {
    window::close_all(&app);
    Ok(())
}

// ============================================================================
// Downloads
// ============================================================================

/// Download a YouTube video to `destination` via the external downloader.
/// Success opens the file and announces `video-downloaded`; failure returns
/// the downloader's error description.
#[tauri::command]
pub async fn save_youtube_video(
    app: AppHandle,
    state: State<'_, AppState>,
    code: String,
    destination: String,
) -> Result<(), String> {
    match download::save_video(&code, Path::new(&destination)).await {
        Ok(()) => {
            let _ = app.emit(
                "video-downloaded",
                json!({ "path": destination, "code": code }),
            );

            let mut ctrl = state.controller.lock().await;
            ctrl.open(MediaSource::youtube(destination.clone(), code.clone()))
                .map_err(|e| e.to_string())?;
            push_state(&app, &ctrl);
            drop(ctrl);

            match state
                .notifications
                .add("Video downloaded", Severity::Success, 5_000)
            {
                Ok(id) => schedule_notification_expiry(
                    app.clone(),
                    state.notifications.clone(),
                    id,
                    5_000,
                ),
                Err(err) => warn!(%err, "Failed to store download notification"),
            }
            let _ = app.emit("notifications-changed", ());
            Ok(())
        }
        Err(err) => {
            notify_error(&app, &state, &err);
            let _ = app.emit("notifications-changed", ());
            Err(err.to_string())
        }
    }
}
