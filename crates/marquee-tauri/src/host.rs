//! Tauri implementations of the core host traits
//!
//! The webview's media element executes playback; the backend commands it by
//! emitting events. Element feedback (position, duration, ended) flows back
//! through IPC commands in `commands.rs`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tauri::{AppHandle, Emitter, Manager};
use tracing::debug;

use marquee_core::host::{EndedCallback, ListenerGuard, MediaHost, WindowSystem};

/// Label of the primary player window.
pub const MAIN_WINDOW: &str = "main";

/// [`MediaHost`] that forwards transport commands to the webview as events.
pub struct EventMediaHost {
    app: AppHandle,
    ended: Arc<Mutex<Vec<(u64, EndedCallback)>>>,
    next_listener: AtomicU64,
}

impl EventMediaHost {
    pub fn new(app: AppHandle) -> Self {
        Self {
            app,
            ended: Arc::new(Mutex::new(Vec::new())),
            next_listener: AtomicU64::new(0),
        }
    }

    /// The element reported end of media; run every attached listener.
    pub fn fire_ended(&self) {
        let listeners = self.ended.lock().unwrap_or_else(|e| e.into_inner());
        for (_, callback) in listeners.iter() {
            callback();
        }
    }

    fn emit(&self, event: &str, payload: serde_json::Value) {
        // A failed emit means the webview is gone; nothing to do about it.
        if let Err(err) = self.app.emit(event, payload) {
            debug!(event, %err, "Event emit failed, ignoring");
        }
    }
}

impl MediaHost for EventMediaHost {
    fn load(&self, location: &str) {
        self.emit("media-load", json!({ "location": location }));
    }

    fn play(&self) -> marquee_core::Result<()> {
        self.emit("media-play", json!({}));
        Ok(())
    }

    fn pause(&self) {
        self.emit("media-pause", json!({}));
    }

    fn seek(&self, seconds: f64) {
        self.emit("media-seek", json!({ "seconds": seconds }));
    }

    fn set_volume(&self, volume: f64) {
        self.emit("media-volume", json!({ "volume": volume }));
    }

    fn set_rate(&self, rate: f64) {
        self.emit("media-rate", json!({ "rate": rate }));
    }

    fn set_fullscreen(&self, on: bool) {
        if let Some(window) = self.app.get_webview_window(MAIN_WINDOW) {
            if let Err(err) = window.set_fullscreen(on) {
                debug!(%err, "Fullscreen request failed, ignoring");
            }
        }
    }

    fn on_ended(&self, callback: EndedCallback) -> ListenerGuard {
        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        self.ended
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, callback));

        let registry = Arc::clone(&self.ended);
        ListenerGuard::new(move || {
            registry
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .retain(|(i, _)| *i != id);
        })
    }
}

/// [`WindowSystem`] backed by the Tauri window registry.
pub struct TauriWindows {
    app: AppHandle,
}

impl TauriWindows {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl WindowSystem for TauriWindows {
    fn close(&self, label: &str) -> bool {
        match self.app.get_webview_window(label) {
            Some(window) => window.close().is_ok(),
            None => false,
        }
    }
}
