//! Secondary window lifecycle
//!
//! The help window and the YouTube chooser modal close on blur (Escape always
//! closes). Focus events go through the [`CloseOnBlur`] policy held in app
//! state; replacing the policy deactivates the old one, so a reopened window
//! never inherits a stale handler.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindowBuilder, WindowEvent};
use tracing::info;

use marquee_core::{CloseOnBlur, WindowSystem};

use crate::commands::AppState;

/// Label of the help window ("closed and reopened" on each request).
pub const HELP_WINDOW: &str = "help";

/// Label of the YouTube chooser modal.
pub const YOUTUBE_WINDOW: &str = "youtube";

/// Open (or reopen) the help window.
pub fn show_help_window(app: &AppHandle, state: &AppState) -> Result<()> {
    if let Some(existing) = app.get_webview_window(HELP_WINDOW) {
        let _ = existing.close();
    }

    let window = WebviewWindowBuilder::new(app, HELP_WINDOW, WebviewUrl::App("help.html".into()))
        .title("Marquee Help")
        .inner_size(560.0, 640.0)
        .resizable(false)
        .build()?;

    // Help never suppresses blur-close.
    let policy = CloseOnBlur::new(
        state.windows(),
        HELP_WINDOW,
        Arc::new(AtomicBool::new(false)),
    );
    attach_blur_handler(&window, &state.help_policy, policy);

    info!("Help window opened");
    Ok(())
}

/// Open the YouTube chooser modal. Blur-close is suppressed while the native
/// save dialog has focus (`state.modal_suppress`, toggled over IPC).
pub fn show_youtube_modal(app: &AppHandle, state: &AppState) -> Result<()> {
    if app.get_webview_window(YOUTUBE_WINDOW).is_some() {
        return Ok(());
    }

    let window =
        WebviewWindowBuilder::new(app, YOUTUBE_WINDOW, WebviewUrl::App("youtube.html".into()))
            .title("Open from YouTube")
            .inner_size(480.0, 220.0)
            .resizable(false)
            .build()?;

    let policy = CloseOnBlur::new(
        state.windows(),
        YOUTUBE_WINDOW,
        Arc::clone(&state.modal_suppress),
    );
    attach_blur_handler(&window, &state.youtube_policy, policy);

    info!("YouTube modal opened");
    Ok(())
}

/// Store the policy and route the window's focus-lost events into it.
fn attach_blur_handler(
    window: &tauri::WebviewWindow,
    slot: &Arc<Mutex<Option<CloseOnBlur>>>,
    policy: CloseOnBlur,
) {
    // Dropping the previous policy clears its active flag.
    *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(policy);

    let slot = Arc::clone(slot);
    window.on_window_event(move |event| {
        if let WindowEvent::Focused(false) = event {
            if let Some(policy) = slot.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
                policy.on_blur();
            }
        }
    });
}

/// Escape pressed inside a secondary window: always closes it.
pub fn escape_pressed(state: &AppState, label: &str) {
    let slot = match label {
        HELP_WINDOW => &state.help_policy,
        YOUTUBE_WINDOW => &state.youtube_policy,
        _ => {
            // No policy for this label; close directly (silent no-op when gone).
            state.windows().close(label);
            return;
        }
    };
    if let Some(policy) = slot.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
        policy.on_escape();
    }
}

/// Close every window and end the process (main-window close-all request).
pub fn close_all(app: &AppHandle) {
    for (_, window) in app.webview_windows() {
        let _ = window.close();
    }
    app.exit(0);
}
