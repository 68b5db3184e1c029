//! Marquee - Desktop Video Player
//!
//! Tauri shell around marquee-core: the webview renders the player and
//! forwards input; the backend owns all playback state.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use commands::AppState;
use marquee_core::media::resolve_startup_source;
use tauri::Manager;

mod commands;
mod download;
mod host;
mod window;

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,marquee=debug".to_string()),
        )
        .init();

    tracing::info!(version = marquee_core::VERSION, "Starting Marquee");

    // A file path given on the command line skips the chooser.
    let startup_path = std::env::args().nth(1);

    tauri::Builder::default()
        .invoke_handler(tauri::generate_handler![
            // Playback control
            commands::open_video,
            commands::continue_previous,
            commands::change_video,
            commands::toggle_playback,
            commands::seek_to,
            commands::seek_by,
            commands::step_volume,
            commands::set_volume,
            commands::toggle_mute,
            commands::change_rate,
            commands::toggle_loop,
            commands::toggle_fullscreen,
            commands::get_playback_state,
            // Input routing
            commands::key_input,
            commands::wheel_input,
            commands::pointer_moved,
            // Media-element feedback
            commands::media_position,
            commands::media_duration,
            commands::media_ended,
            // Notifications
            commands::notify,
            commands::dismiss_notification,
            commands::list_notifications,
            // Windows & downloads
            commands::show_help_window,
            commands::show_youtube_modal,
            commands::window_escape,
            commands::set_modal_suppression,
            commands::close_main_window,
            commands::save_youtube_video,
        ])
        .setup(move |app| {
            let handle = app.handle().clone();
            let state = AppState::new(&handle)?;
            state.spawn_store_watcher(handle.clone());

            let controller = state.controller();
            app.manage(state);

            // Resolve the startup source once the runtime is up.
            let startup = resolve_startup_source(startup_path.as_deref());
            tauri::async_runtime::spawn(async move {
                let mut ctrl = controller.lock().await;
                match startup {
                    Some(source) => {
                        if let Err(err) = ctrl.open(source) {
                            tracing::warn!(%err, "Failed to open startup source");
                            ctrl.enter_chooser();
                        }
                    }
                    None => ctrl.enter_chooser(),
                }
                commands::push_state(&handle, &ctrl);
            });

            tracing::info!("Marquee initialized");

            // Open devtools in debug mode
            #[cfg(debug_assertions)]
            if let Some(window) = app.get_webview_window(host::MAIN_WINDOW) {
                let _ = window.open_devtools();
            }

            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running Marquee");
}
