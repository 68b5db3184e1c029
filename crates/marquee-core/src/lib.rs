//! Marquee Core - Playback Library for Marquee
//!
//! This crate provides the host-agnostic core of the Marquee video player:
//! - Transport state machine (play/pause, seek, volume, rate, loop)
//! - Persisted notification queue shared across windows
//! - Resume-record history (last video, position, volume)
//! - Keyboard/wheel routing table
//! - Window close-on-blur policy for secondary windows
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Marquee Core                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │ Notification │  │   History    │  │    Keymap    │           │
//! │  │    Store     │  │    Store     │  │    Table     │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │         └────────┬────────┘                 │                   │
//! │                  │                          │                   │
//! │           ┌──────┴──────┐            ┌──────┴──────┐            │
//! │           │    State    │            │  Playback   │            │
//! │           │    Store    │            │ Controller  │            │
//! │           └─────────────┘            └──────┬──────┘            │
//! │                                             │                   │
//! │                                      ┌──────┴──────┐            │
//! │                                      │  MediaHost  │            │
//! │                                      │   (trait)   │            │
//! │                                      └─────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The shell (Tauri, tests, or anything else) supplies the [`MediaHost`],
//! [`WindowSystem`], and [`StateStore`] implementations; the core never talks
//! to a concrete windowing system directly.

pub mod controller;
pub mod error;
pub mod history;
pub mod host;
pub mod keymap;
pub mod media;
pub mod notifications;
pub mod store;
pub mod window;

pub use controller::{
    AlertKind, AlertToken, ControlsToken, PlaybackController, PlaybackPhase, PlaybackState,
    RateDirection, TransientAlert, WheelDirection,
};
pub use error::{Error, Result};
pub use history::{HistoryStore, ResumeRecord};
pub use host::{ListenerGuard, MediaHost, WindowSystem};
pub use keymap::{action_for_key, KeyPhase, PlayerAction};
pub use media::{MediaKind, MediaSource};
pub use notifications::{Notification, NotificationStore, Severity};
pub use store::{JsonFileStore, MemoryStore, StateStore, StoreChange};
pub use window::CloseOnBlur;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the player library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Marquee Core initialized");
}
