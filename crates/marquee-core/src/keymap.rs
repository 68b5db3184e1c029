//! Keyboard routing table
//!
//! Maps named keys (browser `KeyboardEvent.key` values forwarded by the
//! shell) to player actions. Letters are case-insensitive. Most bindings fire
//! on key-down; Space and Ctrl+O fire on key-up so they do not auto-repeat.

use serde::{Deserialize, Serialize};

use crate::controller::{RateDirection, SEEK_LONG, SEEK_SHORT};

/// Phase of the key event being routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPhase {
    Down,
    Up,
}

/// Action resolved from a key event.
///
/// Transport actions are handled by the playback controller; `OpenFileDialog`
/// and `ShowHelp` belong to the shell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerAction {
    TogglePlayback,
    Forward(f64),
    Rewind(f64),
    /// Seek to `n`/10 of the duration, `n` in `0..=9`.
    SeekTenths(u8),
    IncreaseVolume,
    DecreaseVolume,
    ToggleMute,
    ChangeRate(RateDirection),
    ToggleLoop,
    ToggleFullscreen,
    OpenFileDialog,
    ShowHelp,
}

/// Resolve a key event to an action, or `None` for unbound keys.
pub fn action_for_key(key: &str, ctrl: bool, phase: KeyPhase) -> Option<PlayerAction> {
    // Key-up bindings first; everything else routes on key-down.
    if phase == KeyPhase::Up {
        return match key {
            " " if !ctrl => Some(PlayerAction::TogglePlayback),
            "o" | "O" if ctrl => Some(PlayerAction::OpenFileDialog),
            _ => None,
        };
    }

    if ctrl {
        return match key {
            "/" => Some(PlayerAction::ShowHelp),
            _ => None,
        };
    }

    if let Some(digit) = key.chars().next().filter(|_| key.len() == 1) {
        if let Some(n) = digit.to_digit(10) {
            return Some(PlayerAction::SeekTenths(n as u8));
        }
    }

    match key {
        "j" | "J" => Some(PlayerAction::Rewind(SEEK_LONG)),
        "k" | "K" => Some(PlayerAction::Forward(SEEK_LONG)),
        "ArrowLeft" => Some(PlayerAction::Rewind(SEEK_SHORT)),
        "ArrowRight" => Some(PlayerAction::Forward(SEEK_SHORT)),
        "ArrowUp" => Some(PlayerAction::IncreaseVolume),
        "ArrowDown" => Some(PlayerAction::DecreaseVolume),
        "m" | "M" => Some(PlayerAction::ToggleMute),
        "l" | "L" => Some(PlayerAction::ToggleLoop),
        "<" => Some(PlayerAction::ChangeRate(RateDirection::Down)),
        ">" => Some(PlayerAction::ChangeRate(RateDirection::Up)),
        "F1" => Some(PlayerAction::ShowHelp),
        "F11" => Some(PlayerAction::ToggleFullscreen),
        _ => None,
    }
}
