//! Close-on-blur policy for secondary windows
//!
//! Secondary windows (help, chooser modal) close when they lose focus, unless
//! suppression is active at the moment the blur arrives; Escape closes them
//! unconditionally. The shell registers the actual host events and routes them
//! here while it holds the policy; dropping the policy deactivates it, so a
//! remount never sees a stale handler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::host::WindowSystem;

/// Blur/escape close policy for one window label.
pub struct CloseOnBlur {
    windows: Arc<dyn WindowSystem>,
    label: String,
    /// Read at event time, not at construction, so a live toggle (e.g. while
    /// a native file dialog steals focus) takes effect immediately.
    suppress: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
}

impl CloseOnBlur {
    pub fn new(
        windows: Arc<dyn WindowSystem>,
        label: impl Into<String>,
        suppress: Arc<AtomicBool>,
    ) -> Self {
        Self {
            windows,
            label: label.into(),
            suppress,
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Label of the governed window.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Flag the shell can hand to host event registrations that outlive this
    /// policy; cleared on drop so late events become no-ops.
    pub fn active_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.active)
    }

    /// The window lost focus: close unless suppression is currently set.
    pub fn on_blur(&self) {
        if !self.active.load(Ordering::SeqCst) {
            return;
        }
        if self.suppress.load(Ordering::SeqCst) {
            debug!(label = %self.label, "Blur ignored, close suppressed");
            return;
        }
        self.close_window();
    }

    /// Escape pressed: always closes, suppression does not apply.
    pub fn on_escape(&self) {
        if !self.active.load(Ordering::SeqCst) {
            return;
        }
        self.close_window();
    }

    /// Close the governed window now. An unknown label is a silent no-op.
    pub fn close_window(&self) {
        if !self.windows.close(&self.label) {
            debug!(label = %self.label, "Window not found, nothing to close");
        }
    }
}

impl Drop for CloseOnBlur {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for CloseOnBlur {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloseOnBlur")
            .field("label", &self.label)
            .field("suppressed", &self.suppress.load(Ordering::SeqCst))
            .finish()
    }
}
