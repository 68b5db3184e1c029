//! Host capability traits
//!
//! The controller never talks to a concrete media element or window system;
//! the shell supplies these traits. The Tauri shell forwards them as events to
//! the webview's media element, tests supply recording mocks.

use crate::Result;

/// Callback invoked when the media element reaches its end.
pub type EndedCallback = Box<dyn Fn() + Send + Sync>;

/// The media surface the controller drives.
pub trait MediaHost: Send + Sync {
    /// Point the element at a new source and begin loading.
    fn load(&self, location: &str);

    /// Start playback. Hosts may reject (autoplay policy); callers decide
    /// whether the rejection matters.
    fn play(&self) -> Result<()>;

    fn pause(&self);

    /// Absolute seek in seconds.
    fn seek(&self, seconds: f64);

    /// Volume in `[0, 1]`.
    fn set_volume(&self, volume: f64);

    /// Playback rate multiplier.
    fn set_rate(&self, rate: f64);

    fn set_fullscreen(&self, on: bool);

    /// Attach an end-of-media listener. The returned guard detaches it; the
    /// caller holds the guard for as long as the listener should stay live.
    fn on_ended(&self, callback: EndedCallback) -> ListenerGuard;
}

/// The window system, for closing secondary windows by label.
pub trait WindowSystem: Send + Sync {
    /// Close the window with the given label. Returns false when no such
    /// window exists; "not found" is never an error.
    fn close(&self, label: &str) -> bool;
}

/// Scoped handle for an attached listener.
///
/// Detaches exactly once: either through [`detach`](Self::detach) or on drop,
/// so teardown paths (including error paths) cannot leak the listener.
pub struct ListenerGuard {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerGuard {
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Guard for hosts with nothing to unregister.
    pub fn noop() -> Self {
        Self { detach: None }
    }

    /// Detach now instead of at drop time.
    pub fn detach(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_guard_detaches_on_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        {
            let _guard = ListenerGuard::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_explicit_detach_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let guard = ListenerGuard::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        guard.detach();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
