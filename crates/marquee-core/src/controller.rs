//! Playback controller - main orchestrator for a single media element
//!
//! Owns the in-memory transport state (playing, position, volume, rate), the
//! ephemeral UI state (loop mode, fullscreen, control visibility, transient
//! alert), and the persisted resume record. All mutation happens through the
//! methods here; the shell forwards user input and media-element feedback and
//! schedules the timers whose generation tokens this controller hands out.
//!
//! Timer policy: every timed effect (transient-alert clear, controls
//! auto-hide) is guarded by a monotonic generation. Starting a new timer bumps
//! the generation, so a stale timer firing after an override is a no-op
//! instead of clearing newer state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::history::HistoryStore;
use crate::host::{ListenerGuard, MediaHost};
use crate::media::{self, MediaKind, MediaSource};
use crate::Result;

/// Allowed playback speeds, ascending. `rate_index` is always a valid index.
pub const PLAYBACK_RATES: [f64; 11] = [
    0.25, 0.33, 0.5, 0.66, 0.75, 1.0, 1.25, 1.5, 2.0, 2.5, 3.0,
];

/// Index of the 1.0x default rate.
pub const DEFAULT_RATE_INDEX: usize = 5;

/// Volume step for keyboard/wheel adjustment.
pub const VOLUME_STEP: f64 = 0.1;

/// Volume restored by unmute when nothing was cached.
pub const DEFAULT_VOLUME: f64 = 0.5;

/// Short relative seek (arrow keys).
pub const SEEK_SHORT: f64 = 5.0;

/// Long relative seek (j/k keys).
pub const SEEK_LONG: f64 = 10.0;

/// Idle delay before playback controls auto-hide.
pub const CONTROLS_HIDE_DELAY: Duration = Duration::from_millis(1250);

/// Display time of a transient alert.
pub const ALERT_CLEAR_DELAY: Duration = Duration::from_millis(600);

/// Minimum spacing between wheel volume steps.
pub const WHEEL_THROTTLE: Duration = Duration::from_millis(125);

/// Icon class of a transient alert, rendered by exhaustive matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Play,
    Pause,
    Forward,
    Rewind,
    Volume,
    Mute,
    Rate,
}

/// Transient on-screen toast describing the last transport action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransientAlert {
    pub kind: AlertKind,
    pub label: Option<String>,
}

/// Token for the transient-alert clear timer. Stale tokens are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertToken(u64);

/// Token for the controls auto-hide timer. Stale tokens are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlsToken(u64);

/// Direction of a playback-rate step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateDirection {
    Up,
    Down,
}

/// Direction of a mouse-wheel step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WheelDirection {
    Up,
    Down,
}

/// Coarse phase of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackPhase {
    /// Nothing loaded, chooser not yet shown.
    NoSource,
    /// Source chooser visible.
    ChoosingSource,
    /// A source is loaded; playing/paused toggles inside this phase.
    Loaded,
}

/// Full in-memory playback state, serialized for the frontend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub source: Option<MediaSource>,
    pub playing: bool,
    pub current_time: f64,
    pub duration: f64,
    /// Always clamped to `[0, 1]`.
    pub volume: f64,
    /// Index into [`PLAYBACK_RATES`].
    pub rate_index: usize,
    pub looping: bool,
    pub fullscreen: bool,
    pub controls_hidden: bool,
    pub choosing: bool,
    pub alert: Option<TransientAlert>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            source: None,
            playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: DEFAULT_VOLUME,
            rate_index: DEFAULT_RATE_INDEX,
            looping: false,
            fullscreen: false,
            controls_hidden: false,
            choosing: false,
            alert: None,
        }
    }
}

impl PlaybackState {
    /// Current playback rate multiplier.
    pub fn rate(&self) -> f64 {
        PLAYBACK_RATES[self.rate_index]
    }
}

/// Playback controller driving a single [`MediaHost`].
pub struct PlaybackController {
    host: Arc<dyn MediaHost>,
    history: HistoryStore,
    state: PlaybackState,
    /// Single-attachment gate for the loop end-of-media listener.
    loop_guard: Option<ListenerGuard>,
    /// Volume cached by mute, restored by unmute.
    muted_from: Option<f64>,
    alert_epoch: u64,
    controls_epoch: u64,
    last_wheel: Option<Instant>,
}

impl PlaybackController {
    /// Create a controller, seeding volume from the resume record.
    pub fn new(host: Arc<dyn MediaHost>, history: HistoryStore) -> Result<Self> {
        let record = history.load()?;
        let state = PlaybackState {
            volume: record.volume.clamp(0.0, 1.0),
            ..PlaybackState::default()
        };
        host.set_volume(state.volume);

        Ok(Self {
            host,
            history,
            state,
            loop_guard: None,
            muted_from: None,
            alert_epoch: 0,
            controls_epoch: 0,
            last_wheel: None,
        })
    }

    /// Current state snapshot.
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Coarse phase of the state machine.
    pub fn phase(&self) -> PlaybackPhase {
        if self.state.source.is_some() {
            PlaybackPhase::Loaded
        } else if self.state.choosing {
            PlaybackPhase::ChoosingSource
        } else {
            PlaybackPhase::NoSource
        }
    }

    // ------------------------------------------------------------------
    // Source transitions
    // ------------------------------------------------------------------

    /// Open a local source, deriving the title from the filename when not
    /// supplied. Title derivation is idempotent for a given locator.
    pub fn set_source(&mut self, location: impl Into<String>, title: Option<String>) -> Result<()> {
        self.open(MediaSource::local(location, title))
    }

    /// Open a prepared source: record it, hand it to the media element, and
    /// start playback. A rejected `play()` is logged and swallowed.
    pub fn open(&mut self, source: MediaSource) -> Result<()> {
        if !media::extension_allowed(&source.location) {
            warn!(location = %source.location, "Extension outside allow-list, loading anyway");
        }

        self.history.record_source(&source)?;
        self.host.load(&source.location);

        info!(location = %source.location, title = %source.title, "Source opened");

        self.state.source = Some(source);
        self.state.choosing = false;
        self.state.playing = true;
        if let Err(err) = self.host.play() {
            debug!(%err, "Host rejected play, ignoring");
        }
        Ok(())
    }

    /// Resume the last session from the resume record.
    ///
    /// Only reachable while no source is loaded. With a saved video, seeks to
    /// the saved position and reopens it under its saved title; without one,
    /// falls back to the source chooser.
    pub fn continue_from_previous(&mut self) -> Result<()> {
        if self.state.source.is_some() {
            return Ok(());
        }

        let record = self.history.load()?;
        let Some(video) = record.video else {
            debug!("No resume record, showing chooser");
            self.enter_chooser();
            return Ok(());
        };

        self.host.seek(record.time);
        self.state.current_time = record.time;

        let title = record
            .title
            .unwrap_or_else(|| media::title_from_path(&video));
        let kind = if record.is_youtube {
            MediaKind::YouTube
        } else {
            MediaKind::Local
        };
        self.open(MediaSource {
            location: video,
            title,
            kind,
            youtube_code: record.youtube_code,
        })
    }

    /// Explicit "change video": drop the current source and show the chooser.
    pub fn change_video(&mut self) {
        self.host.pause();
        self.state.source = None;
        self.state.playing = false;
        self.enter_chooser();
    }

    /// React to an external rewrite of the resume record (another window).
    /// A cleared video field while loaded drops back to the chooser.
    pub fn handle_history_change(&mut self) -> Result<()> {
        let record = self.history.load()?;
        if record.video.is_none() && self.state.source.is_some() {
            info!("Resume record cleared externally, returning to chooser");
            self.change_video();
        }
        Ok(())
    }

    pub fn enter_chooser(&mut self) {
        self.state.choosing = true;
    }

    pub fn leave_chooser(&mut self) {
        self.state.choosing = false;
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    /// Flip play/pause. A host rejection of `play()` is fire-and-forget; the
    /// transient alert is shown either way.
    pub fn toggle_playback(&mut self) -> AlertToken {
        self.state.playing = !self.state.playing;
        if self.state.playing {
            if let Err(err) = self.host.play() {
                debug!(%err, "Host rejected play, ignoring");
            }
            self.show_alert(AlertKind::Play, None)
        } else {
            self.host.pause();
            self.show_alert(AlertKind::Pause, None)
        }
    }

    /// Absolute seek as a fraction of the duration.
    ///
    /// The fraction is deliberately not clamped: drag callers own their input
    /// range, and an out-of-range fraction produces an out-of-range position.
    pub fn seek_to(&mut self, fraction: f64) -> Result<()> {
        let target = fraction * self.state.duration;
        self.state.current_time = target;
        self.host.seek(target);
        self.history.record_time(target)
    }

    /// Relative seek forward, clamped to the duration.
    pub fn forward(&mut self, amount: f64) -> Result<AlertToken> {
        let target = (self.state.current_time + amount).clamp(0.0, self.state.duration);
        self.state.current_time = target;
        self.host.seek(target);
        self.history.record_time(target)?;
        Ok(self.show_alert(AlertKind::Forward, Some(format!("{amount:.0}s"))))
    }

    /// Relative seek backward, clamped to zero.
    pub fn rewind(&mut self, amount: f64) -> Result<AlertToken> {
        let target = (self.state.current_time - amount).clamp(0.0, self.state.duration);
        self.state.current_time = target;
        self.host.seek(target);
        self.history.record_time(target)?;
        Ok(self.show_alert(AlertKind::Rewind, Some(format!("{amount:.0}s"))))
    }

    // ------------------------------------------------------------------
    // Volume
    // ------------------------------------------------------------------

    pub fn increase_volume(&mut self) -> Result<AlertToken> {
        self.step_volume(VOLUME_STEP)
    }

    pub fn decrease_volume(&mut self) -> Result<AlertToken> {
        self.step_volume(-VOLUME_STEP)
    }

    fn step_volume(&mut self, delta: f64) -> Result<AlertToken> {
        // Round to one decimal so repeated steps stay on the 0.1 grid.
        let volume = ((self.state.volume + delta) * 10.0).round() / 10.0;
        let volume = volume.clamp(0.0, 1.0);
        self.apply_volume(volume)?;
        Ok(self.show_alert(AlertKind::Volume, Some(format!("{:.0}%", volume * 100.0))))
    }

    /// Set the volume directly (slider), clamped to `[0, 1]`.
    pub fn set_volume(&mut self, volume: f64) -> Result<()> {
        self.apply_volume(volume.clamp(0.0, 1.0))
    }

    /// Mute, caching the current volume; unmute restores the cache
    /// (or [`DEFAULT_VOLUME`] when nothing was ever cached).
    pub fn toggle_mute(&mut self) -> Result<AlertToken> {
        if self.state.volume > 0.0 {
            self.muted_from = Some(self.state.volume);
            self.apply_volume(0.0)?;
            Ok(self.show_alert(AlertKind::Mute, None))
        } else {
            let restored = self.muted_from.unwrap_or(DEFAULT_VOLUME);
            self.apply_volume(restored)?;
            Ok(self.show_alert(AlertKind::Volume, Some(format!("{:.0}%", restored * 100.0))))
        }
    }

    fn apply_volume(&mut self, volume: f64) -> Result<()> {
        self.state.volume = volume;
        self.host.set_volume(volume);
        self.history.record_volume(volume)
    }

    // ------------------------------------------------------------------
    // Rate, loop, fullscreen
    // ------------------------------------------------------------------

    /// Step the playback rate within [`PLAYBACK_RATES`], clamped at both ends
    /// with no wraparound. Also resets the controls auto-hide timer.
    pub fn change_rate(&mut self, direction: RateDirection) -> (AlertToken, Option<ControlsToken>) {
        let index = match direction {
            RateDirection::Up => (self.state.rate_index + 1).min(PLAYBACK_RATES.len() - 1),
            RateDirection::Down => self.state.rate_index.saturating_sub(1),
        };
        self.state.rate_index = index;
        let rate = self.state.rate();
        self.host.set_rate(rate);

        debug!(rate, "Playback rate changed");

        let alert = self.show_alert(AlertKind::Rate, Some(format!("{rate}x")));
        (alert, self.touch_controls())
    }

    /// Flip loop mode.
    pub fn toggle_loop(&mut self) {
        let looping = !self.state.looping;
        self.set_looping(looping);
    }

    /// Enable or disable loop mode. The stored [`ListenerGuard`] is the
    /// single-attachment gate: enabling while already attached does nothing,
    /// so end-of-media restarts fire exactly once per playthrough.
    pub fn set_looping(&mut self, on: bool) {
        if on {
            if self.loop_guard.is_none() {
                let host = Arc::clone(&self.host);
                self.loop_guard = Some(self.host.on_ended(Box::new(move || {
                    host.seek(0.0);
                    if let Err(err) = host.play() {
                        debug!(%err, "Host rejected loop restart, ignoring");
                    }
                })));
            }
        } else if let Some(guard) = self.loop_guard.take() {
            guard.detach();
        }
        self.state.looping = on;
    }

    /// Flip fullscreen and ask the window system to match.
    pub fn toggle_fullscreen(&mut self) {
        self.state.fullscreen = !self.state.fullscreen;
        self.host.set_fullscreen(self.state.fullscreen);
    }

    // ------------------------------------------------------------------
    // Transient alert and controls visibility
    // ------------------------------------------------------------------

    /// Show a transient alert and return the token its clear timer must carry.
    /// Each call bumps the generation, so an older timer cannot clear newer
    /// content.
    pub fn show_alert(&mut self, kind: AlertKind, label: Option<String>) -> AlertToken {
        self.alert_epoch += 1;
        self.state.alert = Some(TransientAlert { kind, label });
        AlertToken(self.alert_epoch)
    }

    /// Clear the alert if `token` is still current; stale tokens are ignored.
    pub fn clear_alert(&mut self, token: AlertToken) {
        if token.0 == self.alert_epoch {
            self.state.alert = None;
        }
    }

    /// Qualifying input (mouse move, rate change): reveal the controls and
    /// restart the auto-hide timer. While the chooser is visible the controls
    /// hide immediately and no timer is started.
    pub fn touch_controls(&mut self) -> Option<ControlsToken> {
        if self.state.choosing {
            self.state.controls_hidden = true;
            return None;
        }
        self.state.controls_hidden = false;
        self.controls_epoch += 1;
        Some(ControlsToken(self.controls_epoch))
    }

    /// Auto-hide timer fired; hides only when `token` is still current.
    pub fn hide_controls(&mut self, token: ControlsToken) {
        if token.0 == self.controls_epoch {
            self.state.controls_hidden = true;
        }
    }

    // ------------------------------------------------------------------
    // Wheel
    // ------------------------------------------------------------------

    /// Mouse-wheel volume step, throttled to one step per
    /// [`WHEEL_THROTTLE`]. Returns `None` when the step was swallowed.
    pub fn wheel(&mut self, direction: WheelDirection) -> Result<Option<AlertToken>> {
        let now = Instant::now();
        if let Some(last) = self.last_wheel {
            if now.duration_since(last) < WHEEL_THROTTLE {
                return Ok(None);
            }
        }
        self.last_wheel = Some(now);

        let token = match direction {
            WheelDirection::Up => self.increase_volume()?,
            WheelDirection::Down => self.decrease_volume()?,
        };
        Ok(Some(token))
    }

    // ------------------------------------------------------------------
    // Media-element feedback
    // ------------------------------------------------------------------

    /// Position tick from the media element; keeps the resume record current.
    pub fn position_changed(&mut self, seconds: f64) -> Result<()> {
        self.state.current_time = seconds;
        self.history.record_time(seconds)
    }

    /// Duration became known (or changed on a new source).
    pub fn duration_changed(&mut self, seconds: f64) {
        self.state.duration = seconds;
    }

    /// End of media. With loop mode active the attached listener restarts
    /// playback; otherwise the transport drops to paused.
    pub fn playback_ended(&mut self) {
        if !self.state.looping {
            self.state.playing = false;
        }
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("state", &self.state)
            .field("loop_attached", &self.loop_guard.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::EndedCallback;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum HostCall {
        Load(String),
        Play,
        Pause,
        Seek(f64),
        Volume(f64),
        Rate(f64),
        Fullscreen(bool),
    }

    #[derive(Default)]
    struct MockHost {
        calls: Mutex<Vec<HostCall>>,
        reject_play: bool,
        ended: Mutex<Vec<(u64, EndedCallback)>>,
        next_listener: AtomicU64,
    }

    impl MockHost {
        fn rejecting() -> Self {
            Self {
                reject_play: true,
                ..Self::default()
            }
        }

        fn record(&self, call: HostCall) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<HostCall> {
            self.calls.lock().unwrap().clone()
        }

        fn ended_listeners(&self) -> usize {
            self.ended.lock().unwrap().len()
        }

        fn fire_ended(&self) {
            // Snapshot outside the lock so callbacks may re-enter the host.
            let callbacks: Vec<u64> = self.ended.lock().unwrap().iter().map(|(id, _)| *id).collect();
            for id in callbacks {
                let guard = self.ended.lock().unwrap();
                if let Some((_, cb)) = guard.iter().find(|(i, _)| *i == id) {
                    // Callbacks only touch `calls`, never `ended`.
                    cb();
                }
            }
        }
    }

    impl MediaHost for Arc<MockHost> {
        fn load(&self, location: &str) {
            self.record(HostCall::Load(location.to_string()));
        }

        fn play(&self) -> crate::Result<()> {
            self.record(HostCall::Play);
            if self.reject_play {
                Err(crate::Error::MediaLoad {
                    location: "rejected".into(),
                })
            } else {
                Ok(())
            }
        }

        fn pause(&self) {
            self.record(HostCall::Pause);
        }

        fn seek(&self, seconds: f64) {
            self.record(HostCall::Seek(seconds));
        }

        fn set_volume(&self, volume: f64) {
            self.record(HostCall::Volume(volume));
        }

        fn set_rate(&self, rate: f64) {
            self.record(HostCall::Rate(rate));
        }

        fn set_fullscreen(&self, on: bool) {
            self.record(HostCall::Fullscreen(on));
        }

        fn on_ended(&self, callback: EndedCallback) -> ListenerGuard {
            let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
            self.ended.lock().unwrap().push((id, callback));
            let host = Arc::clone(self);
            ListenerGuard::new(move || {
                host.ended.lock().unwrap().retain(|(i, _)| *i != id);
            })
        }
    }

    fn controller() -> (Arc<MockHost>, PlaybackController) {
        controller_with(Arc::new(MockHost::default()))
    }

    fn controller_with(host: Arc<MockHost>) -> (Arc<MockHost>, PlaybackController) {
        let history = HistoryStore::new(Arc::new(MemoryStore::new()));
        let ctrl = PlaybackController::new(Arc::new(Arc::clone(&host)), history).unwrap();
        (host, ctrl)
    }

    #[test]
    fn test_volume_clamps_at_boundaries() {
        let (_, mut ctrl) = controller();
        ctrl.set_volume(0.0).unwrap();
        for _ in 0..5 {
            ctrl.decrease_volume().unwrap();
        }
        assert_eq!(ctrl.state().volume, 0.0);

        ctrl.set_volume(1.0).unwrap();
        for _ in 0..5 {
            ctrl.increase_volume().unwrap();
        }
        assert_eq!(ctrl.state().volume, 1.0);
    }

    #[test]
    fn test_volume_steps_stay_on_decimal_grid() {
        let (_, mut ctrl) = controller();
        ctrl.set_volume(0.5).unwrap();
        ctrl.increase_volume().unwrap();
        assert_eq!(ctrl.state().volume, 0.6);
        ctrl.decrease_volume().unwrap();
        ctrl.decrease_volume().unwrap();
        assert_eq!(ctrl.state().volume, 0.4);
    }

    #[test]
    fn test_rate_index_clamps_without_wraparound() {
        let (_, mut ctrl) = controller();
        assert_eq!(ctrl.state().rate_index, DEFAULT_RATE_INDEX);

        for _ in 0..10 {
            ctrl.change_rate(RateDirection::Up);
        }
        assert_eq!(ctrl.state().rate_index, PLAYBACK_RATES.len() - 1);

        for _ in 0..30 {
            ctrl.change_rate(RateDirection::Down);
        }
        assert_eq!(ctrl.state().rate_index, 0);
        assert_eq!(ctrl.state().rate(), PLAYBACK_RATES[0]);
    }

    #[test]
    fn test_seek_to_fraction_of_duration() {
        let (host, mut ctrl) = controller();
        ctrl.duration_changed(100.0);
        ctrl.seek_to(0.5).unwrap();
        assert_eq!(ctrl.state().current_time, 50.0);
        assert!(host.calls().contains(&HostCall::Seek(50.0)));
    }

    #[test]
    fn test_seek_to_does_not_clamp_fraction() {
        // Documented quirk: callers own the fraction range.
        let (_, mut ctrl) = controller();
        ctrl.duration_changed(100.0);
        ctrl.seek_to(1.5).unwrap();
        assert_eq!(ctrl.state().current_time, 150.0);
    }

    #[test]
    fn test_relative_seek_clamps_to_duration() {
        let (_, mut ctrl) = controller();
        ctrl.duration_changed(100.0);
        ctrl.position_changed(95.0).unwrap();
        ctrl.forward(10.0).unwrap();
        assert_eq!(ctrl.state().current_time, 100.0);

        ctrl.position_changed(5.0).unwrap();
        ctrl.rewind(10.0).unwrap();
        assert_eq!(ctrl.state().current_time, 0.0);
    }

    #[test]
    fn test_mute_caches_and_restores_volume() {
        let (_, mut ctrl) = controller();
        ctrl.set_volume(0.8).unwrap();
        ctrl.toggle_mute().unwrap();
        assert_eq!(ctrl.state().volume, 0.0);
        ctrl.toggle_mute().unwrap();
        assert_eq!(ctrl.state().volume, 0.8);
    }

    #[test]
    fn test_unmute_without_prior_mute_restores_default() {
        let (_, mut ctrl) = controller();
        ctrl.set_volume(0.0).unwrap();
        ctrl.toggle_mute().unwrap();
        assert_eq!(ctrl.state().volume, DEFAULT_VOLUME);
    }

    #[test]
    fn test_loop_gate_attaches_single_listener() {
        let (host, mut ctrl) = controller();
        ctrl.set_looping(true);
        ctrl.set_looping(true);
        assert_eq!(host.ended_listeners(), 1);

        ctrl.set_looping(false);
        assert_eq!(host.ended_listeners(), 0);
    }

    #[test]
    fn test_loop_restart_fires_once_per_playthrough() {
        let (host, mut ctrl) = controller();
        ctrl.set_looping(true);
        ctrl.set_looping(true);

        host.fire_ended();

        let restarts = host
            .calls()
            .iter()
            .filter(|c| **c == HostCall::Seek(0.0))
            .count();
        assert_eq!(restarts, 1);
    }

    #[test]
    fn test_toggle_loop_flips() {
        let (host, mut ctrl) = controller();
        ctrl.toggle_loop();
        assert!(ctrl.state().looping);
        ctrl.toggle_loop();
        assert!(!ctrl.state().looping);
        assert_eq!(host.ended_listeners(), 0);
    }

    #[test]
    fn test_play_rejection_is_swallowed() {
        let (_, mut ctrl) = controller_with(Arc::new(MockHost::rejecting()));
        ctrl.toggle_playback();
        // The flip still happened; the rejection was fire-and-forget.
        assert!(ctrl.state().playing);
        assert!(ctrl.state().alert.is_some());
    }

    #[test]
    fn test_alert_generation_ignores_stale_clear() {
        let (_, mut ctrl) = controller();
        let first = ctrl.show_alert(AlertKind::Play, None);
        let second = ctrl.show_alert(AlertKind::Volume, Some("50%".into()));

        ctrl.clear_alert(first);
        assert_eq!(
            ctrl.state().alert.as_ref().map(|a| a.kind),
            Some(AlertKind::Volume)
        );

        ctrl.clear_alert(second);
        assert!(ctrl.state().alert.is_none());
    }

    #[test]
    fn test_controls_hide_ignores_stale_token() {
        let (_, mut ctrl) = controller();
        let stale = ctrl.touch_controls().unwrap();
        let _fresh = ctrl.touch_controls().unwrap();

        ctrl.hide_controls(stale);
        assert!(!ctrl.state().controls_hidden);
    }

    #[test]
    fn test_controls_hide_with_current_token() {
        let (_, mut ctrl) = controller();
        let token = ctrl.touch_controls().unwrap();
        ctrl.hide_controls(token);
        assert!(ctrl.state().controls_hidden);
    }

    #[test]
    fn test_controls_hide_immediately_while_choosing() {
        let (_, mut ctrl) = controller();
        ctrl.enter_chooser();
        assert!(ctrl.touch_controls().is_none());
        assert!(ctrl.state().controls_hidden);
    }

    #[test]
    fn test_wheel_throttles_rapid_steps() {
        let (_, mut ctrl) = controller();
        ctrl.set_volume(0.5).unwrap();

        assert!(ctrl.wheel(WheelDirection::Up).unwrap().is_some());
        // Immediately after: inside the throttle window.
        assert!(ctrl.wheel(WheelDirection::Up).unwrap().is_none());
        assert_eq!(ctrl.state().volume, 0.6);
    }

    #[test]
    fn test_set_source_derives_title_and_records_history() {
        let store = Arc::new(MemoryStore::new());
        let history = HistoryStore::new(store.clone());
        let host = Arc::new(MockHost::default());
        let mut ctrl =
            PlaybackController::new(Arc::new(Arc::clone(&host)), history.clone()).unwrap();

        ctrl.set_source("/videos/talk.mp4", None).unwrap();

        assert_eq!(
            ctrl.state().source.as_ref().map(|s| s.title.as_str()),
            Some("talk")
        );
        assert!(ctrl.state().playing);
        assert_eq!(ctrl.phase(), PlaybackPhase::Loaded);

        let record = history.load().unwrap();
        assert_eq!(record.video.as_deref(), Some("/videos/talk.mp4"));
        assert_eq!(record.title.as_deref(), Some("talk"));
    }

    #[test]
    fn test_set_source_title_derivation_idempotent() {
        let (_, mut ctrl) = controller();
        ctrl.set_source("/videos/talk.mp4", None).unwrap();
        let first = ctrl.state().source.as_ref().unwrap().title.clone();

        ctrl.change_video();
        ctrl.set_source("/videos/talk.mp4", None).unwrap();
        assert_eq!(ctrl.state().source.as_ref().unwrap().title, first);
    }

    #[test]
    fn test_continue_from_previous_with_record() {
        let store = Arc::new(MemoryStore::new());
        let history = HistoryStore::new(store.clone());
        history
            .record_source(&MediaSource::local("/v/saved.mp4", Some("Saved".into())))
            .unwrap();
        history.record_time(33.0).unwrap();

        let host = Arc::new(MockHost::default());
        let mut ctrl = PlaybackController::new(Arc::new(Arc::clone(&host)), history).unwrap();
        ctrl.continue_from_previous().unwrap();

        assert_eq!(ctrl.state().current_time, 33.0);
        assert_eq!(
            ctrl.state().source.as_ref().map(|s| s.title.as_str()),
            Some("Saved")
        );
        let calls = host.calls();
        assert!(calls.contains(&HostCall::Seek(33.0)));
        assert!(calls.contains(&HostCall::Load("/v/saved.mp4".into())));
    }

    #[test]
    fn test_continue_from_previous_without_record_shows_chooser() {
        let (_, mut ctrl) = controller();
        ctrl.continue_from_previous().unwrap();
        assert_eq!(ctrl.phase(), PlaybackPhase::ChoosingSource);
    }

    #[test]
    fn test_continue_from_previous_noop_while_loaded() {
        let (host, mut ctrl) = controller();
        ctrl.set_source("/v/a.mp4", None).unwrap();
        let calls_before = host.calls().len();

        ctrl.continue_from_previous().unwrap();
        assert_eq!(host.calls().len(), calls_before);
    }

    #[test]
    fn test_external_history_clear_returns_to_chooser() {
        let store = Arc::new(MemoryStore::new());
        let history = HistoryStore::new(store.clone());
        let host = Arc::new(MockHost::default());
        let mut ctrl =
            PlaybackController::new(Arc::new(Arc::clone(&host)), history.clone()).unwrap();
        ctrl.set_source("/v/a.mp4", None).unwrap();

        // Another window wipes the record.
        history.clear_video().unwrap();
        ctrl.handle_history_change().unwrap();

        assert_eq!(ctrl.phase(), PlaybackPhase::ChoosingSource);
        assert!(!ctrl.state().playing);
    }

    #[test]
    fn test_fullscreen_toggle_reaches_host() {
        let (host, mut ctrl) = controller();
        ctrl.toggle_fullscreen();
        assert!(ctrl.state().fullscreen);
        assert!(host.calls().contains(&HostCall::Fullscreen(true)));
    }

    #[test]
    fn test_volume_seeded_from_resume_record() {
        let store = Arc::new(MemoryStore::new());
        let history = HistoryStore::new(store.clone());
        history.record_volume(0.3).unwrap();

        let host = Arc::new(MockHost::default());
        let ctrl = PlaybackController::new(Arc::new(Arc::clone(&host)), history).unwrap();
        assert_eq!(ctrl.state().volume, 0.3);
        assert!(host.calls().contains(&HostCall::Volume(0.3)));
    }
}
