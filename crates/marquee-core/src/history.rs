//! Resume-record history
//!
//! Exactly one resume record exists per installation, stored under the
//! persisted `"history"` key. It is read once at startup and rewritten
//! incrementally every time a tracked field changes. The playback controller
//! is its sole owner; no other component mutates it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::media::{MediaKind, MediaSource};
use crate::store::StateStore;
use crate::Result;

const HISTORY_KEY: &str = "history";

/// Persisted snapshot of the last playback session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    /// Last volume level in `[0, 1]`.
    pub volume: f64,
    /// Last playback position in seconds.
    pub time: f64,
    /// Display title of the last video.
    pub title: Option<String>,
    /// Provenance flag for the last video.
    pub is_youtube: bool,
    /// Locator of the last-opened media.
    pub video: Option<String>,
    /// Identifier of the last downloaded remote video.
    pub youtube_code: Option<String>,
}

impl Default for ResumeRecord {
    fn default() -> Self {
        Self {
            volume: 0.5,
            time: 0.0,
            title: None,
            is_youtube: false,
            video: None,
            youtube_code: None,
        }
    }
}

/// Store wrapper owning the `"history"` key.
#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn StateStore>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Read the record, falling back to the default when missing or
    /// unparseable (silent fallback, not an error).
    pub fn load(&self) -> Result<ResumeRecord> {
        match self.store.read(HISTORY_KEY)? {
            Some(value) => match serde_json::from_value(value) {
                Ok(record) => Ok(record),
                Err(err) => {
                    warn!(%err, "Resume record unreadable, starting fresh");
                    Ok(ResumeRecord::default())
                }
            },
            None => Ok(ResumeRecord::default()),
        }
    }

    /// Record a newly opened source (locator, title, provenance).
    pub fn record_source(&self, source: &MediaSource) -> Result<()> {
        self.update(|record| {
            record.video = Some(source.location.clone());
            record.title = Some(source.title.clone());
            record.is_youtube = source.kind == MediaKind::YouTube;
            if let Some(code) = &source.youtube_code {
                record.youtube_code = Some(code.clone());
            }
        })
    }

    /// Record the current playback position.
    pub fn record_time(&self, time: f64) -> Result<()> {
        self.update(|record| record.time = time)
    }

    /// Record the current volume.
    pub fn record_volume(&self, volume: f64) -> Result<()> {
        self.update(|record| record.volume = volume)
    }

    /// Forget the last video (keeps volume and download code).
    pub fn clear_video(&self) -> Result<()> {
        self.update(|record| {
            record.video = None;
            record.title = None;
            record.time = 0.0;
        })
    }

    fn update(&self, mutate: impl FnOnce(&mut ResumeRecord)) -> Result<()> {
        let mut record = self.load()?;
        mutate(&mut record);
        debug!(video = ?record.video, time = record.time, volume = record.volume, "Resume record updated");
        self.store
            .write(HISTORY_KEY, serde_json::to_value(&record)?)
    }
}
