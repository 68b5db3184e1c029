//! Persisted notification queue
//!
//! Transient user-facing messages shared across every window of the
//! application through the persisted `"notifications"` key. The store records
//! each entry's timeout but never expires anything itself; the renderer
//! schedules a timer at add-time and calls [`NotificationStore::remove`] when
//! it fires (skipped entirely for a timeout of zero).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::store::StateStore;
use crate::Result;

/// Persisted key holding the notification list.
const NOTIFICATIONS_KEY: &str = "notifications";

/// Severity or category for user-visible notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Neutral informational message.
    Info,
    /// Successful operation or positive outcome.
    Success,
    /// Non-critical issue the user should be aware of.
    Warning,
    /// Error or failure that may affect functionality.
    Error,
}

/// A single queued notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Opaque unique identifier, assigned at creation.
    pub id: Uuid,
    /// Display text.
    pub text: String,
    /// Severity class, rendered as `"type"` on the wire.
    #[serde(rename = "type")]
    pub severity: Severity,
    /// Auto-expiry timeout in milliseconds. `0` means never auto-expire; a
    /// negative input is normalized to `i64::MAX` at add-time.
    pub timeout: i64,
}

/// Ordered, persisted list of notifications.
///
/// Insertion order is display order; ids are unique within the live queue.
#[derive(Clone)]
pub struct NotificationStore {
    store: Arc<dyn StateStore>,
}

impl NotificationStore {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Append a new notification and return its id.
    ///
    /// Malformed input is accepted as-is (pass-through contract); the
    /// persisted list changes synchronously, so other windows see the entry on
    /// their next read.
    pub fn add(&self, text: impl Into<String>, severity: Severity, timeout_ms: i64) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let timeout = if timeout_ms < 0 { i64::MAX } else { timeout_ms };

        let mut entries = self.list()?;
        entries.push(Notification {
            id,
            text: text.into(),
            severity,
            timeout,
        });
        self.persist(&entries)?;

        debug!(%id, ?severity, timeout, "Notification added");
        Ok(id)
    }

    /// Remove the first entry whose id matches. No-op when absent.
    pub fn remove(&self, id: Uuid) -> Result<()> {
        let mut entries = self.list()?;
        let Some(index) = entries.iter().position(|n| n.id == id) else {
            return Ok(());
        };
        entries.remove(index);
        self.persist(&entries)?;

        debug!(%id, "Notification removed");
        Ok(())
    }

    /// Current queue in insertion order.
    pub fn list(&self) -> Result<Vec<Notification>> {
        match self.store.read(NOTIFICATIONS_KEY)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    fn persist(&self, entries: &[Notification]) -> Result<()> {
        self.store
            .write(NOTIFICATIONS_KEY, serde_json::to_value(entries)?)
    }
}
