//! Error types for Marquee Core

use thiserror::Error;

use crate::notifications::Severity;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Persisted-state errors
    #[error("Failed to read persisted state: {0}")]
    StoreRead(String),

    #[error("Failed to write persisted state: {0}")]
    StoreWrite(String),

    #[error("Persisted state is not valid JSON: {0}")]
    StoreDecode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Playback errors
    #[error("Failed to load media: {location}")]
    MediaLoad { location: String },

    #[error("No previously played video to resume")]
    NoPreviousVideo,

    // Download errors
    #[error("Video download failed: {0}")]
    Download(String),
}

impl Error {
    /// Notification severity when this error is surfaced to the user.
    ///
    /// Ignorable host rejections (a refused `play()`) never become an
    /// [`Error`] at all, and unknown window labels or a missing resume record
    /// fall back silently, so everything here is user-facing.
    pub fn severity(&self) -> Severity {
        match self {
            Error::StoreRead(_) | Error::StoreWrite(_) | Error::StoreDecode(_) | Error::Io(_) => {
                Severity::Warning
            }
            Error::MediaLoad { .. } | Error::Download(_) => Severity::Error,
            Error::NoPreviousVideo => Severity::Info,
        }
    }

    /// Returns true if the failure leaves playback in a usable state.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::MediaLoad { .. })
    }
}
