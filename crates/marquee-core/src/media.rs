//! Media locators and filename handling

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// File extensions the player knows how to hand to the media element.
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["ogg", "webm", "mp4", "mkv", "mov", "mp3"];

/// Provenance of a media source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Local file picked by the user or passed on the command line.
    Local,
    /// File produced by the YouTube download pipeline.
    YouTube,
}

/// A loadable media source with its display title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSource {
    /// Path or URL-equivalent locator.
    pub location: String,
    /// Display title, derived from the filename when not supplied.
    pub title: String,
    pub kind: MediaKind,
    /// Identifier of the downloaded remote video, for YouTube sources.
    pub youtube_code: Option<String>,
}

impl MediaSource {
    /// Local source with an explicit or filename-derived title.
    pub fn local(location: impl Into<String>, title: Option<String>) -> Self {
        let location = location.into();
        let title = title.unwrap_or_else(|| title_from_path(&location));
        Self {
            location,
            title,
            kind: MediaKind::Local,
            youtube_code: None,
        }
    }

    /// Downloaded YouTube source; the ` [code]` tag the downloader appends to
    /// the filename is stripped from the derived title.
    pub fn youtube(location: impl Into<String>, code: impl Into<String>) -> Self {
        let location = location.into();
        let code = code.into();
        let title = strip_download_tag(&title_from_path(&location), &code);
        Self {
            location,
            title,
            kind: MediaKind::YouTube,
            youtube_code: Some(code),
        }
    }
}

/// Whether the path carries an extension on the allow-list.
pub fn extension_allowed(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Derive a display title from a file path.
///
/// Strips the extension only when it is a known media extension, so deriving
/// twice from the same path yields the same title.
pub fn title_from_path(path: &str) -> String {
    let path = Path::new(path);
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    if extension_allowed(path) {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name)
            .to_string()
    } else {
        name.to_string()
    }
}

/// Remove the trailing ` [code]` token the download pipeline appends.
pub fn strip_download_tag(title: &str, code: &str) -> String {
    let tag = format!("[{code}]");
    title
        .strip_suffix(&tag)
        .map(|rest| rest.trim_end())
        .unwrap_or(title)
        .to_string()
}

/// Resolve the optional CLI-supplied path into a startup source.
///
/// The argument is consumed only when the file exists on disk and carries an
/// allowed extension; anything else falls back to the source chooser.
pub fn resolve_startup_source(arg: Option<&str>) -> Option<MediaSource> {
    let path = arg?;
    if !Path::new(path).is_file() {
        debug!(path, "Startup path does not exist, showing chooser");
        return None;
    }
    if !extension_allowed(path) {
        debug!(path, "Startup path has unsupported extension, showing chooser");
        return None;
    }
    Some(MediaSource::local(path, None))
}
