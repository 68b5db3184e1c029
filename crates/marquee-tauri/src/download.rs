//! External YouTube download invocation
//!
//! The download pipeline itself is an opaque external command (`yt-dlp`);
//! this module only invokes it and reports the outcome.

use std::path::Path;

use tokio::process::Command;
use tracing::{info, warn};

use marquee_core::Error;

/// Download the video identified by `code` to `destination`.
///
/// Returns `Ok(())` on success or the downloader's error description.
pub async fn save_video(code: &str, destination: &Path) -> Result<(), Error> {
    let url = format!("https://www.youtube.com/watch?v={code}");
    info!(code, destination = %destination.display(), "Starting download");

    let output = Command::new("yt-dlp")
        .arg("--no-playlist")
        .arg("-f")
        .arg("mp4")
        .arg("-o")
        .arg(destination)
        .arg(&url)
        .output()
        .await
        .map_err(|err| Error::Download(format!("failed to launch yt-dlp: {err}")))?;

    if output.status.success() {
        info!(code, "Download finished");
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let description = stderr.lines().last().unwrap_or("unknown error").to_string();
        warn!(code, %description, "Download failed");
        Err(Error::Download(description))
    }
}
