//! FFprobe helpers: duration lookup and media sniffing.

use std::path::Path;

use tracing::debug;

use crate::command::{FfmpegRunner, FfprobeCommand};
use crate::error::{MediaError, MediaResult};

/// Get media duration in seconds from the container.
pub async fn probe_duration(runner: &FfmpegRunner, path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let output = runner
        .probe(&FfprobeCommand::new(path).format_duration())
        .await?;

    parse_duration_output(&output.stdout)
}

/// Check whether `path` can be opened as media.
///
/// Any FFprobe failure counts as "no". This is a heuristic, not a format check.
pub async fn is_media_file(runner: &FfmpegRunner, path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();

    if !path.is_file() {
        return false;
    }

    match runner.probe(&FfprobeCommand::new(path)).await {
        Ok(_) => true,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Not a readable media file");
            false
        }
    }
}

/// Parse the bare number printed by `-show_entries format=duration`.
fn parse_duration_output(stdout: &str) -> MediaResult<f64> {
    let value = stdout.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");

    value
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite())
        .ok_or_else(|| MediaError::ffprobe_failed(format!("Unexpected duration output: {:?}", value), None))
}
