//! Audio analysis for silence detection.
//!
//! Runs three passes over the source:
//! 1. FFprobe for the container duration
//! 2. `volumedetect` for the mean volume
//! 3. `silencedetect` with a threshold relative to that mean

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::config::SilenceRemovalConfig;
use super::diagnostics::{extract_mean_volume, extract_silence_intervals};
use super::planner::TimeInterval;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::probe::probe_duration;

/// What was learned about one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFileDescriptor {
    pub path: PathBuf,
    /// Duration in seconds
    pub duration: f64,
    /// Mean volume in dB
    pub mean_volume_db: f64,
}

/// Result of analysing one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct SilenceAnalysis {
    pub media: MediaFileDescriptor,
    /// Detected silences in time order
    pub silences: Vec<TimeInterval>,
}

/// Measure the mean volume of the whole file.
pub async fn measure_mean_volume(runner: &FfmpegRunner, path: &Path) -> MediaResult<f64> {
    let cmd = FfmpegCommand::analysis(path).audio_filter("volumedetect");
    let output = runner.capture(&cmd).await?;
    Ok(extract_mean_volume(&output.stderr)?)
}

/// Detect silences quieter than `threshold_db` lasting at least `min_duration` seconds.
pub async fn detect_silences(
    runner: &FfmpegRunner,
    path: &Path,
    threshold_db: f64,
    min_duration: f64,
) -> MediaResult<Vec<TimeInterval>> {
    let cmd = FfmpegCommand::analysis(path).audio_filter(silencedetect_filter(threshold_db, min_duration));
    let output = runner.capture(&cmd).await?;
    Ok(extract_silence_intervals(&output.stderr)?)
}

/// Run all analysis passes for `path`.
pub async fn analyze_silences(
    runner: &FfmpegRunner,
    path: &Path,
    config: &SilenceRemovalConfig,
) -> MediaResult<SilenceAnalysis> {
    let duration = probe_duration(runner, path).await?;
    let mean_volume_db = measure_mean_volume(runner, path).await?;
    let threshold_db = config.silence_threshold_db(mean_volume_db);

    debug!(
        path = %path.display(),
        duration,
        mean_volume_db,
        threshold_db,
        min_silence = config.min_silence_duration,
        "Detecting silence"
    );

    let silences = detect_silences(runner, path, threshold_db, config.min_silence_duration).await?;
    let silent_secs: f64 = silences.iter().map(TimeInterval::duration).sum();

    info!(
        path = %path.display(),
        silences = silences.len(),
        silent_secs = format!("{:.1}", silent_secs),
        "Silence analysis complete"
    );

    Ok(SilenceAnalysis {
        media: MediaFileDescriptor {
            path: path.to_path_buf(),
            duration,
            mean_volume_db,
        },
        silences,
    })
}

fn silencedetect_filter(threshold_db: f64, min_duration: f64) -> String {
    format!("silencedetect=noise={:.2}dB:d={:.3}", threshold_db, min_duration)
}
