//! Apply silence removal using FFmpeg.
//!
//! # Strategy
//!
//! 1. Extract each keep interval to its own chunk, re-encoded so cuts are
//!    frame accurate
//! 2. Concatenate the chunks with the concat demuxer and stream copy
//!
//! Chunks and the listing file live in a work directory next to the output.
//! It is removed after a successful concat and left behind on failure.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use super::config::EncodingConfig;
use super::planner::TimeInterval;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Name of the concat demuxer listing inside the work directory.
const CONCAT_LISTING: &str = "concat.txt";

/// Marker inserted into default output names.
///
/// Never taken as a container extension.
pub const OUTPUT_SUFFIX: &str = "silenceremoved";

/// Extract `interval` of `source` into `dest`, re-encoding.
pub async fn extract_chunk(
    runner: &FfmpegRunner,
    source: &Path,
    interval: TimeInterval,
    dest: &Path,
    encoding: &EncodingConfig,
) -> MediaResult<()> {
    let mut cmd = FfmpegCommand::new(source, dest)
        .seek(interval.start)
        .duration(interval.duration());

    if let Some(codec) = &encoding.video_codec {
        cmd = cmd.video_codec(codec.as_str());
    }
    if let Some(preset) = &encoding.preset {
        cmd = cmd.preset(preset.as_str());
    }
    if let Some(crf) = encoding.crf {
        cmd = cmd.crf(crf);
    }
    if let Some(codec) = &encoding.audio_codec {
        cmd = cmd.audio_codec(codec.as_str());
    }
    let cmd = cmd.output_args(["-avoid_negative_ts", "make_zero"]);

    let chunk_secs = interval.duration();
    let chunk = dest.display().to_string();
    runner
        .run_with_progress(&cmd, move |progress| {
            debug!(
                chunk = %chunk,
                percent = format!("{:.0}", progress.percentage(chunk_secs)),
                speed = progress.speed,
                "Extracting chunk"
            );
        })
        .await
}

/// Concatenate `chunks` in order into `output` without re-encoding.
///
/// Chunk paths are written to `listing` relative to its directory.
/// `format` forces the output muxer when `output` has no usable extension.
pub async fn concat_chunks(
    runner: &FfmpegRunner,
    chunks: &[PathBuf],
    listing: &Path,
    output: &Path,
    format: Option<&str>,
) -> MediaResult<()> {
    let base = listing.parent().unwrap_or_else(|| Path::new(""));
    let entries: Vec<&Path> = chunks
        .iter()
        .map(|chunk| chunk.strip_prefix(base).unwrap_or(chunk))
        .collect();
    fs::write(listing, concat_listing(&entries)).await?;

    let mut cmd = FfmpegCommand::new(listing, output)
        .input_args(["-f", "concat", "-safe", "0"])
        .codec_copy();
    if let Some(format) = format {
        cmd = cmd.output_args(["-f", format]);
    }

    runner.run(&cmd).await
}

/// Cut `source` down to `intervals` and write the result to `output`.
///
/// Does nothing when `intervals` is empty.
pub async fn render_keep_intervals(
    runner: &FfmpegRunner,
    source: &Path,
    intervals: &[TimeInterval],
    output: &Path,
    encoding: &EncodingConfig,
) -> MediaResult<()> {
    if intervals.is_empty() {
        debug!(source = %source.display(), "No intervals to render");
        return Ok(());
    }

    let work_dir = chunk_dir(output);
    fs::create_dir_all(&work_dir).await?;

    let ext = chunk_extension(output, source);
    let mut chunks = Vec::with_capacity(intervals.len());

    for (i, interval) in intervals.iter().enumerate() {
        let chunk = work_dir.join(chunk_file_name(interval, &ext));
        debug!(
            segment = i,
            start = interval.start,
            end = interval.end,
            chunk = %chunk.display(),
            "Extracting keep interval"
        );
        extract_chunk(runner, source, *interval, &chunk, encoding).await?;
        chunks.push(chunk);
    }

    let format = container_extension(output).is_none().then(|| muxer_for_extension(&ext));
    concat_chunks(runner, &chunks, &work_dir.join(CONCAT_LISTING), output, format).await?;

    fs::remove_dir_all(&work_dir).await?;

    info!(
        source = %source.display(),
        output = %output.display(),
        chunks = chunks.len(),
        "Silence removal concat completed successfully"
    );

    Ok(())
}

/// Work directory for the chunks of `output`: `.<file name>.chunks` beside it.
pub fn chunk_dir(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!(".{}.chunks", name))
}

/// Chunk file name derived from the interval boundaries (millisecond precision).
pub fn chunk_file_name(interval: &TimeInterval, ext: &str) -> String {
    format!("chunk_{:.3}-{:.3}.{}", interval.start, interval.end, ext)
}

/// Build the concat demuxer listing: one `file '<path>'` line per chunk.
pub fn concat_listing<P: AsRef<Path>>(chunks: &[P]) -> String {
    chunks
        .iter()
        .map(|p| format!("file '{}'\n", escape_concat_path(p.as_ref())))
        .collect()
}

/// Escape a path for a single-quoted concat listing entry.
pub fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}

fn chunk_extension(output: &Path, source: &Path) -> String {
    container_extension(output)
        .or_else(|| container_extension(source))
        .unwrap_or("mkv")
        .to_string()
}

fn container_extension(path: &Path) -> Option<&str> {
    path.extension()
        .and_then(OsStr::to_str)
        .filter(|ext| !ext.is_empty() && *ext != OUTPUT_SUFFIX)
}

/// FFmpeg muxer name for a container extension.
fn muxer_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "mp4" | "m4v" => "mp4",
        "mov" => "mov",
        "webm" => "webm",
        "avi" => "avi",
        "ts" | "m2ts" => "mpegts",
        "flv" => "flv",
        "mpg" | "mpeg" => "mpeg",
        _ => "matroska",
    }
}
