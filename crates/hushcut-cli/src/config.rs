//! Runtime configuration.
//!
//! Values come from `HUSHCUT_*` environment variables (a `.env` file is
//! loaded first by `main`) and are then overridden by command line flags.

use std::path::PathBuf;

use hushcut_media::{EncodingConfig, MediaResult, SilenceRemovalConfig, ToolPaths};

use crate::cli::Cli;

/// Configuration for a run.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Interval planning thresholds
    pub silence: SilenceRemovalConfig,
    /// Encoder settings for extracted chunks
    pub encoding: EncodingConfig,
    /// Explicit ffmpeg executable, otherwise looked up in PATH
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit ffprobe executable, otherwise looked up in PATH
    pub ffprobe_path: Option<PathBuf>,
    /// Kill any FFmpeg invocation running longer than this
    pub ffmpeg_timeout_secs: Option<u64>,
}

impl CliConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = SilenceRemovalConfig::default();
        let parsed = |key: &str| var(key).and_then(|s| s.trim().parse::<f64>().ok());

        Self {
            silence: SilenceRemovalConfig {
                min_keep_duration: parsed("HUSHCUT_MIN_KEEP_SECS").unwrap_or(defaults.min_keep_duration),
                min_silence_duration: parsed("HUSHCUT_MIN_SILENCE_SECS")
                    .unwrap_or(defaults.min_silence_duration),
                padding_duration: parsed("HUSHCUT_PADDING_SECS").unwrap_or(defaults.padding_duration),
                threshold_offset_db: parsed("HUSHCUT_THRESHOLD_OFFSET_DB")
                    .unwrap_or(defaults.threshold_offset_db),
            },
            encoding: EncodingConfig {
                video_codec: non_empty(var("HUSHCUT_VIDEO_CODEC")),
                audio_codec: non_empty(var("HUSHCUT_AUDIO_CODEC")),
                crf: var("HUSHCUT_CRF").and_then(|s| s.trim().parse().ok()),
                preset: non_empty(var("HUSHCUT_PRESET")),
            },
            ffmpeg_path: non_empty(var("HUSHCUT_FFMPEG")).map(PathBuf::from),
            ffprobe_path: non_empty(var("HUSHCUT_FFPROBE")).map(PathBuf::from),
            ffmpeg_timeout_secs: var("HUSHCUT_FFMPEG_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse().ok())
                .filter(|secs| *secs > 0),
        }
    }

    /// Apply command line overrides.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(secs) = cli.min_keep {
            self.silence = self.silence.with_min_keep_duration(secs);
        }
        if let Some(secs) = cli.min_silence {
            self.silence = self.silence.with_min_silence_duration(secs);
        }
        if let Some(secs) = cli.padding {
            self.silence = self.silence.with_padding_duration(secs);
        }
        if let Some(db) = cli.threshold_offset {
            self.silence = self.silence.with_threshold_offset_db(db);
        }
        self
    }

    /// Resolve the FFmpeg and FFprobe executables.
    pub fn tool_paths(&self) -> MediaResult<ToolPaths> {
        let ffmpeg = match &self.ffmpeg_path {
            Some(path) => path.clone(),
            None => hushcut_media::check_ffmpeg()?,
        };
        let ffprobe = match &self.ffprobe_path {
            Some(path) => path.clone(),
            None => hushcut_media::check_ffprobe()?,
        };
        Ok(ToolPaths::new(ffmpeg, ffprobe))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
