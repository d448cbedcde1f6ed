//! The media operations the orchestrator needs, behind one trait.

use std::path::Path;

use async_trait::async_trait;

use crate::command::FfmpegRunner;
use crate::error::MediaResult;
use crate::probe;
use crate::silence_removal::{
    analyze_silences, render_keep_intervals, EncodingConfig, SilenceAnalysis, SilenceRemovalConfig,
    TimeInterval,
};

/// Probing, analysis and rendering of media files.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Whether `path` opens as media.
    async fn is_media_file(&self, path: &Path) -> bool;

    /// Duration, mean volume and silences of `path`.
    async fn analyze(&self, path: &Path, config: &SilenceRemovalConfig) -> MediaResult<SilenceAnalysis>;

    /// Write the concatenation of `intervals` of `source` to `output`.
    async fn render(&self, source: &Path, intervals: &[TimeInterval], output: &Path) -> MediaResult<()>;
}

/// [`MediaBackend`] backed by the FFmpeg and FFprobe executables.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    runner: FfmpegRunner,
    encoding: EncodingConfig,
}

impl FfmpegBackend {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self {
            runner,
            encoding: EncodingConfig::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn is_media_file(&self, path: &Path) -> bool {
        probe::is_media_file(&self.runner, path).await
    }

    async fn analyze(&self, path: &Path, config: &SilenceRemovalConfig) -> MediaResult<SilenceAnalysis> {
        analyze_silences(&self.runner, path, config).await
    }

    async fn render(&self, source: &Path, intervals: &[TimeInterval], output: &Path) -> MediaResult<()> {
        render_keep_intervals(&self.runner, source, intervals, output, &self.encoding).await
    }
}
