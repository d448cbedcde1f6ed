//! CLI error types.

use std::path::PathBuf;

use hushcut_media::MediaError;
use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Cannot derive an output name for {0}")]
    NoOutputName(PathBuf),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Whether this is FFmpeg's "too many packets buffered" failure.
    pub fn is_packet_buffering(&self) -> bool {
        matches!(self, Self::Media(e) if e.is_packet_buffering())
    }
}
