//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::silence_removal::ParseError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// FFmpeg message for the muxer queue overflow that aborts some encodes.
const PACKET_BUFFERING_MESSAGE: &str = "too many packets buffered for output stream";

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Failed to parse FFmpeg diagnostics: {0}")]
    Parse(#[from] ParseError),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an FFprobe failure error.
    pub fn ffprobe_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::FfprobeFailed {
            message: message.into(),
            stderr,
        }
    }

    /// Whether FFmpeg gave up with "Too many packets buffered for output stream".
    ///
    /// Batch processing treats this one failure as non-fatal.
    pub fn is_packet_buffering(&self) -> bool {
        match self {
            Self::FfmpegFailed { message, stderr, .. } => {
                contains_packet_buffering(message)
                    || stderr.as_deref().is_some_and(contains_packet_buffering)
            }
            _ => false,
        }
    }
}

fn contains_packet_buffering(text: &str) -> bool {
    text.to_lowercase().contains(PACKET_BUFFERING_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_buffering_detected_in_stderr() {
        let err = MediaError::ffmpeg_failed(
            "Segment extraction failed",
            Some("[mp4 @ 0x55] Too many packets buffered for output stream 0:1.\nConversion failed!".to_string()),
            Some(1),
        );
        assert!(err.is_packet_buffering());
    }

    #[test]
    fn test_other_failures_are_not_packet_buffering() {
        let err = MediaError::ffmpeg_failed("Concat failed", Some("Invalid data found".to_string()), Some(1));
        assert!(!err.is_packet_buffering());

        let err = MediaError::ffprobe_failed(
            "Too many packets buffered for output stream",
            None,
        );
        assert!(!err.is_packet_buffering());

        assert!(!MediaError::FfmpegNotFound.is_packet_buffering());
    }
}
