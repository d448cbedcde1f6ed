#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for silence removal.
//!
//! This crate provides:
//! - Type-safe FFmpeg and FFprobe command building
//! - Progress parsing from `-progress pipe:2`
//! - Parsing of `volumedetect` / `silencedetect` diagnostics
//! - Planning of the intervals to keep around detected silence
//! - Chunk extraction and lossless concatenation of the result

pub mod backend;
pub mod command;
pub mod error;
pub mod probe;
pub mod progress;
pub mod silence_removal;

pub use backend::{FfmpegBackend, MediaBackend};
pub use command::{
    check_ffmpeg, check_ffprobe, CommandOutput, FfmpegCommand, FfmpegRunner, FfprobeCommand, ToolPaths,
};
pub use error::{MediaError, MediaResult};
pub use probe::{is_media_file, probe_duration};
pub use progress::FfmpegProgress;
pub use silence_removal::{
    EncodingConfig, MediaFileDescriptor, ParseError, SilenceAnalysis, SilenceRemovalConfig, TimeInterval,
};
