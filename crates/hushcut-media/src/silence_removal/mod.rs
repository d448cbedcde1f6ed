//! Silence removal driven by FFmpeg's `volumedetect` and `silencedetect`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ FFmpeg       │───►│ diagnostics  │───►│ planner      │
//! │ analysis     │    │ (parse text) │    │ (keep spans) │
//! └──────────────┘    └──────────────┘    └──────────────┘
//!                                                │
//!                                                ▼
//!                     ┌──────────────┐    ┌──────────────┐
//!                     │ Output Video │◄───│ apply        │
//!                     │              │    │ extract+concat│
//!                     └──────────────┘    └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use hushcut_media::silence_removal::{
//!     analyze_silences, plan_keep_intervals, render_keep_intervals, SilenceRemovalConfig,
//! };
//!
//! let config = SilenceRemovalConfig::default();
//! let analysis = analyze_silences(&runner, &input, &config).await?;
//! let keep = plan_keep_intervals(analysis.media.duration, &analysis.silences, &config);
//! render_keep_intervals(&runner, &input, &keep, &output, &EncodingConfig::default()).await?;
//! ```

mod analyze;
mod apply;
mod config;
mod diagnostics;
mod planner;

pub use analyze::{analyze_silences, detect_silences, measure_mean_volume, MediaFileDescriptor, SilenceAnalysis};
pub use apply::{
    chunk_dir, chunk_file_name, concat_chunks, concat_listing, escape_concat_path, extract_chunk,
    render_keep_intervals, OUTPUT_SUFFIX,
};
pub use config::{EncodingConfig, SilenceRemovalConfig};
pub use diagnostics::{extract_mean_volume, extract_silence_intervals, ParseError};
pub use planner::{
    complement_intervals, compute_interval_stats, pad_intervals, plan_keep_intervals, IntervalStats,
    TimeInterval,
};
