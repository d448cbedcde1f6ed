//! Parsing of FFmpeg filter diagnostics.
//!
//! Two filters report on stderr:
//!
//! ```text
//! [Parsed_volumedetect_0 @ 0x600] mean_volume: -27.4 dB
//! [silencedetect @ 0x600] silence_start: 12.48
//! [silencedetect @ 0x600] silence_end: 14.02 | silence_duration: 1.54
//! ```
//!
//! Markers must alternate strictly, `start` then `end`.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::planner::TimeInterval;

static MEAN_VOLUME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"mean[_ ]volume:\s*(\S+)\s*dB").expect("mean volume pattern is valid")
});

static SILENCE_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"silence_(start|end):\s*(\S+)").expect("silence marker pattern is valid")
});

/// Diagnostic text did not have the expected shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("no mean_volume line in volumedetect output")]
    MissingMeanVolume,

    #[error("invalid {field} value: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("silence_end at {at}s without a preceding silence_start")]
    UnmatchedSilenceEnd { at: f64 },

    #[error("silence_start at {at}s while the silence starting at {open}s is still open")]
    UnmatchedSilenceStart { at: f64, open: f64 },
}

/// Extract the mean volume (dB) reported by the `volumedetect` filter.
pub fn extract_mean_volume(text: &str) -> Result<f64, ParseError> {
    let caps = MEAN_VOLUME_RE
        .captures(text)
        .ok_or(ParseError::MissingMeanVolume)?;

    parse_number("mean_volume", &caps[1])
}

/// Extract silence intervals reported by the `silencedetect` filter, in order.
///
/// A `silence_start` left open at the end of the text (silence running to
/// the end of the stream) produces no interval.
pub fn extract_silence_intervals(text: &str) -> Result<Vec<TimeInterval>, ParseError> {
    let mut intervals = Vec::new();
    let mut open: Option<f64> = None;

    for caps in SILENCE_MARKER_RE.captures_iter(text) {
        match &caps[1] {
            "start" => {
                let at = parse_number("silence_start", &caps[2])?;
                if let Some(open) = open {
                    return Err(ParseError::UnmatchedSilenceStart { at, open });
                }
                open = Some(at);
            }
            _ => {
                let at = parse_number("silence_end", &caps[2])?;
                let start = open.take().ok_or(ParseError::UnmatchedSilenceEnd { at })?;
                intervals.push(TimeInterval::new(start, at));
            }
        }
    }

    if let Some(start) = open {
        debug!(silence_start = start, "Dropping silence that runs to the end of the stream");
    }

    Ok(intervals)
}

fn parse_number(field: &'static str, value: &str) -> Result<f64, ParseError> {
    value
        .trim_end_matches(|c: char| !c.is_ascii_digit())
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}
