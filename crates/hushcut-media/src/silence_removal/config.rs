//! Configuration for silence removal.
//!
//! These parameters control how aggressively silence is detected and cut.

use serde::{Deserialize, Serialize};

/// Tuning thresholds for silence detection and interval planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SilenceRemovalConfig {
    /// Minimum gap between two silences for it to be kept (seconds).
    ///
    /// Gaps of this length or shorter are dropped along with the silences
    /// around them. Compared against the gap before padding.
    pub min_keep_duration: f64,

    /// Minimum silence length reported by `silencedetect` (seconds).
    pub min_silence_duration: f64,

    /// Silence left attached to the kept content at each cut (seconds).
    ///
    /// Split evenly: half stays on each side of a cut.
    pub padding_duration: f64,

    /// How far below the file's mean volume audio counts as silence (dB).
    pub threshold_offset_db: f64,
}

impl Default for SilenceRemovalConfig {
    fn default() -> Self {
        Self {
            min_keep_duration: 1.0,
            min_silence_duration: 0.2,
            padding_duration: 0.4,
            threshold_offset_db: 10.0,
        }
    }
}

impl SilenceRemovalConfig {
    /// Silence detection threshold for a file with the given mean volume.
    pub fn silence_threshold_db(&self, mean_volume_db: f64) -> f64 {
        mean_volume_db - self.threshold_offset_db
    }

    /// Builder-style setter for the minimum kept gap.
    pub fn with_min_keep_duration(mut self, secs: f64) -> Self {
        self.min_keep_duration = secs.max(0.0);
        self
    }

    /// Builder-style setter for the minimum detected silence.
    pub fn with_min_silence_duration(mut self, secs: f64) -> Self {
        self.min_silence_duration = secs.max(0.0);
        self
    }

    /// Builder-style setter for padding.
    pub fn with_padding_duration(mut self, secs: f64) -> Self {
        self.padding_duration = secs.max(0.0);
        self
    }

    /// Builder-style setter for the threshold offset.
    pub fn with_threshold_offset_db(mut self, db: f64) -> Self {
        self.threshold_offset_db = db;
        self
    }
}

/// Encoder settings for extracted chunks.
///
/// Unset fields leave the choice to FFmpeg's defaults for the container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingConfig {
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub crf: Option<u8>,
    pub preset: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SilenceRemovalConfig::default();
        assert!((config.min_keep_duration - 1.0).abs() < f64::EPSILON);
        assert!((config.min_silence_duration - 0.2).abs() < f64::EPSILON);
        assert!((config.padding_duration - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_builder_pattern() {
        let config = SilenceRemovalConfig::default()
            .with_min_keep_duration(2.0)
            .with_padding_duration(-1.0)
            .with_threshold_offset_db(6.0);

        assert!((config.min_keep_duration - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.padding_duration, 0.0);
        assert!((config.silence_threshold_db(-24.0) - -30.0).abs() < f64::EPSILON);
    }
}
