//! Planning which parts of a file to keep.
//!
//! The kept intervals are the complement of the detected silences over
//! `[0, duration]`. Gaps no longer than `min_keep_duration` are dropped,
//! then every cut gets `padding_duration / 2` of silence on each side.
//!
//! ```text
//! silence:      ████        ██████            ██
//! keep:     ────    ────────      ────────────  ─
//!           0                                    D
//! padded:   ─────  ──────────    ──────────────    (last gap dropped)
//! ```

use serde::{Deserialize, Serialize};

use super::config::SilenceRemovalConfig;

/// A span of a media file in seconds, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: f64,
    pub end: f64,
}

impl TimeInterval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Compute the padded intervals to keep from sorted, non-overlapping silences.
///
/// An empty result means nothing is worth keeping.
pub fn plan_keep_intervals(
    duration: f64,
    silences: &[TimeInterval],
    config: &SilenceRemovalConfig,
) -> Vec<TimeInterval> {
    let keep = complement_intervals(duration, silences, config.min_keep_duration);
    pad_intervals(&keep, config.padding_duration, duration)
}

/// Gaps between silences (and the file edges) longer than `min_keep`.
pub fn complement_intervals(duration: f64, silences: &[TimeInterval], min_keep: f64) -> Vec<TimeInterval> {
    let mut keep = Vec::new();
    let mut cursor = 0.0;

    for silence in silences {
        if silence.start - cursor > min_keep {
            keep.push(TimeInterval::new(cursor, silence.start));
        }
        cursor = silence.end;
    }

    if duration - cursor > min_keep {
        keep.push(TimeInterval::new(cursor, duration));
    }

    keep
}

/// Widen every inner boundary by `padding / 2`.
///
/// The first start and the last end are left alone. Padding never reaches
/// past the midpoint of the gap to the neighbouring interval, and results
/// stay within `[0, duration]`.
pub fn pad_intervals(intervals: &[TimeInterval], padding: f64, duration: f64) -> Vec<TimeInterval> {
    let half = padding.max(0.0) / 2.0;
    let last = intervals.len().saturating_sub(1);

    intervals
        .iter()
        .enumerate()
        .map(|(i, interval)| {
            let mut start = interval.start;
            let mut end = interval.end;

            if i > 0 {
                let gap = (interval.start - intervals[i - 1].end).max(0.0);
                start = (start - half.min(gap / 2.0)).max(0.0);
            }
            if i < last {
                let gap = (intervals[i + 1].start - interval.end).max(0.0);
                end = (end + half.min(gap / 2.0)).min(duration);
            }

            TimeInterval::new(start, end)
        })
        .collect()
}

/// Statistics about a keep plan.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalStats {
    /// Seconds retained in the output.
    pub kept_secs: f64,
    /// Seconds removed from the source.
    pub removed_secs: f64,
    /// Number of kept intervals.
    pub keep_count: usize,
    /// Ratio of kept content (0.0 to 1.0).
    pub keep_ratio: f64,
}

/// Calculate statistics for `intervals` kept out of `duration` seconds.
pub fn compute_interval_stats(intervals: &[TimeInterval], duration: f64) -> IntervalStats {
    let kept_secs: f64 = intervals.iter().map(TimeInterval::duration).sum();
    let removed_secs = (duration - kept_secs).max(0.0);
    let keep_ratio = if duration > 0.0 {
        (kept_secs / duration).min(1.0)
    } else {
        0.0
    };

    IntervalStats {
        kept_secs,
        removed_secs,
        keep_count: intervals.len(),
        keep_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(start: f64, end: f64) -> TimeInterval {
        TimeInterval::new(start, end)
    }

    fn assert_intervals_eq(actual: &[TimeInterval], expected: &[(f64, f64)]) {
        assert_eq!(actual.len(), expected.len(), "got {:?}", actual);
        for (a, (start, end)) in actual.iter().zip(expected) {
            assert!(
                (a.start - start).abs() < 1e-9 && (a.end - end).abs() < 1e-9,
                "got {:?}, expected {:?}",
                actual,
                expected
            );
        }
    }

    #[test]
    fn test_single_silence_complement() {
        let keep = complement_intervals(10.0, &[iv(2.0, 3.0)], 1.0);
        assert_intervals_eq(&keep, &[(0.0, 2.0), (3.0, 10.0)]);
    }

    #[test]
    fn test_single_silence_padded() {
        let keep = plan_keep_intervals(10.0, &[iv(2.0, 3.0)], &SilenceRemovalConfig::default());
        assert_intervals_eq(&keep, &[(0.0, 2.2), (2.8, 10.0)]);
    }

    #[test]
    fn test_no_silence_keeps_everything() {
        let keep = plan_keep_intervals(42.0, &[], &SilenceRemovalConfig::default());
        assert_intervals_eq(&keep, &[(0.0, 42.0)]);
    }

    #[test]
    fn test_whole_file_silent() {
        let keep = plan_keep_intervals(10.0, &[iv(0.0, 10.0)], &SilenceRemovalConfig::default());
        assert!(keep.is_empty());
    }

    #[test]
    fn test_no_gap_exceeds_min_keep() {
        let silences = [iv(0.5, 3.0), iv(3.8, 7.0), iv(7.9, 9.5)];
        let keep = plan_keep_intervals(10.0, &silences, &SilenceRemovalConfig::default());
        assert!(keep.is_empty());
    }

    #[test]
    fn test_gap_equal_to_min_keep_is_dropped() {
        let keep = complement_intervals(10.0, &[iv(1.0, 2.0), iv(3.0, 9.0)], 1.0);
        assert!(keep.is_empty());
    }

    #[test]
    fn test_short_gaps_are_merged_into_silence() {
        let silences = [iv(2.0, 3.0), iv(3.5, 5.0)];
        let keep = complement_intervals(10.0, &silences, 1.0);
        assert_intervals_eq(&keep, &[(0.0, 2.0), (5.0, 10.0)]);
    }

    #[test]
    fn test_first_and_last_edges_not_padded() {
        let silences = [iv(0.0, 1.0), iv(4.0, 6.0), iv(8.0, 10.0)];
        let keep = plan_keep_intervals(10.0, &silences, &SilenceRemovalConfig::default());
        assert_intervals_eq(&keep, &[(1.0, 4.2), (5.8, 8.0)]);
    }

    #[test]
    fn test_padding_never_overlaps() {
        // 0.25s silence between the two kept spans, less than the 0.4s padding.
        let silences = [iv(3.0, 3.25)];
        let keep = plan_keep_intervals(10.0, &silences, &SilenceRemovalConfig::default());
        assert_intervals_eq(&keep, &[(0.0, 3.125), (3.125, 10.0)]);
    }

    #[test]
    fn test_padding_clamped_to_duration() {
        let padded = pad_intervals(&[iv(0.0, 9.9), iv(9.95, 10.0)], 1.0, 10.0);
        assert!(padded.iter().all(|i| i.start >= 0.0 && i.end <= 10.0));
    }

    #[test]
    fn test_zero_duration_plans_nothing() {
        let keep = plan_keep_intervals(0.0, &[], &SilenceRemovalConfig::default());
        assert!(keep.is_empty());
    }

    #[test]
    fn test_plan_is_sorted_and_complementary() {
        let duration = 60.0;
        let min_keep = 1.0;
        let config = SilenceRemovalConfig::default();

        for seed in 0..50u64 {
            // Deterministic pseudo-random silences.
            let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let mut next = || {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                (state >> 33) as f64 / (1u64 << 31) as f64
            };

            let mut silences = Vec::new();
            let mut t = next() * 2.0;
            while t < duration {
                let end = (t + 0.2 + next() * 3.0).min(duration);
                silences.push(iv(t, end));
                t = end + next() * 4.0;
            }

            let unpadded = complement_intervals(duration, &silences, min_keep);
            for pair in unpadded.windows(2) {
                assert!(pair[0].end <= pair[1].start);
            }
            for keep in &unpadded {
                assert!(keep.duration() > min_keep);
                // No kept span intersects a silence.
                assert!(silences
                    .iter()
                    .all(|s| s.end <= keep.start || s.start >= keep.end));
            }

            let padded = plan_keep_intervals(duration, &silences, &config);
            assert_eq!(padded.len(), unpadded.len());
            for pair in padded.windows(2) {
                assert!(pair[0].start <= pair[0].end);
                assert!(pair[0].end <= pair[1].start + 1e-9);
            }
            if let (Some(first), Some(orig)) = (padded.first(), unpadded.first()) {
                assert_eq!(first.start, orig.start);
            }
            if let (Some(last), Some(orig)) = (padded.last(), unpadded.last()) {
                assert_eq!(last.end, orig.end);
            }
        }
    }

    #[test]
    fn test_interval_stats() {
        let stats = compute_interval_stats(&[iv(0.0, 2.0), iv(3.0, 10.0)], 10.0);
        assert!((stats.kept_secs - 9.0).abs() < 1e-9);
        assert!((stats.removed_secs - 1.0).abs() < 1e-9);
        assert_eq!(stats.keep_count, 2);
        assert!((stats.keep_ratio - 0.9).abs() < 1e-9);
    }
}
