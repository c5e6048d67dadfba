//! Feature Extractor
//!
//! Computes the fixed statistic set per channel from a timeline snapshot:
//! short/long rolling means, least-squares slope over the short window,
//! variance over the short window, and cumulative time outside the normal
//! range. Pure function of the snapshot - no side effects, no state.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::config::MonitorConfig;
use crate::features::vector::{ChannelFeatures, FeatureVector};
use crate::vitals::{TimelineSnapshot, VitalChannel, VitalSample};

pub struct FeatureExtractor {
    config: Arc<MonitorConfig>,
}

impl FeatureExtractor {
    pub fn new(config: Arc<MonitorConfig>) -> Self {
        Self { config }
    }

    /// Compute the feature vector for one evaluation tick.
    ///
    /// The snapshot must span the long window; the short-window statistics
    /// are computed over its tail. Channels with fewer than `min_samples`
    /// readings in the short window are marked insufficient and carry no
    /// values downstream.
    pub fn extract(&self, snapshot: &TimelineSnapshot) -> FeatureVector {
        let now = snapshot.taken_at;
        let short_from = now - Duration::seconds(self.config.short_window_secs);
        let mut vector = FeatureVector::new(now);

        for channel in VitalChannel::ALL {
            let long_samples = snapshot.channel(channel);
            let short_start = long_samples.partition_point(|s| s.timestamp < short_from);
            let short_samples = &long_samples[short_start..];

            if short_samples.len() < self.config.min_samples {
                vector.mark_insufficient(channel);
                continue;
            }

            let normal = self.config.ranges(channel).normal;
            vector.insert(
                channel,
                ChannelFeatures {
                    mean_short: mean(short_samples),
                    mean_long: mean(long_samples),
                    slope_per_min: slope_per_min(short_samples),
                    variance: variance(short_samples),
                    out_of_range_secs: out_of_range_secs(
                        short_samples,
                        now,
                        self.config.short_window_secs,
                        |v| !normal.contains(v),
                    ),
                    sample_count: short_samples.len(),
                },
            );
        }

        vector
    }
}

// ============================================================================
// STATISTICS
// ============================================================================

fn mean(samples: &[VitalSample]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.value).sum::<f32>() / samples.len() as f32
}

fn variance(samples: &[VitalSample]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }
    let m = mean(samples);
    samples.iter().map(|s| (s.value - m).powi(2)).sum::<f32>() / samples.len() as f32
}

/// Least-squares slope of value over time, in units per minute.
fn slope_per_min(samples: &[VitalSample]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }

    let t0 = samples[0].timestamp;
    let n = samples.len() as f64;

    let mut sum_x = 0.0f64;
    let mut sum_y = 0.0f64;
    let mut sum_xy = 0.0f64;
    let mut sum_xx = 0.0f64;

    for s in samples {
        let x = s.timestamp.signed_duration_since(t0).num_milliseconds() as f64 / 1000.0;
        let y = s.value as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denom = n * sum_xx - sum_x * sum_x;
    if denom.abs() < 1e-9 {
        // All samples share a timestamp
        return 0.0;
    }

    let per_sec = (n * sum_xy - sum_x * sum_y) / denom;
    (per_sec * 60.0) as f32
}

/// Cumulative seconds the value was outside the normal range within the
/// short window. Each out-of-range sample accounts for the gap to the
/// next sample (or to `now` for the last one); the total is clamped to
/// the window length.
fn out_of_range_secs(
    samples: &[VitalSample],
    now: DateTime<Utc>,
    window_secs: i64,
    outside: impl Fn(f32) -> bool,
) -> f32 {
    let mut total = 0.0f32;
    for (i, s) in samples.iter().enumerate() {
        if !outside(s.value) {
            continue;
        }
        let until = samples.get(i + 1).map_or(now, |next| next.timestamp);
        let gap = until.signed_duration_since(s.timestamp).num_milliseconds() as f32 / 1000.0;
        total += gap.max(0.0);
    }
    total.min(window_secs as f32)
}

// ============================================================================
// TESTS
// ============================================================================
