//! Vital Sample Buffer - Per-patient rolling timelines
//!
//! Stores recent readings per channel with retention-window eviction.
//! Validation happens here so a bad sample never reaches the feature
//! extractor: implausible values and out-of-order timestamps are rejected
//! and the timeline is left untouched.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::config::MonitorConfig;
use crate::error::IngestError;
use crate::vitals::types::{VitalChannel, VitalSample};

// ============================================================================
// TIMELINE
// ============================================================================

/// Ordered-by-timestamp samples per channel for one patient, bounded to
/// the retention window. Owned exclusively by the engine's per-patient
/// pipeline; callers read it through [`TimelineSnapshot`].
pub struct PatientTimeline {
    config: Arc<MonitorConfig>,
    channels: HashMap<VitalChannel, Vec<VitalSample>>,
}

/// Read-only view of a timeline at a point in time. Samples are ordered
/// by timestamp and restricted to the requested window.
#[derive(Debug, Clone, Default)]
pub struct TimelineSnapshot {
    pub taken_at: DateTime<Utc>,
    channels: HashMap<VitalChannel, Vec<VitalSample>>,
}

impl PatientTimeline {
    pub fn new(config: Arc<MonitorConfig>) -> Self {
        Self {
            config,
            channels: HashMap::new(),
        }
    }

    /// Append a validated sample and evict readings older than the
    /// retention window.
    pub fn ingest(
        &mut self,
        channel: VitalChannel,
        timestamp: DateTime<Utc>,
        value: f32,
    ) -> Result<(), IngestError> {
        let plausible = self.config.ranges(channel).plausible;
        if !value.is_finite() || !plausible.contains(value) {
            return Err(IngestError::InvalidValue {
                channel,
                value,
                min: plausible.min,
                max: plausible.max,
            });
        }

        let samples = self.channels.entry(channel).or_default();

        if let Some(last) = samples.last() {
            let behind = last.timestamp.signed_duration_since(timestamp);
            if behind > Duration::seconds(self.config.skew_tolerance_secs) {
                return Err(IngestError::OutOfOrderSample {
                    channel,
                    behind_secs: behind.num_seconds(),
                });
            }
        }

        // Within skew tolerance a sample may land slightly behind the
        // tail; insert at its sorted position to keep order.
        let pos = samples
            .iter()
            .rposition(|s| s.timestamp <= timestamp)
            .map(|i| i + 1)
            .unwrap_or(0);
        samples.insert(pos, VitalSample::new(channel, timestamp, value));

        self.evict(timestamp);
        Ok(())
    }

    /// Drop samples older than the retention window, measured from the
    /// newest timestamp seen across all channels.
    fn evict(&mut self, newest: DateTime<Utc>) {
        let horizon = newest - Duration::seconds(self.config.retention_secs);
        for samples in self.channels.values_mut() {
            let keep_from = samples.partition_point(|s| s.timestamp < horizon);
            if keep_from > 0 {
                samples.drain(..keep_from);
            }
        }
    }

    /// Read-only snapshot of samples within `window_secs` before `now`,
    /// per channel. Never mutates.
    pub fn snapshot(&self, now: DateTime<Utc>, window_secs: i64) -> TimelineSnapshot {
        let from = now - Duration::seconds(window_secs);
        let mut channels = HashMap::new();
        for (channel, samples) in &self.channels {
            let start = samples.partition_point(|s| s.timestamp < from);
            let end = samples.partition_point(|s| s.timestamp <= now);
            if start < end {
                channels.insert(*channel, samples[start..end].to_vec());
            }
        }
        TimelineSnapshot {
            taken_at: now,
            channels,
        }
    }

    /// Newest timestamp across all channels, if any sample exists.
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.channels
            .values()
            .filter_map(|s| s.last())
            .map(|s| s.timestamp)
            .max()
    }

    pub fn sample_count(&self, channel: VitalChannel) -> usize {
        self.channels.get(&channel).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.channels.values().all(Vec::is_empty)
    }
}

impl TimelineSnapshot {
    /// Samples for one channel (ordered by timestamp), empty if none.
    pub fn channel(&self, channel: VitalChannel) -> &[VitalSample] {
        self.channels.get(&channel).map_or(&[], Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.channels.values().all(Vec::is_empty)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> Arc<MonitorConfig> {
        Arc::new(MonitorConfig::default())
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_ingest_and_snapshot() {
        let mut timeline = PatientTimeline::new(config());
        for i in 0..5 {
            timeline
                .ingest(VitalChannel::HeartRate, ts(i * 60), 70.0 + i as f32)
                .unwrap();
        }

        let snap = timeline.snapshot(ts(240), 300);
        let hr = snap.channel(VitalChannel::HeartRate);
        assert_eq!(hr.len(), 5);
        assert!(hr.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_invalid_value_rejected() {
        let mut timeline = PatientTimeline::new(config());
        let err = timeline
            .ingest(VitalChannel::HeartRate, ts(0), -50.0)
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidValue { .. }));
        assert!(timeline.is_empty());

        // NaN never passes plausibility
        let err = timeline
            .ingest(VitalChannel::Temperature, ts(0), f32::NAN)
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidValue { .. }));
    }

    #[test]
    fn test_rejection_leaves_prior_samples_usable() {
        let mut timeline = PatientTimeline::new(config());
        timeline.ingest(VitalChannel::HeartRate, ts(0), 72.0).unwrap();
        timeline
            .ingest(VitalChannel::HeartRate, ts(60), -50.0)
            .unwrap_err();

        assert_eq!(timeline.sample_count(VitalChannel::HeartRate), 1);
        let snap = timeline.snapshot(ts(60), 300);
        assert_eq!(snap.channel(VitalChannel::HeartRate)[0].value, 72.0);
    }

    #[test]
    fn test_out_of_order_beyond_tolerance_rejected() {
        let mut timeline = PatientTimeline::new(config());
        timeline.ingest(VitalChannel::Spo2, ts(100), 97.0).unwrap();

        let err = timeline
            .ingest(VitalChannel::Spo2, ts(100 - 30), 96.0)
            .unwrap_err();
        assert!(matches!(err, IngestError::OutOfOrderSample { .. }));
    }

    #[test]
    fn test_out_of_order_within_tolerance_kept_sorted() {
        let mut timeline = PatientTimeline::new(config());
        timeline.ingest(VitalChannel::Spo2, ts(100), 97.0).unwrap();
        // 3s behind, inside the default 5s skew allowance
        timeline.ingest(VitalChannel::Spo2, ts(97), 96.0).unwrap();

        let snap = timeline.snapshot(ts(100), 300);
        let spo2 = snap.channel(VitalChannel::Spo2);
        assert_eq!(spo2.len(), 2);
        assert_eq!(spo2[0].value, 96.0);
        assert_eq!(spo2[1].value, 97.0);
    }

    #[test]
    fn test_retention_eviction() {
        let mut timeline = PatientTimeline::new(config());
        let retention = MonitorConfig::default().retention_secs;

        timeline.ingest(VitalChannel::HeartRate, ts(0), 70.0).unwrap();
        timeline
            .ingest(VitalChannel::HeartRate, ts(retention + 60), 75.0)
            .unwrap();

        // Old sample is outside the retention window after the new ingest
        assert_eq!(timeline.sample_count(VitalChannel::HeartRate), 1);
        let snap = timeline.snapshot(ts(retention + 60), retention);
        assert_eq!(snap.channel(VitalChannel::HeartRate)[0].value, 75.0);
    }

    #[test]
    fn test_eviction_spans_all_channels() {
        let mut timeline = PatientTimeline::new(config());
        let retention = MonitorConfig::default().retention_secs;

        timeline.ingest(VitalChannel::Spo2, ts(0), 97.0).unwrap();
        timeline
            .ingest(VitalChannel::HeartRate, ts(retention + 10), 80.0)
            .unwrap();

        assert_eq!(timeline.sample_count(VitalChannel::Spo2), 0);
        assert_eq!(timeline.sample_count(VitalChannel::HeartRate), 1);
    }

    #[test]
    fn test_snapshot_window_filters() {
        let mut timeline = PatientTimeline::new(config());
        for i in 0..10 {
            timeline
                .ingest(VitalChannel::Temperature, ts(i * 60), 37.0)
                .unwrap();
        }

        let snap = timeline.snapshot(ts(540), 120);
        // Only samples in [540-120, 540]: 420, 480, 540
        assert_eq!(snap.channel(VitalChannel::Temperature).len(), 3);
    }
}
