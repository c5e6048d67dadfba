//! Feature Vector - Derived statistics for one evaluation tick
//!
//! Maps (channel, statistic) to a value. Recomputed every tick from a
//! timeline snapshot and never persisted. Channels with too few samples
//! are carried as explicitly insufficient rather than defaulted to zero,
//! so sparse data can never masquerade as a stable patient.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::vitals::VitalChannel;

// ============================================================================
// STATISTICS
// ============================================================================

/// The fixed statistic set computed per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statistic {
    /// Rolling mean over the short window.
    MeanShort,
    /// Rolling mean over the long window.
    MeanLong,
    /// Least-squares slope over the short window (units per minute).
    Slope,
    /// Population variance over the short window.
    Variance,
    /// Cumulative seconds outside the normal range within the short window.
    OutOfRangeSecs,
}

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::MeanShort => "mean_short",
            Statistic::MeanLong => "mean_long",
            Statistic::Slope => "slope",
            Statistic::Variance => "variance",
            Statistic::OutOfRangeSecs => "out_of_range_secs",
        }
    }
}

/// Identifies one feature: a statistic of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureId {
    pub channel: VitalChannel,
    pub statistic: Statistic,
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.channel.as_str(), self.statistic.as_str())
    }
}

// ============================================================================
// CHANNEL FEATURES
// ============================================================================

/// All statistics for one channel with sufficient data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelFeatures {
    pub mean_short: f32,
    pub mean_long: f32,
    pub slope_per_min: f32,
    pub variance: f32,
    pub out_of_range_secs: f32,
    pub sample_count: usize,
}

impl ChannelFeatures {
    pub fn get(&self, statistic: Statistic) -> f32 {
        match statistic {
            Statistic::MeanShort => self.mean_short,
            Statistic::MeanLong => self.mean_long,
            Statistic::Slope => self.slope_per_min,
            Statistic::Variance => self.variance,
            Statistic::OutOfRangeSecs => self.out_of_range_secs,
        }
    }
}

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// Per-patient, per-tick feature vector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Evaluation tick time the vector was computed at.
    pub taken_at: DateTime<Utc>,
    /// Statistics for channels with sufficient data.
    channels: HashMap<VitalChannel, ChannelFeatures>,
    /// Channels excluded for lack of samples in the short window.
    insufficient: Vec<VitalChannel>,
}

impl FeatureVector {
    pub fn new(taken_at: DateTime<Utc>) -> Self {
        Self {
            taken_at,
            channels: HashMap::new(),
            insufficient: Vec::new(),
        }
    }

    pub fn insert(&mut self, channel: VitalChannel, features: ChannelFeatures) {
        self.channels.insert(channel, features);
    }

    pub fn mark_insufficient(&mut self, channel: VitalChannel) {
        if !self.insufficient.contains(&channel) {
            self.insufficient.push(channel);
        }
    }

    pub fn channel(&self, channel: VitalChannel) -> Option<&ChannelFeatures> {
        self.channels.get(&channel)
    }

    pub fn is_sufficient(&self, channel: VitalChannel) -> bool {
        self.channels.contains_key(&channel)
    }

    /// Sufficient channels in clinical priority order.
    pub fn sufficient_channels(&self) -> impl Iterator<Item = VitalChannel> + '_ {
        VitalChannel::ALL
            .into_iter()
            .filter(|c| self.channels.contains_key(c))
    }

    pub fn insufficient_channels(&self) -> &[VitalChannel] {
        &self.insufficient
    }

    /// Look up a single feature value; `None` for insufficient channels.
    pub fn get(&self, id: FeatureId) -> Option<f32> {
        self.channels.get(&id.channel).map(|f| f.get(id.statistic))
    }

    /// Number of channels with sufficient data.
    pub fn sufficient_count(&self) -> usize {
        self.channels.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================
