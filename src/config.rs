//! Monitor Configuration
//!
//! Immutable configuration object constructed once and passed explicitly
//! to each pipeline stage. No process-wide mutable globals: per-deployment
//! tuning and deterministic tests both build their own `MonitorConfig`.

use serde::{Deserialize, Serialize};

use crate::vitals::VitalChannel;

// ============================================================================
// VALUE RANGES
// ============================================================================

/// Inclusive value range for a vital channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn width(&self) -> f32 {
        (self.max - self.min).max(f32::EPSILON)
    }
}

/// Physical plausibility and clinical normal ranges per channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChannelRanges {
    /// Values outside this range are physically implausible and rejected
    /// at ingestion.
    pub plausible: ValueRange,
    /// Values outside this range count toward out-of-range duration.
    pub normal: ValueRange,
}

// ============================================================================
// CLASSIFIER CONFIG
// ============================================================================

/// Score-to-level thresholds for the classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskThresholds {
    /// Scores below this are Low.
    pub low_max: f32,
    /// Scores below this (and >= low_max) are Early; the rest are High.
    pub early_max: f32,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_max: 0.33,
            early_max: 0.66,
        }
    }
}

/// Per-channel weights for the weighted scoring model.
///
/// Weights need not sum to 1.0; the classifier normalizes over the
/// channels that have sufficient data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChannelWeights {
    pub heart_rate: f32,
    pub systolic_bp: f32,
    pub diastolic_bp: f32,
    pub spo2: f32,
    pub temperature: f32,
}

impl ChannelWeights {
    pub fn get(&self, channel: VitalChannel) -> f32 {
        match channel {
            VitalChannel::HeartRate => self.heart_rate,
            VitalChannel::SystolicBp => self.systolic_bp,
            VitalChannel::DiastolicBp => self.diastolic_bp,
            VitalChannel::Spo2 => self.spo2,
            VitalChannel::Temperature => self.temperature,
        }
    }
}

impl Default for ChannelWeights {
    fn default() -> Self {
        Self {
            heart_rate: 0.30,
            systolic_bp: 0.20,
            diastolic_bp: 0.10,
            spo2: 0.25,
            temperature: 0.15,
        }
    }
}

// ============================================================================
// HYSTERESIS CONFIG
// ============================================================================

/// Streak lengths for the transition stabilizer.
///
/// Asymmetric on purpose: under-reacting to deterioration is costlier
/// than over-reacting, so escalations commit faster than recoveries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HysteresisConfig {
    /// Consecutive ticks before committing an escalation (except to High).
    pub escalation_ticks: u32,
    /// Consecutive ticks before committing an escalation to High.
    pub high_escalation_ticks: u32,
    /// Consecutive ticks before committing a de-escalation.
    pub deescalation_ticks: u32,
    /// Emit an assessment to subscribers every N ticks even without a
    /// committed level change.
    pub heartbeat_ticks: u32,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            escalation_ticks: 2,
            high_escalation_ticks: 1,
            deescalation_ticks: 3,
            heartbeat_ticks: 6,
        }
    }
}

// ============================================================================
// ALERT CONFIG
// ============================================================================

/// Alert coordinator tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Repeated alerts for the same target level within this window are
    /// suppressed (recorded with `suppressed: true`).
    pub cooldown_secs: i64,
    /// Whether de-escalations fire alerts (default: recorded only).
    pub alert_on_deescalation: bool,
    /// Alert records retained per patient; the oldest are dropped first.
    pub max_records: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 900,
            alert_on_deescalation: false,
            max_records: 256,
        }
    }
}

// ============================================================================
// MONITOR CONFIG
// ============================================================================

/// Top-level immutable configuration for the risk engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Timeline retention window (seconds). Samples older than this are
    /// evicted on ingest.
    pub retention_secs: i64,
    /// Short feature window (seconds): slope, variance, out-of-range
    /// duration and the short mean are computed over this window.
    pub short_window_secs: i64,
    /// Long feature window (seconds) for the long rolling mean.
    pub long_window_secs: i64,
    /// Minimum samples in the short window for a channel to count as
    /// having sufficient data.
    pub min_samples: usize,
    /// Clock-skew allowance for out-of-order timestamps (seconds).
    pub skew_tolerance_secs: i64,
    /// Maximum number of ranked contributors per assessment.
    pub top_contributors: usize,
    /// Recent assessments retained per patient for trajectory queries.
    pub history_len: usize,

    pub thresholds: RiskThresholds,
    pub weights: ChannelWeights,
    pub hysteresis: HysteresisConfig,
    pub alerts: AlertConfig,

    pub heart_rate: ChannelRanges,
    pub systolic_bp: ChannelRanges,
    pub diastolic_bp: ChannelRanges,
    pub spo2: ChannelRanges,
    pub temperature: ChannelRanges,
}

impl MonitorConfig {
    pub fn ranges(&self, channel: VitalChannel) -> &ChannelRanges {
        match channel {
            VitalChannel::HeartRate => &self.heart_rate,
            VitalChannel::SystolicBp => &self.systolic_bp,
            VitalChannel::DiastolicBp => &self.diastolic_bp,
            VitalChannel::Spo2 => &self.spo2,
            VitalChannel::Temperature => &self.temperature,
        }
    }

    /// Config tuned for fast-moving tests: tight windows, small minimums.
    pub fn fast() -> Self {
        Self {
            short_window_secs: 60,
            long_window_secs: 300,
            retention_secs: 300,
            min_samples: 3,
            ..Default::default()
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            retention_secs: 1800,
            short_window_secs: 300,
            long_window_secs: 1800,
            min_samples: 4,
            skew_tolerance_secs: 5,
            top_contributors: 3,
            history_len: 256,
            thresholds: RiskThresholds::default(),
            weights: ChannelWeights::default(),
            hysteresis: HysteresisConfig::default(),
            alerts: AlertConfig::default(),
            heart_rate: ChannelRanges {
                plausible: ValueRange::new(0.0, 300.0),
                normal: ValueRange::new(50.0, 100.0),
            },
            systolic_bp: ChannelRanges {
                plausible: ValueRange::new(30.0, 300.0),
                normal: ValueRange::new(100.0, 140.0),
            },
            diastolic_bp: ChannelRanges {
                plausible: ValueRange::new(10.0, 200.0),
                normal: ValueRange::new(60.0, 90.0),
            },
            spo2: ChannelRanges {
                plausible: ValueRange::new(50.0, 100.0),
                normal: ValueRange::new(94.0, 100.0),
            },
            temperature: ChannelRanges {
                plausible: ValueRange::new(30.0, 45.0),
                normal: ValueRange::new(36.0, 38.0),
            },
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
