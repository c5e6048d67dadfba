//! Vital Sign Types
//!
//! Core types for monitored vital-sign streams. No logic beyond small
//! helpers - the timeline and extractor own the behavior.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CHANNELS
// ============================================================================

/// One monitored vital-sign stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VitalChannel {
    HeartRate,
    SystolicBp,
    DiastolicBp,
    Spo2,
    Temperature,
}

impl VitalChannel {
    /// All channels, in clinical priority order (highest acuity first).
    /// Used for deterministic iteration and explanation tie-breaking.
    pub const ALL: [VitalChannel; 5] = [
        VitalChannel::Spo2,
        VitalChannel::SystolicBp,
        VitalChannel::DiastolicBp,
        VitalChannel::HeartRate,
        VitalChannel::Temperature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VitalChannel::HeartRate => "heart_rate",
            VitalChannel::SystolicBp => "systolic_bp",
            VitalChannel::DiastolicBp => "diastolic_bp",
            VitalChannel::Spo2 => "spo2",
            VitalChannel::Temperature => "temperature",
        }
    }

    /// Display label for dashboards and explanation text.
    pub fn label(&self) -> &'static str {
        match self {
            VitalChannel::HeartRate => "Heart rate",
            VitalChannel::SystolicBp => "Systolic BP",
            VitalChannel::DiastolicBp => "Diastolic BP",
            VitalChannel::Spo2 => "SpO2",
            VitalChannel::Temperature => "Temperature",
        }
    }

    /// Clinical acuity rank (0 = highest). SpO2 > BP > HR > Temp.
    pub fn priority(&self) -> u8 {
        match self {
            VitalChannel::Spo2 => 0,
            VitalChannel::SystolicBp => 1,
            VitalChannel::DiastolicBp => 2,
            VitalChannel::HeartRate => 3,
            VitalChannel::Temperature => 4,
        }
    }

    /// Measurement unit for display.
    pub fn unit(&self) -> &'static str {
        match self {
            VitalChannel::HeartRate => "bpm",
            VitalChannel::SystolicBp | VitalChannel::DiastolicBp => "mmHg",
            VitalChannel::Spo2 => "%",
            VitalChannel::Temperature => "°C",
        }
    }
}

impl std::fmt::Display for VitalChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// SAMPLES
// ============================================================================

/// A single timestamped vital reading. Immutable once recorded; patient
/// identity is carried by the owning timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSample {
    pub channel: VitalChannel,
    pub timestamp: DateTime<Utc>,
    pub value: f32,
}

impl VitalSample {
    pub fn new(channel: VitalChannel, timestamp: DateTime<Utc>, value: f32) -> Self {
        Self {
            channel,
            timestamp,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order_matches_all() {
        for pair in VitalChannel::ALL.windows(2) {
            assert!(pair[0].priority() < pair[1].priority());
        }
    }

    #[test]
    fn test_channel_as_str_unique() {
        let mut names: Vec<&str> = VitalChannel::ALL.iter().map(|c| c.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), VitalChannel::ALL.len());
    }
}
