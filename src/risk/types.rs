//! Risk Types
//!
//! Data structures for classification output. No logic beyond small
//! helpers - classifier and stabilizer own the behavior.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::explain::Contribution;
use crate::vitals::VitalChannel;

// ============================================================================
// RISK LEVELS
// ============================================================================

/// Deterioration-risk classification levels.
///
/// `Unknown` is reported when no channel has usable data; the classifier
/// itself never produces it. Insufficient data must read as "unknown",
/// never as a reassuring Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Unknown,
    Low,
    Early,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Unknown => "unknown",
            RiskLevel::Low => "low",
            RiskLevel::Early => "early",
            RiskLevel::High => "high",
        }
    }

    pub fn severity_level(&self) -> u8 {
        match self {
            RiskLevel::Unknown => 0,
            RiskLevel::Low => 1,
            RiskLevel::Early => 2,
            RiskLevel::High => 3,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Unknown => "#94a3b8", // Gray
            RiskLevel::Low => "#10b981",     // Green
            RiskLevel::Early => "#f59e0b",   // Amber
            RiskLevel::High => "#ef4444",    // Red
        }
    }

    /// Clinician-facing action hint for the dashboard.
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::Unknown => "Insufficient data - verify monitoring sensors",
            RiskLevel::Low => "Low risk - continue monitoring",
            RiskLevel::Early => "Early deterioration - order labs and review medication",
            RiskLevel::High => "High risk - escalate for ICU transfer review",
        }
    }

    /// Whether moving from `self` to `target` is an escalation.
    pub fn escalates_to(&self, target: RiskLevel) -> bool {
        target.severity_level() > self.severity_level()
            && target != RiskLevel::Unknown
            && *self != RiskLevel::Unknown
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// SCORE BREAKDOWN
// ============================================================================

/// Per-channel share of the raw score, kept for attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRisk {
    pub channel: VitalChannel,
    /// Channel risk in [0, 1] before weighting.
    pub risk: f32,
    /// Weight after renormalizing over sufficient channels.
    pub effective_weight: f32,
    /// Component shares of `risk` (sum to `risk` up to rounding).
    pub level_component: f32,
    pub range_component: f32,
    pub trend_component: f32,
    pub instability_component: f32,
}

impl ChannelRisk {
    /// This channel's contribution to the raw score.
    pub fn contribution(&self) -> f32 {
        self.effective_weight * self.risk
    }
}

/// How the raw score was assembled, one entry per sufficient channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub channel_risks: Vec<ChannelRisk>,
}

impl ScoreBreakdown {
    pub fn channel(&self, channel: VitalChannel) -> Option<&ChannelRisk> {
        self.channel_risks.iter().find(|c| c.channel == channel)
    }
}

/// Classifier output for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawScore {
    /// Risk score in [0, 1].
    pub score: f32,
    /// Score mapped through the configured thresholds.
    pub level: RiskLevel,
    pub breakdown: ScoreBreakdown,
}

// ============================================================================
// ASSESSMENT
// ============================================================================

/// One immutable risk assessment, produced once per evaluation tick and
/// superseded by the next tick's assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub patient_id: String,
    pub timestamp: DateTime<Utc>,
    /// Evaluation tick counter for this patient.
    pub tick: u64,
    /// `None` exactly when the assessment is Unknown/Insufficient.
    pub raw_score: Option<f32>,
    pub raw_level: RiskLevel,
    pub stabilized_level: RiskLevel,
    /// Ranked contributors, highest absolute contribution first.
    pub top_contributors: Vec<Contribution>,
    /// Channels excluded from scoring for lack of data.
    pub insufficient_channels: Vec<VitalChannel>,
    /// Action hint derived from the stabilized level.
    pub recommendation: String,
}

impl RiskAssessment {
    /// Assessment reported when no channel has usable data.
    pub fn unknown(
        patient_id: &str,
        timestamp: DateTime<Utc>,
        tick: u64,
        insufficient: Vec<VitalChannel>,
    ) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            timestamp,
            tick,
            raw_score: None,
            raw_level: RiskLevel::Unknown,
            stabilized_level: RiskLevel::Unknown,
            top_contributors: Vec::new(),
            insufficient_channels: insufficient,
            recommendation: RiskLevel::Unknown.recommendation().to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.raw_level == RiskLevel::Unknown
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(RiskLevel::Low.severity_level() < RiskLevel::Early.severity_level());
        assert!(RiskLevel::Early.severity_level() < RiskLevel::High.severity_level());
    }

    #[test]
    fn test_escalation_detection() {
        assert!(RiskLevel::Low.escalates_to(RiskLevel::Early));
        assert!(RiskLevel::Low.escalates_to(RiskLevel::High));
        assert!(RiskLevel::Early.escalates_to(RiskLevel::High));
        assert!(!RiskLevel::High.escalates_to(RiskLevel::Early));
        assert!(!RiskLevel::Early.escalates_to(RiskLevel::Early));
        // Unknown never participates in escalation
        assert!(!RiskLevel::Unknown.escalates_to(RiskLevel::High));
        assert!(!RiskLevel::Low.escalates_to(RiskLevel::Unknown));
    }

    #[test]
    fn test_unknown_assessment_never_low() {
        let a = RiskAssessment::unknown("p-1", Utc::now(), 3, vec![]);
        assert!(a.is_unknown());
        assert_eq!(a.stabilized_level, RiskLevel::Unknown);
        assert!(a.raw_score.is_none());
        assert!(a.top_contributors.is_empty());
    }
}
