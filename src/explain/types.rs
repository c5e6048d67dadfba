//! Explanation Types

use serde::{Deserialize, Serialize};

use crate::features::FeatureId;
use crate::vitals::VitalChannel;

/// One ranked entry in an assessment's explanation: how much of the raw
/// score a channel accounts for, and why in clinician-readable terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub channel: VitalChannel,
    /// The dominant statistic behind this channel's risk.
    pub feature: FeatureId,
    /// Portion of the raw score attributable to this channel.
    pub weight: f32,
    /// Human-readable justification, e.g. "SpO2 declining trend over the
    /// last 5 min".
    pub reason: String,
}
