//! Risk Module - Scoring and stabilized classification
//!
//! - `types` - Risk levels, raw scores, per-tick assessments
//! - `classifier` - The pluggable scoring model and its weighted default
//! - `stabilizer` - Anti-flicker hysteresis over classifier output

pub mod classifier;
pub mod stabilizer;
pub mod types;

pub use classifier::{RiskModel, WeightedRiskModel};
pub use stabilizer::{StabilizerState, TransitionStabilizer};
pub use types::{ChannelRisk, RawScore, RiskAssessment, RiskLevel, ScoreBreakdown};
