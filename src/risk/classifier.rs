//! Risk Classifier
//!
//! Maps a feature vector to a raw risk score in [0, 1] and a discrete
//! level via configured thresholds. The default model is a weighted blend
//! of per-channel risks; anything satisfying [`RiskModel`] can substitute
//! it without touching the stabilizer or explainer.
//!
//! Channels marked insufficient are excluded and their weight is
//! redistributed proportionally over the remaining channels, so the score
//! stays well-defined in [0, 1] with partial data. Identical feature
//! vectors always yield identical output.

use std::sync::Arc;

use crate::config::MonitorConfig;
use crate::error::ScoreError;
use crate::features::{ChannelFeatures, FeatureVector};
use crate::risk::types::{ChannelRisk, RawScore, RiskLevel, ScoreBreakdown};
use crate::vitals::VitalChannel;

// Component weights within one channel's risk
const LEVEL_SHARE: f32 = 0.40;
const RANGE_SHARE: f32 = 0.30;
const TREND_SHARE: f32 = 0.20;
const INSTABILITY_SHARE: f32 = 0.10;

// ============================================================================
// MODEL TRAIT
// ============================================================================

/// Capability interface for the scoring model. Any implementation can be
/// swapped in per deployment; stabilizer and explainer only see the
/// contract.
pub trait RiskModel: Send + Sync {
    fn score(&self, features: &FeatureVector) -> Result<RawScore, ScoreError>;
}

// ============================================================================
// WEIGHTED MODEL
// ============================================================================

/// Default scoring model: configured channel weights over per-channel
/// risks blended from level deviation, out-of-range time, adverse trend,
/// and instability.
pub struct WeightedRiskModel {
    config: Arc<MonitorConfig>,
}

impl WeightedRiskModel {
    pub fn new(config: Arc<MonitorConfig>) -> Self {
        Self { config }
    }

    /// Direction in which a rising value is adverse: +1 when high values
    /// are dangerous, -1 when low values are.
    fn adverse_sign(channel: VitalChannel) -> f32 {
        match channel {
            VitalChannel::HeartRate | VitalChannel::Temperature => 1.0,
            VitalChannel::SystolicBp | VitalChannel::DiastolicBp | VitalChannel::Spo2 => -1.0,
        }
    }

    /// Slope magnitude (units/min) that saturates the trend component.
    fn trend_scale(channel: VitalChannel) -> f32 {
        match channel {
            VitalChannel::HeartRate => 3.0,
            VitalChannel::SystolicBp => 3.0,
            VitalChannel::DiastolicBp => 2.0,
            VitalChannel::Spo2 => 0.5,
            VitalChannel::Temperature => 0.1,
        }
    }

    fn channel_risk(&self, channel: VitalChannel, feats: &ChannelFeatures) -> ChannelRisk {
        let normal = self.config.ranges(channel).normal;
        let width = normal.width();

        // Distance of the short mean outside the normal band, in band widths
        let above = (feats.mean_short - normal.max).max(0.0);
        let below = (normal.min - feats.mean_short).max(0.0);
        let level = ((above + below) / width).clamp(0.0, 1.0);

        // Fraction of the short window spent out of range
        let range = (feats.out_of_range_secs / self.config.short_window_secs as f32)
            .clamp(0.0, 1.0);

        // Trend in the adverse direction, saturating at the channel scale
        let adverse_slope = feats.slope_per_min * Self::adverse_sign(channel);
        let trend = (adverse_slope / Self::trend_scale(channel)).clamp(0.0, 1.0);

        // Short-window instability relative to the normal band
        let instability = (feats.variance.sqrt() / (0.25 * width)).clamp(0.0, 1.0);

        let level_component = LEVEL_SHARE * level;
        let range_component = RANGE_SHARE * range;
        let trend_component = TREND_SHARE * trend;
        let instability_component = INSTABILITY_SHARE * instability;

        ChannelRisk {
            channel,
            risk: (level_component + range_component + trend_component + instability_component)
                .clamp(0.0, 1.0),
            effective_weight: 0.0, // Filled in by score()
            level_component,
            range_component,
            trend_component,
            instability_component,
        }
    }

    fn level_for(&self, score: f32) -> RiskLevel {
        let t = &self.config.thresholds;
        if score < t.low_max {
            RiskLevel::Low
        } else if score < t.early_max {
            RiskLevel::Early
        } else {
            RiskLevel::High
        }
    }
}

impl RiskModel for WeightedRiskModel {
    fn score(&self, features: &FeatureVector) -> Result<RawScore, ScoreError> {
        let mut channel_risks: Vec<ChannelRisk> = VitalChannel::ALL
            .into_iter()
            .filter_map(|channel| {
                features
                    .channel(channel)
                    .map(|feats| self.channel_risk(channel, feats))
            })
            .collect();

        if channel_risks.is_empty() {
            return Err(ScoreError::NoUsableFeatures);
        }

        let total_weight: f32 = channel_risks
            .iter()
            .map(|c| self.config.weights.get(c.channel))
            .sum();
        if total_weight <= 0.0 {
            return Err(ScoreError::NoUsableFeatures);
        }

        // Redistribute missing channels' weight proportionally
        for c in &mut channel_risks {
            c.effective_weight = self.config.weights.get(c.channel) / total_weight;
        }

        let score = channel_risks
            .iter()
            .map(ChannelRisk::contribution)
            .sum::<f32>()
            .clamp(0.0, 1.0);

        Ok(RawScore {
            score,
            level: self.level_for(score),
            breakdown: ScoreBreakdown { channel_risks },
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn model() -> WeightedRiskModel {
        WeightedRiskModel::new(Arc::new(MonitorConfig::default()))
    }

    fn normal_features(mean: f32) -> ChannelFeatures {
        ChannelFeatures {
            mean_short: mean,
            mean_long: mean,
            slope_per_min: 0.0,
            variance: 0.0,
            out_of_range_secs: 0.0,
            sample_count: 5,
        }
    }

    fn all_normal_vector() -> FeatureVector {
        let mut fv = FeatureVector::new(Utc::now());
        fv.insert(VitalChannel::HeartRate, normal_features(72.0));
        fv.insert(VitalChannel::SystolicBp, normal_features(120.0));
        fv.insert(VitalChannel::DiastolicBp, normal_features(75.0));
        fv.insert(VitalChannel::Spo2, normal_features(97.0));
        fv.insert(VitalChannel::Temperature, normal_features(37.0));
        fv
    }

    #[test]
    fn test_all_normal_scores_low() {
        let raw = model().score(&all_normal_vector()).unwrap();
        assert!(raw.score < 0.1, "normal vitals scored {}", raw.score);
        assert_eq!(raw.level, RiskLevel::Low);
    }

    #[test]
    fn test_deterministic_and_idempotent() {
        let m = model();
        let fv = all_normal_vector();
        let a = m.score(&fv).unwrap();
        let b = m.score(&fv).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_severely_abnormal_scores_high() {
        let mut fv = all_normal_vector();
        fv.insert(
            VitalChannel::Spo2,
            ChannelFeatures {
                mean_short: 82.0,
                mean_long: 90.0,
                slope_per_min: -1.0,
                variance: 4.0,
                out_of_range_secs: 300.0,
                sample_count: 10,
            },
        );
        fv.insert(
            VitalChannel::HeartRate,
            ChannelFeatures {
                mean_short: 150.0,
                mean_long: 120.0,
                slope_per_min: 5.0,
                variance: 36.0,
                out_of_range_secs: 300.0,
                sample_count: 10,
            },
        );
        fv.insert(
            VitalChannel::SystolicBp,
            ChannelFeatures {
                mean_short: 75.0,
                mean_long: 95.0,
                slope_per_min: -4.0,
                variance: 25.0,
                out_of_range_secs: 300.0,
                sample_count: 10,
            },
        );
        fv.insert(
            VitalChannel::Temperature,
            ChannelFeatures {
                mean_short: 39.5,
                mean_long: 38.5,
                slope_per_min: 0.1,
                variance: 0.09,
                out_of_range_secs: 300.0,
                sample_count: 10,
            },
        );
        fv.insert(
            VitalChannel::DiastolicBp,
            ChannelFeatures {
                mean_short: 45.0,
                mean_long: 55.0,
                slope_per_min: -2.0,
                variance: 16.0,
                out_of_range_secs: 300.0,
                sample_count: 10,
            },
        );

        let raw = model().score(&fv).unwrap();
        assert!(raw.score > 0.66, "deteriorating vitals scored {}", raw.score);
        assert_eq!(raw.level, RiskLevel::High);
    }

    #[test]
    fn test_missing_channel_redistributes_weight() {
        let m = model();

        let mut partial = all_normal_vector();
        // Rebuild without SpO2
        let mut fv = FeatureVector::new(partial.taken_at);
        for channel in [
            VitalChannel::HeartRate,
            VitalChannel::SystolicBp,
            VitalChannel::DiastolicBp,
            VitalChannel::Temperature,
        ] {
            fv.insert(channel, partial.channel(channel).unwrap().clone());
        }
        fv.mark_insufficient(VitalChannel::Spo2);
        partial = fv;

        let raw = m.score(&partial).unwrap();
        assert!(raw.score >= 0.0 && raw.score <= 1.0);
        assert!(raw.breakdown.channel(VitalChannel::Spo2).is_none());

        // Effective weights renormalize to 1
        let total: f32 = raw
            .breakdown
            .channel_risks
            .iter()
            .map(|c| c.effective_weight)
            .sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_all_insufficient_is_error() {
        let mut fv = FeatureVector::new(Utc::now());
        for channel in VitalChannel::ALL {
            fv.mark_insufficient(channel);
        }
        assert_eq!(
            model().score(&fv).unwrap_err(),
            ScoreError::NoUsableFeatures
        );
    }

    #[test]
    fn test_contributions_sum_to_score() {
        let mut fv = all_normal_vector();
        fv.insert(
            VitalChannel::HeartRate,
            ChannelFeatures {
                mean_short: 125.0,
                mean_long: 100.0,
                slope_per_min: 2.0,
                variance: 9.0,
                out_of_range_secs: 200.0,
                sample_count: 8,
            },
        );

        let raw = model().score(&fv).unwrap();
        let sum: f32 = raw
            .breakdown
            .channel_risks
            .iter()
            .map(ChannelRisk::contribution)
            .sum();
        assert!((sum - raw.score).abs() < 1e-5);
    }

    #[test]
    fn test_adverse_trend_raises_risk() {
        let m = model();

        let flat = m.score(&all_normal_vector()).unwrap();

        let mut declining = all_normal_vector();
        declining.insert(
            VitalChannel::Spo2,
            ChannelFeatures {
                slope_per_min: -0.5,
                ..normal_features(96.0)
            },
        );
        let trending = m.score(&declining).unwrap();

        assert!(trending.score > flat.score);
    }

    #[test]
    fn test_benign_trend_direction_ignored() {
        let m = model();

        // Rising SpO2 is recovery, not risk
        let mut improving = all_normal_vector();
        improving.insert(
            VitalChannel::Spo2,
            ChannelFeatures {
                slope_per_min: 0.5,
                ..normal_features(97.0)
            },
        );
        let raw = m.score(&improving).unwrap();
        let spo2 = raw.breakdown.channel(VitalChannel::Spo2).unwrap();
        assert_eq!(spo2.trend_component, 0.0);
    }
}
