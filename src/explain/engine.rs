//! Explanation Engine
//!
//! Attributes the raw risk score to contributing channels via the same
//! weight decomposition the classifier produced, ranks them by absolute
//! contribution, and annotates each with a reason derived from its
//! dominant statistic. Ties break by clinical priority (SpO2 > BP > HR >
//! Temp). Purely derived from the classifier's inputs and output; holds
//! no state of its own.

use std::sync::Arc;

use crate::config::MonitorConfig;
use crate::explain::types::Contribution;
use crate::features::{FeatureId, FeatureVector, Statistic};
use crate::risk::types::{ChannelRisk, RawScore};

pub struct ExplanationEngine {
    config: Arc<MonitorConfig>,
}

impl ExplanationEngine {
    pub fn new(config: Arc<MonitorConfig>) -> Self {
        Self { config }
    }

    /// Top-N contributors to `raw.score`, ranked by absolute contribution.
    ///
    /// Channels marked insufficient in the feature vector are never
    /// attributed; the classifier excludes them from the breakdown and
    /// this filter enforces it against pluggable models too.
    pub fn explain(&self, features: &FeatureVector, raw: &RawScore) -> Vec<Contribution> {
        let mut entries: Vec<(&ChannelRisk, f32)> = raw
            .breakdown
            .channel_risks
            .iter()
            .filter(|c| features.is_sufficient(c.channel))
            .map(|c| (c, c.contribution()))
            .filter(|(_, w)| *w > 0.0)
            .collect();

        entries.sort_by(|(a, wa), (b, wb)| {
            wb.abs()
                .partial_cmp(&wa.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.channel.priority().cmp(&b.channel.priority()))
        });
        entries.truncate(self.config.top_contributors);

        entries
            .into_iter()
            .map(|(risk, weight)| {
                let statistic = dominant_statistic(risk);
                Contribution {
                    channel: risk.channel,
                    feature: FeatureId {
                        channel: risk.channel,
                        statistic,
                    },
                    weight,
                    reason: self.reason(risk, statistic, features),
                }
            })
            .collect()
    }

    fn reason(
        &self,
        risk: &ChannelRisk,
        statistic: Statistic,
        features: &FeatureVector,
    ) -> String {
        let label = risk.channel.label();
        let window_min = (self.config.short_window_secs as f32 / 60.0).round() as i64;
        let feats = features.channel(risk.channel);

        match statistic {
            Statistic::Slope => {
                let rising = feats.map_or(false, |f| f.slope_per_min > 0.0);
                let direction = if rising { "rising" } else { "declining" };
                format!("{label} {direction} trend over the last {window_min} min")
            }
            Statistic::OutOfRangeSecs => {
                let minutes = feats
                    .map_or(0.0, |f| f.out_of_range_secs / 60.0)
                    .round() as i64;
                format!("{label} outside normal range for {minutes} min of the last {window_min} min")
            }
            Statistic::MeanShort => {
                let normal = self.config.ranges(risk.channel).normal;
                let side = match feats {
                    Some(f) if f.mean_short > normal.max => "above",
                    _ => "below",
                };
                format!("{label} sustained {side} normal range")
            }
            Statistic::Variance => {
                format!("{label} unstable over the last {window_min} min")
            }
            // mean_long never dominates; kept for completeness
            Statistic::MeanLong => format!("{label} deviating from its baseline"),
        }
    }
}

/// The statistic whose component contributed most to the channel risk.
fn dominant_statistic(risk: &ChannelRisk) -> Statistic {
    let components = [
        (Statistic::MeanShort, risk.level_component),
        (Statistic::OutOfRangeSecs, risk.range_component),
        (Statistic::Slope, risk.trend_component),
        (Statistic::Variance, risk.instability_component),
    ];
    components
        .into_iter()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(s, _)| s)
        .unwrap_or(Statistic::MeanShort)
}

// ============================================================================
// TESTS
// ============================================================================
