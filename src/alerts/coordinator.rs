//! Alert Coordinator
//!
//! Fires an alert record when the stabilized level escalates and
//! suppresses repeats for the same target level within the cooldown
//! window. De-escalations are recorded but not alert-worthy by default.
//! Malformed input is logged and ignored - alerting is best-effort and
//! must never block the risk pipeline.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AlertConfig;
use crate::risk::{RiskAssessment, RiskLevel};

// ============================================================================
// RECORDS
// ============================================================================

/// A stabilized level transition worth recording. Never mutated after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub alert_id: Uuid,
    pub patient_id: String,
    pub from_level: RiskLevel,
    pub to_level: RiskLevel,
    pub timestamp: DateTime<Utc>,
    /// True when the record was kept for the audit trail but should not
    /// be surfaced (cooldown repeat or non-alerting de-escalation).
    pub suppressed: bool,
}

impl AlertRecord {
    pub fn is_escalation(&self) -> bool {
        self.from_level.escalates_to(self.to_level)
    }
}

// ============================================================================
// COORDINATOR
// ============================================================================

/// Per-patient alert state: recent records (bounded ring, oldest dropped
/// first) plus the last unsuppressed alert time per target level for
/// cooldown checks.
pub struct AlertCoordinator {
    config: AlertConfig,
    records: VecDeque<AlertRecord>,
    last_alert_at: HashMap<RiskLevel, DateTime<Utc>>,
}

impl AlertCoordinator {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            records: VecDeque::new(),
            last_alert_at: HashMap::new(),
        }
    }

    /// Compare consecutive assessments and record a transition if the
    /// stabilized level changed. Returns the new record, if any.
    ///
    /// Malformed input (mismatched patients, time running backwards) is
    /// logged and dropped rather than raised.
    pub fn evaluate(
        &mut self,
        previous: Option<&RiskAssessment>,
        current: &RiskAssessment,
    ) -> Option<AlertRecord> {
        if let Some(prev) = previous {
            if prev.patient_id != current.patient_id {
                log::warn!(
                    "[AlertCoordinator] assessment patient mismatch: {} vs {}",
                    prev.patient_id,
                    current.patient_id
                );
                return None;
            }
            if current.timestamp < prev.timestamp {
                log::warn!(
                    "[AlertCoordinator] assessment timestamps regressed for {}",
                    current.patient_id
                );
                return None;
            }
        }

        // A new patient starts from the stabilizer's initial Low
        let from = previous.map_or(RiskLevel::Low, |p| p.stabilized_level);
        let to = current.stabilized_level;

        // Unknown is a data gap, not a transition
        if from == RiskLevel::Unknown || to == RiskLevel::Unknown || from == to {
            return None;
        }

        let suppressed = if from.escalates_to(to) {
            self.in_cooldown(to, current.timestamp)
        } else if self.config.alert_on_deescalation {
            self.in_cooldown(to, current.timestamp)
        } else {
            true
        };

        let record = AlertRecord {
            alert_id: Uuid::new_v4(),
            patient_id: current.patient_id.clone(),
            from_level: from,
            to_level: to,
            timestamp: current.timestamp,
            suppressed,
        };

        if suppressed {
            log::debug!(
                "[AlertCoordinator] suppressed {} -> {} for {}",
                from,
                to,
                current.patient_id
            );
        } else {
            log::info!(
                "[AlertCoordinator] alert {} -> {} for {}",
                from,
                to,
                current.patient_id
            );
            self.last_alert_at.insert(to, current.timestamp);
        }

        self.records.push_back(record.clone());
        while self.records.len() > self.config.max_records.max(1) {
            self.records.pop_front();
        }
        Some(record)
    }

    fn in_cooldown(&self, target: RiskLevel, now: DateTime<Utc>) -> bool {
        self.last_alert_at.get(&target).is_some_and(|last| {
            now.signed_duration_since(*last) < Duration::seconds(self.config.cooldown_secs)
        })
    }

    /// Records at or after `since`, oldest first.
    pub fn alerts_since(&self, since: DateTime<Utc>) -> Vec<AlertRecord> {
        self.records
            .iter()
            .filter(|r| r.timestamp >= since)
            .cloned()
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn assessment(patient: &str, secs: i64, stabilized: RiskLevel) -> RiskAssessment {
        RiskAssessment {
            patient_id: patient.to_string(),
            timestamp: ts(secs),
            tick: 0,
            raw_score: Some(0.5),
            raw_level: stabilized,
            stabilized_level: stabilized,
            top_contributors: vec![],
            insufficient_channels: vec![],
            recommendation: stabilized.recommendation().to_string(),
        }
    }

    fn coordinator() -> AlertCoordinator {
        AlertCoordinator::new(AlertConfig::default())
    }

    #[test]
    fn test_escalation_fires_alert() {
        let mut c = coordinator();
        let prev = assessment("p-1", 0, RiskLevel::Low);
        let cur = assessment("p-1", 60, RiskLevel::Early);

        let record = c.evaluate(Some(&prev), &cur).unwrap();
        assert!(!record.suppressed);
        assert!(record.is_escalation());
        assert_eq!(record.from_level, RiskLevel::Low);
        assert_eq!(record.to_level, RiskLevel::Early);
    }

    #[test]
    fn test_no_record_without_change() {
        let mut c = coordinator();
        let prev = assessment("p-1", 0, RiskLevel::Early);
        let cur = assessment("p-1", 60, RiskLevel::Early);
        assert!(c.evaluate(Some(&prev), &cur).is_none());
    }

    #[test]
    fn test_cooldown_suppresses_repeat() {
        let mut c = coordinator();
        let a0 = assessment("p-1", 0, RiskLevel::Low);
        let a1 = assessment("p-1", 60, RiskLevel::High);
        let a2 = assessment("p-1", 120, RiskLevel::Low);
        let a3 = assessment("p-1", 180, RiskLevel::High);

        assert!(!c.evaluate(Some(&a0), &a1).unwrap().suppressed);
        // De-escalation back down is recorded, suppressed
        assert!(c.evaluate(Some(&a1), &a2).unwrap().suppressed);
        // Second High escalation inside the 15 min cooldown
        assert!(c.evaluate(Some(&a2), &a3).unwrap().suppressed);
    }

    #[test]
    fn test_alert_refires_after_cooldown() {
        let mut c = coordinator();
        let cooldown = AlertConfig::default().cooldown_secs;

        let a0 = assessment("p-1", 0, RiskLevel::Low);
        let a1 = assessment("p-1", 60, RiskLevel::High);
        let a2 = assessment("p-1", 120, RiskLevel::Low);
        let a3 = assessment("p-1", 60 + cooldown + 1, RiskLevel::High);

        assert!(!c.evaluate(Some(&a0), &a1).unwrap().suppressed);
        c.evaluate(Some(&a1), &a2);
        assert!(!c.evaluate(Some(&a2), &a3).unwrap().suppressed);
    }

    #[test]
    fn test_no_two_unsuppressed_same_level_within_cooldown() {
        let mut c = coordinator();
        let mut prev = assessment("p-1", 0, RiskLevel::Low);
        let mut unsuppressed_high = 0;

        // Bounce Low <-> High every minute for 10 minutes
        for i in 1..=10 {
            let level = if i % 2 == 1 { RiskLevel::High } else { RiskLevel::Low };
            let cur = assessment("p-1", i * 60, level);
            if let Some(r) = c.evaluate(Some(&prev), &cur) {
                if !r.suppressed && r.to_level == RiskLevel::High {
                    unsuppressed_high += 1;
                }
            }
            prev = cur;
        }

        assert_eq!(unsuppressed_high, 1);
    }

    #[test]
    fn test_deescalation_recorded_not_alerting() {
        let mut c = coordinator();
        let a0 = assessment("p-1", 0, RiskLevel::Low);
        let a1 = assessment("p-1", 60, RiskLevel::High);
        let a2 = assessment("p-1", 120, RiskLevel::Early);

        c.evaluate(Some(&a0), &a1);
        let record = c.evaluate(Some(&a1), &a2).unwrap();
        assert!(record.suppressed);
        assert!(!record.is_escalation());
        assert_eq!(c.alerts_since(ts(0)).len(), 2);
    }

    #[test]
    fn test_mismatched_patients_ignored() {
        let mut c = coordinator();
        let prev = assessment("p-1", 0, RiskLevel::Low);
        let cur = assessment("p-2", 60, RiskLevel::High);
        assert!(c.evaluate(Some(&prev), &cur).is_none());
    }

    #[test]
    fn test_time_regression_ignored() {
        let mut c = coordinator();
        let prev = assessment("p-1", 600, RiskLevel::Low);
        let cur = assessment("p-1", 0, RiskLevel::High);
        assert!(c.evaluate(Some(&prev), &cur).is_none());
    }

    #[test]
    fn test_unknown_transitions_not_recorded() {
        let mut c = coordinator();
        let a0 = assessment("p-1", 0, RiskLevel::Unknown);
        let a1 = assessment("p-1", 60, RiskLevel::High);

        // From Unknown: a data gap ending, not an escalation
        assert!(c.evaluate(Some(&a0), &a1).is_none());

        let a2 = assessment("p-1", 120, RiskLevel::Unknown);
        assert!(c.evaluate(Some(&a1), &a2).is_none());
    }

    #[test]
    fn test_first_assessment_high_alerts_from_low() {
        let mut c = coordinator();
        let cur = assessment("p-1", 0, RiskLevel::High);
        let record = c.evaluate(None, &cur).unwrap();
        assert!(!record.suppressed);
        assert_eq!(record.from_level, RiskLevel::Low);
    }

    #[test]
    fn test_record_buffer_bounded_drops_oldest() {
        let mut c = AlertCoordinator::new(AlertConfig {
            max_records: 4,
            ..AlertConfig::default()
        });

        // Bounce Low <-> Early every minute: one record per transition
        let mut prev = assessment("p-1", 0, RiskLevel::Low);
        for i in 1..=10 {
            let level = if i % 2 == 1 { RiskLevel::Early } else { RiskLevel::Low };
            let cur = assessment("p-1", i * 60, level);
            c.evaluate(Some(&prev), &cur);
            prev = cur;
        }

        let records = c.alerts_since(ts(0));
        assert_eq!(records.len(), 4);
        // The newest records survive
        assert_eq!(records.last().unwrap().timestamp, ts(600));
        assert!(records.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_alerts_since_filters() {
        let mut c = coordinator();
        let a0 = assessment("p-1", 0, RiskLevel::Low);
        let a1 = assessment("p-1", 60, RiskLevel::Early);
        let a2 = assessment("p-1", 2000, RiskLevel::High);

        c.evaluate(Some(&a0), &a1);
        c.evaluate(Some(&a1), &a2);

        assert_eq!(c.alerts_since(ts(0)).len(), 2);
        assert_eq!(c.alerts_since(ts(1000)).len(), 1);
        assert_eq!(c.alerts_since(ts(1000))[0].to_level, RiskLevel::High);
    }
}
