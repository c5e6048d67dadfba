//! Transition Stabilizer
//!
//! Hysteresis over raw classifier levels: a candidate change must hold
//! for a configured number of consecutive ticks before it becomes the
//! authoritative level, so one noisy reading never flips the display.
//! Asymmetric: escalations (and especially escalations to High) commit
//! faster than de-escalations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::HysteresisConfig;
use crate::risk::types::RiskLevel;

// ============================================================================
// STATE
// ============================================================================

/// The one piece of cross-tick mutable state in the core. Mutated only by
/// [`TransitionStabilizer::observe`] on the owning patient's tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilizerState {
    pub current_level: RiskLevel,
    pub level_entered_at: DateTime<Utc>,
    pub candidate_level: Option<RiskLevel>,
    pub candidate_streak: u32,
}

impl StabilizerState {
    /// Initial state for a newly monitored patient: Low with zero streak.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            current_level: RiskLevel::Low,
            level_entered_at: now,
            candidate_level: None,
            candidate_streak: 0,
        }
    }
}

/// What one tick of stabilization produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// The authoritative level after this tick.
    pub stabilized_level: RiskLevel,
    /// Whether this tick committed a level change.
    pub changed: bool,
}

// ============================================================================
// STABILIZER
// ============================================================================

pub struct TransitionStabilizer {
    config: HysteresisConfig,
    state: StabilizerState,
}

impl TransitionStabilizer {
    pub fn new(config: HysteresisConfig, now: DateTime<Utc>) -> Self {
        Self {
            config,
            state: StabilizerState::new(now),
        }
    }

    pub fn state(&self) -> &StabilizerState {
        &self.state
    }

    /// Ticks the candidate must persist before committing `from -> to`.
    fn required_streak(&self, from: RiskLevel, to: RiskLevel) -> u32 {
        if to == RiskLevel::High {
            self.config.high_escalation_ticks
        } else if from.escalates_to(to) {
            self.config.escalation_ticks
        } else {
            self.config.deescalation_ticks
        }
    }

    /// Feed one raw level; returns the authoritative level.
    ///
    /// Unknown raw levels leave the current level untouched and reset any
    /// candidate streak - a data gap must never commit a transition.
    pub fn observe(&mut self, raw: RiskLevel, now: DateTime<Utc>) -> Observation {
        let current = self.state.current_level;

        if raw == RiskLevel::Unknown || raw == current {
            self.state.candidate_level = None;
            self.state.candidate_streak = 0;
            return Observation {
                stabilized_level: current,
                changed: false,
            };
        }

        if self.state.candidate_level == Some(raw) {
            self.state.candidate_streak += 1;
        } else {
            self.state.candidate_level = Some(raw);
            self.state.candidate_streak = 1;
        }

        if self.state.candidate_streak >= self.required_streak(current, raw) {
            log::info!(
                "[Stabilizer] committing level change {} -> {} after {} tick(s)",
                current,
                raw,
                self.state.candidate_streak
            );
            self.state.current_level = raw;
            self.state.level_entered_at = now;
            self.state.candidate_level = None;
            self.state.candidate_streak = 0;
            return Observation {
                stabilized_level: raw,
                changed: true,
            };
        }

        Observation {
            stabilized_level: current,
            changed: false,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
