//! Alerts Module - Clinician-facing escalation alerts
//!
//! Watches stabilized risk-state transitions and decides when an alert
//! should fire, with cooldown suppression against alert fatigue.

pub mod coordinator;

pub use coordinator::{AlertCoordinator, AlertRecord};
