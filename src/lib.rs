//! MedGuard Core - Clinical Deterioration Risk Engine
//!
//! Ingests streaming vital-sign measurements per patient and produces a
//! continuously updated deterioration-risk classification (Low / Early /
//! High) with a ranked explanation of which signals drove the current
//! level.
//!
//! ## Architecture
//! - `vitals/` - Sample validation and per-patient rolling timelines
//! - `features/` - Windowed statistics (mean, slope, variance, out-of-range)
//! - `risk/` - Scoring model, thresholds, hysteresis stabilizer
//! - `explain/` - Feature attribution and human-readable reasons
//! - `alerts/` - Escalation alerts with cooldown suppression
//! - `engine` - Per-patient pipeline wiring the stages together
//!
//! The dashboard, ingestion feed, and persistence are external
//! collaborators: the crate exposes `ingest`, `evaluate`, `subscribe` and
//! `get_alerts` and performs no I/O of its own.

pub mod alerts;
pub mod config;
pub mod engine;
pub mod error;
pub mod explain;
pub mod features;
pub mod risk;
pub mod vitals;

pub use config::MonitorConfig;
pub use engine::MonitorEngine;
pub use error::{EvaluationError, IngestError, ScoreError};
pub use risk::{RiskAssessment, RiskLevel};
pub use vitals::{VitalChannel, VitalSample};
