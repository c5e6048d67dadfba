//! Error Types
//!
//! Taxonomy: bad input is rejected at ingestion and leaves the pipeline
//! untouched; insufficient data is recoverable and surfaces as an explicit
//! Unknown assessment; alert-delivery problems are logged and never
//! propagated. No error path may degrade a High signal to a lower one.

use thiserror::Error;

use crate::vitals::VitalChannel;

/// Errors rejecting a sample at ingestion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    /// Value is outside the channel's physical plausibility range.
    #[error("implausible {channel} value {value} (plausible range {min}..={max})")]
    InvalidValue {
        channel: VitalChannel,
        value: f32,
        min: f32,
        max: f32,
    },

    /// Timestamp precedes the last recorded sample for the channel beyond
    /// the clock-skew tolerance.
    #[error("out-of-order {channel} sample: {behind_secs}s behind the latest reading")]
    OutOfOrderSample {
        channel: VitalChannel,
        behind_secs: i64,
    },
}

/// Errors from the scoring model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    /// Every channel was marked insufficient; the caller must treat this
    /// as "unknown", never as "low".
    #[error("no channel has sufficient data to score")]
    NoUsableFeatures,
}

/// Errors from a full evaluation tick. Insufficient data is not one of
/// them: an all-insufficient tick yields an explicit Unknown assessment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// No samples have ever been ingested for this patient.
    #[error("unknown patient: {0}")]
    UnknownPatient(String),
}
