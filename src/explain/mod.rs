//! Explain Module - Feature attribution for risk scores
//!
//! - `types` - Ranked contribution entries
//! - `engine` - Weight decomposition and human-readable reasons

pub mod engine;
pub mod types;

pub use engine::ExplanationEngine;
pub use types::Contribution;
