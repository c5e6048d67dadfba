//! Vitals Module - Sample types and per-patient timelines
//!
//! - `types` - Vital channels and immutable samples
//! - `buffer` - Rolling, retention-bounded per-channel timelines

pub mod buffer;
pub mod types;

pub use buffer::{PatientTimeline, TimelineSnapshot};
pub use types::{VitalChannel, VitalSample};
