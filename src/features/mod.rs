//! Features Module - Windowed statistics per vital channel
//!
//! - `vector` - The per-tick feature vector keyed by (channel, statistic)
//! - `extractor` - Rolling mean / slope / variance / out-of-range duration

pub mod extractor;
pub mod vector;

pub use extractor::FeatureExtractor;
pub use vector::{ChannelFeatures, FeatureId, FeatureVector, Statistic};
