//! Mixtape Pulse - Listener reaction analytics engine
//!
//! Pulse turns raw per-listener reaction timestamps into comparative
//! statistics, normalized radar profiles, and deterministic rule-based
//! archetypes through a pure pipeline: snapshot validation → latency
//! statistics → windowed thresholds → bucketing / normalization →
//! ordered taxonomy matching → report assembly.
//!
//! ## Modules
//!
//! - **Reflex / Radar**: per-member latency profiles and cohort-normalized
//!   five-axis scores
//! - **Archetypes**: listening-style and influence taxonomies with
//!   deterministic tie-breaks
//! - **Aggregation**: activity timelines, engagement totals, superlatives,
//!   and the taste-gravity graph

pub mod aggregate;
pub mod archetype;
pub mod engine;
pub mod error;
pub mod gravity;
pub mod radar;
pub mod reflex;
pub mod stats;
pub mod store;
pub mod types;
pub mod window;

pub use engine::PulseEngine;
pub use error::AnalyticsError;
pub use store::{GroupSnapshot, InMemorySource, RawSnapshot, SnapshotSource};
pub use types::GroupPulseReport;
pub use window::AnalysisWindow;

/// Engine version embedded in all report payloads
pub const PULSE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "mixtape-pulse";
