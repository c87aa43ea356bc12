//! Error types for Mixtape Pulse

use thiserror::Error;

/// Errors surfaced to the boundary layer.
///
/// These are raised before any aggregation runs; once a computation has
/// started, numeric edge cases degrade to neutral values instead of
/// erroring. Insufficient data is a valid (zeroed) response, not an error.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Unsupported analysis window: {0}")]
    InvalidWindow(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse snapshot: {0}")]
    ParseError(String),
}
