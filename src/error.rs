//! Error types for Pulse Analytics

use crate::store::FetchError;
use thiserror::Error;

/// Errors that can occur while producing an analysis
///
/// Too little telemetry is not an error: it surfaces as the `low_confidence`
/// marker on the assessment instead.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("User {0} does not manage any team")]
    NotAuthorized(String),

    #[error("Team {0} is not accessible to this manager")]
    TeamNotAccessible(String),

    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(#[from] FetchError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse input: {0}")]
    ParseError(String),
}

impl AnalyticsError {
    /// Whether the caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, AnalyticsError::UpstreamFetch(_))
    }
}
