//! Pulse Analytics - Manager-facing workforce analytics
//!
//! Pulse turns desktop-tracker activity records into two reports for a team
//! manager through a deterministic pipeline: scope resolution → batched
//! activity fetch → daily aggregation → trend rules and risk scoring (or
//! distraction profiling) → report encoding.
//!
//! ## Analyses
//!
//! - **Burnout risk**: per-member risk score, level and contributing factors
//!   with team rollups
//! - **Distraction profile**: unproductive time attributed to application
//!   categories with plain-English insights

pub mod aggregator;
pub mod config;
pub mod distraction;
pub mod encoder;
pub mod error;
pub mod pipeline;
pub mod risk;
pub mod scope;
pub mod store;
pub mod trend;
pub mod types;

pub use config::AnalyticsConfig;
pub use encoder::ReportEncoder;
pub use error::AnalyticsError;
pub use pipeline::{burnout_risk_json, distraction_profile_json, AnalyticsEngine};
pub use store::{
    ActivityStore, FetchError, InMemoryActivityStore, InMemoryMembership, MembershipResolver,
};
pub use types::{BurnoutRiskReport, DistractionReport};

/// Pulse version embedded in all report envelopes
pub const PULSE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report envelopes
pub const PRODUCER_NAME: &str = "pulse-analytics";
