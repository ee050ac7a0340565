//! Core types for the Pulse Analytics pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! analysis: raw activity records, daily aggregates, trend metrics, risk factors,
//! and the report payloads handed to the HTTP layer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a tracked user
pub type UserId = String;

/// Identifier of a team
pub type TeamId = String;

/// Role a user holds within a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Manager,
    Employee,
}

/// A single row of the membership relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: UserId,
    pub team_id: TeamId,
    pub role: Role,
}

/// Immutable telemetry fact captured by the desktop tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// User the record belongs to
    pub user_id: UserId,
    /// Team the record was captured under
    pub team_id: TeamId,
    /// Capture time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Foreground application at capture time
    #[serde(default)]
    pub active_app: Option<String>,
    /// Foreground window title at capture time
    #[serde(default)]
    pub window_title: Option<String>,
    /// Self-reported productive time (hours)
    #[serde(default)]
    pub productive_hours: f64,
    /// Self-reported unproductive time (hours)
    #[serde(default)]
    pub unproductive_hours: f64,
    /// Idle time (hours)
    #[serde(default)]
    pub idle_time: f64,
    /// Goals completed since the previous record
    #[serde(default)]
    pub goals_completed: u32,
}

/// Per-user, per-calendar-day summary of activity records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub user_id: UserId,
    /// UTC calendar date the records fall on
    pub date: NaiveDate,
    /// Wall-clock span between the earliest and latest record of the day (hours)
    pub work_span_hours: f64,
    pub productive_hours: f64,
    pub unproductive_hours: f64,
    pub idle_hours: f64,
    pub goals_completed: u32,
    /// Number of records folded into this aggregate
    pub record_count: u32,
}

impl DailyAggregate {
    /// Total reported time (productive + unproductive + idle)
    pub fn reported_hours(&self) -> f64 {
        self.productive_hours + self.unproductive_hours + self.idle_hours
    }
}

/// Severity of a single detected pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Pattern detected by the trend analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactorType {
    LongHours,
    WeekendWork,
    EscalatingTrend,
    HighIdleRatio,
    LowGoalCompletion,
}

/// One fired burnout rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    #[serde(rename = "type")]
    pub factor_type: RiskFactorType,
    pub severity: Severity,
    /// Human-readable explanation with the observed values
    pub description: String,
    /// Contribution to the composite risk score
    pub impact_points: u32,
}

/// Composite burnout risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Rolling statistics computed from one user's daily aggregates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendMetrics {
    /// Days with at least one record
    pub active_days: u32,
    /// Mean work span (hours)
    pub avg_work_span: f64,
    /// Longest work span (hours)
    pub max_work_span: f64,
    /// Population standard deviation of the work span (hours)
    pub work_span_stddev: f64,
    /// Least-squares slope of the work span over the trailing slope window (hours/day)
    pub work_span_slope: Option<f64>,
    /// Idle share of reported time over the window (0-1)
    pub idle_ratio: Option<f64>,
    /// Saturdays/Sundays with a work span above the weekend threshold
    pub weekend_days: u32,
    /// Goals completed over the window
    pub goals_completed: u32,
}

/// Burnout assessment for one user within one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnoutAssessment {
    pub user_id: UserId,
    pub team_id: TeamId,
    /// Composite score in [0, 100]
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub factors: Vec<RiskFactor>,
    pub trend_summary: String,
    pub analysis_date: DateTime<Utc>,
    /// Set when too few active days were observed to trust the score
    pub low_confidence: bool,
    pub metrics: TrendMetrics,
    pub recommendations: Vec<String>,
}

/// Per-team rollup of burnout assessments (no averaging)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRiskSummary {
    pub team_id: TeamId,
    /// Members enrolled in the team
    pub member_count: u32,
    /// Members with an assessment backed by enough data
    pub assessed_count: u32,
    pub low_confidence_count: u32,
    pub high_risk_count: u32,
    /// Highest individual risk level in the team
    pub peak_risk_level: RiskLevel,
    pub recommendations: Vec<String>,
}

/// Unproductive time attributed to one application category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistractionCategory {
    pub category_name: String,
    pub total_unproductive_hours: f64,
    /// Share of the scope's total unproductive time (0-100)
    pub percentage: f64,
    /// Case-folded application name to hours
    pub app_breakdown: BTreeMap<String, f64>,
}

/// Ranked breakdown of a scope's unproductive time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistractionProfile {
    pub team_id: Option<TeamId>,
    /// Distinct users with at least one record in the window
    pub team_size: u32,
    /// Ordered by total unproductive hours, descending
    pub categories: Vec<DistractionCategory>,
    pub insights: Vec<String>,
    pub total_unproductive_hours: f64,
    pub analysis_date: DateTime<Utc>,
}

/// Response of the burnout risk operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnoutRiskReport {
    pub analysis_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    pub lookback_days: u32,
    /// Ordered by risk score descending, then user id
    pub burnout_analysis: Vec<BurnoutAssessment>,
    pub team_summaries: Vec<TeamRiskSummary>,
}

/// Response of the distraction profile operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistractionReport {
    pub analysis_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    pub team_size: u32,
    pub distraction_profile: Vec<DistractionCategory>,
    pub insights: Vec<String>,
    pub total_unproductive_hours: f64,
    pub period_days: u32,
}

impl DistractionReport {
    pub fn from_profile(profile: DistractionProfile, period_days: u32) -> Self {
        Self {
            analysis_date: profile.analysis_date,
            team_id: profile.team_id,
            team_size: profile.team_size,
            distraction_profile: profile.categories,
            insights: profile.insights,
            total_unproductive_hours: profile.total_unproductive_hours,
            period_days,
        }
    }
}
