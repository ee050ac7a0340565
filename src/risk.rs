//! Burnout risk scoring
//!
//! Composes the fired trend rules into a composite score and level for each
//! user, and rolls individual assessments up per team. Team rollups report
//! counts and the peak level; scores are never averaged.

use crate::config::{AnalyticsConfig, RiskLevelThresholds};
use crate::trend::TrendAnalyzer;
use crate::types::{
    BurnoutAssessment, DailyAggregate, RiskFactor, RiskFactorType, RiskLevel, TeamRiskSummary,
};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Upper bound of the composite risk score
pub const MAX_RISK_SCORE: u32 = 100;

/// Scores burnout risk from daily aggregates
pub struct RiskScorer<'a> {
    config: &'a AnalyticsConfig,
}

impl<'a> RiskScorer<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Produce the assessment for one user within one team
    ///
    /// Identical inputs always produce identical assessments.
    pub fn assess(
        &self,
        user_id: &str,
        team_id: &str,
        days: &[DailyAggregate],
        analysis_date: DateTime<Utc>,
    ) -> BurnoutAssessment {
        let analysis = TrendAnalyzer::new(self.config).analyze(days);
        let risk_score = composite_score(&analysis.factors);
        let risk_level = classify(risk_score, &self.config.levels);
        let trend_summary = analysis.summary();
        let recommendations = member_recommendations(&analysis.factors, analysis.low_confidence);

        BurnoutAssessment {
            user_id: user_id.to_string(),
            team_id: team_id.to_string(),
            risk_score,
            risk_level,
            factors: analysis.factors,
            trend_summary,
            analysis_date,
            low_confidence: analysis.low_confidence,
            metrics: analysis.metrics,
            recommendations,
        }
    }

    /// Summarize a team's assessments without averaging them
    pub fn rollup(
        &self,
        team_id: &str,
        member_count: usize,
        assessments: &[BurnoutAssessment],
    ) -> TeamRiskSummary {
        let team: Vec<&BurnoutAssessment> =
            assessments.iter().filter(|a| a.team_id == team_id).collect();

        let low_confidence_count = team.iter().filter(|a| a.low_confidence).count();
        let assessed_count = team.len() - low_confidence_count;
        let high_risk_count = team
            .iter()
            .filter(|a| a.risk_level == RiskLevel::High)
            .count();
        let elevated_count = team
            .iter()
            .filter(|a| !a.low_confidence && a.risk_level >= RiskLevel::Medium)
            .count();
        let peak_risk_level = team
            .iter()
            .map(|a| a.risk_level)
            .max()
            .unwrap_or(RiskLevel::Low);

        let mut recommendations = Vec::new();
        if peak_risk_level == RiskLevel::High {
            recommendations.push(
                "Consider mandatory breaks and work-life balance policies for the team".to_string(),
            );
        }
        if high_risk_count > 0 {
            recommendations.push(format!(
                "Schedule one-on-one meetings with the {} high-risk team member(s)",
                high_risk_count
            ));
        }
        if assessed_count > 0 && elevated_count * 2 >= assessed_count {
            recommendations.push("Review workload distribution across the team".to_string());
        }
        if low_confidence_count > 0 {
            recommendations.push(format!(
                "{} member(s) have too little tracked activity for a reliable assessment; check tracker coverage",
                low_confidence_count
            ));
        }

        TeamRiskSummary {
            team_id: team_id.to_string(),
            member_count: member_count as u32,
            assessed_count: assessed_count as u32,
            low_confidence_count: low_confidence_count as u32,
            high_risk_count: high_risk_count as u32,
            peak_risk_level,
            recommendations,
        }
    }
}

/// Sum of fired impact points, capped at `MAX_RISK_SCORE`
pub fn composite_score(factors: &[RiskFactor]) -> u32 {
    factors
        .iter()
        .map(|f| f.impact_points)
        .fold(0u32, u32::saturating_add)
        .min(MAX_RISK_SCORE)
}

/// Map a composite score onto a risk level
pub fn classify(score: u32, thresholds: &RiskLevelThresholds) -> RiskLevel {
    if score >= thresholds.high {
        RiskLevel::High
    } else if score >= thresholds.medium {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Order assessments by risk score (descending), then user and team id
pub fn rank_assessments(assessments: &mut [BurnoutAssessment]) {
    assessments.sort_by(compare_assessments);
}

fn compare_assessments(a: &BurnoutAssessment, b: &BurnoutAssessment) -> Ordering {
    b.risk_score
        .cmp(&a.risk_score)
        .then_with(|| a.user_id.cmp(&b.user_id))
        .then_with(|| a.team_id.cmp(&b.team_id))
}

fn member_recommendations(factors: &[RiskFactor], low_confidence: bool) -> Vec<String> {
    if low_confidence {
        return vec![
            "Not enough recent activity to assess burnout risk; revisit once more data is tracked"
                .to_string(),
        ];
    }

    factors
        .iter()
        .map(|factor| recommendation_for(factor.factor_type).to_string())
        .collect()
}

fn recommendation_for(factor_type: RiskFactorType) -> &'static str {
    match factor_type {
        RiskFactorType::LongHours => "Discuss workload and encourage a shorter working day",
        RiskFactorType::WeekendWork => "Protect weekends; check whether deadlines force weekend work",
        RiskFactorType::EscalatingTrend => "Working hours are climbing; review upcoming commitments",
        RiskFactorType::HighIdleRatio => {
            "High idle time can signal disengagement; check in on motivation"
        }
        RiskFactorType::LowGoalCompletion => {
            "Goal completion is dropping; revisit priorities and blockers"
        }
    }
}
