//! Analytics pipeline orchestration
//!
//! This module provides the public API for the two manager-facing analyses.
//! It orchestrates the full pipeline from scope resolution to the report:
//! scope → batched activity fetch → daily aggregation → trend/risk or
//! distraction profiling.

use crate::aggregator::ActivityAggregator;
use crate::config::AnalyticsConfig;
use crate::distraction::DistractionProfiler;
use crate::encoder::ReportEncoder;
use crate::error::AnalyticsError;
use crate::risk::{rank_assessments, RiskScorer};
use crate::scope::{Scope, ScopeResolver};
use crate::store::{ActivityStore, InMemoryActivityStore, InMemoryMembership, MembershipResolver};
use crate::types::{
    ActivityRecord, BurnoutAssessment, BurnoutRiskReport, DistractionReport, TeamId, UserId,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Compute a burnout risk report from JSON inputs (stateless, one-shot).
///
/// # Arguments
/// * `memberships_json` - JSON array of memberships
/// * `activities_json` - JSON array of activity records
/// * `manager_id` - Requesting manager
/// * `team_id` - Optional team to narrow the scope to
///
/// # Returns
/// Report JSON wrapped in a producer envelope
pub fn burnout_risk_json(
    memberships_json: &str,
    activities_json: &str,
    manager_id: &str,
    team_id: Option<&str>,
) -> Result<String, AnalyticsError> {
    let engine = engine_from_json(memberships_json, activities_json)?;
    let report = engine.get_burnout_risk(manager_id, team_id)?;
    ReportEncoder::new().encode_to_json(&report, false)
}

/// Compute a distraction profile from JSON inputs (stateless, one-shot).
pub fn distraction_profile_json(
    memberships_json: &str,
    activities_json: &str,
    manager_id: &str,
    team_id: Option<&str>,
) -> Result<String, AnalyticsError> {
    let engine = engine_from_json(memberships_json, activities_json)?;
    let report = engine.get_distraction_profile(manager_id, team_id)?;
    ReportEncoder::new().encode_to_json(&report, false)
}

fn engine_from_json(
    memberships_json: &str,
    activities_json: &str,
) -> Result<AnalyticsEngine<InMemoryMembership, InMemoryActivityStore>, AnalyticsError> {
    let membership = InMemoryMembership::from_json(memberships_json)?;
    let store = InMemoryActivityStore::from_json(activities_json)?;
    Ok(AnalyticsEngine::new(membership, store))
}

/// Activity visible to one request, fetched in a single batch
struct ScopedActivity {
    scope: Scope,
    /// Enrolled members per scoped team
    members: BTreeMap<TeamId, BTreeSet<UserId>>,
    /// In-window records of scoped teams, restricted to each team's members
    records: Vec<ActivityRecord>,
    aggregator: ActivityAggregator,
}

/// Analytics engine over explicit membership and activity collaborators.
///
/// Holds no state between calls beyond its configuration.
pub struct AnalyticsEngine<M, S> {
    membership: M,
    store: S,
    config: AnalyticsConfig,
}

impl<M: MembershipResolver, S: ActivityStore> AnalyticsEngine<M, S> {
    /// Create an engine with the default policy configuration
    pub fn new(membership: M, store: S) -> Self {
        Self {
            membership,
            store,
            config: AnalyticsConfig::default(),
        }
    }

    /// Create an engine with a custom configuration
    pub fn with_config(
        membership: M,
        store: S,
        config: AnalyticsConfig,
    ) -> Result<Self, AnalyticsError> {
        config.validate()?;
        Ok(Self {
            membership,
            store,
            config,
        })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Burnout risk for every member of the manager's scope, as of now
    pub fn get_burnout_risk(
        &self,
        manager_id: &str,
        team_id: Option<&str>,
    ) -> Result<BurnoutRiskReport, AnalyticsError> {
        self.get_burnout_risk_at(manager_id, team_id, Utc::now())
    }

    /// Burnout risk as of an explicit analysis time
    pub fn get_burnout_risk_at(
        &self,
        manager_id: &str,
        team_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<BurnoutRiskReport, AnalyticsError> {
        let activity = self.load_scope(manager_id, team_id, now)?;
        let scorer = RiskScorer::new(&self.config);

        let mut assessments: Vec<BurnoutAssessment> = Vec::new();
        for (team, members) in &activity.members {
            let team_records: Vec<ActivityRecord> = activity
                .records
                .iter()
                .filter(|r| &r.team_id == team)
                .cloned()
                .collect();
            let daily = activity.aggregator.aggregate(&team_records);

            for user_id in members {
                let days = daily.get(user_id).map(Vec::as_slice).unwrap_or(&[]);
                assessments.push(scorer.assess(user_id, team, days, now));
            }
        }

        let team_summaries = activity
            .members
            .iter()
            .map(|(team, members)| scorer.rollup(team, members.len(), &assessments))
            .collect();
        rank_assessments(&mut assessments);

        tracing::info!(
            manager_id,
            teams = activity.members.len(),
            assessments = assessments.len(),
            low_confidence = assessments.iter().filter(|a| a.low_confidence).count(),
            "Burnout risk analysis complete"
        );

        Ok(BurnoutRiskReport {
            analysis_date: now,
            team_id: activity.scope.requested_team,
            lookback_days: self.config.lookback_days,
            burnout_analysis: assessments,
            team_summaries,
        })
    }

    /// Distraction profile of the manager's scope, as of now
    pub fn get_distraction_profile(
        &self,
        manager_id: &str,
        team_id: Option<&str>,
    ) -> Result<DistractionReport, AnalyticsError> {
        self.get_distraction_profile_at(manager_id, team_id, Utc::now())
    }

    /// Distraction profile as of an explicit analysis time
    pub fn get_distraction_profile_at(
        &self,
        manager_id: &str,
        team_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DistractionReport, AnalyticsError> {
        let activity = self.load_scope(manager_id, team_id, now)?;
        let daily = activity.aggregator.aggregate(&activity.records);

        let profile = DistractionProfiler::new(&self.config).profile(
            activity.scope.requested_team.as_deref(),
            &daily,
            &activity.records,
            now,
        );

        tracing::info!(
            manager_id,
            team_size = profile.team_size,
            categories = profile.categories.len(),
            "Distraction profile complete"
        );

        Ok(DistractionReport::from_profile(profile, self.config.lookback_days))
    }

    fn load_scope(
        &self,
        manager_id: &str,
        team_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ScopedActivity, AnalyticsError> {
        let scope = ScopeResolver::new(&self.membership).resolve(manager_id, team_id)?;
        let members = self.membership.list_team_members(&scope.team_ids)?;

        let user_ids: BTreeSet<UserId> = members.values().flatten().cloned().collect();
        let aggregator = ActivityAggregator::for_window(now, self.config.lookback_days);

        let records = if user_ids.is_empty() {
            Vec::new()
        } else {
            self.store.fetch_activities(&user_ids, aggregator.since())?
        };
        let fetched = records.len();

        let records: Vec<ActivityRecord> = records
            .into_iter()
            .filter(|r| aggregator.in_window(r))
            .filter(|r| {
                members
                    .get(&r.team_id)
                    .is_some_and(|team| team.contains(&r.user_id))
            })
            .collect();

        tracing::debug!(
            manager_id,
            teams = scope.team_ids.len(),
            users = user_ids.len(),
            fetched,
            in_scope = records.len(),
            since = %aggregator.since(),
            "Loaded scoped activity"
        );

        Ok(ScopedActivity {
            scope,
            members,
            records,
            aggregator,
        })
    }
}
