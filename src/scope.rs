//! Manager scope resolution
//!
//! The membership relation is the only source of truth for which teams a
//! manager may query: a team is in scope exactly when the caller holds the
//! `manager` role in it.

use crate::error::AnalyticsError;
use crate::store::MembershipResolver;
use crate::types::TeamId;
use std::collections::BTreeSet;

/// Teams a single request is allowed to analyze
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Team explicitly requested by the caller, if any
    pub requested_team: Option<TeamId>,
    /// Teams to analyze (the requested team alone, or every managed team)
    pub team_ids: BTreeSet<TeamId>,
}

/// Resolves the set of teams visible to a manager
pub struct ScopeResolver<'a, M: MembershipResolver + ?Sized> {
    membership: &'a M,
}

impl<'a, M: MembershipResolver + ?Sized> ScopeResolver<'a, M> {
    pub fn new(membership: &'a M) -> Self {
        Self { membership }
    }

    /// Resolve the scope for `manager_id`, optionally narrowed to one team
    pub fn resolve(
        &self,
        manager_id: &str,
        requested_team: Option<&str>,
    ) -> Result<Scope, AnalyticsError> {
        let managed = self.membership.list_managed_team_ids(manager_id)?;

        if managed.is_empty() {
            tracing::warn!(manager_id, "Scope denied: no managed teams");
            return Err(AnalyticsError::NotAuthorized(manager_id.to_string()));
        }

        match requested_team {
            Some(team_id) if managed.contains(team_id) => Ok(Scope {
                requested_team: Some(team_id.to_string()),
                team_ids: BTreeSet::from([team_id.to_string()]),
            }),
            Some(team_id) => {
                tracing::warn!(manager_id, team_id, "Scope denied: team not managed");
                Err(AnalyticsError::TeamNotAccessible(team_id.to_string()))
            }
            None => {
                tracing::debug!(manager_id, teams = managed.len(), "Resolved full manager scope");
                Ok(Scope {
                    requested_team: None,
                    team_ids: managed,
                })
            }
        }
    }
}
