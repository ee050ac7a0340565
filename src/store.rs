//! External collaborators consumed by the analytics core
//!
//! The membership relation and the raw activity store live outside this crate.
//! They are passed into the engine explicitly through these traits; the
//! in-memory implementations back the CLI and the tests.

use crate::error::AnalyticsError;
use crate::types::{ActivityRecord, Membership, Role, TeamId, UserId};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Failure reported by an external collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{collaborator}: {message}")]
pub struct FetchError {
    pub collaborator: String,
    pub message: String,
}

impl FetchError {
    pub fn activity_store(message: impl Into<String>) -> Self {
        Self {
            collaborator: "activity store".to_string(),
            message: message.into(),
        }
    }

    pub fn membership(message: impl Into<String>) -> Self {
        Self {
            collaborator: "membership resolver".to_string(),
            message: message.into(),
        }
    }
}

/// Read access to the team membership relation
pub trait MembershipResolver {
    /// Teams in which `user_id` holds the manager role
    fn list_managed_team_ids(&self, user_id: &str) -> Result<BTreeSet<TeamId>, FetchError>;

    /// Members of each of the given teams, any role
    fn list_team_members(
        &self,
        team_ids: &BTreeSet<TeamId>,
    ) -> Result<BTreeMap<TeamId, BTreeSet<UserId>>, FetchError>;
}

/// Read access to raw tracker telemetry
pub trait ActivityStore {
    /// All records for `user_ids` captured at or after `since`, in one batch
    fn fetch_activities(
        &self,
        user_ids: &BTreeSet<UserId>,
        since: DateTime<Utc>,
    ) -> Result<Vec<ActivityRecord>, FetchError>;
}

impl<T: MembershipResolver + ?Sized> MembershipResolver for &T {
    fn list_managed_team_ids(&self, user_id: &str) -> Result<BTreeSet<TeamId>, FetchError> {
        (**self).list_managed_team_ids(user_id)
    }

    fn list_team_members(
        &self,
        team_ids: &BTreeSet<TeamId>,
    ) -> Result<BTreeMap<TeamId, BTreeSet<UserId>>, FetchError> {
        (**self).list_team_members(team_ids)
    }
}

impl<T: ActivityStore + ?Sized> ActivityStore for &T {
    fn fetch_activities(
        &self,
        user_ids: &BTreeSet<UserId>,
        since: DateTime<Utc>,
    ) -> Result<Vec<ActivityRecord>, FetchError> {
        (**self).fetch_activities(user_ids, since)
    }
}

/// Membership relation held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryMembership {
    memberships: Vec<Membership>,
}

impl InMemoryMembership {
    pub fn new(memberships: Vec<Membership>) -> Self {
        Self { memberships }
    }

    /// Parse a JSON array of memberships
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn add(&mut self, user_id: &str, team_id: &str, role: Role) {
        self.memberships.push(Membership {
            user_id: user_id.to_string(),
            team_id: team_id.to_string(),
            role,
        });
    }

    pub fn len(&self) -> usize {
        self.memberships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memberships.is_empty()
    }
}

impl MembershipResolver for InMemoryMembership {
    fn list_managed_team_ids(&self, user_id: &str) -> Result<BTreeSet<TeamId>, FetchError> {
        Ok(self
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id && m.role == Role::Manager)
            .map(|m| m.team_id.clone())
            .collect())
    }

    fn list_team_members(
        &self,
        team_ids: &BTreeSet<TeamId>,
    ) -> Result<BTreeMap<TeamId, BTreeSet<UserId>>, FetchError> {
        let mut members: BTreeMap<TeamId, BTreeSet<UserId>> = team_ids
            .iter()
            .map(|team_id| (team_id.clone(), BTreeSet::new()))
            .collect();

        for membership in &self.memberships {
            if let Some(team) = members.get_mut(&membership.team_id) {
                team.insert(membership.user_id.clone());
            }
        }

        Ok(members)
    }
}

/// Activity records held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryActivityStore {
    records: Vec<ActivityRecord>,
}

impl InMemoryActivityStore {
    pub fn new(records: Vec<ActivityRecord>) -> Self {
        Self { records }
    }

    /// Parse newline-delimited JSON, one record per line; blank lines are skipped
    pub fn from_ndjson(ndjson: &str) -> Result<Self, AnalyticsError> {
        let records = ndjson
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str::<ActivityRecord>(line.trim())
                    .map_err(|e| AnalyticsError::ParseError(format!("line {}: {}", n + 1, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(records))
    }

    /// Parse a JSON array of records
    pub fn from_json(json: &str) -> Result<Self, AnalyticsError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }
}

impl ActivityStore for InMemoryActivityStore {
    fn fetch_activities(
        &self,
        user_ids: &BTreeSet<UserId>,
        since: DateTime<Utc>,
    ) -> Result<Vec<ActivityRecord>, FetchError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.timestamp >= since && user_ids.contains(&r.user_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(user_id: &str, day: u32) -> ActivityRecord {
        ActivityRecord {
            user_id: user_id.to_string(),
            team_id: "t1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap(),
            active_app: None,
            window_title: None,
            productive_hours: 1.0,
            unproductive_hours: 0.0,
            idle_time: 0.0,
            goals_completed: 0,
        }
    }

    #[test]
    fn test_managed_teams_come_from_manager_role_only() {
        let mut membership = InMemoryMembership::default();
        membership.add("boss", "t1", Role::Manager);
        membership.add("boss", "t2", Role::Employee);
        membership.add("boss", "t3", Role::Owner);
        membership.add("boss", "t1", Role::Manager);

        let teams = membership.list_managed_team_ids("boss").unwrap();
        assert_eq!(teams, BTreeSet::from(["t1".to_string()]));
    }

    #[test]
    fn test_team_members_include_every_role() {
        let mut membership = InMemoryMembership::default();
        membership.add("boss", "t1", Role::Manager);
        membership.add("alice", "t1", Role::Employee);
        membership.add("bob", "t2", Role::Employee);

        let teams = BTreeSet::from(["t1".to_string()]);
        let members = membership.list_team_members(&teams).unwrap();

        assert_eq!(members.len(), 1);
        assert_eq!(
            members["t1"],
            BTreeSet::from(["alice".to_string(), "boss".to_string()])
        );
    }

    #[test]
    fn test_membership_from_json() {
        let json = r#"[
            { "user_id": "boss", "team_id": "t1", "role": "manager" },
            { "user_id": "alice", "team_id": "t1", "role": "employee" }
        ]"#;
        let membership = InMemoryMembership::from_json(json).unwrap();

        assert_eq!(membership.len(), 2);
        assert_eq!(membership.list_managed_team_ids("boss").unwrap().len(), 1);
    }

    #[test]
    fn test_activities_from_ndjson() {
        let ndjson = r#"{"user_id":"alice","team_id":"t1","timestamp":"2024-03-04T09:00:00Z","active_app":"chrome"}

{"user_id":"bob","team_id":"t1","timestamp":"2024-03-04T10:00:00Z","unproductive_hours":1.5}
"#;
        let store = InMemoryActivityStore::from_ndjson(ndjson).unwrap();

        assert_eq!(store.records().len(), 2);
        assert_eq!(store.records()[0].active_app.as_deref(), Some("chrome"));
        assert_eq!(store.records()[1].unproductive_hours, 1.5);
    }

    #[test]
    fn test_ndjson_error_names_the_line() {
        let ndjson = "{\"user_id\":\"alice\",\"team_id\":\"t1\",\"timestamp\":\"2024-03-04T09:00:00Z\"}\nnot json\n";
        let err = InMemoryActivityStore::from_ndjson(ndjson).unwrap_err();

        assert!(matches!(err, AnalyticsError::ParseError(ref msg) if msg.starts_with("line 2:")));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_activities_from_json_array() {
        let json = r#"[{"user_id":"alice","team_id":"t1","timestamp":"2024-03-04T09:00:00Z"}]"#;
        let store = InMemoryActivityStore::from_json(json).unwrap();
        assert_eq!(store.records()[0].user_id, "alice");

        assert!(matches!(
            InMemoryActivityStore::from_json("{}"),
            Err(AnalyticsError::JsonError(_))
        ));
    }

    #[test]
    fn test_fetch_filters_by_user_and_since() {
        let store = InMemoryActivityStore::new(vec![
            record("alice", 1),
            record("alice", 10),
            record("bob", 10),
        ]);

        let users = BTreeSet::from(["alice".to_string()]);
        let since = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let fetched = store.fetch_activities(&users, since).unwrap();

        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].user_id, "alice");
        assert_eq!(fetched[0].timestamp.format("%d").to_string(), "10");
    }
}
