//! Activity aggregation
//!
//! Folds raw tracker records into one `DailyAggregate` per user per UTC calendar
//! day. Days without records are not synthesized: absence means "no signal",
//! not "zero hours".

use crate::types::{ActivityRecord, DailyAggregate, UserId};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Hours in a calendar day; upper bound for the reported time of one aggregate
pub const HOURS_PER_DAY: f64 = 24.0;

/// Groups activity records into per-user daily aggregates
#[derive(Debug, Clone, Copy)]
pub struct ActivityAggregator {
    since: DateTime<Utc>,
}

impl ActivityAggregator {
    /// Aggregator over records captured at or after `since`
    pub fn new(since: DateTime<Utc>) -> Self {
        Self { since }
    }

    /// Aggregator over the trailing `lookback_days` ending at `now`
    pub fn for_window(now: DateTime<Utc>, lookback_days: u32) -> Self {
        Self::new(now - Duration::days(i64::from(lookback_days)))
    }

    /// Start of the lookback window
    pub fn since(&self) -> DateTime<Utc> {
        self.since
    }

    /// Whether a record falls inside the lookback window
    pub fn in_window(&self, record: &ActivityRecord) -> bool {
        record.timestamp >= self.since
    }

    /// Aggregate records into chronological daily summaries per user
    pub fn aggregate(&self, records: &[ActivityRecord]) -> BTreeMap<UserId, Vec<DailyAggregate>> {
        let mut by_user_day: BTreeMap<(UserId, NaiveDate), DayAccumulator> = BTreeMap::new();

        for record in records.iter().filter(|r| self.in_window(r)) {
            let key = (record.user_id.clone(), record.timestamp.date_naive());
            by_user_day
                .entry(key)
                .or_insert_with(|| DayAccumulator::new(record.timestamp))
                .add_record(record);
        }

        // BTreeMap iteration is ordered by (user, date), so each user's days
        // come out chronologically.
        let mut aggregates: BTreeMap<UserId, Vec<DailyAggregate>> = BTreeMap::new();
        for ((user_id, date), accumulator) in by_user_day {
            let daily = accumulator.finish(&user_id, date);
            aggregates.entry(user_id).or_default().push(daily);
        }

        aggregates
    }
}

/// Running totals for one user-day
struct DayAccumulator {
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    productive_hours: f64,
    unproductive_hours: f64,
    idle_hours: f64,
    goals_completed: u32,
    record_count: u32,
}

impl DayAccumulator {
    fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            first_seen: timestamp,
            last_seen: timestamp,
            productive_hours: 0.0,
            unproductive_hours: 0.0,
            idle_hours: 0.0,
            goals_completed: 0,
            record_count: 0,
        }
    }

    fn add_record(&mut self, record: &ActivityRecord) {
        self.first_seen = self.first_seen.min(record.timestamp);
        self.last_seen = self.last_seen.max(record.timestamp);
        self.productive_hours += sanitize_hours(record.productive_hours);
        self.unproductive_hours += sanitize_hours(record.unproductive_hours);
        self.idle_hours += sanitize_hours(record.idle_time);
        self.goals_completed = self.goals_completed.saturating_add(record.goals_completed);
        self.record_count += 1;
    }

    fn finish(self, user_id: &str, date: NaiveDate) -> DailyAggregate {
        let span = self.last_seen - self.first_seen;
        let work_span_hours = span.num_milliseconds() as f64 / 3_600_000.0;

        let reported = self.productive_hours + self.unproductive_hours + self.idle_hours;
        if reported > HOURS_PER_DAY {
            tracing::warn!(user_id, %date, reported, "Reported hours exceed a day; scaled down");
        }
        let (productive_hours, unproductive_hours, idle_hours) = clamp_to_day(
            self.productive_hours,
            self.unproductive_hours,
            self.idle_hours,
        );

        DailyAggregate {
            user_id: user_id.to_string(),
            date,
            work_span_hours,
            productive_hours,
            unproductive_hours,
            idle_hours,
            goals_completed: self.goals_completed,
            record_count: self.record_count,
        }
    }
}

/// Negative and non-finite hour values carry no signal
pub(crate) fn sanitize_hours(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Scale the three buckets proportionally so their sum does not exceed a day
fn clamp_to_day(productive: f64, unproductive: f64, idle: f64) -> (f64, f64, f64) {
    let total = productive + unproductive + idle;
    if total <= HOURS_PER_DAY {
        return (productive, unproductive, idle);
    }
    let scale = HOURS_PER_DAY / total;
    let productive = productive * scale;
    let unproductive = unproductive * scale;
    let idle = (HOURS_PER_DAY - productive - unproductive).clamp(0.0, idle * scale);
    (productive, unproductive, idle)
}
