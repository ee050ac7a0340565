//! Distraction profiling
//!
//! Attributes unproductive time to application categories across a team and
//! ranks the categories, with short plain-English insights for managers.

use crate::aggregator::sanitize_hours;
use crate::config::{AnalyticsConfig, DistractionConfig, OTHER_CATEGORY};
use crate::types::{
    ActivityRecord, DailyAggregate, DistractionCategory, DistractionProfile, UserId,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// App key used for records without a foreground application
pub const UNKNOWN_APP: &str = "unknown";

const SOCIAL_MEDIA: &str = "Social Media";
const COMMUNICATION: &str = "Communication";

/// Builds team distraction profiles from activity records
pub struct DistractionProfiler<'a> {
    config: &'a DistractionConfig,
}

impl<'a> DistractionProfiler<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self {
            config: &config.distraction,
        }
    }

    /// Category of an application name
    ///
    /// Names are case-folded. An exact keyword match wins; otherwise a keyword
    /// must appear as whole words inside the name ("Google Chrome" matches
    /// `chrome`, "Adobe Photoshop" does not match `shop`). Unmatched names fall
    /// into `Other`.
    pub fn categorize(&self, app: &str) -> &str {
        let key = app_key(Some(app));
        let app_words = words(&key);

        let exact = self
            .config
            .categories
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| k.to_lowercase() == key));
        let matched = exact.or_else(|| {
            self.config
                .categories
                .iter()
                .find(|rule| rule.keywords.iter().any(|k| contains_words(&app_words, k)))
        });

        matched.map(|rule| rule.name.as_str()).unwrap_or(OTHER_CATEGORY)
    }

    /// Profile the unproductive time in `records`
    ///
    /// `daily` carries the same window's per-user aggregates; `team_size` counts
    /// the users observed there, not the team's enrollment.
    pub fn profile(
        &self,
        team_id: Option<&str>,
        daily: &BTreeMap<UserId, Vec<DailyAggregate>>,
        records: &[ActivityRecord],
        analysis_date: DateTime<Utc>,
    ) -> DistractionProfile {
        let mut by_category: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();

        for record in records {
            let hours = sanitize_hours(record.unproductive_hours);
            if hours <= 0.0 {
                continue;
            }
            let app = app_key(record.active_app.as_deref());
            let category = self.categorize(&app).to_string();
            *by_category
                .entry(category)
                .or_default()
                .entry(app)
                .or_insert(0.0) += hours;
        }

        let total: f64 = by_category.values().flat_map(|apps| apps.values()).sum();

        let mut categories: Vec<DistractionCategory> = by_category
            .into_iter()
            .map(|(category_name, apps)| {
                let hours: f64 = apps.values().sum();
                DistractionCategory {
                    category_name,
                    total_unproductive_hours: round_to(hours, 2),
                    percentage: round_to(share_pct(hours, total), 1),
                    app_breakdown: apps.into_iter().map(|(app, h)| (app, round_to(h, 2))).collect(),
                }
            })
            .collect();
        categories.sort_by(|a, b| {
            b.total_unproductive_hours
                .total_cmp(&a.total_unproductive_hours)
                .then_with(|| a.category_name.cmp(&b.category_name))
        });

        let insights = self.insights(&categories);
        let team_size = daily.values().filter(|days| !days.is_empty()).count() as u32;

        DistractionProfile {
            team_id: team_id.map(str::to_string),
            team_size,
            categories,
            insights,
            total_unproductive_hours: round_to(total, 2),
            analysis_date,
        }
    }

    fn insights(&self, categories: &[DistractionCategory]) -> Vec<String> {
        let Some(top) = categories.first() else {
            return vec!["No unproductive time recorded across the team in this period".to_string()];
        };

        let mut insights: Vec<String> = categories
            .iter()
            .take(self.config.max_insights.max(1))
            .map(|c| {
                format!(
                    "{} accounts for {:.1} hours of unproductive time across the team ({:.0}%)",
                    c.category_name, c.total_unproductive_hours, c.percentage
                )
            })
            .collect();

        if top.percentage > self.config.dominant_share_pct {
            insights.push(format!(
                "{} is the biggest team distraction ({:.0}% of unproductive time)",
                top.category_name, top.percentage
            ));
        }
        if share_of(categories, SOCIAL_MEDIA) > self.config.social_media_share_pct {
            insights.push("Social media usage is significantly impacting team productivity".to_string());
        }
        if share_of(categories, COMMUNICATION) > self.config.communication_share_pct {
            insights.push("Internal communication tools may be causing context switching".to_string());
        }

        insights
    }
}

fn app_key(app: Option<&str>) -> String {
    match app.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_lowercase(),
        _ => UNKNOWN_APP.to_string(),
    }
}

fn words(name: &str) -> Vec<String> {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether the keyword's words occur consecutively in `haystack`
fn contains_words(haystack: &[String], keyword: &str) -> bool {
    let needle = words(keyword);
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle.as_slice())
}

fn share_pct(part: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    part / total * 100.0
}

fn share_of(categories: &[DistractionCategory], name: &str) -> f64 {
    categories
        .iter()
        .find(|c| c.category_name == name)
        .map(|c| c.percentage)
        .unwrap_or(0.0)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::ActivityAggregator;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn record(user_id: &str, app: Option<&str>, unproductive: f64) -> ActivityRecord {
        ActivityRecord {
            user_id: user_id.to_string(),
            team_id: "t1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap(),
            active_app: app.map(str::to_string),
            window_title: None,
            productive_hours: 1.0,
            unproductive_hours: unproductive,
            idle_time: 0.0,
            goals_completed: 0,
        }
    }

    fn analysis_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap()
    }

    fn profile_of(records: &[ActivityRecord]) -> DistractionProfile {
        let config = AnalyticsConfig::default();
        let since = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let daily = ActivityAggregator::new(since).aggregate(records);
        DistractionProfiler::new(&config).profile(Some("t1"), &daily, records, analysis_date())
    }

    #[test]
    fn test_categorize_known_apps() {
        let config = AnalyticsConfig::default();
        let profiler = DistractionProfiler::new(&config);

        assert_eq!(profiler.categorize("chrome"), "Web Browsing");
        assert_eq!(profiler.categorize("Google Chrome"), "Web Browsing");
        assert_eq!(profiler.categorize("SLACK"), "Communication");
        assert_eq!(profiler.categorize("Microsoft Teams"), "Communication");
        assert_eq!(profiler.categorize("YouTube"), "Social Media");
        assert_eq!(profiler.categorize("Spotify"), "Entertainment");
        assert_eq!(profiler.categorize("Thunderbird"), "Email");
        assert_eq!(profiler.categorize("  netflix "), "Entertainment");
        assert_eq!(profiler.categorize("vim"), "Other");
    }

    #[test]
    fn test_keywords_match_whole_words_only() {
        let config = AnalyticsConfig::default();
        let profiler = DistractionProfiler::new(&config);

        assert_eq!(profiler.categorize("Adobe Photoshop"), "Other");
        assert_eq!(profiler.categorize("knowledge-base"), "Other");
        assert_eq!(profiler.categorize("Microsoft Edge"), "Web Browsing");
        assert_eq!(profiler.categorize("Mozilla Firefox"), "Web Browsing");
        assert_eq!(profiler.categorize("Apple Mail"), "Email");
        assert_eq!(profiler.categorize("Google News"), "News");
        assert_eq!(profiler.categorize("shop.example.com"), "Shopping");
    }

    #[test]
    fn test_multi_word_keywords_match_as_a_phrase() {
        let mut config = AnalyticsConfig::default();
        config.distraction.categories.insert(
            0,
            crate::config::CategoryRule {
                name: "Video Calls".to_string(),
                keywords: vec!["google meet".to_string()],
            },
        );
        let profiler = DistractionProfiler::new(&config);

        assert_eq!(profiler.categorize("Google Meet - Standup"), "Video Calls");
        assert_eq!(profiler.categorize("Google Chrome"), "Web Browsing");
    }

    #[test]
    fn test_exact_match_wins_over_word_match() {
        let mut config = AnalyticsConfig::default();
        config.distraction.categories.insert(
            0,
            crate::config::CategoryRule {
                name: "Chat".to_string(),
                keywords: vec!["messages".to_string()],
            },
        );
        config.distraction.categories.push(crate::config::CategoryRule {
            name: "Work Mail".to_string(),
            keywords: vec!["gmail".to_string()],
        });
        let profiler = DistractionProfiler::new(&config);

        // Both "Email" and "Work Mail" list gmail exactly; table order decides
        assert_eq!(profiler.categorize("gmail"), "Email");
        assert_eq!(profiler.categorize("messages"), "Chat");
    }

    #[test]
    fn test_team_of_three_ranks_chrome_first() {
        let records = vec![
            record("alice", Some("chrome"), 6.0),
            record("alice", Some("slack"), 2.0),
            record("bob", Some("spotify"), 1.0),
            record("carol", Some("code"), 0.0),
        ];
        let profile = profile_of(&records);

        assert_eq!(profile.team_size, 3);
        assert_eq!(profile.categories[0].category_name, "Web Browsing");
        assert!(profile.categories[0].total_unproductive_hours >= 6.0);
        assert_eq!(profile.categories[0].app_breakdown["chrome"], 6.0);
        assert_eq!(profile.total_unproductive_hours, 9.0);
    }

    #[test]
    fn test_categories_sorted_descending_with_name_tiebreak() {
        let records = vec![
            record("alice", Some("spotify"), 2.0),
            record("alice", Some("amazon"), 2.0),
            record("bob", Some("slack"), 3.0),
        ];
        let profile = profile_of(&records);
        let names: Vec<&str> = profile
            .categories
            .iter()
            .map(|c| c.category_name.as_str())
            .collect();

        assert_eq!(names, vec!["Communication", "Entertainment", "Shopping"]);
    }

    #[test]
    fn test_percentages_and_breakdown() {
        let records = vec![
            record("alice", Some("Chrome"), 3.0),
            record("bob", Some("firefox"), 1.0),
            record("bob", None, 4.0),
        ];
        let profile = profile_of(&records);

        let browsing = profile
            .categories
            .iter()
            .find(|c| c.category_name == "Web Browsing")
            .unwrap();
        assert_eq!(browsing.percentage, 50.0);
        assert_eq!(
            browsing.app_breakdown,
            BTreeMap::from([("chrome".to_string(), 3.0), ("firefox".to_string(), 1.0)])
        );

        let other = profile
            .categories
            .iter()
            .find(|c| c.category_name == "Other")
            .unwrap();
        assert_eq!(other.app_breakdown[UNKNOWN_APP], 4.0);
    }

    #[test]
    fn test_insights_for_top_categories() {
        let records = vec![
            record("alice", Some("chrome"), 5.0),
            record("alice", Some("slack"), 3.0),
            record("bob", Some("instagram"), 1.5),
            record("bob", Some("netflix"), 0.5),
        ];
        let profile = profile_of(&records);

        assert_eq!(
            profile.insights[0],
            "Web Browsing accounts for 5.0 hours of unproductive time across the team (50%)"
        );
        assert!(profile.insights[1].starts_with("Communication accounts for 3.0 hours"));
        assert!(profile.insights[2].starts_with("Social Media accounts for 1.5 hours"));
        assert!(profile
            .insights
            .iter()
            .any(|i| i.contains("biggest team distraction")));
        assert!(profile
            .insights
            .iter()
            .any(|i| i.contains("context switching")));
        assert!(!profile.insights.iter().any(|i| i.contains("Entertainment")));
    }

    #[test]
    fn test_no_unproductive_time() {
        let records = vec![record("alice", Some("code"), 0.0)];
        let profile = profile_of(&records);

        assert_eq!(profile.team_size, 1);
        assert!(profile.categories.is_empty());
        assert_eq!(profile.total_unproductive_hours, 0.0);
        assert_eq!(profile.insights.len(), 1);
        assert!(profile.insights[0].starts_with("No unproductive time"));
    }

    #[test]
    fn test_negative_hours_are_ignored() {
        let records = vec![
            record("alice", Some("chrome"), -4.0),
            record("alice", Some("chrome"), 1.0),
        ];
        let profile = profile_of(&records);

        assert_eq!(profile.total_unproductive_hours, 1.0);
    }
}
