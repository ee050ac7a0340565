//! Analysis policy configuration
//!
//! Thresholds, rule weights and the application category table are policy
//! constants rather than structural requirements, so they are collected here
//! and can be overridden from a (partial) JSON document.

use crate::error::AnalyticsError;
use serde::{Deserialize, Serialize};

/// Default lookback window in days
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// Category assigned to applications that match no rule
pub const OTHER_CATEGORY: &str = "Other";

/// Top-level configuration for the analytics engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Trailing window of telemetry considered per call (days)
    pub lookback_days: u32,
    pub trend: TrendThresholds,
    pub weights: RiskWeights,
    pub levels: RiskLevelThresholds,
    pub distraction: DistractionConfig,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            trend: TrendThresholds::default(),
            weights: RiskWeights::default(),
            levels: RiskLevelThresholds::default(),
            distraction: DistractionConfig::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Load configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, AnalyticsError> {
        let config: AnalyticsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, AnalyticsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations that would make the rules meaningless
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.lookback_days == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "lookback_days must be at least 1".to_string(),
            ));
        }
        let t = &self.trend;
        if t.min_days == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "trend.min_days must be at least 1".to_string(),
            ));
        }
        if t.slope_window_days < 2 {
            return Err(AnalyticsError::InvalidConfig(
                "trend.slope_window_days must be at least 2".to_string(),
            ));
        }
        if t.long_hours_high <= t.long_hours_medium {
            return Err(AnalyticsError::InvalidConfig(format!(
                "trend.long_hours_high ({}) must exceed trend.long_hours_medium ({})",
                t.long_hours_high, t.long_hours_medium
            )));
        }
        for (name, ratio) in [
            ("trend.idle_ratio_medium", t.idle_ratio_medium),
            ("trend.idle_ratio_high", t.idle_ratio_high),
            ("trend.goal_decline_ratio", t.goal_decline_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(AnalyticsError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {ratio}"
                )));
            }
        }
        if self.levels.medium >= self.levels.high {
            return Err(AnalyticsError::InvalidConfig(format!(
                "levels.medium ({}) must be below levels.high ({})",
                self.levels.medium, self.levels.high
            )));
        }
        if self
            .distraction
            .categories
            .iter()
            .any(|rule| rule.name.trim().is_empty())
        {
            return Err(AnalyticsError::InvalidConfig(
                "distraction category names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Thresholds used by the trend rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendThresholds {
    /// Active days required before any rule is evaluated
    pub min_days: usize,
    /// Average work span above which the long-hours rule fires (hours)
    pub long_hours_medium: f64,
    /// Average work span above which long hours are high severity (hours)
    pub long_hours_high: f64,
    /// Weekend work span above which a weekend day counts as worked (hours)
    pub weekend_span_hours: f64,
    /// Weekend days worked at which weekend work is high severity
    pub weekend_days_high: u32,
    /// Trailing aggregates used for the escalation slope
    pub slope_window_days: usize,
    /// Slope above which the work span is considered escalating (hours/day)
    pub slope_epsilon: f64,
    /// Slope at which escalation is high severity (hours/day)
    pub slope_steep: f64,
    /// Idle share of reported time above which the idle rule fires
    pub idle_ratio_medium: f64,
    /// Idle share at which the idle rule is high severity
    pub idle_ratio_high: f64,
    /// Relative drop in goals per day (recent vs earlier half) that fires the goal rule
    pub goal_decline_ratio: f64,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            min_days: 3,
            long_hours_medium: 9.0,
            long_hours_high: 10.0,
            weekend_span_hours: 2.0,
            weekend_days_high: 3,
            slope_window_days: 7,
            slope_epsilon: 0.1,
            slope_steep: 0.5,
            idle_ratio_medium: 0.4,
            idle_ratio_high: 0.6,
            goal_decline_ratio: 0.3,
        }
    }
}

/// Impact points contributed by each fired rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub long_hours: u32,
    pub weekend_work: u32,
    pub escalating_trend: u32,
    pub high_idle_ratio: u32,
    pub low_goal_completion: u32,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            long_hours: 25,
            weekend_work: 15,
            escalating_trend: 20,
            high_idle_ratio: 15,
            low_goal_completion: 10,
        }
    }
}

/// Score boundaries between risk levels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLevelThresholds {
    /// Lowest score classified as medium
    pub medium: u32,
    /// Lowest score classified as high
    pub high: u32,
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        Self {
            medium: 30,
            high: 60,
        }
    }
}

/// Maps application names onto a distraction category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    /// Case-folded keywords; exact matches win over whole-word matches
    pub keywords: Vec<String>,
}

impl CategoryRule {
    fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Distraction profiler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistractionConfig {
    /// Category table, consulted in order
    pub categories: Vec<CategoryRule>,
    /// Number of top categories that get a headline insight
    pub max_insights: usize,
    /// Top-category share (percent) called out as the biggest distraction
    pub dominant_share_pct: f64,
    /// Social media share (percent) called out as significant
    pub social_media_share_pct: f64,
    /// Communication share (percent) called out as context switching
    pub communication_share_pct: f64,
}

impl Default for DistractionConfig {
    fn default() -> Self {
        Self {
            categories: default_category_table(),
            max_insights: 3,
            dominant_share_pct: 40.0,
            social_media_share_pct: 25.0,
            communication_share_pct: 20.0,
        }
    }
}

/// Built-in application category table
///
/// Specific services precede generic browsers; whole-word matches take the
/// first rule in table order.
pub fn default_category_table() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new(
            "Social Media",
            &["facebook", "twitter", "instagram", "linkedin", "tiktok", "youtube", "reddit"],
        ),
        CategoryRule::new(
            "Entertainment",
            &["netflix", "spotify", "twitch", "steam", "games", "vlc"],
        ),
        CategoryRule::new("News", &["cnn", "bbc", "reuters", "news"]),
        CategoryRule::new("Shopping", &["amazon", "ebay", "etsy", "shop"]),
        CategoryRule::new(
            "Communication",
            &["slack", "teams", "discord", "whatsapp", "telegram", "zoom", "messages"],
        ),
        CategoryRule::new("Email", &["gmail", "outlook", "thunderbird", "mail"]),
        CategoryRule::new(
            "Web Browsing",
            &["chrome", "firefox", "safari", "edge", "brave", "opera", "browser"],
        ),
    ]
}
