//! Trend analysis over daily aggregates
//!
//! Computes rolling work-span statistics for one user and evaluates each burnout
//! rule as an independent pure function over the aggregate sequence. The risk
//! scorer composes the fired rules into a composite score.

use crate::config::{AnalyticsConfig, RiskWeights, TrendThresholds};
use crate::types::{DailyAggregate, RiskFactor, RiskFactorType, Severity, TrendMetrics};
use chrono::{Datelike, NaiveDate, Weekday};

/// A burnout rule: fires at most one risk factor for a user's aggregate history
pub type Rule = fn(&[DailyAggregate], &TrendThresholds, &RiskWeights) -> Option<RiskFactor>;

/// Portion of the history a rule is evaluated over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reach {
    /// The whole lookback window at once
    Window,
    /// Every point of the window: the history up to each active day, keeping
    /// the strongest factor. A pattern seen anywhere in the window stays
    /// reported when later days are added.
    AnyPoint,
}

/// Rules in evaluation order; factor order in an assessment follows this list
pub const RULES: [(Rule, Reach); 5] = [
    (long_hours_rule, Reach::Window),
    (weekend_work_rule, Reach::Window),
    (escalating_trend_rule, Reach::AnyPoint),
    (high_idle_ratio_rule, Reach::AnyPoint),
    (low_goal_completion_rule, Reach::AnyPoint),
];

/// Output of a trend analysis for one user
#[derive(Debug, Clone, PartialEq)]
pub struct TrendAnalysis {
    pub metrics: TrendMetrics,
    pub factors: Vec<RiskFactor>,
    /// Too few active days to evaluate the rules
    pub low_confidence: bool,
    min_days: usize,
}

impl TrendAnalysis {
    /// One-line human-readable description of the analyzed history
    pub fn summary(&self) -> String {
        let m = &self.metrics;
        if m.active_days == 0 {
            return "No activity recorded in the lookback window".to_string();
        }
        if self.low_confidence {
            return format!(
                "Only {} active day(s) recorded; at least {} needed for trend analysis",
                m.active_days, self.min_days
            );
        }

        let direction = match m.work_span_slope {
            Some(slope) if slope > 0.0 => "rising",
            Some(slope) if slope < 0.0 => "falling",
            _ => "stable",
        };
        format!(
            "Average work span {:.1}h (max {:.1}h, stddev {:.1}h) over {} active days; recent trend {}",
            m.avg_work_span, m.max_work_span, m.work_span_stddev, m.active_days, direction
        )
    }
}

/// Derives trend metrics and fires burnout rules
pub struct TrendAnalyzer<'a> {
    thresholds: &'a TrendThresholds,
    weights: &'a RiskWeights,
}

impl<'a> TrendAnalyzer<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self {
            thresholds: &config.trend,
            weights: &config.weights,
        }
    }

    /// Analyze one user's chronological daily aggregates
    pub fn analyze(&self, days: &[DailyAggregate]) -> TrendAnalysis {
        let metrics = compute_metrics(days, self.thresholds);
        let low_confidence = days.len() < self.thresholds.min_days;

        let factors = if low_confidence {
            Vec::new()
        } else {
            RULES
                .iter()
                .filter_map(|(rule, reach)| match reach {
                    Reach::Window => rule(days, self.thresholds, self.weights),
                    Reach::AnyPoint => {
                        strongest_at_any_point(*rule, days, self.thresholds, self.weights)
                    }
                })
                .collect()
        };

        TrendAnalysis {
            metrics,
            factors,
            low_confidence,
            min_days: self.thresholds.min_days,
        }
    }
}

/// Compute the rolling statistics reported alongside an assessment
pub fn compute_metrics(days: &[DailyAggregate], thresholds: &TrendThresholds) -> TrendMetrics {
    let spans: Vec<f64> = days.iter().map(|d| d.work_span_hours).collect();

    TrendMetrics {
        active_days: days.len() as u32,
        avg_work_span: mean(&spans).unwrap_or(0.0),
        max_work_span: spans.iter().copied().fold(0.0, f64::max),
        work_span_stddev: population_stddev(&spans).unwrap_or(0.0),
        work_span_slope: work_span_slope(days, thresholds.slope_window_days),
        idle_ratio: idle_ratio(days),
        weekend_days: weekend_days_worked(days, thresholds.weekend_span_hours),
        goals_completed: days.iter().map(|d| d.goals_completed).sum(),
    }
}

/// Evaluate `rule` on the history up to each active day (from `min_days` on)
///
/// Returns the most severe factor; on equal severity the most recent one.
pub fn strongest_at_any_point(
    rule: Rule,
    days: &[DailyAggregate],
    thresholds: &TrendThresholds,
    weights: &RiskWeights,
) -> Option<RiskFactor> {
    (thresholds.min_days.max(1)..=days.len())
        .filter_map(|end| rule(&days[..end], thresholds, weights))
        .fold(None, |strongest: Option<RiskFactor>, factor| match strongest {
            Some(s) if s.severity > factor.severity => Some(s),
            _ => Some(factor),
        })
}

/// Sustained long work spans
pub fn long_hours_rule(
    days: &[DailyAggregate],
    thresholds: &TrendThresholds,
    weights: &RiskWeights,
) -> Option<RiskFactor> {
    let spans: Vec<f64> = days.iter().map(|d| d.work_span_hours).collect();
    let avg = mean(&spans)?;
    if avg <= thresholds.long_hours_medium {
        return None;
    }

    let severity = if avg > thresholds.long_hours_high {
        Severity::High
    } else {
        Severity::Medium
    };
    Some(RiskFactor {
        factor_type: RiskFactorType::LongHours,
        severity,
        description: format!(
            "Average work span of {:.1}h over {} active days exceeds {:.1}h",
            avg,
            days.len(),
            thresholds.long_hours_medium
        ),
        impact_points: weights.long_hours,
    })
}

/// Meaningful work on Saturdays or Sundays
pub fn weekend_work_rule(
    days: &[DailyAggregate],
    thresholds: &TrendThresholds,
    weights: &RiskWeights,
) -> Option<RiskFactor> {
    let worked = weekend_days_worked(days, thresholds.weekend_span_hours);
    if worked == 0 {
        return None;
    }

    let severity = if worked >= thresholds.weekend_days_high {
        Severity::High
    } else {
        Severity::Medium
    };
    Some(RiskFactor {
        factor_type: RiskFactorType::WeekendWork,
        severity,
        description: format!(
            "Worked {} weekend day(s) with a span above {:.1}h",
            worked, thresholds.weekend_span_hours
        ),
        impact_points: weights.weekend_work,
    })
}

/// Work span growing over the most recent active days
pub fn escalating_trend_rule(
    days: &[DailyAggregate],
    thresholds: &TrendThresholds,
    weights: &RiskWeights,
) -> Option<RiskFactor> {
    let slope = work_span_slope(days, thresholds.slope_window_days)?;
    if slope <= thresholds.slope_epsilon {
        return None;
    }

    let severity = if slope >= thresholds.slope_steep {
        Severity::High
    } else {
        Severity::Medium
    };
    let window = days.len().min(thresholds.slope_window_days);
    Some(RiskFactor {
        factor_type: RiskFactorType::EscalatingTrend,
        severity,
        description: format!(
            "Work span rising by {:.2}h per day across the last {} active days",
            slope, window
        ),
        impact_points: weights.escalating_trend,
    })
}

/// Large share of tracked time spent idle
pub fn high_idle_ratio_rule(
    days: &[DailyAggregate],
    thresholds: &TrendThresholds,
    weights: &RiskWeights,
) -> Option<RiskFactor> {
    let ratio = idle_ratio(days)?;
    if ratio <= thresholds.idle_ratio_medium {
        return None;
    }

    let severity = if ratio > thresholds.idle_ratio_high {
        Severity::High
    } else {
        Severity::Medium
    };
    Some(RiskFactor {
        factor_type: RiskFactorType::HighIdleRatio,
        severity,
        description: format!("Idle time is {:.0}% of tracked time", ratio * 100.0),
        impact_points: weights.high_idle_ratio,
    })
}

/// Goals per day dropping between the earlier and the recent half of the window
///
/// Users who never logged a goal in the window are not evaluated.
pub fn low_goal_completion_rule(
    days: &[DailyAggregate],
    thresholds: &TrendThresholds,
    weights: &RiskWeights,
) -> Option<RiskFactor> {
    if days.len() < 2 || days.iter().all(|d| d.goals_completed == 0) {
        return None;
    }

    let (earlier, recent) = days.split_at(days.len() / 2);
    let earlier_rate = goals_per_day(earlier)?;
    let recent_rate = goals_per_day(recent)?;
    if earlier_rate <= 0.0 || recent_rate >= earlier_rate * (1.0 - thresholds.goal_decline_ratio) {
        return None;
    }

    let severity = if recent_rate == 0.0 {
        Severity::Medium
    } else {
        Severity::Low
    };
    Some(RiskFactor {
        factor_type: RiskFactorType::LowGoalCompletion,
        severity,
        description: format!(
            "Goals completed per day fell from {:.1} to {:.1}",
            earlier_rate, recent_rate
        ),
        impact_points: weights.low_goal_completion,
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn population_stddev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Least-squares slope of `y` over `x`; `None` without horizontal spread
fn linear_slope(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance_x = 0.0;
    for (x, y) in points {
        covariance += (x - mean_x) * (y - mean_y);
        variance_x += (x - mean_x).powi(2);
    }

    if variance_x <= f64::EPSILON {
        return None;
    }
    Some(covariance / variance_x)
}

/// Slope of the work span over the trailing `window` aggregates
///
/// X values are calendar-day offsets, so gaps between active days stretch the
/// fit instead of being collapsed.
fn work_span_slope(days: &[DailyAggregate], window: usize) -> Option<f64> {
    let tail = &days[days.len().saturating_sub(window)..];
    let origin: NaiveDate = tail.first()?.date;
    let points: Vec<(f64, f64)> = tail
        .iter()
        .map(|d| ((d.date - origin).num_days() as f64, d.work_span_hours))
        .collect();
    linear_slope(&points)
}

fn idle_ratio(days: &[DailyAggregate]) -> Option<f64> {
    let reported: f64 = days.iter().map(DailyAggregate::reported_hours).sum();
    if reported <= 0.0 {
        return None;
    }
    let idle: f64 = days.iter().map(|d| d.idle_hours).sum();
    Some((idle / reported).clamp(0.0, 1.0))
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn weekend_days_worked(days: &[DailyAggregate], min_span_hours: f64) -> u32 {
    days.iter()
        .filter(|d| is_weekend(d.date) && d.work_span_hours > min_span_hours)
        .count() as u32
}

fn goals_per_day(days: &[DailyAggregate]) -> Option<f64> {
    if days.is_empty() {
        return None;
    }
    let total: u32 = days.iter().map(|d| d.goals_completed).sum();
    Some(total as f64 / days.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    /// 2024-03-04 is a Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    fn day(offset: i64, span: f64) -> DailyAggregate {
        DailyAggregate {
            user_id: "alice".to_string(),
            date: monday() + Duration::days(offset),
            work_span_hours: span,
            productive_hours: span * 0.8,
            unproductive_hours: span * 0.1,
            idle_hours: span * 0.1,
            goals_completed: 2,
            record_count: 4,
        }
    }

    /// Weekday offsets only (skips Saturday/Sunday)
    fn weekdays(spans: &[f64]) -> Vec<DailyAggregate> {
        let mut offset = 0;
        spans
            .iter()
            .map(|span| {
                while is_weekend(monday() + Duration::days(offset)) {
                    offset += 1;
                }
                let d = day(offset, *span);
                offset += 1;
                d
            })
            .collect()
    }

    fn defaults() -> (TrendThresholds, RiskWeights) {
        (TrendThresholds::default(), RiskWeights::default())
    }

    #[test]
    fn test_metrics_basic_statistics() {
        let (t, _) = defaults();
        let days = weekdays(&[8.0, 10.0, 12.0]);
        let metrics = compute_metrics(&days, &t);

        assert_eq!(metrics.active_days, 3);
        assert!((metrics.avg_work_span - 10.0).abs() < 1e-9);
        assert_eq!(metrics.max_work_span, 12.0);
        assert!((metrics.work_span_stddev - (8.0f64 / 3.0).sqrt()).abs() < 1e-9);
        assert!((metrics.work_span_slope.unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(metrics.goals_completed, 6);
    }

    #[test]
    fn test_long_hours_medium_and_high() {
        let (t, w) = defaults();

        let medium = long_hours_rule(&weekdays(&[9.5, 9.5, 9.5]), &t, &w).unwrap();
        assert_eq!(medium.severity, Severity::Medium);
        assert_eq!(medium.impact_points, 25);

        let high = long_hours_rule(&weekdays(&[11.0; 10]), &t, &w).unwrap();
        assert_eq!(high.severity, Severity::High);

        assert!(long_hours_rule(&weekdays(&[9.0, 9.0, 9.0]), &t, &w).is_none());
    }

    #[test]
    fn test_weekend_work_requires_span_above_threshold() {
        let (t, w) = defaults();
        // Offsets 5 and 6 are Saturday and Sunday
        let light = vec![day(0, 8.0), day(1, 8.0), day(5, 1.5)];
        assert!(weekend_work_rule(&light, &t, &w).is_none());

        let worked = vec![day(0, 8.0), day(1, 8.0), day(5, 4.0)];
        let factor = weekend_work_rule(&worked, &t, &w).unwrap();
        assert_eq!(factor.severity, Severity::Medium);
        assert_eq!(factor.impact_points, 15);

        let many = vec![day(5, 4.0), day(6, 4.0), day(12, 3.0), day(13, 3.0)];
        assert_eq!(weekend_work_rule(&many, &t, &w).unwrap().severity, Severity::High);
    }

    #[test]
    fn test_escalating_trend_uses_last_window() {
        let (t, w) = defaults();
        // Early decline followed by seven days of steady growth
        let mut spans = vec![12.0, 11.0, 10.0];
        spans.extend([6.0, 6.5, 7.0, 7.5, 8.0, 8.5, 9.0]);
        let days: Vec<DailyAggregate> = spans
            .iter()
            .enumerate()
            .map(|(i, s)| day(i as i64, *s))
            .collect();

        let factor = escalating_trend_rule(&days, &t, &w).unwrap();
        assert_eq!(factor.severity, Severity::High);
        assert_eq!(factor.impact_points, 20);
    }

    #[test]
    fn test_escalation_seen_earlier_in_window_is_kept() {
        let (t, w) = defaults();
        let mut spans = vec![6.0; 14];
        spans.extend([12.0; 7]);
        let days: Vec<DailyAggregate> = spans
            .iter()
            .enumerate()
            .map(|(i, s)| day(i as i64, *s))
            .collect();

        // The trailing seven days are flat at 12h
        assert!(escalating_trend_rule(&days, &t, &w).is_none());

        let factor = strongest_at_any_point(escalating_trend_rule, &days, &t, &w).unwrap();
        assert_eq!(factor.severity, Severity::High);

        let config = AnalyticsConfig::default();
        let analysis = TrendAnalyzer::new(&config).analyze(&days);
        assert!(analysis
            .factors
            .iter()
            .any(|f| f.factor_type == RiskFactorType::EscalatingTrend));
    }

    #[test]
    fn test_any_point_prefers_most_severe() {
        let (t, w) = defaults();
        let mut days = weekdays(&[8.0; 6]);
        // Idle share above 60% over the first three days, then diluted
        for d in days.iter_mut().take(3) {
            d.productive_hours = 1.0;
            d.unproductive_hours = 0.0;
            d.idle_hours = 3.0;
        }
        for d in days.iter_mut().skip(3) {
            d.productive_hours = 8.0;
            d.unproductive_hours = 0.0;
            d.idle_hours = 0.0;
        }

        assert!(high_idle_ratio_rule(&days, &t, &w).is_none());
        let factor = strongest_at_any_point(high_idle_ratio_rule, &days, &t, &w).unwrap();
        assert_eq!(factor.severity, Severity::High);
    }

    #[test]
    fn test_flat_or_falling_span_does_not_escalate() {
        let (t, w) = defaults();
        assert!(escalating_trend_rule(&weekdays(&[8.0; 7]), &t, &w).is_none());
        assert!(escalating_trend_rule(&weekdays(&[10.0, 9.0, 8.0, 7.0]), &t, &w).is_none());
    }

    #[test]
    fn test_slope_respects_calendar_gaps() {
        let days = vec![day(0, 8.0), day(10, 9.0), day(20, 10.0)];
        let slope = work_span_slope(&days, 7).unwrap();
        assert!((slope - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_high_idle_ratio() {
        let (t, w) = defaults();
        let mut days = weekdays(&[8.0, 8.0, 8.0]);
        for d in &mut days {
            d.productive_hours = 2.0;
            d.unproductive_hours = 1.0;
            d.idle_hours = 3.0;
        }

        let factor = high_idle_ratio_rule(&days, &t, &w).unwrap();
        assert_eq!(factor.severity, Severity::Medium);
        assert_eq!(factor.impact_points, 15);
        assert!(factor.description.contains("50%"));

        assert!(high_idle_ratio_rule(&weekdays(&[8.0, 8.0, 8.0]), &t, &w).is_none());
    }

    #[test]
    fn test_idle_ratio_without_reported_time_is_none() {
        let (t, w) = defaults();
        let mut days = weekdays(&[8.0, 8.0, 8.0]);
        for d in &mut days {
            d.productive_hours = 0.0;
            d.unproductive_hours = 0.0;
            d.idle_hours = 0.0;
        }
        assert!(high_idle_ratio_rule(&days, &t, &w).is_none());
    }

    #[test]
    fn test_goal_completion_decline() {
        let (t, w) = defaults();
        let mut days = weekdays(&[8.0; 6]);
        for (i, d) in days.iter_mut().enumerate() {
            d.goals_completed = if i < 3 { 4 } else { 1 };
        }

        let factor = low_goal_completion_rule(&days, &t, &w).unwrap();
        assert_eq!(factor.severity, Severity::Low);
        assert_eq!(factor.impact_points, 10);

        for d in days.iter_mut().skip(3) {
            d.goals_completed = 0;
        }
        let factor = low_goal_completion_rule(&days, &t, &w).unwrap();
        assert_eq!(factor.severity, Severity::Medium);
    }

    #[test]
    fn test_goal_rule_skips_users_without_goals() {
        let (t, w) = defaults();
        let mut days = weekdays(&[8.0; 6]);
        for d in &mut days {
            d.goals_completed = 0;
        }
        assert!(low_goal_completion_rule(&days, &t, &w).is_none());
    }

    #[test]
    fn test_steady_goals_do_not_fire() {
        let (t, w) = defaults();
        assert!(low_goal_completion_rule(&weekdays(&[8.0; 6]), &t, &w).is_none());
    }

    #[test]
    fn test_insufficient_data_is_low_confidence_without_factors() {
        let config = AnalyticsConfig::default();
        let analysis = TrendAnalyzer::new(&config).analyze(&weekdays(&[14.0, 14.0]));

        assert!(analysis.low_confidence);
        assert!(analysis.factors.is_empty());
        assert_eq!(analysis.metrics.active_days, 2);
        assert!(analysis.summary().contains("Only 2 active day(s)"));
    }

    #[test]
    fn test_empty_history() {
        let config = AnalyticsConfig::default();
        let analysis = TrendAnalyzer::new(&config).analyze(&[]);

        assert!(analysis.low_confidence);
        assert_eq!(analysis.metrics, TrendMetrics::default());
        assert_eq!(analysis.summary(), "No activity recorded in the lookback window");
    }

    #[test]
    fn test_factor_order_follows_rule_order() {
        let config = AnalyticsConfig::default();
        // Rising long days ending on a weekend
        let days: Vec<DailyAggregate> = (0..7).map(|i| day(i, 9.0 + i as f64 * 0.5)).collect();
        let analysis = TrendAnalyzer::new(&config).analyze(&days);

        let types: Vec<RiskFactorType> = analysis.factors.iter().map(|f| f.factor_type).collect();
        assert_eq!(
            types,
            vec![
                RiskFactorType::LongHours,
                RiskFactorType::WeekendWork,
                RiskFactorType::EscalatingTrend
            ]
        );
        assert!(analysis.summary().contains("recent trend rising"));
    }
}
