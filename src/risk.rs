//! Complication risk scoring
//!
//! Two independent strategies answer two different questions:
//!
//! - [`TrajectoryRiskScorer`]: where is recovery heading? Driven by recent
//!   average pain, externally computed trend directions, anomaly flags and
//!   the recovery score.
//! - [`PointInTimeRiskScorer`]: how concerning is the patient right now?
//!   Driven by the latest absolute vitals measured against the personal
//!   baseline.
//!
//! Their inputs and scales differ and the two scores are never merged.

use crate::factors::RiskFactor;
use crate::models::{trailing_average_pain, Insights, MetricEntry, TrendDirection};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Upper bound of every risk score
pub const MAX_RISK_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Moderate => write!(f, "moderate"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Score boundaries between risk levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLevelBands {
    /// Scores below this are low
    pub low_below: u32,
    /// Scores below this (and not low) are moderate; the rest are high
    pub moderate_below: u32,
}

impl RiskLevelBands {
    pub fn level(&self, score: u32) -> RiskLevel {
        if score < self.low_below {
            RiskLevel::Low
        } else if score < self.moderate_below {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }
}

/// Points one rule added to a score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreContribution {
    pub source: String,
    pub points: u32,
}

/// A risk score with its level and supporting explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    /// Clamped to `[0, 100]`
    pub score: u32,
    pub level: RiskLevel,
    pub message: String,
    pub factors: Vec<RiskFactor>,
    pub protective_factors: Vec<String>,
    /// Unclamped per-rule points, in evaluation order
    pub breakdown: Vec<ScoreContribution>,
}

impl RiskResult {
    /// Attach the factor lists that back this score
    pub fn with_factors(mut self, factors: Vec<RiskFactor>, protective_factors: Vec<String>) -> Self {
        self.factors = factors;
        self.protective_factors = protective_factors;
        self
    }

    /// Sum of the breakdown before clamping
    pub fn raw_points(&self) -> u32 {
        self.breakdown.iter().map(|c| c.points).sum()
    }

    pub fn points_from(&self, source: &str) -> u32 {
        self.breakdown
            .iter()
            .filter(|c| c.source == source)
            .map(|c| c.points)
            .sum()
    }
}

/// Accumulates rule points and turns them into a [`RiskResult`]
#[derive(Default)]
struct PointTally {
    breakdown: Vec<ScoreContribution>,
}

impl PointTally {
    fn add(&mut self, source: &str, points: u32) {
        self.breakdown.push(ScoreContribution {
            source: source.to_string(),
            points,
        });
    }

    fn finish(self, bands: &RiskLevelBands, message: impl Fn(RiskLevel) -> &'static str) -> RiskResult {
        let raw: u32 = self.breakdown.iter().map(|c| c.points).sum();
        let score = raw.min(MAX_RISK_SCORE);
        let level = bands.level(score);

        RiskResult {
            score,
            level,
            message: message(level).to_string(),
            factors: Vec::new(),
            protective_factors: Vec::new(),
            breakdown: self.breakdown,
        }
    }
}

// Breakdown source labels
pub const SOURCE_PAIN: &str = "pain";
pub const SOURCE_PAIN_TREND: &str = "pain_trend";
pub const SOURCE_ACTIVITY_TREND: &str = "activity_trend";
pub const SOURCE_ANOMALIES: &str = "anomalies";
pub const SOURCE_RECOVERY_SCORE: &str = "recovery_score";
pub const SOURCE_TEMPERATURE: &str = "temperature";
pub const SOURCE_HEART_RATE: &str = "heart_rate";
pub const SOURCE_VELOCITY: &str = "recovery_velocity";

/// Rule weights for the trajectory strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryRiskConfig {
    /// Score reported when entries or insights are absent (unknown, not zero, risk)
    pub default_score: u32,
    /// Number of trailing entries averaged for pain
    pub pain_window: usize,
    pub pain_high_above: f64,
    pub pain_high_points: u32,
    pub pain_moderate_above: f64,
    pub pain_moderate_points: u32,
    pub pain_mild_above: f64,
    pub pain_mild_points: u32,
    pub increasing_pain_points: u32,
    pub stable_pain_points: u32,
    pub declining_activity_points: u32,
    /// Flat, regardless of anomaly count
    pub anomaly_points: u32,
    pub low_recovery_score_below: f64,
    pub low_recovery_points: u32,
    pub levels: RiskLevelBands,
}

impl Default for TrajectoryRiskConfig {
    fn default() -> Self {
        TrajectoryRiskConfig {
            default_score: 15,
            pain_window: 3,
            pain_high_above: 7.0,
            pain_high_points: 30,
            pain_moderate_above: 5.0,
            pain_moderate_points: 15,
            pain_mild_above: 3.0,
            pain_mild_points: 5,
            increasing_pain_points: 25,
            stable_pain_points: 10,
            declining_activity_points: 20,
            anomaly_points: 30,
            low_recovery_score_below: 30.0,
            low_recovery_points: 20,
            levels: RiskLevelBands {
                low_below: 20,
                moderate_below: 50,
            },
        }
    }
}

/// Complication risk inferred from trend direction and anomaly signals
pub struct TrajectoryRiskScorer {
    config: TrajectoryRiskConfig,
}

impl TrajectoryRiskScorer {
    pub fn new() -> Self {
        TrajectoryRiskScorer {
            config: TrajectoryRiskConfig::default(),
        }
    }

    pub fn with_config(config: TrajectoryRiskConfig) -> Self {
        TrajectoryRiskScorer { config }
    }

    pub fn score(&self, entries: &[MetricEntry], insights: Option<&Insights>) -> RiskResult {
        let (Some(insights), Some(avg_pain)) = (
            insights,
            trailing_average_pain(entries, self.config.pain_window),
        ) else {
            let score = self.config.default_score.min(MAX_RISK_SCORE);
            let level = self.config.levels.level(score);
            debug!(score, "trajectory risk defaulted: no entries or insights");
            return RiskResult {
                score,
                level,
                message: "Not enough trend data yet - risk is unknown".to_string(),
                factors: Vec::new(),
                protective_factors: Vec::new(),
                breakdown: Vec::new(),
            };
        };

        let cfg = &self.config;
        let mut tally = PointTally::default();

        if avg_pain > cfg.pain_high_above {
            tally.add(SOURCE_PAIN, cfg.pain_high_points);
        } else if avg_pain > cfg.pain_moderate_above {
            tally.add(SOURCE_PAIN, cfg.pain_moderate_points);
        } else if avg_pain > cfg.pain_mild_above {
            tally.add(SOURCE_PAIN, cfg.pain_mild_points);
        }

        match insights.pain_direction() {
            TrendDirection::Increasing => tally.add(SOURCE_PAIN_TREND, cfg.increasing_pain_points),
            TrendDirection::Stable => tally.add(SOURCE_PAIN_TREND, cfg.stable_pain_points),
            _ => {}
        }

        if insights.activity_direction() == TrendDirection::Decreasing {
            tally.add(SOURCE_ACTIVITY_TREND, cfg.declining_activity_points);
        }

        if insights.has_anomalies() {
            tally.add(SOURCE_ANOMALIES, cfg.anomaly_points);
        }

        if let Some(recovery_score) = insights.recovery_score {
            if recovery_score < cfg.low_recovery_score_below {
                tally.add(SOURCE_RECOVERY_SCORE, cfg.low_recovery_points);
            }
        }

        let result = tally.finish(&cfg.levels, |level| match level {
            RiskLevel::Low => "Recovery trajectory is on track",
            RiskLevel::Moderate => "Trajectory shows early warning signs - keep monitoring",
            RiskLevel::High => "Trajectory suggests possible complications - contact care team",
        });

        debug!(
            avg_pain,
            score = result.score,
            level = %result.level,
            anomalies = insights.anomalies.len(),
            "trajectory risk scored"
        );

        result
    }
}

impl Default for TrajectoryRiskScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Rule weights for the point-in-time strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointInTimeRiskConfig {
    pub min_entries: usize,
    pub severe_pain: f64,
    pub severe_pain_points: u32,
    pub moderate_pain: f64,
    pub moderate_pain_points: u32,
    /// Temperature (°C) at or above which fever points apply
    pub fever_temp: f64,
    pub fever_points: u32,
    pub low_grade_temp: f64,
    pub low_grade_points: u32,
    /// Heart rate margin above baseline (bpm)
    pub hr_high_margin: f64,
    pub hr_high_points: u32,
    pub hr_mild_margin: f64,
    pub hr_mild_points: u32,
    pub increasing_pain_points: u32,
    pub negative_velocity_points: u32,
    pub levels: RiskLevelBands,
}

impl Default for PointInTimeRiskConfig {
    fn default() -> Self {
        PointInTimeRiskConfig {
            min_entries: 3,
            severe_pain: 7.0,
            severe_pain_points: 30,
            moderate_pain: 5.0,
            moderate_pain_points: 15,
            fever_temp: 38.0,
            fever_points: 40,
            low_grade_temp: 37.5,
            low_grade_points: 20,
            hr_high_margin: 20.0,
            hr_high_points: 25,
            hr_mild_margin: 10.0,
            hr_mild_points: 10,
            increasing_pain_points: 15,
            negative_velocity_points: 20,
            levels: RiskLevelBands {
                low_below: 30,
                moderate_below: 60,
            },
        }
    }
}

pub const INSUFFICIENT_DATA_MESSAGE: &str = "Insufficient data for risk assessment";

/// Clinical risk inferred from the latest absolute vitals versus baseline
pub struct PointInTimeRiskScorer {
    config: PointInTimeRiskConfig,
}

impl PointInTimeRiskScorer {
    pub fn new() -> Self {
        PointInTimeRiskScorer {
            config: PointInTimeRiskConfig::default(),
        }
    }

    pub fn with_config(config: PointInTimeRiskConfig) -> Self {
        PointInTimeRiskScorer { config }
    }

    pub fn score(&self, entries: &[MetricEntry], insights: Option<&Insights>) -> RiskResult {
        let cfg = &self.config;

        let baseline = insights.and_then(|i| i.baseline.as_ref());
        let (Some(insights), Some(baseline), Some(latest)) = (insights, baseline, entries.last())
        else {
            return Self::insufficient_data();
        };
        if entries.len() < cfg.min_entries {
            return Self::insufficient_data();
        }

        let mut tally = PointTally::default();

        let pain = latest.pain();
        if pain >= cfg.severe_pain {
            tally.add(SOURCE_PAIN, cfg.severe_pain_points);
        } else if pain >= cfg.moderate_pain {
            tally.add(SOURCE_PAIN, cfg.moderate_pain_points);
        }

        if let Some(temperature) = latest.temperature {
            if temperature >= cfg.fever_temp {
                tally.add(SOURCE_TEMPERATURE, cfg.fever_points);
            } else if temperature >= cfg.low_grade_temp {
                tally.add(SOURCE_TEMPERATURE, cfg.low_grade_points);
            }
        }

        if let Some(heart_rate) = latest.heart_rate.map(f64::from) {
            if heart_rate > baseline.hr_baseline + cfg.hr_high_margin {
                tally.add(SOURCE_HEART_RATE, cfg.hr_high_points);
            } else if heart_rate > baseline.hr_baseline + cfg.hr_mild_margin {
                tally.add(SOURCE_HEART_RATE, cfg.hr_mild_points);
            }
        }

        if insights.pain_direction() == TrendDirection::Increasing {
            tally.add(SOURCE_PAIN_TREND, cfg.increasing_pain_points);
        }

        if insights.trends.recovery_velocity.is_some_and(|v| v < 0.0) {
            tally.add(SOURCE_VELOCITY, cfg.negative_velocity_points);
        }

        let result = tally.finish(&cfg.levels, |level| match level {
            RiskLevel::Low => "Recovery progressing well with minimal risk factors",
            RiskLevel::Moderate => "Some risk factors detected - monitor closely",
            RiskLevel::High => "Multiple risk factors - consider medical consultation",
        });

        debug!(
            score = result.score,
            raw = result.raw_points(),
            level = %result.level,
            "point-in-time risk scored"
        );

        result
    }

    fn insufficient_data() -> RiskResult {
        RiskResult {
            score: 0,
            level: RiskLevel::Low,
            message: INSUFFICIENT_DATA_MESSAGE.to_string(),
            factors: Vec::new(),
            protective_factors: Vec::new(),
            breakdown: Vec::new(),
        }
    }
}

impl Default for PointInTimeRiskScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityLevel, ActivityTrend, Baseline, PainTrend, Trends};
    use chrono::{Duration, TimeZone, Utc};

    fn entries_with_pain(pains: &[u8]) -> Vec<MetricEntry> {
        let start = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
        pains
            .iter()
            .enumerate()
            .map(|(i, &pain)| {
                MetricEntry::new(start + Duration::days(i as i64), pain, ActivityLevel::Medium)
                    .with_heart_rate(72)
                    .with_temperature(36.8)
            })
            .collect()
    }

    fn baseline() -> Baseline {
        Baseline {
            pain_baseline: 4.0,
            temp_baseline: 36.8,
            hr_baseline: 72.0,
        }
    }

    fn insights_with(pain: TrendDirection, activity: TrendDirection) -> Insights {
        Insights {
            baseline: Some(baseline()),
            trends: Trends {
                pain: Some(PainTrend {
                    direction: pain,
                    slope: Some(0.1),
                    confidence: Some(0.7),
                }),
                activity: Some(ActivityTrend {
                    direction: activity,
                    confidence: Some(0.6),
                }),
                recovery_velocity: Some(1.0),
            },
            anomalies: Vec::new(),
            recovery_score: Some(60.0),
        }
    }

    #[test]
    fn test_trajectory_defaults_without_data() {
        let scorer = TrajectoryRiskScorer::new();

        let no_insights = scorer.score(&entries_with_pain(&[5, 5, 5]), None);
        assert_eq!(no_insights.score, 15);
        assert_eq!(no_insights.level, RiskLevel::Low);

        let insights = Insights::default();
        let no_entries = scorer.score(&[], Some(&insights));
        assert_eq!(no_entries.score, 15);
    }

    #[test]
    fn test_trajectory_pain_average_bands() {
        let scorer = TrajectoryRiskScorer::new();
        let insights = Insights::default();

        // Averages over the last three entries only
        assert_eq!(scorer.score(&entries_with_pain(&[0, 8, 8, 8]), Some(&insights)).score, 30);
        assert_eq!(scorer.score(&entries_with_pain(&[6, 6, 6]), Some(&insights)).score, 15);
        assert_eq!(scorer.score(&entries_with_pain(&[4, 4, 4]), Some(&insights)).score, 5);
        assert_eq!(scorer.score(&entries_with_pain(&[3, 3, 3]), Some(&insights)).score, 0);
        // Short series average over what exists
        assert_eq!(scorer.score(&entries_with_pain(&[9]), Some(&insights)).score, 30);
    }

    #[test]
    fn test_trajectory_accumulates_signals() {
        let scorer = TrajectoryRiskScorer::new();
        let mut insights = insights_with(TrendDirection::Increasing, TrendDirection::Decreasing);
        insights.anomalies = vec!["fever spike".to_string(), "hr jump".to_string()];
        insights.recovery_score = Some(20.0);

        let result = scorer.score(&entries_with_pain(&[8, 8, 8]), Some(&insights));
        // 30 + 25 + 20 + 30 + 20 = 125, clamped
        assert_eq!(result.raw_points(), 125);
        assert_eq!(result.score, 100);
        assert_eq!(result.level, RiskLevel::High);
        assert_eq!(result.points_from(SOURCE_ANOMALIES), 30);
    }

    #[test]
    fn test_trajectory_stable_pain_and_decreasing_activity() {
        let scorer = TrajectoryRiskScorer::new();
        let insights = insights_with(TrendDirection::Stable, TrendDirection::Decreasing);

        let result = scorer.score(&entries_with_pain(&[2, 2, 2]), Some(&insights));
        assert_eq!(result.score, 30);
        assert_eq!(result.level, RiskLevel::Moderate);
    }

    #[test]
    fn test_trajectory_ignores_declining_activity() {
        let scorer = TrajectoryRiskScorer::new();
        let insights = insights_with(TrendDirection::Decreasing, TrendDirection::Declining);

        let result = scorer.score(&entries_with_pain(&[2, 2, 2]), Some(&insights));
        assert_eq!(result.points_from(SOURCE_ACTIVITY_TREND), 0);
        assert_eq!(result.score, 0);
        assert!(result.breakdown.is_empty());
    }

    #[test]
    fn test_trajectory_levels() {
        let bands = TrajectoryRiskConfig::default().levels;
        assert_eq!(bands.level(19), RiskLevel::Low);
        assert_eq!(bands.level(20), RiskLevel::Moderate);
        assert_eq!(bands.level(49), RiskLevel::Moderate);
        assert_eq!(bands.level(50), RiskLevel::High);
    }

    #[test]
    fn test_point_in_time_insufficient_data() {
        let scorer = PointInTimeRiskScorer::new();
        let insights = insights_with(TrendDirection::Increasing, TrendDirection::Stable);

        let too_few = scorer.score(&entries_with_pain(&[9, 9]), Some(&insights));
        assert_eq!(too_few.score, 0);
        assert_eq!(too_few.level, RiskLevel::Low);
        assert_eq!(too_few.message, INSUFFICIENT_DATA_MESSAGE);

        let no_baseline = Insights {
            baseline: None,
            ..insights
        };
        let result = scorer.score(&entries_with_pain(&[9, 9, 9]), Some(&no_baseline));
        assert_eq!(result.message, INSUFFICIENT_DATA_MESSAGE);

        assert_eq!(scorer.score(&entries_with_pain(&[9, 9, 9]), None).score, 0);
    }

    #[test]
    fn test_point_in_time_fever_adds_forty() {
        let scorer = PointInTimeRiskScorer::new();
        let insights = insights_with(TrendDirection::Decreasing, TrendDirection::Stable);

        let mut entries = entries_with_pain(&[2, 2, 2]);
        if let Some(latest) = entries.last_mut() {
            latest.temperature = Some(38.5);
        }

        let result = scorer.score(&entries, Some(&insights));
        assert_eq!(result.points_from(SOURCE_TEMPERATURE), 40);
        assert_eq!(result.score, 40);
        assert_eq!(result.level, RiskLevel::Moderate);
        assert_eq!(result.message, "Some risk factors detected - monitor closely");
    }

    #[test]
    fn test_point_in_time_low_grade_and_heart_rate() {
        let scorer = PointInTimeRiskScorer::new();
        let insights = insights_with(TrendDirection::Decreasing, TrendDirection::Stable);

        let mut entries = entries_with_pain(&[5, 5, 5]);
        if let Some(latest) = entries.last_mut() {
            latest.temperature = Some(37.6);
            latest.heart_rate = Some(85); // baseline 72 + 13
        }

        let result = scorer.score(&entries, Some(&insights));
        assert_eq!(result.points_from(SOURCE_PAIN), 15);
        assert_eq!(result.points_from(SOURCE_TEMPERATURE), 20);
        assert_eq!(result.points_from(SOURCE_HEART_RATE), 10);
        assert_eq!(result.score, 45);
    }

    #[test]
    fn test_point_in_time_trend_and_velocity() {
        let scorer = PointInTimeRiskScorer::new();
        let mut insights = insights_with(TrendDirection::Increasing, TrendDirection::Stable);
        insights.trends.recovery_velocity = Some(-3.0);

        let mut entries = entries_with_pain(&[7, 7, 8]);
        if let Some(latest) = entries.last_mut() {
            latest.heart_rate = Some(95); // baseline 72 + 23
        }

        let result = scorer.score(&entries, Some(&insights));
        // 30 + 25 + 15 + 20
        assert_eq!(result.score, 90);
        assert_eq!(result.level, RiskLevel::High);
        assert_eq!(
            result.message,
            "Multiple risk factors - consider medical consultation"
        );
    }

    #[test]
    fn test_point_in_time_missing_temperature_adds_nothing() {
        let scorer = PointInTimeRiskScorer::new();
        let insights = insights_with(TrendDirection::Decreasing, TrendDirection::Stable);

        let mut entries = entries_with_pain(&[1, 1, 1]);
        if let Some(latest) = entries.last_mut() {
            latest.temperature = None;
        }

        let result = scorer.score(&entries, Some(&insights));
        assert_eq!(result.score, 0);
        assert_eq!(result.level, RiskLevel::Low);
        assert_eq!(result.message, "Recovery progressing well with minimal risk factors");
    }

    #[test]
    fn test_point_in_time_missing_heart_rate_adds_nothing() {
        let scorer = PointInTimeRiskScorer::new();
        let mut insights = insights_with(TrendDirection::Decreasing, TrendDirection::Stable);
        if let Some(baseline) = insights.baseline.as_mut() {
            baseline.hr_baseline = 50.0;
        }

        let mut entries = entries_with_pain(&[1, 1, 1]);
        for entry in &mut entries {
            entry.heart_rate = None;
        }

        let result = scorer.score(&entries, Some(&insights));
        assert_eq!(result.points_from(SOURCE_HEART_RATE), 0);
        assert_eq!(result.score, 0);
        assert!(result.breakdown.is_empty());
    }
}
