//! Dashboard assembly
//!
//! [`RecoveryEngine`] owns one instance of every calculator, configured from
//! a shared [`ClinicalThresholds`], and derives each dashboard output from
//! the same `(entries, insights)` pair. Every derivation is pure; the only
//! time input is the explicit `as_of` used to date milestones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::alerts::{active_alerts, MonitoringAlert};
use crate::config::ClinicalThresholds;
use crate::factors::{ProtectiveFactorExtractor, RiskFactorExtractor};
use crate::forecast::{ForecastPoint, ForecastSeriesGenerator, ShortHorizonForecast};
use crate::milestones::{MilestoneForecaster, MilestoneTimeline, NextMilestone};
use crate::models::{Insights, MetricEntry, SubmissionResponse};
use crate::risk::{PointInTimeRiskScorer, RiskResult, TrajectoryRiskScorer};
use crate::triage::SubmissionTriage;
use crate::velocity::{RecoveryStatus, RecoveryVelocity, RecoveryVelocityCalculator};
use crate::vitals::{VitalSigns, VitalStatusClassifier};

/// Every derived output for one history and insights snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub as_of: DateTime<Utc>,
    pub entry_count: usize,
    pub latest_entry: Option<MetricEntry>,
    pub vitals: VitalSigns,
    pub velocity: RecoveryVelocity,
    /// Label for the insights recovery score
    pub recovery_status: RecoveryStatus,
    pub trajectory_risk: RiskResult,
    pub current_risk: RiskResult,
    pub timeline: MilestoneTimeline,
    pub next_milestone: NextMilestone,
    pub forecast: Vec<ForecastPoint>,
    pub short_horizon: Option<ShortHorizonForecast>,
    pub alerts: Vec<MonitoringAlert>,
}

pub struct RecoveryEngine {
    vitals: VitalStatusClassifier,
    velocity: RecoveryVelocityCalculator,
    trajectory: TrajectoryRiskScorer,
    point_in_time: PointInTimeRiskScorer,
    risk_factors: RiskFactorExtractor,
    protective_factors: ProtectiveFactorExtractor,
    milestones: MilestoneForecaster,
    forecast: ForecastSeriesGenerator,
    triage: SubmissionTriage,
}

impl RecoveryEngine {
    pub fn new() -> Self {
        Self::with_thresholds(ClinicalThresholds::default())
    }

    pub fn with_thresholds(thresholds: ClinicalThresholds) -> Self {
        RecoveryEngine {
            vitals: VitalStatusClassifier::with_config(thresholds.vitals),
            velocity: RecoveryVelocityCalculator::with_config(thresholds.velocity),
            trajectory: TrajectoryRiskScorer::with_config(thresholds.trajectory),
            point_in_time: PointInTimeRiskScorer::with_config(thresholds.point_in_time),
            risk_factors: RiskFactorExtractor::with_config(thresholds.factors.clone()),
            protective_factors: ProtectiveFactorExtractor::with_config(thresholds.factors),
            milestones: MilestoneForecaster::with_config(thresholds.milestones),
            forecast: ForecastSeriesGenerator::with_config(thresholds.forecast),
            triage: SubmissionTriage::with_config(thresholds.triage),
        }
    }

    pub fn vital_signs(&self, entries: &[MetricEntry]) -> VitalSigns {
        self.vitals.classify_latest(entries)
    }

    pub fn recovery_velocity(&self, entries: &[MetricEntry]) -> RecoveryVelocity {
        self.velocity.assess(entries)
    }

    pub fn trajectory_risk(&self, entries: &[MetricEntry], insights: Option<&Insights>) -> RiskResult {
        self.trajectory.score(entries, insights)
    }

    /// Point-in-time risk with the risk and protective factors behind it
    pub fn risk_assessment(&self, entries: &[MetricEntry], insights: Option<&Insights>) -> RiskResult {
        self.point_in_time.score(entries, insights).with_factors(
            self.risk_factors.extract(entries, insights),
            self.protective_factors.extract(entries, insights),
        )
    }

    pub fn milestone_timeline(
        &self,
        entries: &[MetricEntry],
        insights: Option<&Insights>,
        as_of: DateTime<Utc>,
    ) -> MilestoneTimeline {
        self.milestones.forecast(entries, insights, as_of)
    }

    pub fn next_milestone(&self, entries: &[MetricEntry]) -> NextMilestone {
        self.milestones.next_milestone(entries)
    }

    /// Forecast series; `days` falls back to the configured horizon
    pub fn forecast(
        &self,
        entries: &[MetricEntry],
        insights: Option<&Insights>,
        days: Option<u32>,
    ) -> Vec<ForecastPoint> {
        let days = days.unwrap_or_else(|| self.forecast.default_days());
        self.forecast.generate(entries, insights, days)
    }

    pub fn short_horizon(
        &self,
        entries: &[MetricEntry],
        insights: Option<&Insights>,
    ) -> Option<ShortHorizonForecast> {
        self.forecast.short_horizon(entries, insights)
    }

    /// Classify a submission; the new entry is the last element of `history`
    pub fn triage(&self, history: &[MetricEntry]) -> SubmissionResponse {
        self.triage.assess(history)
    }

    #[instrument(skip(self, entries, insights), fields(entries = entries.len()))]
    pub fn snapshot(
        &self,
        entries: &[MetricEntry],
        insights: Option<&Insights>,
        as_of: DateTime<Utc>,
    ) -> DashboardSnapshot {
        self.snapshot_with_days(entries, insights, as_of, None)
    }

    /// [`snapshot`](Self::snapshot) with an explicit forecast horizon
    pub fn snapshot_with_days(
        &self,
        entries: &[MetricEntry],
        insights: Option<&Insights>,
        as_of: DateTime<Utc>,
        forecast_days: Option<u32>,
    ) -> DashboardSnapshot {
        let snapshot = DashboardSnapshot {
            as_of,
            entry_count: entries.len(),
            latest_entry: entries.last().cloned(),
            vitals: self.vital_signs(entries),
            velocity: self.recovery_velocity(entries),
            recovery_status: RecoveryStatus::from_score(insights.and_then(|i| i.recovery_score)),
            trajectory_risk: self.trajectory_risk(entries, insights),
            current_risk: self.risk_assessment(entries, insights),
            timeline: self.milestone_timeline(entries, insights, as_of),
            next_milestone: self.next_milestone(entries),
            forecast: self.forecast(entries, insights, forecast_days),
            short_horizon: self.short_horizon(entries, insights),
            alerts: active_alerts(entries, insights),
        };

        info!(
            entries = snapshot.entry_count,
            trajectory_score = snapshot.trajectory_risk.score,
            current_score = snapshot.current_risk.score,
            velocity = snapshot.velocity.velocity,
            "dashboard snapshot derived"
        );

        snapshot
    }
}

impl Default for RecoveryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertKind;
    use crate::milestones::PLACEHOLDER_TITLE;
    use crate::models::{ActivityLevel, Baseline};
    use crate::risk::{RiskLevel, INSUFFICIENT_DATA_MESSAGE};
    use crate::velocity::VelocityRecommendation;
    use chrono::{Duration, TimeZone};

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_snapshot() {
        let engine = RecoveryEngine::new();
        let snapshot = engine.snapshot(&[], None, as_of());

        assert_eq!(snapshot.entry_count, 0);
        assert!(snapshot.latest_entry.is_none());
        assert_eq!(snapshot.velocity.velocity, 0.0);
        assert_eq!(snapshot.current_risk.score, 0);
        assert_eq!(snapshot.current_risk.message, INSUFFICIENT_DATA_MESSAGE);
        assert_eq!(snapshot.timeline.milestones[0].title, PLACEHOLDER_TITLE);
        assert_eq!(snapshot.next_milestone.title, PLACEHOLDER_TITLE);
        assert_eq!(snapshot.forecast.len(), 7);
        assert!(snapshot.short_horizon.is_none());
        assert_eq!(snapshot.alerts[0].kind, AlertKind::Info);
        assert_eq!(snapshot.velocity.recommendation, VelocityRecommendation::Consult);
        assert_eq!(snapshot.recovery_status, RecoveryStatus::NeedsAttention);
    }

    #[test]
    fn test_snapshot_labels_recovery_progress() {
        let start = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
        // pain 6 -> 4 with flat activity over 3 entries: 20 / 3
        let entries: Vec<MetricEntry> = [6u8, 5, 4]
            .iter()
            .enumerate()
            .map(|(i, &pain)| {
                MetricEntry::new(start + Duration::days(i as i64), pain, ActivityLevel::Medium)
            })
            .collect();
        let insights = Insights {
            recovery_score: Some(55.0),
            ..Insights::default()
        };

        let snapshot = RecoveryEngine::new().snapshot(&entries, Some(&insights), as_of());
        assert_eq!(snapshot.velocity.recommendation, VelocityRecommendation::Maintain);
        assert_eq!(snapshot.recovery_status, RecoveryStatus::Progressing);
    }

    #[test]
    fn test_risk_assessment_carries_factors() {
        let start = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
        let entries: Vec<MetricEntry> = [8u8, 8, 9]
            .iter()
            .enumerate()
            .map(|(i, &pain)| {
                MetricEntry::new(start + Duration::days(i as i64), pain, ActivityLevel::Low)
                    .with_temperature(38.6)
                    .with_heart_rate(104)
            })
            .collect();

        let insights = Insights {
            baseline: Some(Baseline {
                pain_baseline: 6.0,
                temp_baseline: 36.8,
                hr_baseline: 75.0,
            }),
            ..Insights::default()
        };

        let engine = RecoveryEngine::new();
        assert_eq!(
            engine.risk_assessment(&entries, None).message,
            INSUFFICIENT_DATA_MESSAGE
        );

        // 30 pain + 40 fever + 25 heart rate
        let result = engine.risk_assessment(&entries, Some(&insights));
        assert_eq!(result.score, 95);

        assert_eq!(result.level, RiskLevel::High);
        assert!(!result.factors.is_empty());
        assert!(result.protective_factors.is_empty());
    }

    #[test]
    fn test_forecast_horizon_override() {
        let engine = RecoveryEngine::new();
        assert_eq!(engine.forecast(&[], None, Some(3)).len(), 3);
        assert_eq!(engine.forecast(&[], None, None).len(), 7);

        let snapshot = engine.snapshot_with_days(&[], None, as_of(), Some(14));
        assert_eq!(snapshot.forecast.len(), 14);
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let engine = RecoveryEngine::new();
        let entries = vec![MetricEntry::new(as_of(), 4, ActivityLevel::Medium)];
        let snapshot = engine.snapshot(&entries, Some(&Insights::default()), as_of());

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: DashboardSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entry_count, 1);
        assert_eq!(back.latest_entry, snapshot.latest_entry);
        assert_eq!(back.timeline, snapshot.timeline);
        assert_eq!(back.current_risk.score, snapshot.current_risk.score);
        assert_eq!(back.forecast.len(), snapshot.forecast.len());
    }
}
