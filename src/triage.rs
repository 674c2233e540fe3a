//! Status triage for a newly submitted entry
//!
//! Reference implementation of the classification the analysis service
//! attaches to every submission. The new entry is compared against the
//! patient's own prior entries; the first matching rule decides the status.

use crate::models::{
    trailing, ActivityLevel, MetricEntry, SubmissionMetrics, SubmissionResponse, SubmissionStatus,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Entries (including the new one) needed before rules apply
    pub min_entries: usize,
    /// Most recent entries considered
    pub history_limit: usize,
    /// Temperatures strictly above this (°C) are critical
    pub critical_temp: f64,
    pub critical_pain: f64,
    /// Heart rates strictly above this at low activity raise a warning
    pub resting_hr_limit: f64,
    /// Activity scores below this count as low activity
    pub low_activity_below: f64,
    /// Pain above baseline mean by more than this raises a warning
    pub pain_escalation_margin: f64,
    /// Ordinal steps below average activity that raise a warning
    pub activity_decline_steps: f64,
    /// Ordinal steps either side of average that read as stable
    pub activity_stable_steps: f64,
}

impl Default for TriageConfig {
    fn default() -> Self {
        TriageConfig {
            min_entries: 3,
            history_limit: 50,
            critical_temp: 38.5,
            critical_pain: 8.0,
            resting_hr_limit: 105.0,
            low_activity_below: 4.0,
            pain_escalation_margin: 2.0,
            activity_decline_steps: 1.0,
            activity_stable_steps: 0.5,
        }
    }
}

pub const ACQUIRING_BASELINE: &str = "Acquiring clinical baseline. Please continue monitoring.";
pub const NORMAL_REASON: &str = "Recovery is progressing within optimal clinical parameters.";
pub const ACTIVITY_DECLINE_REASON: &str =
    "Notable decline in activity levels observed. AI monitoring for secondary symptoms.";

pub struct SubmissionTriage {
    config: TriageConfig,
}

impl SubmissionTriage {
    pub fn new() -> Self {
        SubmissionTriage {
            config: TriageConfig::default(),
        }
    }

    pub fn with_config(config: TriageConfig) -> Self {
        SubmissionTriage { config }
    }

    /// Classify the last entry of `history` against the entries before it
    pub fn assess(&self, history: &[MetricEntry]) -> SubmissionResponse {
        let cfg = &self.config;
        let history = trailing(history, cfg.history_limit);

        let Some((latest, prior)) = history.split_last() else {
            return Self::acquiring_baseline();
        };
        if history.len() < cfg.min_entries {
            return Self::acquiring_baseline();
        }

        let pain_mean = mean(prior.iter().map(MetricEntry::pain));
        let pain_std = sample_std_dev(prior.iter().map(MetricEntry::pain), pain_mean);
        let activity_mean = mean(prior.iter().map(MetricEntry::activity_score));

        let latest_activity = latest.activity_score();
        let step = ActivityLevel::ORDINAL_STEP;
        let pain = latest.pain();

        let (status, reason, alert_provider) = if latest
            .temperature
            .is_some_and(|t| t > cfg.critical_temp)
        {
            (
                SubmissionStatus::Critical,
                format!(
                    "Hyperpyrexia detected (Fever > {:.1}°C). Immediate clinical intervention advised.",
                    cfg.critical_temp
                ),
                true,
            )
        } else if pain >= cfg.critical_pain {
            (
                SubmissionStatus::Critical,
                "Severe breakthrough pain reported. Surgical team notified for medication review."
                    .to_string(),
                true,
            )
        } else if latest
            .heart_rate
            .is_some_and(|hr| f64::from(hr) > cfg.resting_hr_limit)
            && latest_activity < cfg.low_activity_below
        {
            (
                SubmissionStatus::Warning,
                "Elevated resting heart rate detected. Ensure adequate hydration and rest."
                    .to_string(),
                false,
            )
        } else if pain_std > 0.0 && pain > pain_mean + cfg.pain_escalation_margin {
            (
                SubmissionStatus::Warning,
                format!(
                    "Significant pain escalation (+{:.1} vs baseline). Monitoring intensified.",
                    pain - pain_mean
                ),
                false,
            )
        } else if latest_activity < activity_mean - cfg.activity_decline_steps * step {
            (
                SubmissionStatus::Warning,
                ACTIVITY_DECLINE_REASON.to_string(),
                false,
            )
        } else {
            (SubmissionStatus::Normal, NORMAL_REASON.to_string(), false)
        };

        let activity_trend = if (latest_activity - activity_mean).abs() < cfg.activity_stable_steps * step {
            "Stable"
        } else if latest_activity < activity_mean {
            "Decreasing"
        } else {
            "Increasing"
        };

        if alert_provider {
            info!(%status, pain, "submission requires provider alert");
        } else {
            debug!(%status, pain_mean, pain_std, activity_mean, "submission triaged");
        }

        SubmissionResponse {
            status,
            reason,
            alert_provider,
            metrics: Some(SubmissionMetrics {
                pain_avg: pain_mean,
                activity_trend: activity_trend.to_string(),
                entries_count: history.len(),
            }),
        }
    }

    fn acquiring_baseline() -> SubmissionResponse {
        SubmissionResponse {
            status: SubmissionStatus::Normal,
            reason: ACQUIRING_BASELINE.to_string(),
            alert_provider: false,
            metrics: None,
        }
    }
}

impl Default for SubmissionTriage {
    fn default() -> Self {
        Self::new()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Sample standard deviation (n - 1 denominator); 0 for fewer than two values
fn sample_std_dev(values: impl Iterator<Item = f64>, mean: f64) -> f64 {
    let (sum_sq, count) = values.fold((0.0, 0usize), |(sum_sq, count), v| {
        (sum_sq + (v - mean).powi(2), count + 1)
    });
    if count < 2 {
        0.0
    } else {
        (sum_sq / (count - 1) as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn history(points: &[(u8, f64, u16, ActivityLevel)]) -> Vec<MetricEntry> {
        let start = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
        points
            .iter()
            .enumerate()
            .map(|(i, &(pain, temp, hr, activity))| {
                MetricEntry::new(start + Duration::days(i as i64), pain, activity)
                    .with_temperature(temp)
                    .with_heart_rate(hr)
            })
            .collect()
    }

    #[test]
    fn test_acquiring_baseline() {
        let triage = SubmissionTriage::new();
        let response = triage.assess(&history(&[
            (9, 39.5, 120, ActivityLevel::Low),
            (9, 39.5, 120, ActivityLevel::Low),
        ]));

        assert_eq!(response.status, SubmissionStatus::Normal);
        assert_eq!(response.reason, ACQUIRING_BASELINE);
        assert!(!response.alert_provider);
        assert!(response.metrics.is_none());

        assert_eq!(triage.assess(&[]).reason, ACQUIRING_BASELINE);
    }

    #[test]
    fn test_fever_is_critical() {
        let triage = SubmissionTriage::new();
        let response = triage.assess(&history(&[
            (4, 37.0, 80, ActivityLevel::Medium),
            (4, 37.0, 80, ActivityLevel::Medium),
            (4, 38.6, 80, ActivityLevel::Medium),
        ]));

        assert_eq!(response.status, SubmissionStatus::Critical);
        assert!(response.alert_provider);
        assert!(response.reason.starts_with("Hyperpyrexia"));
    }

    #[test]
    fn test_fever_boundary_is_exclusive() {
        let triage = SubmissionTriage::new();
        let response = triage.assess(&history(&[
            (4, 37.0, 80, ActivityLevel::Medium),
            (4, 37.0, 80, ActivityLevel::Medium),
            (4, 38.5, 80, ActivityLevel::Medium),
        ]));
        assert_eq!(response.status, SubmissionStatus::Normal);
    }

    #[test]
    fn test_severe_pain_is_critical() {
        let triage = SubmissionTriage::new();
        let response = triage.assess(&history(&[
            (7, 37.0, 80, ActivityLevel::Medium),
            (7, 37.0, 80, ActivityLevel::Medium),
            (8, 37.0, 80, ActivityLevel::Medium),
        ]));

        assert_eq!(response.status, SubmissionStatus::Critical);
        assert!(response.reason.contains("breakthrough pain"));
    }

    #[test]
    fn test_resting_heart_rate_warning() {
        let triage = SubmissionTriage::new();
        let response = triage.assess(&history(&[
            (3, 37.0, 80, ActivityLevel::Low),
            (3, 37.0, 80, ActivityLevel::Low),
            (3, 37.0, 110, ActivityLevel::Low),
        ]));

        assert_eq!(response.status, SubmissionStatus::Warning);
        assert!(!response.alert_provider);
        assert!(response.reason.contains("resting heart rate"));
    }

    #[test]
    fn test_pain_escalation_warning() {
        let triage = SubmissionTriage::new();
        let response = triage.assess(&history(&[
            (2, 37.0, 80, ActivityLevel::Medium),
            (4, 37.0, 80, ActivityLevel::Medium),
            (6, 37.0, 80, ActivityLevel::Medium),
        ]));

        assert_eq!(response.status, SubmissionStatus::Warning);
        assert_eq!(
            response.reason,
            "Significant pain escalation (+3.0 vs baseline). Monitoring intensified."
        );
        let metrics = response.metrics.unwrap();
        assert_eq!(metrics.pain_avg, 3.0);
        assert_eq!(metrics.entries_count, 3);
    }

    #[test]
    fn test_flat_pain_history_never_escalates() {
        let triage = SubmissionTriage::new();
        // Zero spread in the baseline disables the escalation rule
        let response = triage.assess(&history(&[
            (2, 37.0, 80, ActivityLevel::Medium),
            (2, 37.0, 80, ActivityLevel::Medium),
            (7, 37.0, 80, ActivityLevel::Medium),
        ]));
        assert_eq!(response.status, SubmissionStatus::Normal);
    }

    #[test]
    fn test_activity_decline_warning() {
        let triage = SubmissionTriage::new();
        let response = triage.assess(&history(&[
            (3, 37.0, 80, ActivityLevel::High),
            (3, 37.0, 80, ActivityLevel::High),
            (3, 37.0, 80, ActivityLevel::Low),
        ]));

        assert_eq!(response.status, SubmissionStatus::Warning);
        assert_eq!(
            response.reason,
            "Notable decline in activity levels observed. AI monitoring for secondary symptoms."
        );
        assert_eq!(response.metrics.unwrap().activity_trend, "Decreasing");
    }

    #[test]
    fn test_normal_with_trend_metrics() {
        let triage = SubmissionTriage::new();
        let response = triage.assess(&history(&[
            (4, 37.0, 80, ActivityLevel::Low),
            (3, 37.0, 78, ActivityLevel::Medium),
            (3, 36.9, 76, ActivityLevel::High),
        ]));

        assert_eq!(response.status, SubmissionStatus::Normal);
        assert_eq!(response.reason, NORMAL_REASON);
        assert_eq!(response.metrics.unwrap().activity_trend, "Increasing");
    }

    #[test]
    fn test_history_limit() {
        let triage = SubmissionTriage::with_config(TriageConfig {
            history_limit: 3,
            ..TriageConfig::default()
        });
        let points: Vec<_> = (0..10)
            .map(|_| (3, 37.0, 80, ActivityLevel::Medium))
            .collect();

        let response = triage.assess(&history(&points));
        assert_eq!(response.metrics.unwrap().entries_count, 3);
    }

    #[test]
    fn test_sample_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(values.iter().copied());
        assert_eq!(m, 5.0);
        let std = sample_std_dev(values.iter().copied(), m);
        assert!((std - 2.138089935299395).abs() < 1e-12);
        assert_eq!(sample_std_dev([1.0].into_iter(), 1.0), 0.0);
    }
}
