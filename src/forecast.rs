//! Short-horizon pain and heart-rate projections
//!
//! Projections extend the recent average linearly along the externally
//! supplied pain slope. They are display heuristics, not statistical
//! forecasts.

use crate::models::{trailing, Insights, MetricEntry};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Projected vitals for one future day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Days after the latest entry, starting at 1
    pub day_offset: u32,
    /// Clamped to `[0, 10]`
    pub predicted_pain: f64,
    /// Clamped to `[60, 100]`
    pub predicted_hr: f64,
    /// Clamped to `[0, 100]`
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonPrediction {
    pub pain: f64,
    pub confidence: f64,
}

/// Tomorrow and next-week pain projections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortHorizonForecast {
    pub tomorrow: HorizonPrediction,
    pub next_week: HorizonPrediction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub default_days: u32,
    /// Trailing entries averaged as the projection's starting point
    pub window: usize,
    /// Slope used when the insights carry none (pain points per day)
    pub default_slope: f64,
    /// Trend confidence used when the insights carry none (0-1)
    pub default_confidence: f64,
    pub hr_decline_per_day: f64,
    pub confidence_decay_per_day: f64,
    pub confidence_floor: f64,
    pub default_heart_rate: f64,
    /// Flat series reported before any entry exists
    pub empty_pain: f64,
    pub empty_hr: f64,
    pub short_horizon_default_slope: f64,
    pub tomorrow_confidence: f64,
    pub next_week_confidence: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            default_days: 7,
            window: 5,
            default_slope: -0.1,
            default_confidence: 0.5,
            hr_decline_per_day: 0.5,
            confidence_decay_per_day: 5.0,
            confidence_floor: 30.0,
            default_heart_rate: 75.0,
            empty_pain: 5.0,
            empty_hr: 75.0,
            short_horizon_default_slope: -0.15,
            tomorrow_confidence: 82.0,
            next_week_confidence: 68.0,
        }
    }
}

/// Longest horizon a configuration or command may request
pub const MAX_FORECAST_DAYS: u32 = 365;

pub const PAIN_RANGE: (f64, f64) = (0.0, 10.0);
pub const HR_RANGE: (f64, f64) = (60.0, 100.0);
pub const CONFIDENCE_RANGE: (f64, f64) = (0.0, 100.0);

fn clamp_to(value: f64, (min, max): (f64, f64)) -> f64 {
    value.clamp(min, max)
}

/// Produces the multi-day predicted series
pub struct ForecastSeriesGenerator {
    config: ForecastConfig,
}

impl ForecastSeriesGenerator {
    pub fn new() -> Self {
        ForecastSeriesGenerator {
            config: ForecastConfig::default(),
        }
    }

    pub fn with_config(config: ForecastConfig) -> Self {
        ForecastSeriesGenerator { config }
    }

    pub fn default_days(&self) -> u32 {
        self.config.default_days
    }

    /// Predicted series for days `1..=days`
    ///
    /// For day `d`:
    ///
    /// ```text
    /// pain       = clamp(avg_pain + slope * d, 0, 10)
    /// hr         = clamp(avg_hr - 0.5 * d, 60, 100)
    /// confidence = max(30, trend_confidence * 100 - 5 * d)
    /// ```
    pub fn generate(
        &self,
        entries: &[MetricEntry],
        insights: Option<&Insights>,
        days: u32,
    ) -> Vec<ForecastPoint> {
        let cfg = &self.config;

        let recent = trailing(entries, cfg.window);
        if recent.is_empty() {
            return (1..=days)
                .map(|day_offset| ForecastPoint {
                    day_offset,
                    predicted_pain: clamp_to(cfg.empty_pain, PAIN_RANGE),
                    predicted_hr: clamp_to(cfg.empty_hr, HR_RANGE),
                    confidence: 0.0,
                })
                .collect();
        }

        let count = recent.len() as f64;
        let avg_pain = recent.iter().map(MetricEntry::pain).sum::<f64>() / count;
        let avg_hr = recent
            .iter()
            .map(|e| e.heart_rate_or(cfg.default_heart_rate))
            .sum::<f64>()
            / count;

        let slope = insights
            .and_then(Insights::pain_slope)
            .unwrap_or(cfg.default_slope);
        let trend_confidence = insights
            .and_then(Insights::pain_confidence)
            .unwrap_or(cfg.default_confidence);

        debug!(avg_pain, avg_hr, slope, trend_confidence, days, "generating forecast series");

        (1..=days)
            .map(|day_offset| {
                let d = f64::from(day_offset);
                let confidence = (trend_confidence * 100.0 - cfg.confidence_decay_per_day * d)
                    .max(cfg.confidence_floor);

                ForecastPoint {
                    day_offset,
                    predicted_pain: clamp_to(avg_pain + slope * d, PAIN_RANGE),
                    predicted_hr: clamp_to(avg_hr - cfg.hr_decline_per_day * d, HR_RANGE),
                    confidence: clamp_to(confidence, CONFIDENCE_RANGE),
                }
            })
            .collect()
    }

    /// Tomorrow and next-week projections from the current pain
    ///
    /// Uses fixed confidences rather than the decayed ones of
    /// [`generate`](Self::generate). Requires a baseline; without entries
    /// the baseline pain is the starting point.
    pub fn short_horizon(
        &self,
        entries: &[MetricEntry],
        insights: Option<&Insights>,
    ) -> Option<ShortHorizonForecast> {
        let cfg = &self.config;
        let insights = insights?;
        let baseline = insights.baseline.as_ref()?;

        let current_pain = entries
            .last()
            .map(MetricEntry::pain)
            .unwrap_or(baseline.pain_baseline);
        let slope = insights
            .pain_slope()
            .unwrap_or(cfg.short_horizon_default_slope);

        Some(ShortHorizonForecast {
            tomorrow: HorizonPrediction {
                pain: clamp_to(current_pain + slope, PAIN_RANGE),
                confidence: clamp_to(cfg.tomorrow_confidence, CONFIDENCE_RANGE),
            },
            next_week: HorizonPrediction {
                pain: clamp_to(current_pain + slope * 7.0, PAIN_RANGE),
                confidence: clamp_to(cfg.next_week_confidence, CONFIDENCE_RANGE),
            },
        })
    }
}

impl Default for ForecastSeriesGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityLevel, Baseline, PainTrend, Trends};
    use chrono::{Duration, TimeZone, Utc};

    fn entries(points: &[(u8, u16)]) -> Vec<MetricEntry> {
        let start = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
        points
            .iter()
            .enumerate()
            .map(|(i, &(pain, hr))| {
                MetricEntry::new(start + Duration::days(i as i64), pain, ActivityLevel::Medium)
                    .with_heart_rate(hr)
            })
            .collect()
    }

    fn insights(slope: Option<f64>, confidence: Option<f64>) -> Insights {
        Insights {
            baseline: Some(Baseline {
                pain_baseline: 6.0,
                temp_baseline: 36.8,
                hr_baseline: 75.0,
            }),
            trends: Trends {
                pain: Some(PainTrend {
                    slope,
                    confidence,
                    ..PainTrend::default()
                }),
                ..Trends::default()
            },
            ..Insights::default()
        }
    }

    #[test]
    fn test_flat_series_without_entries() {
        let generator = ForecastSeriesGenerator::new();
        let series = generator.generate(&[], None, 7);

        assert_eq!(series.len(), 7);
        for (i, point) in series.iter().enumerate() {
            assert_eq!(point.day_offset, i as u32 + 1);
            assert_eq!(point.predicted_pain, 5.0);
            assert_eq!(point.predicted_hr, 75.0);
            assert_eq!(point.confidence, 0.0);
        }
    }

    #[test]
    fn test_linear_projection() {
        let generator = ForecastSeriesGenerator::new();
        let insights = insights(Some(-0.5), Some(0.9));
        // Only the last five entries count: avg pain 6, avg hr 80
        let history = entries(&[(10, 120), (8, 84), (7, 82), (6, 80), (5, 78), (4, 76)]);

        let series = generator.generate(&history, Some(&insights), 3);
        assert_eq!(series.len(), 3);

        assert!((series[0].predicted_pain - 5.5).abs() < 1e-9);
        assert!((series[0].predicted_hr - 79.5).abs() < 1e-9);
        assert!((series[0].confidence - 85.0).abs() < 1e-9);

        assert!((series[2].predicted_pain - 4.5).abs() < 1e-9);
        assert!((series[2].predicted_hr - 78.5).abs() < 1e-9);
        assert!((series[2].confidence - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_slope_and_confidence() {
        let generator = ForecastSeriesGenerator::new();
        let series = generator.generate(&entries(&[(4, 70)]), None, 2);

        assert!((series[0].predicted_pain - 3.9).abs() < 1e-9);
        assert!((series[0].confidence - 45.0).abs() < 1e-9);
        assert!((series[1].confidence - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_floor_and_clamps() {
        let generator = ForecastSeriesGenerator::new();
        let insights = insights(Some(2.0), Some(0.2));
        let series = generator.generate(&entries(&[(9, 130), (9, 130)]), Some(&insights), 14);

        for point in &series {
            assert_eq!(point.confidence, 30.0);
            assert!(point.predicted_pain <= 10.0);
            assert!(point.predicted_hr <= 100.0);
        }
        assert_eq!(series[13].predicted_pain, 10.0);
        assert_eq!(series[0].predicted_hr, 100.0);

        let falling = insights_falling();
        let low = generator.generate(&entries(&[(1, 55)]), Some(&falling), 5);
        assert!(low.iter().all(|p| p.predicted_pain == 0.0 && p.predicted_hr == 60.0));
    }

    fn insights_falling() -> Insights {
        insights(Some(-3.0), Some(1.5))
    }

    #[test]
    fn test_confidence_never_exceeds_hundred() {
        let generator = ForecastSeriesGenerator::new();
        let series = generator.generate(&entries(&[(5, 75)]), Some(&insights_falling()), 3);
        assert!(series.iter().all(|p| p.confidence <= 100.0));
    }

    #[test]
    fn test_short_horizon_requires_baseline() {
        let generator = ForecastSeriesGenerator::new();
        assert!(generator.short_horizon(&entries(&[(5, 75)]), None).is_none());

        let no_baseline = Insights::default();
        assert!(generator
            .short_horizon(&entries(&[(5, 75)]), Some(&no_baseline))
            .is_none());
    }

    #[test]
    fn test_short_horizon_fixed_confidences() {
        let generator = ForecastSeriesGenerator::new();
        let insights = insights(Some(-0.2), Some(0.9));

        let forecast = generator
            .short_horizon(&entries(&[(7, 80), (5, 78)]), Some(&insights))
            .unwrap();
        assert!((forecast.tomorrow.pain - 4.8).abs() < 1e-9);
        assert_eq!(forecast.tomorrow.confidence, 82.0);
        assert!((forecast.next_week.pain - 3.6).abs() < 1e-9);
        assert_eq!(forecast.next_week.confidence, 68.0);
    }

    #[test]
    fn test_short_horizon_uses_baseline_and_default_slope() {
        let generator = ForecastSeriesGenerator::new();
        let insights = insights(None, None);

        let forecast = generator.short_horizon(&[], Some(&insights)).unwrap();
        assert!((forecast.tomorrow.pain - 5.85).abs() < 1e-9);
        assert!((forecast.next_week.pain - 4.95).abs() < 1e-9);
    }
}
