use crate::models::MetricEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vital sign being classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalMetric {
    Pain,
    HeartRate,
    Activity,
}

impl fmt::Display for VitalMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VitalMetric::Pain => write!(f, "Pain"),
            VitalMetric::HeartRate => write!(f, "Heart Rate"),
            VitalMetric::Activity => write!(f, "Activity"),
        }
    }
}

/// Ordinal band a vital falls into
///
/// `Elevated` applies to pain and heart rate, `Low` to activity. `Baseline`
/// is the neutral band reported before any entry exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VitalBand {
    Baseline,
    Optimal,
    Moderate,
    Elevated,
    Low,
}

impl fmt::Display for VitalBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VitalBand::Baseline => write!(f, "baseline"),
            VitalBand::Optimal => write!(f, "optimal"),
            VitalBand::Moderate => write!(f, "moderate"),
            VitalBand::Elevated => write!(f, "elevated"),
            VitalBand::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalStatus {
    pub metric: VitalMetric,
    /// Observed value; absent for the baseline status
    pub value: Option<f64>,
    pub band: VitalBand,
}

impl VitalStatus {
    fn baseline(metric: VitalMetric) -> Self {
        VitalStatus {
            metric,
            value: None,
            band: VitalBand::Baseline,
        }
    }
}

/// Status of every tracked vital for the most recent entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    pub pain: VitalStatus,
    pub heart_rate: VitalStatus,
    pub activity: VitalStatus,
}

impl VitalSigns {
    pub fn iter(&self) -> impl Iterator<Item = &VitalStatus> {
        [&self.pain, &self.heart_rate, &self.activity].into_iter()
    }
}

/// Band boundaries for the live vitals panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalThresholds {
    /// Pain at or below this is optimal
    pub pain_optimal_max: f64,
    /// Pain at or below this (and above optimal) is moderate
    pub pain_moderate_max: f64,
    pub hr_optimal_max: f64,
    pub hr_moderate_max: f64,
    /// Activity at or above this is optimal
    pub activity_optimal_min: f64,
    pub activity_moderate_min: f64,
    /// Heart rate assumed when an entry has none (bpm)
    pub default_heart_rate: f64,
}

impl Default for VitalThresholds {
    fn default() -> Self {
        VitalThresholds {
            pain_optimal_max: 3.0,
            pain_moderate_max: 6.0,
            hr_optimal_max: 80.0,
            hr_moderate_max: 90.0,
            activity_optimal_min: 7.0,
            activity_moderate_min: 4.0,
            default_heart_rate: 75.0,
        }
    }
}

/// Classifies the latest entry's vitals into ordinal bands
pub struct VitalStatusClassifier {
    config: VitalThresholds,
}

impl VitalStatusClassifier {
    pub fn new() -> Self {
        VitalStatusClassifier {
            config: VitalThresholds::default(),
        }
    }

    pub fn with_config(config: VitalThresholds) -> Self {
        VitalStatusClassifier { config }
    }

    /// Classify the last entry of an ascending series
    pub fn classify_latest(&self, entries: &[MetricEntry]) -> VitalSigns {
        self.classify(entries.last())
    }

    pub fn classify(&self, latest: Option<&MetricEntry>) -> VitalSigns {
        let Some(entry) = latest else {
            return VitalSigns {
                pain: VitalStatus::baseline(VitalMetric::Pain),
                heart_rate: VitalStatus::baseline(VitalMetric::HeartRate),
                activity: VitalStatus::baseline(VitalMetric::Activity),
            };
        };

        let pain = entry.pain();
        let heart_rate = entry.heart_rate_or(self.config.default_heart_rate);
        let activity = entry.activity_score();

        VitalSigns {
            pain: VitalStatus {
                metric: VitalMetric::Pain,
                value: Some(pain),
                band: self.pain_band(pain),
            },
            heart_rate: VitalStatus {
                metric: VitalMetric::HeartRate,
                value: Some(heart_rate),
                band: self.heart_rate_band(heart_rate),
            },
            activity: VitalStatus {
                metric: VitalMetric::Activity,
                value: Some(activity),
                band: self.activity_band(activity),
            },
        }
    }

    pub fn pain_band(&self, pain: f64) -> VitalBand {
        if pain <= self.config.pain_optimal_max {
            VitalBand::Optimal
        } else if pain <= self.config.pain_moderate_max {
            VitalBand::Moderate
        } else {
            VitalBand::Elevated
        }
    }

    pub fn heart_rate_band(&self, heart_rate: f64) -> VitalBand {
        if heart_rate <= self.config.hr_optimal_max {
            VitalBand::Optimal
        } else if heart_rate <= self.config.hr_moderate_max {
            VitalBand::Moderate
        } else {
            VitalBand::Elevated
        }
    }

    pub fn activity_band(&self, activity: f64) -> VitalBand {
        if activity >= self.config.activity_optimal_min {
            VitalBand::Optimal
        } else if activity >= self.config.activity_moderate_min {
            VitalBand::Moderate
        } else {
            VitalBand::Low
        }
    }
}

impl Default for VitalStatusClassifier {
    fn default() -> Self {
        Self::new()
    }
}
