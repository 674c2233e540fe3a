use crate::models::{Insights, MetricEntry, TrendDirection};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorSeverity {
    High,
    Moderate,
}

impl fmt::Display for FactorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorSeverity::High => write!(f, "high"),
            FactorSeverity::Moderate => write!(f, "moderate"),
        }
    }
}

/// A triggered risk factor, ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub severity: FactorSeverity,
    pub description: String,
}

pub const SEVERE_PAIN: &str = "Severe Pain";
pub const ELEVATED_TEMPERATURE: &str = "Elevated Temperature";
pub const WORSENING_PAIN_TREND: &str = "Worsening Pain Trend";
pub const REDUCED_ACTIVITY: &str = "Reduced Activity";
pub const ELEVATED_HEART_RATE: &str = "Elevated Heart Rate";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorConfig {
    pub min_entries: usize,
    pub severe_pain: f64,
    pub fever_temp: f64,
    /// Heart rate margin above baseline that counts as elevated (bpm)
    pub hr_margin: f64,
    /// Logged entries needed for the consistency factor
    pub streak_entries: usize,
    pub high_recovery_score: f64,
}

impl Default for FactorConfig {
    fn default() -> Self {
        FactorConfig {
            min_entries: 3,
            severe_pain: 7.0,
            fever_temp: 38.0,
            hr_margin: 15.0,
            streak_entries: 7,
            high_recovery_score: 70.0,
        }
    }
}

/// Lists the risk factors triggered by the latest entry and trends
///
/// Factors come out in a fixed evaluation order: pain, temperature, pain
/// trend, activity trend, heart rate.
pub struct RiskFactorExtractor {
    config: FactorConfig,
}

impl RiskFactorExtractor {
    pub fn new() -> Self {
        RiskFactorExtractor {
            config: FactorConfig::default(),
        }
    }

    pub fn with_config(config: FactorConfig) -> Self {
        RiskFactorExtractor { config }
    }

    pub fn extract(&self, entries: &[MetricEntry], insights: Option<&Insights>) -> Vec<RiskFactor> {
        let cfg = &self.config;
        let mut factors = Vec::new();

        if entries.len() < cfg.min_entries {
            return factors;
        }
        let Some(insights) = insights else {
            return factors;
        };
        let (Some(baseline), Some(latest)) = (insights.baseline.as_ref(), entries.last()) else {
            return factors;
        };

        if latest.pain() >= cfg.severe_pain {
            factors.push(RiskFactor {
                name: SEVERE_PAIN.to_string(),
                severity: FactorSeverity::High,
                description: format!("Pain level {}/10 exceeds normal range", latest.pain_level),
            });
        }

        if let Some(temperature) = latest.temperature.filter(|t| *t >= cfg.fever_temp) {
            factors.push(RiskFactor {
                name: ELEVATED_TEMPERATURE.to_string(),
                severity: FactorSeverity::High,
                description: format!("Temperature {:.1}°C may indicate infection", temperature),
            });
        }

        if insights.pain_direction() == TrendDirection::Increasing {
            factors.push(RiskFactor {
                name: WORSENING_PAIN_TREND.to_string(),
                severity: FactorSeverity::Moderate,
                description: "Pain levels increasing over time".to_string(),
            });
        }

        if insights.activity_direction() == TrendDirection::Declining {
            factors.push(RiskFactor {
                name: REDUCED_ACTIVITY.to_string(),
                severity: FactorSeverity::Moderate,
                description: "Activity levels declining - may slow recovery".to_string(),
            });
        }

        if let Some(heart_rate) = latest
            .heart_rate
            .filter(|hr| f64::from(*hr) > baseline.hr_baseline + cfg.hr_margin)
        {
            factors.push(RiskFactor {
                name: ELEVATED_HEART_RATE.to_string(),
                severity: FactorSeverity::Moderate,
                description: format!("HR {} bpm above baseline", heart_rate),
            });
        }

        factors
    }
}

impl Default for RiskFactorExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Lists affirming messages independent of the risk factors
pub struct ProtectiveFactorExtractor {
    config: FactorConfig,
}

impl ProtectiveFactorExtractor {
    pub fn new() -> Self {
        ProtectiveFactorExtractor {
            config: FactorConfig::default(),
        }
    }

    pub fn with_config(config: FactorConfig) -> Self {
        ProtectiveFactorExtractor { config }
    }

    pub fn extract(&self, entries: &[MetricEntry], insights: Option<&Insights>) -> Vec<String> {
        let mut factors = Vec::new();

        if entries.len() >= self.config.streak_entries {
            factors.push(format!(
                "Consistent monitoring ({}+ day streak)",
                self.config.streak_entries
            ));
        }

        let Some(insights) = insights else {
            return factors;
        };

        if insights.pain_direction() == TrendDirection::Decreasing {
            factors.push("Pain trending downward".to_string());
        }

        if insights.activity_direction() == TrendDirection::Improving {
            factors.push("Increasing activity levels".to_string());
        }

        if insights
            .recovery_score
            .is_some_and(|score| score >= self.config.high_recovery_score)
        {
            factors.push("High recovery score".to_string());
        }

        factors
    }
}

impl Default for ProtectiveFactorExtractor {
    fn default() -> Self {
        Self::new()
    }
}
