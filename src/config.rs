use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::VitalSentinelError;
use crate::factors::FactorConfig;
use crate::forecast::{ForecastConfig, MAX_FORECAST_DAYS};
use crate::logging::LogConfig;
use crate::milestones::{MilestoneConfig, MAX_MILESTONE_DAYS};
use crate::risk::{PointInTimeRiskConfig, RiskLevelBands, TrajectoryRiskConfig};
use crate::triage::TriageConfig;
use crate::velocity::VelocityConfig;
use crate::vitals::VitalThresholds;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// Logging settings
    #[serde(default)]
    pub logging: LogConfig,

    /// General engine settings
    #[serde(default)]
    pub engine: EngineSettings,

    /// Clinical thresholds used by every derivation
    #[serde(default)]
    pub thresholds: ClinicalThresholds,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// General engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Days projected by the forecast series unless overridden
    pub forecast_days: u32,

    /// Most recent entries loaded from a history file (0 for all)
    pub history_limit: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            forecast_days: 7,
            history_limit: 100,
        }
    }
}

/// Heuristic clinical thresholds, one section per derivation
///
/// These are illustrative heuristics, not validated medical guidance. Every
/// section falls back to its defaults so a config file only needs the values
/// it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicalThresholds {
    pub vitals: VitalThresholds,
    pub velocity: VelocityConfig,
    pub trajectory: TrajectoryRiskConfig,
    pub point_in_time: PointInTimeRiskConfig,
    pub factors: FactorConfig,
    pub milestones: MilestoneConfig,
    pub forecast: ForecastConfig,
    pub triage: TriageConfig,
}

fn require(ok: bool, field: &str, rule: &str) -> crate::error::Result<()> {
    if ok {
        Ok(())
    } else {
        Err(VitalSentinelError::Configuration(format!("{} {}", field, rule)))
    }
}

fn require_finite(field: &str, values: &[f64]) -> crate::error::Result<()> {
    require(values.iter().all(|v| v.is_finite()), field, "must be finite numbers")
}

fn require_ordered_bands(field: &str, bands: &RiskLevelBands) -> crate::error::Result<()> {
    require(
        bands.low_below <= bands.moderate_below,
        field,
        "must have low_below <= moderate_below",
    )
}

impl ClinicalThresholds {
    /// Reject values the derivations cannot work with
    pub fn validate(&self) -> crate::error::Result<()> {
        let velocity = &self.velocity;
        require(
            velocity.limit.is_finite() && velocity.limit >= 0.0,
            "thresholds.velocity.limit",
            "must be a non-negative number",
        )?;
        require(velocity.window > 0, "thresholds.velocity.window", "must be at least 1")?;
        require_finite(
            "thresholds.velocity",
            &[
                velocity.pain_weight,
                velocity.activity_weight,
                velocity.excellent_above,
                velocity.good_above,
                velocity.stable_above,
                velocity.maintain_above,
                velocity.monitor_above,
            ],
        )?;

        require_ordered_bands("thresholds.trajectory.levels", &self.trajectory.levels)?;
        require_ordered_bands("thresholds.point_in_time.levels", &self.point_in_time.levels)?;

        let milestones = &self.milestones;
        let longest = [
            milestones.slow_days,
            milestones.average_days,
            milestones.fast_days,
            milestones.pain_management_days,
            milestones.mobility_days,
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        require(
            longest <= MAX_MILESTONE_DAYS,
            "thresholds.milestones",
            &format!("day offsets must not exceed {}", MAX_MILESTONE_DAYS),
        )?;
        require_finite(
            "thresholds.milestones",
            &[milestones.slow_slope_min, milestones.fast_slope_max],
        )?;

        let forecast = &self.forecast;
        require(
            forecast.default_days <= MAX_FORECAST_DAYS,
            "thresholds.forecast.default_days",
            &format!("must not exceed {}", MAX_FORECAST_DAYS),
        )?;
        require_finite(
            "thresholds.forecast",
            &[
                forecast.default_slope,
                forecast.default_confidence,
                forecast.hr_decline_per_day,
                forecast.confidence_decay_per_day,
                forecast.confidence_floor,
                forecast.default_heart_rate,
                forecast.short_horizon_default_slope,
            ],
        )?;

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            logging: LogConfig::default(),
            engine: EngineSettings::default(),
            thresholds: ClinicalThresholds::default(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config.validate().with_context(|| {
            format!("Invalid configuration in {}", path.as_ref().display())
        })?;

        Ok(config)
    }

    /// Check every section for values the engine cannot use
    pub fn validate(&self) -> crate::error::Result<()> {
        require(
            self.engine.forecast_days <= MAX_FORECAST_DAYS,
            "engine.forecast_days",
            &format!("must not exceed {}", MAX_FORECAST_DAYS),
        )?;
        self.thresholds.validate()
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(&*self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vitalsentinel")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::debug!(
                    path = %config_path.display(),
                    error = %err,
                    "config file not loaded, using defaults"
                );
                Self::default()
            }
        }
    }
}
