use crate::models::{trailing_average_pain, Insights, MetricEntry};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MilestoneStatus {
    Pending,
    InProgress,
    Completed,
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MilestoneStatus::Pending => write!(f, "pending"),
            MilestoneStatus::InProgress => write!(f, "in-progress"),
            MilestoneStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Pace of recovery implied by the pain-trend slope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryPace {
    Slow,
    Average,
    Fast,
}

impl fmt::Display for RecoveryPace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryPace::Slow => write!(f, "slow"),
            RecoveryPace::Average => write!(f, "average"),
            RecoveryPace::Fast => write!(f, "fast"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
    pub status: MilestoneStatus,
    pub expected_date: DateTime<Utc>,
    /// Confidence in the expected date, 0-100
    pub confidence: u8,
    /// Progress toward the milestone, 0-100, when tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneTimeline {
    pub days_to_recovery: u32,
    pub pace: RecoveryPace,
    pub milestones: Vec<Milestone>,
}

/// Single upcoming milestone chosen from recent pain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextMilestone {
    pub title: String,
    pub days: u32,
    pub progress: u8,
}

pub const PLACEHOLDER_TITLE: &str = "Begin Recovery Tracking";
pub const PAIN_MANAGEMENT: &str = "Pain Management";
pub const MOBILITY_RESTORATION: &str = "Mobility Restoration";
pub const FULL_RECOVERY: &str = "Full Recovery";

/// Largest milestone offset a configuration may ask for
pub const MAX_MILESTONE_DAYS: u32 = 3650;

/// `as_of` moved forward by whole days, saturating at the latest
/// representable instant
fn days_after(as_of: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    as_of
        .checked_add_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilestoneConfig {
    /// Slopes at or above this (pain points per day) are slow recovery
    pub slow_slope_min: f64,
    /// Slopes at or below this are fast recovery
    pub fast_slope_max: f64,
    pub slow_days: u32,
    pub average_days: u32,
    pub fast_days: u32,
    /// Pain management counts as completed with more entries than this
    pub pain_management_entries: usize,
    pub pain_management_days: u32,
    pub mobility_days: u32,
    pub pain_management_confidence: u8,
    pub mobility_confidence: u8,
    pub full_recovery_confidence: u8,
    /// Trailing entries averaged for the next-milestone card
    pub next_milestone_window: usize,
}

impl Default for MilestoneConfig {
    fn default() -> Self {
        MilestoneConfig {
            slow_slope_min: -0.05,
            fast_slope_max: -0.3,
            slow_days: 21,
            average_days: 14,
            fast_days: 7,
            pain_management_entries: 3,
            pain_management_days: 2,
            mobility_days: 7,
            pain_management_confidence: 95,
            mobility_confidence: 85,
            full_recovery_confidence: 78,
            next_milestone_window: 3,
        }
    }
}

/// Derives the staged recovery timeline from the pain-trend slope
pub struct MilestoneForecaster {
    config: MilestoneConfig,
}

impl MilestoneForecaster {
    pub fn new() -> Self {
        MilestoneForecaster {
            config: MilestoneConfig::default(),
        }
    }

    pub fn with_config(config: MilestoneConfig) -> Self {
        MilestoneForecaster { config }
    }

    /// Recovery pace for a pain slope; no slope means average
    pub fn pace(&self, slope: Option<f64>) -> RecoveryPace {
        match slope {
            Some(slope) if slope >= self.config.slow_slope_min => RecoveryPace::Slow,
            Some(slope) if slope <= self.config.fast_slope_max => RecoveryPace::Fast,
            _ => RecoveryPace::Average,
        }
    }

    pub fn days_to_recovery(&self, slope: Option<f64>) -> u32 {
        match self.pace(slope) {
            RecoveryPace::Slow => self.config.slow_days,
            RecoveryPace::Average => self.config.average_days,
            RecoveryPace::Fast => self.config.fast_days,
        }
    }

    /// Staged timeline with dates offset from `as_of`
    ///
    /// With no entries the timeline is a single "Begin Recovery Tracking"
    /// placeholder at 0% progress.
    pub fn forecast(
        &self,
        entries: &[MetricEntry],
        insights: Option<&Insights>,
        as_of: DateTime<Utc>,
    ) -> MilestoneTimeline {
        let cfg = &self.config;
        let slope = insights.and_then(Insights::pain_slope);
        let pace = self.pace(slope);
        let days_to_recovery = self.days_to_recovery(slope);

        if entries.is_empty() {
            return MilestoneTimeline {
                days_to_recovery,
                pace,
                milestones: vec![Milestone {
                    title: PLACEHOLDER_TITLE.to_string(),
                    status: MilestoneStatus::Pending,
                    expected_date: as_of,
                    confidence: 0,
                    progress: Some(0),
                }],
            };
        }

        let pain_management_status = if entries.len() > cfg.pain_management_entries {
            MilestoneStatus::Completed
        } else {
            MilestoneStatus::InProgress
        };

        let milestones = vec![
            Milestone {
                title: PAIN_MANAGEMENT.to_string(),
                status: pain_management_status,
                expected_date: days_after(as_of, cfg.pain_management_days),
                confidence: cfg.pain_management_confidence.min(100),
                progress: None,
            },
            Milestone {
                title: MOBILITY_RESTORATION.to_string(),
                status: MilestoneStatus::InProgress,
                expected_date: days_after(as_of, cfg.mobility_days),
                confidence: cfg.mobility_confidence.min(100),
                progress: None,
            },
            Milestone {
                title: FULL_RECOVERY.to_string(),
                status: MilestoneStatus::Pending,
                expected_date: days_after(as_of, days_to_recovery),
                confidence: cfg.full_recovery_confidence.min(100),
                progress: None,
            },
        ];

        debug!(?slope, %pace, days_to_recovery, "milestone timeline forecast");

        MilestoneTimeline {
            days_to_recovery,
            pace,
            milestones,
        }
    }

    /// The next milestone to work toward, picked from recent average pain
    pub fn next_milestone(&self, entries: &[MetricEntry]) -> NextMilestone {
        let Some(avg_pain) = trailing_average_pain(entries, self.config.next_milestone_window)
        else {
            return NextMilestone {
                title: PLACEHOLDER_TITLE.to_string(),
                days: 0,
                progress: 0,
            };
        };

        let (title, days, progress) = if avg_pain > 5.0 {
            (PAIN_MANAGEMENT, 7, 35)
        } else if avg_pain > 2.0 {
            (MOBILITY_RESTORATION, 14, 65)
        } else {
            (FULL_RECOVERY, 21, 85)
        };

        NextMilestone {
            title: title.to_string(),
            days,
            progress,
        }
    }
}

impl Default for MilestoneForecaster {
    fn default() -> Self {
        Self::new()
    }
}
