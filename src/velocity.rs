use crate::models::{trailing, MetricEntry};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Display interpretation of a recovery velocity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VelocityBand {
    Excellent,
    Good,
    Stable,
    Concerning,
}

impl VelocityBand {
    pub fn description(&self) -> &'static str {
        match self {
            VelocityBand::Excellent => "Rapid improvement in pain and activity",
            VelocityBand::Good => "Steady improvement",
            VelocityBand::Stable => "Little change over the recent window",
            VelocityBand::Concerning => "Recovery is slowing or reversing",
        }
    }
}

impl fmt::Display for VelocityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VelocityBand::Excellent => write!(f, "Excellent"),
            VelocityBand::Good => write!(f, "Good"),
            VelocityBand::Stable => write!(f, "Stable"),
            VelocityBand::Concerning => write!(f, "Concerning"),
        }
    }
}

/// Next step suggested by a recovery velocity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VelocityRecommendation {
    Maintain,
    Monitor,
    Consult,
}

impl VelocityRecommendation {
    pub fn message(&self) -> &'static str {
        match self {
            VelocityRecommendation::Maintain => "Maintain current recovery protocols",
            VelocityRecommendation::Monitor => "Monitor trends closely for next 48h",
            VelocityRecommendation::Consult => "Consider care provider consultation",
        }
    }
}

impl fmt::Display for VelocityRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Label for the recovery index reported by the analysis service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecoveryStatus {
    OnTrack,
    Progressing,
    NeedsAttention,
}

impl RecoveryStatus {
    /// Above 70 is on track, above 40 progressing. A missing score needs attention.
    pub fn from_score(recovery_score: Option<f64>) -> Self {
        match recovery_score {
            Some(score) if score > 70.0 => RecoveryStatus::OnTrack,
            Some(score) if score > 40.0 => RecoveryStatus::Progressing,
            _ => RecoveryStatus::NeedsAttention,
        }
    }
}

impl fmt::Display for RecoveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryStatus::OnTrack => write!(f, "On Track"),
            RecoveryStatus::Progressing => write!(f, "Progressing"),
            RecoveryStatus::NeedsAttention => write!(f, "Needs Attention"),
        }
    }
}

/// Velocity score with its display band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryVelocity {
    /// Signed score in `[-limit, limit]`; positive means improving
    pub velocity: f64,
    pub band: VelocityBand,
    pub recommendation: VelocityRecommendation,
    /// Number of entries the score was computed from (0 when insufficient)
    pub window_len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    pub min_entries: usize,
    pub window: usize,
    /// Points per unit of pain reduction
    pub pain_weight: f64,
    /// Points per unit of activity gain
    pub activity_weight: f64,
    /// Velocity is clamped to `[-limit, limit]`
    pub limit: f64,
    pub excellent_above: f64,
    pub good_above: f64,
    pub stable_above: f64,
    /// Velocity above which current protocols are kept
    pub maintain_above: f64,
    /// Velocity above which close monitoring is enough
    pub monitor_above: f64,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        VelocityConfig {
            min_entries: 3,
            window: 7,
            pain_weight: 10.0,
            activity_weight: 5.0,
            limit: 20.0,
            excellent_above: 5.0,
            good_above: 2.0,
            stable_above: -2.0,
            maintain_above: 3.0,
            monitor_above: 0.0,
        }
    }
}

/// Computes a signed rate-of-change score from recent entries
pub struct RecoveryVelocityCalculator {
    config: VelocityConfig,
}

impl RecoveryVelocityCalculator {
    pub fn new() -> Self {
        RecoveryVelocityCalculator {
            config: VelocityConfig::default(),
        }
    }

    pub fn with_config(config: VelocityConfig) -> Self {
        RecoveryVelocityCalculator { config }
    }

    /// Velocity over the trailing window
    ///
    /// ```text
    /// velocity = (pain_delta * 10 + activity_delta * 5) / window_len
    /// ```
    ///
    /// where `pain_delta = first.pain - last.pain` and
    /// `activity_delta = last.activity - first.activity`. Fewer than
    /// `min_entries` entries yields 0.
    pub fn calculate(&self, entries: &[MetricEntry]) -> f64 {
        if entries.len() < self.config.min_entries {
            return 0.0;
        }

        let window = trailing(entries, self.config.window);
        let (Some(first), Some(last)) = (window.first(), window.last()) else {
            return 0.0;
        };

        let pain_delta = first.pain() - last.pain();
        let activity_delta = last.activity_score() - first.activity_score();

        let raw = (pain_delta * self.config.pain_weight
            + activity_delta * self.config.activity_weight)
            / window.len() as f64;

        trace!(pain_delta, activity_delta, raw, window = window.len(), "velocity computed");

        let limit = self.config.limit.abs();
        raw.max(-limit).min(limit)
    }

    pub fn band(&self, velocity: f64) -> VelocityBand {
        if velocity > self.config.excellent_above {
            VelocityBand::Excellent
        } else if velocity > self.config.good_above {
            VelocityBand::Good
        } else if velocity > self.config.stable_above {
            VelocityBand::Stable
        } else {
            VelocityBand::Concerning
        }
    }

    pub fn recommend(&self, velocity: f64) -> VelocityRecommendation {
        if velocity > self.config.maintain_above {
            VelocityRecommendation::Maintain
        } else if velocity > self.config.monitor_above {
            VelocityRecommendation::Monitor
        } else {
            VelocityRecommendation::Consult
        }
    }

    /// Velocity together with its band and window size
    pub fn assess(&self, entries: &[MetricEntry]) -> RecoveryVelocity {
        let velocity = self.calculate(entries);
        let window_len = if entries.len() < self.config.min_entries {
            0
        } else {
            entries.len().min(self.config.window)
        };

        RecoveryVelocity {
            velocity,
            band: self.band(velocity),
            recommendation: self.recommend(velocity),
            window_len,
        }
    }
}

impl Default for RecoveryVelocityCalculator {
    fn default() -> Self {
        Self::new()
    }
}
