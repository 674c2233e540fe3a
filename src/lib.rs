// Library interface for VitalSentinel modules
// This allows integration tests and benchmarks to access the engine

pub mod alerts;
pub mod config;
pub mod engine;
pub mod error;
pub mod factors;
pub mod forecast;
pub mod import;
pub mod logging;
pub mod milestones;
pub mod models;
pub mod report;
pub mod risk;
pub mod triage;
pub mod velocity;
pub mod vitals;

// Re-export commonly used types for convenience
pub use models::*;
pub use alerts::{active_alerts, AlertKind, MonitoringAlert};
pub use config::{AppConfig, ClinicalThresholds};
pub use engine::{DashboardSnapshot, RecoveryEngine};
pub use error::{ImportError, Result, VitalSentinelError};
pub use factors::{ProtectiveFactorExtractor, RiskFactor, RiskFactorExtractor};
pub use forecast::{ForecastPoint, ForecastSeriesGenerator, ShortHorizonForecast};
pub use import::HistoryImporter;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use milestones::{MilestoneForecaster, MilestoneTimeline, NextMilestone};
pub use risk::{PointInTimeRiskScorer, RiskLevel, RiskResult, TrajectoryRiskScorer};
pub use triage::SubmissionTriage;
pub use velocity::{
    RecoveryStatus, RecoveryVelocity, RecoveryVelocityCalculator, VelocityBand,
    VelocityRecommendation,
};
pub use vitals::{VitalBand, VitalSigns, VitalStatusClassifier};
