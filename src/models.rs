//! Input data shapes shared across the derivation engine
//!
//! These mirror the payloads exchanged with the external analysis service:
//! metric entries returned by the history endpoint, the insights snapshot,
//! and the submit/upload responses. Field names follow the upstream JSON.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Patient-reported activity level
///
/// Entries carry either a coarse ordinal level or a 0-10 numeric score. The
/// ordinal levels are placed on the numeric scale so every calculation can
/// work on one axis; one ordinal step equals [`ActivityLevel::ORDINAL_STEP`]
/// scale points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ActivityRepr", into = "String")]
pub enum ActivityLevel {
    Low,
    Medium,
    High,
    /// Numeric score on the 0-10 scale
    Scale(f64),
}

impl ActivityLevel {
    /// Distance between adjacent ordinal levels on the 0-10 scale
    pub const ORDINAL_STEP: f64 = 3.0;

    /// Activity expressed on the 0-10 scale
    pub fn score(&self) -> f64 {
        match self {
            ActivityLevel::Low => 2.0,
            ActivityLevel::Medium => 5.0,
            ActivityLevel::High => 8.0,
            ActivityLevel::Scale(value) => *value,
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityLevel::Low => write!(f, "Low"),
            ActivityLevel::Medium => write!(f, "Medium"),
            ActivityLevel::High => write!(f, "High"),
            ActivityLevel::Scale(value) => write!(f, "{}", value),
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "low" => Ok(ActivityLevel::Low),
            "medium" | "moderate" => Ok(ActivityLevel::Medium),
            "high" => Ok(ActivityLevel::High),
            _ => match trimmed.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(ActivityLevel::Scale(value)),
                _ => Err(format!("Invalid activity level: {}", s)),
            },
        }
    }
}

impl From<ActivityLevel> for String {
    fn from(level: ActivityLevel) -> Self {
        level.to_string()
    }
}

/// Wire representation: upstream sends strings, some clients send numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum ActivityRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<ActivityRepr> for ActivityLevel {
    type Error = String;

    fn try_from(repr: ActivityRepr) -> Result<Self, Self::Error> {
        match repr {
            ActivityRepr::Number(value) if value.is_finite() => Ok(ActivityLevel::Scale(value)),
            ActivityRepr::Number(value) => Err(format!("Invalid activity level: {}", value)),
            ActivityRepr::Text(text) => text.parse(),
        }
    }
}

/// A single patient-submitted vital-sign entry
///
/// Entries are immutable once created. Every engine call expects its entry
/// slice sorted ascending by `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    /// When the entry was recorded
    #[serde(with = "timestamp_format")]
    pub timestamp: DateTime<Utc>,

    /// Self-reported pain on a 0-10 scale
    pub pain_level: u8,

    /// Body temperature in °C
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Heart rate in beats per minute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<u16>,

    /// Activity level, ordinal or 0-10
    pub activity_level: ActivityLevel,
}

impl MetricEntry {
    pub fn new(timestamp: DateTime<Utc>, pain_level: u8, activity_level: ActivityLevel) -> Self {
        MetricEntry {
            timestamp,
            pain_level,
            temperature: None,
            heart_rate: None,
            activity_level,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_heart_rate(mut self, heart_rate: u16) -> Self {
        self.heart_rate = Some(heart_rate);
        self
    }

    /// Heart rate, or `fallback` when the entry has none
    pub fn heart_rate_or(&self, fallback: f64) -> f64 {
        self.heart_rate.map(f64::from).unwrap_or(fallback)
    }

    pub fn pain(&self) -> f64 {
        f64::from(self.pain_level)
    }

    pub fn activity_score(&self) -> f64 {
        self.activity_level.score()
    }
}

/// Average pain over the trailing `window` entries (or fewer when the
/// series is shorter). Returns `None` for an empty series.
pub fn trailing_average_pain(entries: &[MetricEntry], window: usize) -> Option<f64> {
    let recent = trailing(entries, window);
    if recent.is_empty() {
        return None;
    }
    Some(recent.iter().map(MetricEntry::pain).sum::<f64>() / recent.len() as f64)
}

/// The last `window` entries of the series
pub fn trailing(entries: &[MetricEntry], window: usize) -> &[MetricEntry] {
    &entries[entries.len().saturating_sub(window)..]
}

/// Direction of an externally computed trend
///
/// The analysis service uses different words per rule: some activity rules
/// key on `decreasing`, others on `declining` or `improving`. Each word keeps
/// its own variant and rules match the exact one they expect. Anything
/// unrecognized becomes `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    Improving,
    Declining,
    #[default]
    Unknown,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
            TrendDirection::Improving => "improving",
            TrendDirection::Declining => "declining",
            TrendDirection::Unknown => "unknown",
        }
    }
}

impl From<String> for TrendDirection {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "increasing" => TrendDirection::Increasing,
            "decreasing" => TrendDirection::Decreasing,
            "stable" => TrendDirection::Stable,
            "improving" => TrendDirection::Improving,
            "declining" => TrendDirection::Declining,
            _ => TrendDirection::Unknown,
        }
    }
}

impl From<TrendDirection> for String {
    fn from(direction: TrendDirection) -> Self {
        direction.as_str().to_string()
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Personal reference values computed by the analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub pain_baseline: f64,
    pub temp_baseline: f64,
    pub hr_baseline: f64,
}

/// Pain trend: direction, slope in pain points per day, confidence 0-1
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PainTrend {
    #[serde(default)]
    pub direction: TrendDirection,
    #[serde(default)]
    pub slope: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityTrend {
    #[serde(default)]
    pub direction: TrendDirection,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trends {
    #[serde(default)]
    pub pain: Option<PainTrend>,
    #[serde(default)]
    pub activity: Option<ActivityTrend>,
    #[serde(default)]
    pub recovery_velocity: Option<f64>,
}

/// Insights snapshot produced by the external analysis service
///
/// Read-only to the engine. Every section is optional because the service
/// only fills in what it could compute from the history it has.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    #[serde(default)]
    pub baseline: Option<Baseline>,
    #[serde(default)]
    pub trends: Trends,
    #[serde(default)]
    pub anomalies: Vec<String>,
    #[serde(default)]
    pub recovery_score: Option<f64>,
}

impl Insights {
    pub fn pain_direction(&self) -> TrendDirection {
        self.trends
            .pain
            .as_ref()
            .map(|trend| trend.direction)
            .unwrap_or_default()
    }

    pub fn activity_direction(&self) -> TrendDirection {
        self.trends
            .activity
            .as_ref()
            .map(|trend| trend.direction)
            .unwrap_or_default()
    }

    pub fn pain_slope(&self) -> Option<f64> {
        self.trends.pain.as_ref().and_then(|trend| trend.slope)
    }

    pub fn pain_confidence(&self) -> Option<f64> {
        self.trends.pain.as_ref().and_then(|trend| trend.confidence)
    }

    pub fn has_anomalies(&self) -> bool {
        !self.anomalies.is_empty()
    }
}

/// Outcome category returned by the submit-entry endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Normal,
    Warning,
    Critical,
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionStatus::Normal => write!(f, "Normal"),
            SubmissionStatus::Warning => write!(f, "Warning"),
            SubmissionStatus::Critical => write!(f, "Critical"),
        }
    }
}

/// Summary metrics attached to a submit-entry response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionMetrics {
    pub pain_avg: f64,
    pub activity_trend: String,
    pub entries_count: usize,
}

/// Response shape of the submit-entry endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub status: SubmissionStatus,
    pub reason: String,
    pub alert_provider: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<SubmissionMetrics>,
}

/// Response shape of the document-upload endpoint (not consumed by the engine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportAnalysis {
    pub message: String,
    pub analysis: String,
}

/// Parse the timestamp formats the analysis service emits
///
/// RFC 3339 is preferred; naive ISO timestamps and bare dates are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];

    for format in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }

    Err(format!("Unable to parse timestamp: {}", raw))
}

mod timestamp_format {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&timestamp.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}
