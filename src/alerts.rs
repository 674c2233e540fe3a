use crate::models::{Insights, MetricEntry, TrendDirection};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Info,
    Warning,
    Success,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::Info => write!(f, "info"),
            AlertKind::Warning => write!(f, "warning"),
            AlertKind::Success => write!(f, "success"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringAlert {
    pub kind: AlertKind,
    pub message: String,
}

impl MonitoringAlert {
    fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        MonitoringAlert {
            kind,
            message: message.into(),
        }
    }
}

/// Alerts shown on the live monitoring panel
pub const MAX_ALERTS: usize = 2;

/// Builds the short list of monitoring alerts, at most [`MAX_ALERTS`]
pub fn active_alerts(entries: &[MetricEntry], insights: Option<&Insights>) -> Vec<MonitoringAlert> {
    if entries.is_empty() {
        return vec![MonitoringAlert::new(
            AlertKind::Info,
            "System ready - awaiting first data entry",
        )];
    }

    let mut alerts = Vec::new();

    if let Some(insights) = insights {
        let anomalies = insights.anomalies.len();
        if anomalies > 0 {
            let noun = if anomalies > 1 { "anomalies" } else { "anomaly" };
            alerts.push(MonitoringAlert::new(
                AlertKind::Warning,
                format!("{} {} detected", anomalies, noun),
            ));
        }

        if insights.pain_direction() == TrendDirection::Increasing {
            alerts.push(MonitoringAlert::new(
                AlertKind::Warning,
                "Pain levels trending upward",
            ));
        }

        if insights.activity_direction() == TrendDirection::Decreasing {
            alerts.push(MonitoringAlert::new(
                AlertKind::Warning,
                "Activity declining - encourage movement",
            ));
        }
    }

    if alerts.is_empty() {
        alerts.push(MonitoringAlert::new(
            AlertKind::Success,
            "All vitals within expected ranges",
        ));
    }

    alerts.truncate(MAX_ALERTS);
    alerts
}
