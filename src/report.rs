//! Terminal rendering of engine outputs

use colored::*;
use std::fmt::{self, Write};
use tabled::{settings::Style, Table, Tabled};

use crate::alerts::{AlertKind, MonitoringAlert};
use crate::engine::DashboardSnapshot;
use crate::forecast::{ForecastPoint, ShortHorizonForecast};
use crate::milestones::MilestoneTimeline;
use crate::models::{SubmissionResponse, SubmissionStatus};
use crate::risk::{RiskLevel, RiskResult};
use crate::velocity::RecoveryStatus;
use crate::vitals::{VitalBand, VitalSigns};

#[derive(Tabled)]
struct VitalRow {
    #[tabled(rename = "Vital")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Status")]
    band: String,
}

#[derive(Tabled)]
struct FactorRow {
    #[tabled(rename = "Factor")]
    name: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Detail")]
    description: String,
}

#[derive(Tabled)]
struct MilestoneRow {
    #[tabled(rename = "Milestone")]
    title: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Expected")]
    expected: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

#[derive(Tabled)]
struct ForecastRow {
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Pain")]
    pain: String,
    #[tabled(rename = "Heart Rate")]
    heart_rate: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

fn table<T: Tabled>(rows: Vec<T>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn heading(title: &str) -> String {
    title.to_uppercase().bold().to_string()
}

fn colored_level(level: RiskLevel) -> ColoredString {
    let label = level.to_string().to_uppercase();
    match level {
        RiskLevel::Low => label.green(),
        RiskLevel::Moderate => label.yellow(),
        RiskLevel::High => label.red().bold(),
    }
}

fn colored_band(band: VitalBand) -> ColoredString {
    let label = band.to_string();
    match band {
        VitalBand::Optimal => label.green(),
        VitalBand::Moderate => label.yellow(),
        VitalBand::Elevated | VitalBand::Low => label.red(),
        VitalBand::Baseline => label.dimmed(),
    }
}

pub fn render_vitals(out: &mut impl Write, vitals: &VitalSigns) -> fmt::Result {
    let rows: Vec<VitalRow> = vitals
        .iter()
        .map(|status| VitalRow {
            metric: status.metric.to_string(),
            value: status
                .value
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| "-".to_string()),
            band: colored_band(status.band).to_string(),
        })
        .collect();
    writeln!(out, "{}", table(rows))
}

pub fn render_risk(out: &mut impl Write, title: &str, risk: &RiskResult) -> fmt::Result {
    writeln!(out, "{}", heading(title))?;
    writeln!(
        out,
        "Score: {}/100 ({})",
        risk.score,
        colored_level(risk.level)
    )?;
    writeln!(out, "{}", risk.message)?;

    if !risk.factors.is_empty() {
        let rows: Vec<FactorRow> = risk
            .factors
            .iter()
            .map(|factor| FactorRow {
                name: factor.name.clone(),
                severity: factor.severity.to_string(),
                description: factor.description.clone(),
            })
            .collect();
        writeln!(out, "{}", table(rows))?;
    }

    for factor in &risk.protective_factors {
        writeln!(out, "  {} {}", "+".green(), factor)?;
    }

    Ok(())
}

pub fn render_timeline(out: &mut impl Write, timeline: &MilestoneTimeline) -> fmt::Result {
    writeln!(
        out,
        "Estimated recovery in {} days ({} pace)",
        timeline.days_to_recovery, timeline.pace
    )?;

    let rows: Vec<MilestoneRow> = timeline
        .milestones
        .iter()
        .map(|milestone| MilestoneRow {
            title: milestone.title.clone(),
            status: milestone.status.to_string(),
            expected: milestone.expected_date.format("%Y-%m-%d").to_string(),
            confidence: format!("{}%", milestone.confidence),
        })
        .collect();
    writeln!(out, "{}", table(rows))
}

pub fn render_forecast(
    out: &mut impl Write,
    series: &[ForecastPoint],
    short: Option<&ShortHorizonForecast>,
) -> fmt::Result {
    if let Some(short) = short {
        writeln!(
            out,
            "Tomorrow: pain {:.1} ({:.0}% confidence)",
            short.tomorrow.pain, short.tomorrow.confidence
        )?;
        writeln!(
            out,
            "Next week: pain {:.1} ({:.0}% confidence)",
            short.next_week.pain, short.next_week.confidence
        )?;
    }

    let rows: Vec<ForecastRow> = series
        .iter()
        .map(|point| ForecastRow {
            day: format!("+{}", point.day_offset),
            pain: format!("{:.1}", point.predicted_pain),
            heart_rate: format!("{:.0}", point.predicted_hr),
            confidence: format!("{:.0}%", point.confidence),
        })
        .collect();
    writeln!(out, "{}", table(rows))
}

pub fn render_alerts(out: &mut impl Write, alerts: &[MonitoringAlert]) -> fmt::Result {
    for alert in alerts {
        let marker = match alert.kind {
            AlertKind::Info => "i".blue(),
            AlertKind::Warning => "!".yellow().bold(),
            AlertKind::Success => "✓".green(),
        };
        writeln!(out, "  {} {}", marker, alert.message)?;
    }
    Ok(())
}

pub fn render_triage(out: &mut impl Write, response: &SubmissionResponse) -> fmt::Result {
    let status = match response.status {
        SubmissionStatus::Normal => response.status.to_string().green(),
        SubmissionStatus::Warning => response.status.to_string().yellow().bold(),
        SubmissionStatus::Critical => response.status.to_string().red().bold(),
    };
    writeln!(out, "Status: {}", status)?;
    writeln!(out, "{}", response.reason)?;
    if response.alert_provider {
        writeln!(out, "{}", "Care provider alert raised".red())?;
    }
    if let Some(metrics) = &response.metrics {
        writeln!(
            out,
            "Baseline pain {:.1} over {} entries, activity {}",
            metrics.pain_avg, metrics.entries_count, metrics.activity_trend
        )?;
    }
    Ok(())
}

fn colored_status(status: RecoveryStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        RecoveryStatus::OnTrack => label.green(),
        RecoveryStatus::Progressing => label.yellow(),
        RecoveryStatus::NeedsAttention => label.red(),
    }
}

/// Full dashboard report
pub fn render_dashboard(out: &mut impl Write, snapshot: &DashboardSnapshot) -> fmt::Result {
    writeln!(
        out,
        "{} as of {} ({} entries)",
        "Recovery dashboard".cyan().bold(),
        snapshot.as_of.format("%Y-%m-%d %H:%M UTC"),
        snapshot.entry_count
    )?;
    writeln!(out)?;

    writeln!(out, "{}", heading("Vitals"))?;
    render_vitals(out, &snapshot.vitals)?;
    writeln!(out)?;

    writeln!(
        out,
        "Recovery velocity: {:+.1} ({}: {})",
        snapshot.velocity.velocity,
        snapshot.velocity.band,
        snapshot.velocity.band.description()
    )?;
    writeln!(out, "Recommendation: {}", snapshot.velocity.recommendation)?;
    writeln!(out, "Recovery status: {}", colored_status(snapshot.recovery_status))?;
    writeln!(out)?;

    render_risk(out, "Trajectory risk", &snapshot.trajectory_risk)?;
    writeln!(out)?;
    render_risk(out, "Current risk", &snapshot.current_risk)?;
    writeln!(out)?;

    writeln!(out, "{}", heading("Milestones"))?;
    render_timeline(out, &snapshot.timeline)?;
    writeln!(
        out,
        "Next: {} in {} days ({}% progress)",
        snapshot.next_milestone.title, snapshot.next_milestone.days, snapshot.next_milestone.progress
    )?;
    writeln!(out)?;

    writeln!(out, "{}", heading("Forecast"))?;
    render_forecast(out, &snapshot.forecast, snapshot.short_horizon.as_ref())?;
    writeln!(out)?;

    writeln!(out, "{}", heading("Alerts"))?;
    render_alerts(out, &snapshot.alerts)
}
