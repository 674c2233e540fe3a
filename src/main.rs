use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use vitalsentinel::config::AppConfig;
use vitalsentinel::engine::RecoveryEngine;
use vitalsentinel::import::HistoryImporter;
use vitalsentinel::forecast::MAX_FORECAST_DAYS;
use vitalsentinel::logging::{init_logging, LogFormat, LogLevel};
use vitalsentinel::models::{Insights, MetricEntry};
use vitalsentinel::report;

/// VitalSentinel - Post-operative recovery monitoring CLI
///
/// Derives vital-sign status, recovery velocity, risk scores, milestone
/// timelines and short-horizon forecasts from a patient's metric history and
/// the insights snapshot produced by the analysis service.
#[derive(Parser)]
#[command(name = "vitalsentinel")]
#[command(author = "VitalSentinel Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Recovery monitoring dashboard CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log level (error, warn, info, debug, trace); overrides -v
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Log output format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every derived output for a history
    Dashboard {
        /// Metric history file (JSON or CSV)
        #[arg(long, value_name = "FILE")]
        history: PathBuf,

        /// Insights snapshot (JSON)
        #[arg(long, value_name = "FILE")]
        insights: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Forecast horizon in days (config default if not specified)
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Score trajectory and current complication risk
    Risk {
        /// Metric history file (JSON or CSV)
        #[arg(long, value_name = "FILE")]
        history: PathBuf,

        /// Insights snapshot (JSON)
        #[arg(long, value_name = "FILE")]
        insights: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Project pain and heart rate forward
    Forecast {
        /// Metric history file (JSON or CSV)
        #[arg(long, value_name = "FILE")]
        history: PathBuf,

        /// Insights snapshot (JSON)
        #[arg(long, value_name = "FILE")]
        insights: Option<PathBuf>,

        /// Forecast horizon in days (config default if not specified)
        #[arg(short, long)]
        days: Option<u32>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Classify the most recent entry against the rest of the history
    Triage {
        /// Metric history file (JSON or CSV); the newest entry is triaged
        #[arg(long, value_name = "FILE")]
        history: PathBuf,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Configure application settings
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from_file(path),
        None => Ok(AppConfig::load_or_default()),
    }
}

fn load_inputs(
    importer: &HistoryImporter,
    history: &Path,
    insights: Option<&Path>,
) -> Result<(Vec<MetricEntry>, Option<Insights>)> {
    let entries = importer
        .import_history(history)
        .with_context(|| format!("Failed to load history: {}", history.display()))?;

    let insights = insights
        .map(|path| {
            importer
                .load_insights(path)
                .with_context(|| format!("Failed to load insights: {}", path.display()))
        })
        .transpose()?;

    Ok((entries, insights))
}

fn forecast_days(requested: Option<u32>, config: &AppConfig) -> Result<u32> {
    let days = requested.unwrap_or(config.engine.forecast_days);
    if days > MAX_FORECAST_DAYS {
        anyhow::bail!("Forecast horizon must not exceed {} days", MAX_FORECAST_DAYS);
    }
    Ok(days)
}

fn print_report(render: impl FnOnce(&mut String) -> std::fmt::Result) -> Result<()> {
    let mut text = String::new();
    render(&mut text).context("Failed to render report")?;
    print!("{}", text);
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match (&cli.command, cli.config.as_deref()) {
        (Commands::Config { init: true, .. }, Some(path)) if !path.exists() => AppConfig::default(),
        (_, path) => load_config(path)?,
    };
    config.logging.level = cli
        .log_level
        .unwrap_or_else(|| LogLevel::from_verbosity(cli.verbose, config.logging.level));
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    init_logging(&config.logging).context("Failed to initialize logging")?;

    let engine = RecoveryEngine::with_thresholds(config.thresholds.clone());
    let importer = HistoryImporter::new().with_limit(config.engine.history_limit);
    let as_of = Utc::now();

    match cli.command {
        Commands::Dashboard {
            history,
            insights,
            format,
            days,
        } => {
            let (entries, insights) = load_inputs(&importer, &history, insights.as_deref())?;
            let days = forecast_days(days, &config)?;
            let snapshot =
                engine.snapshot_with_days(&entries, insights.as_ref(), as_of, Some(days));

            match format {
                OutputFormat::Json => print_json(&snapshot)?,
                OutputFormat::Text => {
                    print_report(|out| report::render_dashboard(out, &snapshot))?
                }
            }
        }

        Commands::Risk {
            history,
            insights,
            format,
        } => {
            let (entries, insights) = load_inputs(&importer, &history, insights.as_deref())?;
            let trajectory = engine.trajectory_risk(&entries, insights.as_ref());
            let current = engine.risk_assessment(&entries, insights.as_ref());

            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "trajectory": trajectory,
                    "current": current,
                }))?,
                OutputFormat::Text => print_report(|out| {
                    report::render_risk(out, "Trajectory risk", &trajectory)?;
                    writeln!(out)?;
                    report::render_risk(out, "Current risk", &current)
                })?,
            }
        }

        Commands::Forecast {
            history,
            insights,
            days,
            format,
        } => {
            let (entries, insights) = load_inputs(&importer, &history, insights.as_deref())?;
            let days = forecast_days(days, &config)?;
            let series = engine.forecast(&entries, insights.as_ref(), Some(days));
            let short = engine.short_horizon(&entries, insights.as_ref());

            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "series": series,
                    "short_horizon": short,
                }))?,
                OutputFormat::Text => {
                    print_report(|out| report::render_forecast(out, &series, short.as_ref()))?
                }
            }
        }

        Commands::Triage { history, format } => {
            let (entries, _) = load_inputs(&importer, &history, None)?;
            let response = engine.triage(&entries);

            match format {
                OutputFormat::Json => print_json(&response)?,
                OutputFormat::Text => print_report(|out| report::render_triage(out, &response))?,
            }
        }

        Commands::Config { init, show } => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(AppConfig::default_config_path);

            if init {
                if path.exists() {
                    println!(
                        "{} {}",
                        "Config already exists:".yellow(),
                        path.display()
                    );
                } else {
                    let mut fresh = AppConfig::default();
                    fresh.save_to_file(&path)?;
                    println!("{} {}", "✓ Wrote default config to".green(), path.display());
                }
            }

            if show {
                let toml_content =
                    toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
                println!("{}", toml_content);
            }

            if !init && !show {
                println!("Config file: {}", path.display());
                println!("{}", "Use --init to create it or --show to print it".dimmed());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_flags() {
        let cli = Cli::try_parse_from([
            "vitalsentinel",
            "--log-level",
            "debug",
            "--log-format",
            "json",
            "triage",
            "--history",
            "history.json",
        ])
        .unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert_eq!(cli.log_format, Some(LogFormat::Json));

        let bad = Cli::try_parse_from([
            "vitalsentinel",
            "--log-format",
            "xml",
            "triage",
            "--history",
            "history.json",
        ]);
        assert!(bad.is_err());
    }

    #[test]
    fn test_forecast_days_bound() {
        let config = AppConfig::default();
        assert_eq!(forecast_days(None, &config).unwrap(), 7);
        assert_eq!(forecast_days(Some(MAX_FORECAST_DAYS), &config).unwrap(), 365);
        assert!(forecast_days(Some(MAX_FORECAST_DAYS + 1), &config).is_err());
    }
}
