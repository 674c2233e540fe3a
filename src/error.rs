//! Unified error hierarchy for VitalSentinel
//!
//! The derivation engine itself is total and never fails. Errors only arise at
//! the boundary: loading histories and insights from disk, parsing
//! configuration, and setting up logging.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all VitalSentinel boundary operations
#[derive(Debug, Error)]
pub enum VitalSentinelError {
    /// History or insights import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while reading entry histories and insight snapshots
#[derive(Debug, Error)]
pub enum ImportError {
    /// File not found at specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Unsupported format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// A single record could not be turned into a metric entry
    #[error("Invalid entry at row {row}: {reason}")]
    InvalidEntry { row: usize, reason: String },
}

impl ImportError {
    pub fn parse(format: impl Into<String>, reason: impl ToString) -> Self {
        ImportError::ParseError {
            format: format.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for VitalSentinel operations
pub type Result<T> = std::result::Result<T, VitalSentinelError>;
