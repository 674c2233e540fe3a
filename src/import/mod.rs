//! Loading entry histories and insight snapshots from disk

use crate::error::{ImportError, Result};
use crate::models::{Insights, MetricEntry};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub mod csv;
pub mod json;

/// Highest accepted pain level
pub const MAX_PAIN_LEVEL: u8 = 10;

/// Trait for importing metric histories from different file formats
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Import metric entries from the file, in file order
    fn import_file(&self, file_path: &Path) -> Result<Vec<MetricEntry>>;

    /// Get the format name for this importer
    fn format_name(&self) -> &'static str;
}

/// Lowercased file extension, if any
pub(crate) fn extension(file_path: &Path) -> Option<String> {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Auto-detecting history loader
///
/// Returned histories are sorted ascending by timestamp and, when a limit is
/// set, truncated to the most recent entries.
pub struct HistoryImporter {
    importers: Vec<Box<dyn ImportFormat>>,
    limit: Option<usize>,
}

impl HistoryImporter {
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![
            Box::new(json::JsonImporter::new()),
            Box::new(csv::CsvImporter::new()),
        ];

        Self {
            importers,
            limit: None,
        }
    }

    /// Keep only the most recent `limit` entries; zero keeps everything
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = if limit == 0 { None } else { Some(limit) };
        self
    }

    /// Import a history file, auto-detecting the format
    pub fn import_history(&self, file_path: &Path) -> Result<Vec<MetricEntry>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound {
                path: file_path.to_path_buf(),
            }
            .into());
        }

        let importer = self
            .importers
            .iter()
            .find(|importer| importer.can_import(file_path))
            .ok_or_else(|| ImportError::UnsupportedFormat {
                format: extension(file_path).unwrap_or_else(|| "unknown".to_string()),
            })?;

        debug!(
            path = %file_path.display(),
            format = importer.format_name(),
            "importing history"
        );

        let mut entries = importer.import_file(file_path)?;
        validate_entries(&entries)?;

        entries.sort_by_key(|entry| entry.timestamp);

        if let Some(limit) = self.limit {
            if entries.len() > limit {
                entries.drain(..entries.len() - limit);
            }
        }

        info!(
            path = %file_path.display(),
            format = importer.format_name(),
            entries = entries.len(),
            "history loaded"
        );

        Ok(entries)
    }

    /// Load an insights snapshot from a JSON file
    pub fn load_insights(&self, file_path: &Path) -> Result<Insights> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound {
                path: file_path.to_path_buf(),
            }
            .into());
        }

        let content = fs::read_to_string(file_path)?;
        let insights: Insights =
            serde_json::from_str(&content).map_err(|e| ImportError::parse("insights", e))?;

        debug!(
            path = %file_path.display(),
            has_baseline = insights.baseline.is_some(),
            anomalies = insights.anomalies.len(),
            "insights loaded"
        );

        Ok(insights)
    }
}

impl Default for HistoryImporter {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_entries(entries: &[MetricEntry]) -> Result<()> {
    for (index, entry) in entries.iter().enumerate() {
        if entry.pain_level > MAX_PAIN_LEVEL {
            return Err(ImportError::InvalidEntry {
                row: index + 1,
                reason: format!(
                    "pain level {} exceeds {}",
                    entry.pain_level, MAX_PAIN_LEVEL
                ),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VitalSentinelError;
    use std::fs;
    use tempfile::tempdir;

    const HISTORY_JSON: &str = r#"[
        {"_id": "b", "user_id": "p1", "timestamp": "2024-09-03T08:00:00Z", "pain_level": 4, "activity_level": "Medium"},
        {"_id": "a", "user_id": "p1", "timestamp": "2024-09-01T08:00:00Z", "pain_level": 7, "activity_level": "Low", "temperature": 37.4},
        {"_id": "c", "user_id": "p1", "timestamp": "2024-09-02T08:00:00Z", "pain_level": 5, "activity_level": "Low", "heart_rate": 82}
    ]"#;

    #[test]
    fn test_json_history_sorted_ascending() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, HISTORY_JSON).unwrap();

        let entries = HistoryImporter::new().import_history(&path).unwrap();
        let pains: Vec<u8> = entries.iter().map(|e| e.pain_level).collect();
        assert_eq!(pains, vec![7, 5, 4]);
        assert_eq!(entries[0].temperature, Some(37.4));
        assert_eq!(entries[1].heart_rate, Some(82));
    }

    #[test]
    fn test_limit_keeps_most_recent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, HISTORY_JSON).unwrap();

        let entries = HistoryImporter::new()
            .with_limit(2)
            .import_history(&path)
            .unwrap();
        let pains: Vec<u8> = entries.iter().map(|e| e.pain_level).collect();
        assert_eq!(pains, vec![5, 4]);
    }

    #[test]
    fn test_csv_detected_by_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.CSV");
        fs::write(
            &path,
            "date,pain,hr,activity\n2024-09-02,3,78,high\n2024-09-01,6,,low\n",
        )
        .unwrap();

        let entries = HistoryImporter::new().import_history(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].pain_level, 6);
        assert_eq!(entries[0].heart_rate, None);
        assert_eq!(entries[1].heart_rate, Some(78));
    }

    #[test]
    fn test_missing_and_unsupported_files() {
        let dir = tempdir().unwrap();
        let importer = HistoryImporter::new();

        let missing = importer.import_history(&dir.path().join("nope.json"));
        assert!(matches!(
            missing,
            Err(VitalSentinelError::Import(ImportError::FileNotFound { .. }))
        ));

        let path = dir.path().join("history.xml");
        fs::write(&path, "<entries/>").unwrap();
        match importer.import_history(&path) {
            Err(VitalSentinelError::Import(ImportError::UnsupportedFormat { format })) => {
                assert_eq!(format, "xml")
            }
            other => panic!("expected unsupported format, got {:?}", other),
        }
    }

    #[test]
    fn test_pain_out_of_range_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(
            &path,
            r#"[{"timestamp": "2024-09-01T08:00:00Z", "pain_level": 12, "activity_level": "Low"}]"#,
        )
        .unwrap();

        let result = HistoryImporter::new().import_history(&path);
        assert!(matches!(
            result,
            Err(VitalSentinelError::Import(ImportError::InvalidEntry { row: 1, .. }))
        ));
    }

    #[test]
    fn test_load_insights() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("insights.json");
        fs::write(
            &path,
            r#"{
                "baseline": {"pain_baseline": 6.5, "temp_baseline": 36.9, "hr_baseline": 78.0},
                "trends": {"pain": {"direction": "decreasing", "slope": -0.3, "confidence": 0.8}},
                "anomalies": ["hr spike"],
                "recovery_score": 62
            }"#,
        )
        .unwrap();

        let insights = HistoryImporter::new().load_insights(&path).unwrap();
        assert!(insights.baseline.is_some());
        assert_eq!(insights.pain_slope(), Some(-0.3));
        assert!(insights.has_anomalies());
    }

    #[test]
    fn test_malformed_insights() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("insights.json");
        fs::write(&path, "{not json").unwrap();

        let result = HistoryImporter::new().load_insights(&path);
        assert!(matches!(
            result,
            Err(VitalSentinelError::Import(ImportError::ParseError { .. }))
        ));
    }
}
