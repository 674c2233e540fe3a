use std::fs;
use std::path::Path;

use crate::error::{ImportError, Result};
use crate::import::{extension, ImportFormat};
use crate::models::MetricEntry;

/// JSON history importer
///
/// Accepts the array returned by the history endpoint. Storage fields such
/// as `_id` or `user_id` are ignored.
pub struct JsonImporter;

impl JsonImporter {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_str(&self, content: &str) -> Result<Vec<MetricEntry>> {
        let entries: Vec<MetricEntry> =
            serde_json::from_str(content).map_err(|e| ImportError::parse("JSON", e))?;
        Ok(entries)
    }
}

impl Default for JsonImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for JsonImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        extension(file_path).as_deref() == Some("json")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<MetricEntry>> {
        let content = fs::read_to_string(file_path)?;
        self.parse_str(&content)
    }

    fn format_name(&self) -> &'static str {
        "JSON"
    }
}
