use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{ImportError, Result};
use crate::import::{extension, ImportFormat};
use crate::models::{parse_timestamp, ActivityLevel, MetricEntry};

const TIMESTAMP: &str = "timestamp";
const PAIN_LEVEL: &str = "pain_level";
const TEMPERATURE: &str = "temperature";
const HEART_RATE: &str = "heart_rate";
const ACTIVITY_LEVEL: &str = "activity_level";

/// CSV importer with flexible column mapping
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Common column name variations
        Self::add_mapping(&mut column_mapping, TIMESTAMP, &["timestamp", "time", "date"]);
        Self::add_mapping(&mut column_mapping, PAIN_LEVEL, &["pain_level", "pain"]);
        Self::add_mapping(&mut column_mapping, TEMPERATURE, &["temperature", "temp"]);
        Self::add_mapping(
            &mut column_mapping,
            HEART_RATE,
            &["heart_rate", "hr", "heartrate", "bpm"],
        );
        Self::add_mapping(
            &mut column_mapping,
            ACTIVITY_LEVEL,
            &["activity_level", "activity"],
        );

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    /// Parse CSV content from any reader
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<Vec<MetricEntry>> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| ImportError::parse("CSV", e))?
            .clone();

        let columns: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(index, name)| (self.normalize_column_name(name), index))
            .collect();

        for required in [TIMESTAMP, PAIN_LEVEL, ACTIVITY_LEVEL] {
            if !columns.contains_key(required) {
                return Err(ImportError::parse("CSV", format!("missing column: {}", required)).into());
            }
        }

        let mut entries = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let row = index + 1;
            let record = record.map_err(|e| ImportError::parse("CSV", e))?;
            entries.push(Self::parse_record(&record, &columns, row)?);
        }

        Ok(entries)
    }

    fn parse_record(
        record: &StringRecord,
        columns: &HashMap<String, usize>,
        row: usize,
    ) -> Result<MetricEntry> {
        let field = |name: &str| {
            columns
                .get(name)
                .and_then(|&index| record.get(index))
                .filter(|value| !value.is_empty())
        };
        let invalid = |reason: String| ImportError::InvalidEntry { row, reason };

        let timestamp = field(TIMESTAMP)
            .ok_or_else(|| invalid("missing timestamp".to_string()))
            .and_then(|raw| parse_timestamp(raw).map_err(invalid))?;

        let pain_level = field(PAIN_LEVEL)
            .ok_or_else(|| invalid("missing pain level".to_string()))
            .and_then(|raw| {
                raw.parse::<u8>()
                    .map_err(|_| invalid(format!("invalid pain level: {}", raw)))
            })?;

        let activity_level = field(ACTIVITY_LEVEL)
            .ok_or_else(|| invalid("missing activity level".to_string()))
            .and_then(|raw| raw.parse::<ActivityLevel>().map_err(invalid))?;

        let temperature = field(TEMPERATURE)
            .map(|raw| {
                raw.parse::<f64>()
                    .map_err(|_| invalid(format!("invalid temperature: {}", raw)))
            })
            .transpose()?;

        let heart_rate = field(HEART_RATE)
            .map(|raw| {
                raw.parse::<u16>()
                    .map_err(|_| invalid(format!("invalid heart rate: {}", raw)))
            })
            .transpose()?;

        Ok(MetricEntry {
            timestamp,
            pain_level,
            temperature,
            heart_rate,
            activity_level,
        })
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        extension(file_path).as_deref() == Some("csv")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<MetricEntry>> {
        let file = File::open(file_path)?;
        self.parse_reader(file)
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}
