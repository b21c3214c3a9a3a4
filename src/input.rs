//! Contact list loading from CSV and JSON files
//!
//! Supports:
//! - CSV with a header row; every column becomes a row field
//! - JSON array of objects, or an object with a "rows" or "data" array

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::record::Record;

/// File format for contact lists, shared by input and output
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()).as_deref() {
            Some("csv") => Some(Self::Csv),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// Load rows from a file (format from extension)
pub fn load_rows(path: &Path) -> Result<Vec<Record>> {
    let format = InputFormat::from_path(path).context(format!(
        "Cannot determine input format from file extension. Expected .csv or .json: {}",
        path.display()
    ))?;

    let content = fs::read_to_string(path)
        .context(format!("Failed to read input file: {}", path.display()))?;

    let rows = match format {
        InputFormat::Csv => parse_csv_rows(&content)?,
        InputFormat::Json => parse_json_rows(&content)?,
    };
    debug!("Loaded {} rows from {}", rows.len(), path.display());

    Ok(rows)
}

/// Parse rows from CSV content with a header row.
///
/// Cells are kept verbatim (empty cells stay present as empty strings).
/// Short records only get the columns they have.
pub fn parse_csv_rows(content: &str) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result.context(format!("Failed to parse CSV record {}", i + 1))?;
        let row = Record::from_pairs(
            headers
                .iter()
                .zip(record.iter())
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, value)| (header.as_str(), value)),
        );
        rows.push(row);
    }

    Ok(rows)
}

/// Parse rows from JSON content
pub fn parse_json_rows(content: &str) -> Result<Vec<Record>> {
    let value: serde_json::Value = serde_json::from_str(content).context("Failed to parse JSON content")?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => match obj.remove("rows").or_else(|| obj.remove("data")) {
            Some(serde_json::Value::Array(items)) => items,
            Some(_) => bail!("'rows' field must be an array"),
            None => bail!("JSON object must have a 'rows' array field"),
        },
        _ => bail!("JSON must be an array of objects or an object with a 'rows' field"),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                bail!("Row {} is not a JSON object", i + 1);
            }
            serde_json::from_value::<Record>(item).context(format!("Failed to parse row {}", i + 1))
        })
        .collect()
}
