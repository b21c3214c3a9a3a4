use anyhow::{Context, Result};
use chrono::Utc;
use csv::Writer;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::input::InputFormat;
use crate::pipeline::RunSummary;
use crate::record::Record;

/// Write rows in the format named by the output extension
pub fn export_rows(records: &[Record], summary: &RunSummary, output_path: &Path) -> Result<()> {
    let format = InputFormat::from_path(output_path).context(format!(
        "Cannot determine output format from file extension. Expected .csv or .json: {}",
        output_path.display()
    ))?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create output directory: {}", parent.display()))?;
    }

    match format {
        InputFormat::Csv => export_csv(records, output_path),
        InputFormat::Json => export_json(records, summary, output_path),
    }
}

/// Header for a set of rows: every column, in first-seen order
pub fn csv_columns(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for record in records {
        for (key, _) in record.fields() {
            if seen.insert(key) {
                columns.push(key.to_string());
            }
        }
    }
    columns
}

pub fn export_csv(records: &[Record], output_path: &Path) -> Result<()> {
    debug!("Exporting {} rows to CSV: {}", records.len(), output_path.display());

    let file = File::create(output_path)
        .context(format!("Failed to create output file: {}", output_path.display()))?;
    let mut wtr = Writer::from_writer(file);

    let columns = csv_columns(records);
    wtr.write_record(&columns)?;

    for record in records {
        let cells = columns
            .iter()
            .map(|column| record.get(column).and_then(|v| v.as_deref()).unwrap_or(""));
        wtr.write_record(cells)?;
    }

    wtr.flush()?;
    info!("Successfully exported {} rows to CSV: {}", records.len(), output_path.display());

    Ok(())
}

#[derive(Serialize)]
struct JsonExport<'a> {
    generated_at: String,
    summary: &'a RunSummary,
    rows: &'a [Record],
}

/// Pretty JSON with the run summary; the `rows` array can be fed back in as input
pub fn export_json(records: &[Record], summary: &RunSummary, output_path: &Path) -> Result<()> {
    debug!("Exporting {} rows to JSON: {}", records.len(), output_path.display());

    let json_output = JsonExport {
        generated_at: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        summary,
        rows: records,
    };
    let json_string = serde_json::to_string_pretty(&json_output)?;

    let mut file = File::create(output_path)
        .context(format!("Failed to create output file: {}", output_path.display()))?;
    file.write_all(json_string.as_bytes())?;

    info!("Successfully exported {} rows to JSON: {}", records.len(), output_path.display());

    Ok(())
}
