//! Contact list processing pipeline
//!
//! Sequences expansion, cleaning, deduplication, provider classification and
//! alternate-contact assignment over one in-memory list of rows, reporting
//! stage-labelled progress along the way. Each run gets its own
//! classification cache.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::batch::{BatchClassificationRunner, DEFAULT_BATCH_SIZE};
use crate::cleaner::clean_records;
use crate::config::AppConfig;
use crate::contacts::assign_alternate_contacts;
use crate::dedup::{dedupe_records, identity_key};
use crate::dns::MxLookup;
use crate::expand::{has_email_columns, needs_expansion, NumberedEmailExpander, RowExpander};
use crate::progress::{ProgressEvent, ProgressReporter, CLASSIFICATION_END, CLASSIFICATION_START};
use crate::provider::{ProviderClassifier, ProviderRule};
use crate::record::Record;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid CSV data")]
    InvalidInput,

    #[error("Processing failed: {0}")]
    Processing(String),
}

/// Counters describing one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub input_rows: usize,
    pub expanded_rows: usize,
    pub rows_without_key: usize,
    pub duplicates_removed: usize,
    pub output_rows: usize,
    pub rows_classified: usize,
    pub domains_classified: usize,
    pub lookups_performed: usize,
    pub alternates_assigned: usize,
    pub provider_counts: BTreeMap<String, usize>,
    pub duration_secs: f64,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub records: Vec<Record>,
    pub summary: RunSummary,
}

pub struct Pipeline {
    rules: Arc<[ProviderRule]>,
    lookup: Arc<dyn MxLookup>,
    expander: Arc<dyn RowExpander>,
    batch_size: usize,
}

impl Pipeline {
    pub fn new(rules: Vec<ProviderRule>, lookup: Arc<dyn MxLookup>) -> Self {
        Self {
            rules: rules.into(),
            lookup,
            expander: Arc::new(NumberedEmailExpander),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn from_config(config: &AppConfig, lookup: Arc<dyn MxLookup>) -> Self {
        Self::new(config.provider_rules(), lookup).with_batch_size(config.pipeline.batch_size)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_expander(mut self, expander: Arc<dyn RowExpander>) -> Self {
        self.expander = expander;
        self
    }

    /// Process `rows` and return the cleaned, deduplicated, enriched list
    pub async fn run(&self, rows: Vec<Record>, progress: &dyn ProgressReporter) -> Result<Vec<Record>, PipelineError> {
        self.run_with_summary(rows, progress).await.map(|output| output.records)
    }

    /// Like [`Pipeline::run`], also returning run counters
    pub async fn run_with_summary(
        &self,
        rows: Vec<Record>,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineOutput, PipelineError> {
        if rows.is_empty() {
            return Err(PipelineError::InvalidInput);
        }

        self.process(rows, progress).await.map_err(|e| {
            error!("Pipeline run failed: {:#}", e);
            PipelineError::Processing(format!("{:#}", e))
        })
    }

    async fn process(&self, rows: Vec<Record>, progress: &dyn ProgressReporter) -> Result<PipelineOutput> {
        let started = Instant::now();
        let mut summary = RunSummary {
            input_rows: rows.len(),
            ..RunSummary::default()
        };

        progress.report(ProgressEvent::new(10, "Analyzing CSV structure..."));
        let has_email = has_email_columns(&rows);

        let rows = if has_email && needs_expansion(&rows) {
            debug!("Expanding numbered email columns across {} rows", rows.len());
            let mut expanded = Vec::with_capacity(rows.len());
            for (i, row) in rows.iter().enumerate() {
                let fanned = self
                    .expander
                    .expand(row)
                    .with_context(|| format!("Failed to expand row {}", i + 1))?;
                expanded.extend(fanned);
            }
            expanded
        } else {
            rows
        };
        summary.expanded_rows = rows.len();

        progress.report(ProgressEvent::new(30, "Cleaning data..."));
        let cleaned = clean_records(&rows);
        summary.rows_without_key = cleaned.iter().filter(|r| identity_key(r).is_none()).count();

        progress.report(ProgressEvent::new(40, "Removing duplicates..."));
        let mut unique = dedupe_records(cleaned);
        summary.duplicates_removed = summary.expanded_rows - summary.rows_without_key - unique.len();
        debug!(
            "Deduplicated {} rows to {} ({} duplicates, {} without email or website)",
            summary.expanded_rows,
            unique.len(),
            summary.duplicates_removed,
            summary.rows_without_key
        );

        if has_email {
            progress.report(ProgressEvent::new(CLASSIFICATION_START, "Processing MX records..."));

            let classifier = ProviderClassifier::new(self.rules.clone(), self.lookup.clone());
            summary.rows_classified = BatchClassificationRunner::new(&classifier, self.batch_size)
                .run(&mut unique, progress)
                .await;
            summary.domains_classified = classifier.cache().len();
            summary.lookups_performed = classifier.lookups_performed();

            progress.report(ProgressEvent::new(CLASSIFICATION_END, "Assigning alternate contacts..."));
            summary.alternates_assigned = assign_alternate_contacts(&mut unique);
        }

        let records = clean_records(&unique);

        summary.output_rows = records.len();
        for provider in records.iter().filter_map(|r| r.mx_provider()) {
            *summary.provider_counts.entry(provider.to_string()).or_insert(0) += 1;
        }
        summary.duration_secs = started.elapsed().as_secs_f64();

        progress.report(ProgressEvent::new(100, "Complete"));
        info!(
            "Processed {} rows into {} ({} lookups for {} domains) in {:.2}s",
            summary.input_rows,
            summary.output_rows,
            summary.lookups_performed,
            summary.domains_classified,
            summary.duration_secs
        );

        Ok(PipelineOutput { records, summary })
    }
}
