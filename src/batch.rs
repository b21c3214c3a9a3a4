//! Batched mail-provider classification
//!
//! Rows are walked in fixed-size batches. Within a batch every distinct mail
//! domain is classified concurrently; the batch is a checkpoint, so progress
//! is reported only once all of its lookups have finished.

use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::progress::{classification_progress, ProgressEvent, ProgressReporter};
use crate::provider::{ProviderClassifier, UNKNOWN_PROVIDER};
use crate::record::{KnownField, Record};
use crate::website::email_domain;

/// Batch size used when none is configured
pub const DEFAULT_BATCH_SIZE: usize = 10;

pub struct BatchClassificationRunner<'a> {
    classifier: &'a ProviderClassifier,
    batch_size: usize,
}

impl<'a> BatchClassificationRunner<'a> {
    pub fn new(classifier: &'a ProviderClassifier, batch_size: usize) -> Self {
        Self {
            classifier,
            batch_size: batch_size.max(1),
        }
    }

    /// Set `mxProvider` on every row that has an email. Returns the number of
    /// rows classified.
    ///
    /// Rows without an email are left untouched. An email with no usable
    /// domain is classified as `"unknown"` without a lookup.
    pub async fn run(&self, rows: &mut [Record], progress: &dyn ProgressReporter) -> usize {
        let total = rows.len();
        let mut processed = 0;
        let mut classified = 0;

        for (batch_index, batch) in rows.chunks_mut(self.batch_size).enumerate() {
            let mut seen = HashSet::new();
            let domains: Vec<String> = batch
                .iter()
                .filter_map(|row| row.email().and_then(email_domain))
                .filter(|domain| seen.insert(domain.clone()))
                .collect();

            debug!(
                "Batch {}: {} rows, {} distinct mail domains",
                batch_index + 1,
                batch.len(),
                domains.len()
            );

            let lookups = domains.iter().map(|domain| async move {
                let provider = self.classifier.classify(domain).await;
                (domain.as_str(), provider)
            });
            let providers: HashMap<&str, String> = join_all(lookups).await.into_iter().collect();

            for row in batch.iter_mut() {
                let Some(email) = row.email() else {
                    continue;
                };
                let provider = email_domain(email)
                    .and_then(|domain| providers.get(domain.as_str()).cloned())
                    .unwrap_or_else(|| UNKNOWN_PROVIDER.to_string());
                row.set_known(KnownField::MxProvider, provider);
                classified += 1;
            }

            processed += batch.len();
            progress.report(ProgressEvent::new(
                classification_progress(processed, total),
                format!("Processing MX records ({}/{})...", processed, total),
            ));
        }

        classified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::MxLookup;
    use crate::provider::ProviderRule;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct StaticLookup {
        hosts: HashMap<String, Vec<String>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MxLookup for StaticLookup {
        async fn mx_hosts(&self, domain: &str) -> Vec<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.hosts.get(domain).cloned().unwrap_or_default()
        }
    }

    fn classifier() -> (ProviderClassifier, Arc<StaticLookup>) {
        let mut hosts = HashMap::new();
        hosts.insert("x.com".to_string(), vec!["aspmx.l.google.com".to_string()]);
        hosts.insert("y.com".to_string(), vec!["y-com.mail.protection.outlook.com".to_string()]);
        let lookup = Arc::new(StaticLookup {
            hosts,
            calls: AtomicUsize::new(0),
        });
        let rules = vec![
            ProviderRule::new("google", ["google"], 1),
            ProviderRule::new("microsoft", ["outlook"], 1),
        ];
        (ProviderClassifier::new(rules, lookup.clone()), lookup)
    }

    fn row(email: &str) -> Record {
        Record::from_pairs([("email", email)])
    }

    #[tokio::test]
    async fn test_assigns_providers_and_skips_rows_without_email() {
        let (classifier, _) = classifier();
        let mut rows = vec![
            row("a@x.com"),
            Record::from_pairs([("website", "z.com")]),
            row("b@Y.com"),
            row("broken"),
        ];

        let runner = BatchClassificationRunner::new(&classifier, 10);
        let classified = runner.run(&mut rows, &crate::progress::NoopProgress).await;

        assert_eq!(classified, 3);
        assert_eq!(rows[0].mx_provider(), Some("google"));
        assert_eq!(rows[1].mx_provider(), None);
        assert_eq!(rows[2].mx_provider(), Some("microsoft"));
        assert_eq!(rows[3].mx_provider(), Some("unknown"));
    }

    #[tokio::test]
    async fn test_repeat_domains_cost_one_lookup() {
        let (classifier, lookup) = classifier();
        let mut rows: Vec<Record> = (0..25).map(|i| row(&format!("user{}@x.com", i))).collect();

        BatchClassificationRunner::new(&classifier, 10)
            .run(&mut rows, &crate::progress::NoopProgress)
            .await;

        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
        assert!(rows.iter().all(|r| r.mx_provider() == Some("google")));
    }

    #[tokio::test]
    async fn test_reports_progress_after_each_batch() {
        let (classifier, _) = classifier();
        let mut rows: Vec<Record> = (0..25).map(|i| row(&format!("user{}@y.com", i))).collect();
        let (tx, mut rx) = mpsc::unbounded_channel();

        BatchClassificationRunner::new(&classifier, 10).run(&mut rows, &tx).await;
        drop(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(
            events,
            vec![
                ProgressEvent::new(66, "Processing MX records (10/25)..."),
                ProgressEvent::new(82, "Processing MX records (20/25)..."),
                ProgressEvent::new(90, "Processing MX records (25/25)..."),
            ]
        );
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_treated_as_one() {
        let (classifier, _) = classifier();
        let mut rows = vec![row("a@x.com"), row("b@x.com")];
        let (tx, mut rx) = mpsc::unbounded_channel();

        BatchClassificationRunner::new(&classifier, 0).run(&mut rows, &tx).await;
        drop(tx);

        let mut count = 0;
        while rx.recv().await.is_some() {
            count += 1;
        }
        assert_eq!(count, 2);
    }
}
