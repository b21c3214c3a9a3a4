//! Mail provider classification
//!
//! A domain's mail-exchange hosts are scored against a list of provider rules.
//! Every host that matches any of a rule's patterns adds the rule's priority to
//! its score, and the highest score wins. Results are cached per domain for the
//! lifetime of one classifier, which the pipeline creates per run.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::dns::MxLookup;

/// Provider reported when a domain has no mail-exchange records
pub const UNKNOWN_PROVIDER: &str = "unknown";

/// Provider reported when records exist but no rule matches them
pub const OTHER_PROVIDER: &str = "others";

/// A named set of host-name patterns with a scoring weight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRule {
    name: String,
    patterns: Vec<String>,
    priority: u32,
}

impl ProviderRule {
    /// Patterns are stored lowercased; empty patterns are dropped.
    pub fn new<'a>(name: &str, patterns: impl IntoIterator<Item = &'a str>, priority: u32) -> Self {
        Self {
            name: name.to_string(),
            patterns: patterns
                .into_iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            priority,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Case-insensitive substring match against a mail-exchange host
    pub fn matches(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        self.patterns.iter().any(|p| host.contains(p.as_str()))
    }
}

/// Outcome of classifying one domain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub provider: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mx_records: Option<Vec<String>>,
}

impl ClassificationResult {
    fn unknown() -> Self {
        Self {
            provider: UNKNOWN_PROVIDER.to_string(),
            confidence: 0.0,
            mx_records: None,
        }
    }
}

/// Score `mx_records` against `rules`.
///
/// Ties keep the rule that comes first in `rules`. Confidence is
/// `best_score / (record_count * 2)` and is not clamped.
pub fn detect_provider(rules: &[ProviderRule], mx_records: Vec<String>) -> ClassificationResult {
    if mx_records.is_empty() {
        return ClassificationResult::unknown();
    }

    let mut scores = vec![0u32; rules.len()];
    for record in &mx_records {
        for (score, rule) in scores.iter_mut().zip(rules) {
            if rule.matches(record) {
                *score = score.saturating_add(rule.priority);
            }
        }
    }

    let mut best: Option<(usize, u32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((index, score));
        }
    }

    match best {
        None => ClassificationResult {
            provider: OTHER_PROVIDER.to_string(),
            confidence: 0.5,
            mx_records: Some(mx_records),
        },
        Some((index, score)) => ClassificationResult {
            provider: rules[index].name.clone(),
            confidence: f64::from(score) / (mx_records.len() as f64 * 2.0),
            mx_records: Some(mx_records),
        },
    }
}

/// Run-scoped, thread-safe map of domain to classification.
///
/// Two concurrent misses for the same domain may both compute and insert;
/// the results are identical so the later write is harmless.
#[derive(Debug, Clone, Default)]
pub struct ClassificationCache {
    inner: Arc<RwLock<HashMap<String, ClassificationResult>>>,
}

impl ClassificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, domain: &str) -> Option<ClassificationResult> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.get(domain).cloned()
    }

    pub fn insert(&self, domain: &str, result: ClassificationResult) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.insert(domain.to_string(), result);
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

/// Classifies mail domains by provider, looking each domain up at most once
pub struct ProviderClassifier {
    rules: Arc<[ProviderRule]>,
    lookup: Arc<dyn MxLookup>,
    cache: ClassificationCache,
    lookups: AtomicUsize,
}

impl ProviderClassifier {
    pub fn new(rules: impl Into<Arc<[ProviderRule]>>, lookup: Arc<dyn MxLookup>) -> Self {
        Self {
            rules: rules.into(),
            lookup,
            cache: ClassificationCache::new(),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Provider name for `domain`. Never fails; problems degrade to `"unknown"`.
    pub async fn classify(&self, domain: &str) -> String {
        self.classify_detailed(domain).await.provider
    }

    /// Full classification for `domain`, served from the cache when possible
    pub async fn classify_detailed(&self, domain: &str) -> ClassificationResult {
        if domain.is_empty() {
            return ClassificationResult::unknown();
        }

        if let Some(cached) = self.cache.get(domain) {
            debug!("Cache hit - provider for {}: {}", domain, cached.provider);
            return cached;
        }

        self.lookups.fetch_add(1, Ordering::Relaxed);
        let mx_records = self.lookup.mx_hosts(domain).await;
        let result = detect_provider(&self.rules, mx_records);

        debug!(
            "Classified {} as {} (confidence {:.2})",
            domain, result.provider, result.confidence
        );

        self.cache.insert(domain, result.clone());
        result
    }

    /// Number of mail-exchange lookups issued so far
    pub fn lookups_performed(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    pub fn cache(&self) -> &ClassificationCache {
        &self.cache
    }

    pub fn rules(&self) -> &[ProviderRule] {
        &self.rules
    }
}
