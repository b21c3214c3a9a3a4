//! Duplicate removal keyed on email, falling back to website

use std::collections::HashSet;

use crate::record::Record;

/// Identity key: lowercased, trimmed `email`, else lowercased, trimmed `website`
pub fn identity_key(row: &Record) -> Option<String> {
    let normalize = |value: &str| {
        let key = value.trim().to_lowercase();
        (!key.is_empty()).then_some(key)
    };

    row.email()
        .and_then(normalize)
        .or_else(|| row.website().and_then(normalize))
}

/// Keep the first row for each identity key, in first-occurrence order.
/// Rows without a key are dropped.
pub fn dedupe_records(rows: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| match identity_key(row) {
            Some(key) => seen.insert(key),
            None => false,
        })
        .collect()
}
