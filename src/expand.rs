//! Numbered email expansion
//!
//! Sheets exported from enrichment tools often carry several addresses per
//! company row (`email_1`, `email_2`, ... with matching `fullName_1`, ...).
//! Expansion fans each such row out into one row per address before cleaning.

use anyhow::Result;

use crate::record::{KnownField, Record};

/// Turns one input row into the rows the rest of the pipeline sees
pub trait RowExpander: Send + Sync {
    fn expand(&self, row: &Record) -> Result<Vec<Record>>;
}

/// Emits one row per non-empty `email_<n>` column, in ascending `n`.
///
/// Each emitted row gets `email` set to that address and every other
/// preserved column `<field>_<n>` promoted to `<field>`. Rows without
/// numbered emails pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberedEmailExpander;

impl RowExpander for NumberedEmailExpander {
    fn expand(&self, row: &Record) -> Result<Vec<Record>> {
        let mut numbered: Vec<(u32, &str)> = row
            .fields()
            .filter_map(|(key, value)| {
                let n = key.strip_prefix("email_")?.parse::<u32>().ok()?;
                let email = value?.trim();
                (!email.is_empty()).then_some((n, email))
            })
            .collect();

        if numbered.is_empty() {
            return Ok(vec![row.clone()]);
        }
        numbered.sort_by_key(|(n, _)| *n);

        let expanded = numbered
            .into_iter()
            .map(|(n, email)| {
                let mut out = row.clone();
                out.set_known(KnownField::Email, email);
                for field in KnownField::PRESERVED {
                    if field == KnownField::Email {
                        continue;
                    }
                    if let Some(value) = row.text(&format!("{}_{}", field, n)) {
                        out.set_known(field, value);
                    }
                }
                out
            })
            .collect();

        Ok(expanded)
    }
}

/// Whether any row carries an email: a non-empty `email` or `email_1`, or a
/// column whose name mentions "email"
pub fn has_email_columns(rows: &[Record]) -> bool {
    rows.iter().any(|row| {
        row.text("email").is_some()
            || row.text("email_1").is_some()
            || row.fields().any(|(key, _)| key.to_lowercase().contains("email"))
    })
}

/// Expansion runs when the first row carries a numbered email
pub fn needs_expansion(rows: &[Record]) -> bool {
    rows.first().and_then(|row| row.text("email_1")).is_some()
}
