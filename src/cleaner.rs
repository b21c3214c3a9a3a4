//! Column cleaning
//!
//! Reshapes loosely-typed rows into the canonical schema: one normalized
//! `website`, the preserved contact columns copied verbatim, and any other
//! column that carries a value and is not an alternate-value or placeholder
//! column.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::record::{KnownField, Record};
use crate::website::normalize_website;

/// Columns that may hold a website, in scan order
pub const WEBSITE_COLUMNS: [&str; 6] = ["website", "site", "sites", "domain", "url", "web"];

// Alternate-value columns such as email_1, phone_2
static NUMBERED_SUFFIX_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"_\d+$").unwrap());

// Spreadsheet placeholder headers such as "1", "17"
static NUMERIC_NAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

/// Clean every row, preserving order
pub fn clean_records(rows: &[Record]) -> Vec<Record> {
    rows.iter().map(clean_record).collect()
}

/// Clean a single row. Running this on its own output returns the same row.
pub fn clean_record(row: &Record) -> Record {
    let mut clean = Record::new();

    // The first website-like column with a value decides; a value that does
    // not normalize does not fall through to later columns.
    let mut website_found = false;
    if let Some(raw) = WEBSITE_COLUMNS.iter().find_map(|col| row.text(col)) {
        if let Some(domain) = normalize_website(Some(raw)) {
            clean.set_known(KnownField::Website, domain);
            website_found = true;
        }
    }

    for field in KnownField::PRESERVED {
        if field == KnownField::Website && website_found {
            continue;
        }
        if let Some(value) = row.get(field.as_str()) {
            clean.set(field.as_str(), value.clone());
        }
    }

    for (key, value) in row.fields() {
        if KnownField::from_name(key).is_some()
            || is_website_column(key)
            || NUMBERED_SUFFIX_REGEX.is_match(key)
            || NUMERIC_NAME_REGEX.is_match(key)
        {
            continue;
        }
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            clean.set(key, Some(value.to_string()));
        }
    }

    clean
}

/// Website-like column names are matched case-insensitively when filtering
pub fn is_website_column(name: &str) -> bool {
    let name = name.to_lowercase();
    WEBSITE_COLUMNS.contains(&name.as_str())
}

/// Whether a column name is an alternate-value column (`email_1`, `phone_12`)
pub fn is_numbered_column(name: &str) -> bool {
    NUMBERED_SUFFIX_REGEX.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_website_is_normalized_from_first_present_column() {
        let row = Record::from_pairs([("url", "https://www.Acme.com/about"), ("web", "other.org")]);
        let clean = clean_record(&row);

        assert_eq!(clean.website(), Some("acme.com"));
        assert!(!clean.contains("url"));
        assert!(!clean.contains("web"));
    }

    #[test]
    fn test_invalid_first_website_column_does_not_fall_through() {
        let row = Record::from_pairs([("site", "n/a"), ("url", "https://acme.com")]);
        let clean = clean_record(&row);

        assert_eq!(clean.website(), None);
        assert!(!clean.contains("url"));
    }

    #[test]
    fn test_unnormalizable_website_column_is_kept_verbatim() {
        let row = Record::from_pairs([("website", "tbd"), ("email", "a@x.com")]);
        let clean = clean_record(&row);

        assert_eq!(clean.text("website"), Some("tbd"));
    }

    #[test]
    fn test_empty_website_column_is_skipped_during_scan() {
        let row = Record::from_pairs([("website", ""), ("domain", "acme.com")]);
        let clean = clean_record(&row);

        assert_eq!(clean.website(), Some("acme.com"));
    }

    #[test]
    fn test_preserved_columns_copied_even_when_null() {
        let mut row = Record::from_pairs([("email", "a@x.com"), ("fullName", "Ann Lee")]);
        row.set("phone", None);
        row.set("title", Some(String::new()));

        let clean = clean_record(&row);

        assert_eq!(clean.email(), Some("a@x.com"));
        assert_eq!(clean.text("fullName"), Some("Ann Lee"));
        assert_eq!(clean.get("phone"), Some(&None));
        assert_eq!(clean.get("title"), Some(&Some(String::new())));
    }

    #[test]
    fn test_extra_columns_filtered() {
        let mut row = Record::from_pairs([
            ("email", "a@x.com"),
            ("linkedin", "in/ann"),
            ("email_1", "b@x.com"),
            ("phone_2", "555"),
            ("3", "junk"),
            ("Website", "https://acme.com"),
            ("notes", ""),
        ]);
        row.set("region", None);

        let clean = clean_record(&row);
        let keys: Vec<&str> = clean.fields().map(|(k, _)| k).collect();

        assert_eq!(keys, vec!["email", "linkedin"]);
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let mut row = Record::from_pairs([
            ("Company Size", "50"),
            ("site", "HTTP://WWW.Acme.COM:443/x"),
            ("email", "Ann@Acme.com"),
            ("email_2", "ann.lee@acme.com"),
            ("mxProvider", "google"),
            ("7", "x"),
        ]);
        row.set("department", None);
        let mut rows = vec![row, Record::from_pairs([("website", "tbd"), ("url", "acme.io")])];
        for messy in ["acme.com /about", "https:// acme.com", "www.www.acme.com", ".www.acme.com"] {
            rows.push(Record::from_pairs([("website", messy)]));
        }

        let once = clean_records(&rows);
        let twice = clean_records(&once);

        assert_eq!(once, twice);
        assert_eq!(once[0].website(), Some("acme.com"));
        assert_eq!(once[0].text("Company Size"), Some("50"));
        assert!(once[2..].iter().all(|r| r.website() == Some("acme.com")));
    }

    #[test]
    fn test_column_helpers() {
        assert!(is_website_column("URL"));
        assert!(!is_website_column("homepage"));
        assert!(is_numbered_column("email_12"));
        assert!(!is_numbered_column("email_x"));
    }
}
