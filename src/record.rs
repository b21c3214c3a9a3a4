//! Contact row model
//!
//! A [`Record`] is an open mapping from column name to an optional string value.
//! Columns the pipeline understands live in a small typed map keyed by
//! [`KnownField`]; every other column is kept, in arrival order, in an
//! extension list so unknown CSV columns pass through untouched.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Columns with a fixed meaning. Declaration order is the output column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KnownField {
    Website,
    Email,
    FullName,
    FirstName,
    LastName,
    Title,
    Phone,
    MxProvider,
    OtherDmName,
    Company,
    Department,
}

impl KnownField {
    /// Preserved columns, in the order the cleaner copies them
    pub const PRESERVED: [KnownField; 11] = [
        KnownField::Email,
        KnownField::FullName,
        KnownField::FirstName,
        KnownField::LastName,
        KnownField::Title,
        KnownField::Phone,
        KnownField::MxProvider,
        KnownField::OtherDmName,
        KnownField::Website,
        KnownField::Company,
        KnownField::Department,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KnownField::Website => "website",
            KnownField::Email => "email",
            KnownField::FullName => "fullName",
            KnownField::FirstName => "firstName",
            KnownField::LastName => "lastName",
            KnownField::Title => "title",
            KnownField::Phone => "phone",
            KnownField::MxProvider => "mxProvider",
            KnownField::OtherDmName => "other_dm_name",
            KnownField::Company => "company",
            KnownField::Department => "department",
        }
    }

    /// Exact (case-sensitive) column name lookup
    pub fn from_name(name: &str) -> Option<Self> {
        Self::PRESERVED.iter().copied().find(|f| f.as_str() == name)
    }
}

impl fmt::Display for KnownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One contact row.
///
/// A column can be absent, present with no value (`null` in JSON input), or
/// present with a string. The distinction matters to the cleaner, which copies
/// preserved columns whenever they are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    known: BTreeMap<KnownField, Option<String>>,
    extra: Vec<(String, Option<String>)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(column, value)` pairs. Later duplicates overwrite earlier ones.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut record = Self::new();
        for (key, value) in pairs {
            record.set(key, Some(value.into()));
        }
        record
    }

    /// Raw slot for `name`: `None` when absent, `Some(None)` when present without a value
    pub fn get(&self, name: &str) -> Option<&Option<String>> {
        match KnownField::from_name(name) {
            Some(field) => self.known.get(&field),
            None => self.extra.iter().find(|(k, _)| k == name).map(|(_, v)| v),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Non-empty value for `name`
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty())
    }

    /// Non-empty value of a known field
    pub fn known(&self, field: KnownField) -> Option<&str> {
        self.known
            .get(&field)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        match KnownField::from_name(&name) {
            Some(field) => {
                self.known.insert(field, value);
            }
            None => match self.extra.iter_mut().find(|(k, _)| *k == name) {
                Some(slot) => slot.1 = value,
                None => self.extra.push((name, value)),
            },
        }
    }

    pub fn set_known(&mut self, field: KnownField, value: impl Into<String>) {
        self.known.insert(field, Some(value.into()));
    }

    pub fn remove(&mut self, name: &str) -> Option<Option<String>> {
        match KnownField::from_name(name) {
            Some(field) => self.known.remove(&field),
            None => {
                let index = self.extra.iter().position(|(k, _)| k == name)?;
                Some(self.extra.remove(index).1)
            }
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.known(KnownField::Email)
    }

    pub fn website(&self) -> Option<&str> {
        self.known(KnownField::Website)
    }

    pub fn mx_provider(&self) -> Option<&str> {
        self.known(KnownField::MxProvider)
    }

    pub fn other_dm_name(&self) -> Option<&str> {
        self.known(KnownField::OtherDmName)
    }

    /// All columns: known fields in [`KnownField`] order, then extension columns in arrival order
    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.known
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
            .chain(self.extra.iter().map(|(k, v)| (k.as_str(), v.as_deref())))
    }

    pub fn len(&self) -> usize {
        self.known.len() + self.extra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.extra.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.fields() {
            map.serialize_entry(key, &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of column names to scalar values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
        let mut record = Record::new();
        while let Some((key, value)) = access.next_entry::<String, serde_json::Value>()? {
            record.set(key, scalar_to_text(value));
        }
        Ok(record)
    }
}

/// Numbers and booleans are kept as their textual form; nested values as compact JSON
fn scalar_to_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
