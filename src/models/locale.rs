//! Locale entries and the text-encoded table pages carry.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Translations of one key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleValues {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub vn: String,
}

/// One translation key with its three language variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleEntry {
    pub name: String,
    #[serde(default)]
    pub values: LocaleValues,
}

impl LocaleEntry {
    pub fn new(name: &str, id: &str, en: &str, vn: &str) -> Self {
        Self {
            name: name.to_string(),
            values: LocaleValues {
                id: id.to_string(),
                en: en.to_string(),
                vn: vn.to_string(),
            },
        }
    }
}

/// Errors raised when locale text does not hold a locale-entry array.
#[derive(Debug, Error)]
pub enum LocaleError {
    #[error("Locale is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("Locale must be a JSON array of entries")]
    NotAnArray,

    #[error("Locale entry {index} is malformed: {source}")]
    Entry {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Parsed locale entries, in the order the backend stored them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleTable {
    entries: Vec<LocaleEntry>,
}

impl LocaleTable {
    /// Parse locale text into entries, reporting which entry is malformed.
    pub fn parse(text: &str) -> Result<Self, LocaleError> {
        let value: Value = serde_json::from_str(text).map_err(LocaleError::Syntax)?;
        let Value::Array(items) = value else {
            return Err(LocaleError::NotAnArray);
        };

        let entries = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item).map_err(|source| LocaleError::Entry { index, source })
            })
            .collect::<Result<Vec<LocaleEntry>, _>>()?;

        Ok(Self { entries })
    }

    /// Validate locale text for sending. Blank text means no entries and is
    /// sent as `[]`; anything else goes out exactly as typed.
    pub fn validate_for_upload(text: &str) -> Result<String, LocaleError> {
        if text.trim().is_empty() {
            return Ok("[]".to_string());
        }
        Self::parse(text)?;
        Ok(text.to_string())
    }

    pub fn entries(&self) -> &[LocaleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Table rows as `[name, id, en, vn]` cells.
    pub fn rows(&self) -> impl Iterator<Item = [&str; 4]> {
        self.entries.iter().map(|e| {
            [
                e.name.as_str(),
                e.values.id.as_str(),
                e.values.en.as_str(),
                e.values.vn.as_str(),
            ]
        })
    }
}

impl From<Vec<LocaleEntry>> for LocaleTable {
    fn from(entries: Vec<LocaleEntry>) -> Self {
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREETING: &str =
        r#"[{"name":"greeting","values":{"id":"halo","en":"hello","vn":"chào"}}]"#;

    #[test]
    fn test_parse_greeting_row() {
        let table = LocaleTable::parse(GREETING).unwrap();
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows, vec![["greeting", "halo", "hello", "chào"]]);
    }

    #[test]
    fn test_parse_keeps_backend_order() {
        let text = r#"[
            {"name":"zeta","values":{"id":"z","en":"z","vn":"z"}},
            {"name":"alpha","values":{"id":"a","en":"a","vn":"a"}}
        ]"#;
        let table = LocaleTable::parse(text).unwrap();
        let names: Vec<_> = table.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(matches!(
            LocaleTable::parse("[{"),
            Err(LocaleError::Syntax(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(matches!(
            LocaleTable::parse(r#"{"name":"x"}"#),
            Err(LocaleError::NotAnArray)
        ));
    }

    #[test]
    fn test_parse_reports_bad_entry_index() {
        let err = LocaleTable::parse(r#"[{"name":"ok"}, {"values":{}}]"#).unwrap_err();
        assert!(matches!(err, LocaleError::Entry { index: 1, .. }));
    }

    #[test]
    fn test_missing_values_default_to_empty() {
        let table = LocaleTable::parse(r#"[{"name":"k","values":{"en":"only"}}]"#).unwrap();
        assert_eq!(table.entries()[0].values.id, "");
        assert_eq!(table.entries()[0].values.en, "only");
    }

    #[test]
    fn test_blank_upload_text_is_empty_array() {
        assert_eq!(LocaleTable::validate_for_upload("").unwrap(), "[]");
        assert_eq!(LocaleTable::validate_for_upload("  \n").unwrap(), "[]");
        assert_eq!(LocaleTable::validate_for_upload(GREETING).unwrap(), GREETING);
        assert!(LocaleTable::validate_for_upload("nope").is_err());
    }
}
