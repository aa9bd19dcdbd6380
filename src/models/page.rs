//! Page records as served by the backend.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::locale::{LocaleError, LocaleTable};

/// A managed image record with tags and localization text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "nullable_list")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_link: String,
    #[serde(default)]
    pub annotated_image_link: Option<String>,
    /// JSON-encoded array of locale entries, kept as text.
    #[serde(default, deserialize_with = "locale_text")]
    pub locale: Option<String>,
}

impl Page {
    /// Link to the annotated derivative, if one has been saved.
    pub fn annotated_image(&self) -> Option<&str> {
        self.annotated_image_link
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Tags as an order-independent set.
    pub fn tag_set(&self) -> BTreeSet<&str> {
        self.tags.iter().map(String::as_str).collect()
    }

    /// Raw locale text, empty when the page carries none.
    pub fn locale_text(&self) -> &str {
        self.locale.as_deref().unwrap_or("")
    }

    /// Parse the stored locale text. A page without locale has an empty table.
    pub fn locale_table(&self) -> Result<LocaleTable, LocaleError> {
        match self.locale.as_deref() {
            Some(text) if !text.trim().is_empty() => LocaleTable::parse(text),
            _ => Ok(LocaleTable::default()),
        }
    }
}

/// Input for the create-page form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPage {
    pub name: String,
    pub tags: Vec<String>,
    pub image: PathBuf,
    pub locale: String,
}

impl NewPage {
    /// Comma-joined tag list as the backend expects it.
    pub fn tags_csv(&self) -> String {
        self.tags.join(",")
    }
}

/// Identifiers are opaque; numeric ids are accepted and stringified.
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Locale is normally a JSON string; structured JSON is re-encoded to text.
fn locale_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Ok(Some(other.to_string())),
    }
}
