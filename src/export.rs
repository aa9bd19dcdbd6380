//! Locale bundle export.
//!
//! The download endpoint returns a flat list of locale entries across pages.
//! It is regrouped into one `name -> text` mapping per language, keys sorted,
//! and written as `en.json`, `id.json` and `vn.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::models::LocaleEntry;

/// Language codes carried by every locale entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    En,
    Id,
    Vn,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Id, Language::Vn];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Id => "id",
            Language::Vn => "vn",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.json", self.code())
    }
}

/// Per-language mappings built from a flat entry list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleBundle {
    pub en: BTreeMap<String, String>,
    pub id: BTreeMap<String, String>,
    pub vn: BTreeMap<String, String>,
}

impl LocaleBundle {
    /// Regroup entries by language. A repeated name keeps its last value.
    pub fn from_entries(entries: &[LocaleEntry]) -> Self {
        let mut bundle = Self::default();
        for entry in entries {
            bundle.en.insert(entry.name.clone(), entry.values.en.clone());
            bundle.id.insert(entry.name.clone(), entry.values.id.clone());
            bundle.vn.insert(entry.name.clone(), entry.values.vn.clone());
        }
        bundle
    }

    pub fn get(&self, language: Language) -> &BTreeMap<String, String> {
        match language {
            Language::En => &self.en,
            Language::Id => &self.id,
            Language::Vn => &self.vn,
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.en.len()
    }

    pub fn is_empty(&self) -> bool {
        self.en.is_empty()
    }

    /// Pretty-printed JSON (two-space indent) with keys in ascending order.
    pub fn render(&self, language: Language) -> String {
        // BTreeMap serializes in key order.
        serde_json::to_string_pretty(self.get(language)).unwrap_or_else(|_| "{}".to_string())
    }

    /// Write all three files into `dir`, returning their paths.
    pub fn write_to(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(Language::ALL.len());
        for language in Language::ALL {
            let path = dir.join(language.file_name());
            fs::write(&path, self.render(language))?;
            written.push(path);
        }
        info!("Exported {} locale keys to {}", self.len(), dir.display());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<LocaleEntry> {
        vec![
            LocaleEntry::new("zeta", "z-id", "z-en", "z-vn"),
            LocaleEntry::new("alpha", "a-id", "a-en", "a-vn"),
            LocaleEntry::new("Beta", "b-id", "b-en", "b-vn"),
            LocaleEntry::new("alpha", "a2-id", "a2-en", "a2-vn"),
        ]
    }

    #[test]
    fn test_regroup_keeps_distinct_names_last_wins() {
        let bundle = LocaleBundle::from_entries(&entries());
        assert_eq!(bundle.len(), 3);
        assert_eq!(bundle.en["alpha"], "a2-en");
        assert_eq!(bundle.id["alpha"], "a2-id");
        assert_eq!(bundle.vn["zeta"], "z-vn");
    }

    #[test]
    fn test_render_sorted_two_space_indent() {
        let bundle = LocaleBundle::from_entries(&entries());
        let rendered = bundle.render(Language::En);
        assert_eq!(
            rendered,
            "{\n  \"Beta\": \"b-en\",\n  \"alpha\": \"a2-en\",\n  \"zeta\": \"z-en\"\n}"
        );
    }

    #[test]
    fn test_render_keys_strictly_ascending() {
        let many: Vec<_> = (0..50)
            .rev()
            .map(|i| LocaleEntry::new(&format!("key{:02}", i % 37), "i", "e", "v"))
            .collect();
        let bundle = LocaleBundle::from_entries(&many);
        let value: serde_json::Value = serde_json::from_str(&bundle.render(Language::Vn)).unwrap();
        let rendered = bundle.render(Language::Vn);
        let positions: Vec<usize> = bundle
            .vn
            .keys()
            .map(|k| rendered.find(&format!("\"{}\"", k)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(value.as_object().unwrap().len(), 37);
    }

    #[test]
    fn test_empty_input_renders_empty_object() {
        let bundle = LocaleBundle::from_entries(&[]);
        assert!(bundle.is_empty());
        assert_eq!(bundle.render(Language::Id), "{}");
    }

    #[test]
    fn test_write_to_creates_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = LocaleBundle::from_entries(&entries());
        let written = bundle.write_to(dir.path()).unwrap();

        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["en.json", "id.json", "vn.json"]);

        let id = fs::read_to_string(dir.path().join("id.json")).unwrap();
        assert!(id.contains("\"alpha\": \"a2-id\""));
    }
}
