use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::ImportError;

const BUILTIN_TABLE: &str = include_str!("../data/translations.toml");

/// Read-only translation service consulted by the decoders.
///
/// Implementations are shared between decoder workers, so they must be safe
/// for concurrent reads.
pub trait CategoryLookup: Send + Sync {
    /// Canonical category name for a raw category/chapter token
    fn lookup_category(&self, raw: &str) -> Option<String>;

    /// Canonical unit name for a raw unit token
    fn lookup_unit(&self, raw: &str) -> Option<String>;
}

#[derive(Debug, Deserialize, Default)]
struct TranslationFile {
    #[serde(default)]
    categories: HashMap<String, String>,
    #[serde(default)]
    units: HashMap<String, String>,
}

/// Category and unit translation maps loaded from TOML
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    categories: HashMap<String, String>,
    units: HashMap<String, String>,
}

impl TranslationTable {
    /// The table shipped with the crate
    pub fn builtin() -> Result<Self, ImportError> {
        Self::from_toml(BUILTIN_TABLE)
    }

    /// Load a table from a TOML file with `[categories]` and `[units]` tables
    pub fn from_path(path: &Path) -> Result<Self, ImportError> {
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?;
        Ok(Self::from_file(settings.try_deserialize()?))
    }

    pub fn from_toml(source: &str) -> Result<Self, ImportError> {
        let settings = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;
        Ok(Self::from_file(settings.try_deserialize()?))
    }

    /// Build a table from explicit pairs
    pub fn from_pairs<'a>(
        categories: impl IntoIterator<Item = (&'a str, &'a str)>,
        units: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        TranslationTable {
            categories: categories
                .into_iter()
                .map(|(k, v)| (normalize_key(k), v.to_string()))
                .collect(),
            units: units
                .into_iter()
                .map(|(k, v)| (normalize_key(k), v.to_string()))
                .collect(),
        }
    }

    fn from_file(file: TranslationFile) -> Self {
        TranslationTable {
            categories: file
                .categories
                .into_iter()
                .map(|(k, v)| (normalize_key(&k), v))
                .collect(),
            units: file
                .units
                .into_iter()
                .map(|(k, v)| (normalize_key(&k), v))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len() + self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CategoryLookup for TranslationTable {
    fn lookup_category(&self, raw: &str) -> Option<String> {
        self.categories.get(&normalize_key(raw)).cloned()
    }

    fn lookup_unit(&self, raw: &str) -> Option<String> {
        self.units.get(&normalize_key(raw)).cloned()
    }
}

fn normalize_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches('.')
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_loads() {
        let table = TranslationTable::builtin().unwrap();
        assert!(!table.is_empty());
        assert_eq!(table.lookup_category("Soup").as_deref(), Some("Soups"));
        assert_eq!(
            table.lookup_category("  LOW   fat ").as_deref(),
            Some("Diet: Low Fat")
        );
        assert_eq!(table.lookup_unit("Tbsp.").as_deref(), Some("tablespoon"));
    }

    #[test]
    fn test_unknown_token_is_not_found() {
        let table = TranslationTable::from_pairs([("soup", "Soups")], []);
        assert!(table.lookup_category("Casseroles").is_none());
        assert!(table.lookup_unit("cup").is_none());
    }

    #[test]
    fn test_from_toml() {
        let table = TranslationTable::from_toml(
            r#"
            [categories]
            "main dish" = "Course: Main Dishes"

            [units]
            "lb" = "pound"
            "#,
        )
        .unwrap();
        assert_eq!(
            table.lookup_category("Main Dish").as_deref(),
            Some("Course: Main Dishes")
        );
        assert_eq!(table.lookup_unit("LB").as_deref(), Some("pound"));
    }

    #[test]
    fn test_table_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TranslationTable>();
    }
}
