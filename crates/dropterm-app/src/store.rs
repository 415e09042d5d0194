//! Sectioned key/value store
//!
//! Window, tab and pane layout is kept as named sections of key/value pairs
//! (`[layout-Child-0-1-2]`, ...). The store is serialized as a TOML document
//! with one table per section.

use std::path::Path;

use toml::{Table, Value};

use crate::config::{layout_path, write_private, ConfigError};

/// Ordered collection of sections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigStore {
    sections: Table,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document. Top-level entries that are not tables are
    /// ignored.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let document: Table = toml::from_str(content)?;
        let mut sections = Table::new();
        for (name, value) in document {
            match value {
                Value::Table(_) => {
                    sections.insert(name, value);
                }
                _ => log::warn!("Ignoring top-level layout entry '{}'", name),
            }
        }
        Ok(Self { sections })
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&self.sections)?)
    }

    /// Load the store from the default location
    pub fn load() -> Result<Self, ConfigError> {
        let path = layout_path().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&path)
    }

    /// Load the store from a file; a missing file is an empty store
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Save the store to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = layout_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        write_private(path, &self.to_toml_string()?)
    }

    /// Section names. Returned owned so callers can remove sections while
    /// walking the list.
    pub fn sections(&self) -> Vec<String> {
        self.sections.keys().cloned().collect()
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    pub fn remove_section(&mut self, section: &str) -> bool {
        self.sections.remove(section).is_some()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&Value> {
        self.sections.get(section)?.as_table()?.get(key)
    }

    pub fn get_str(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key)?.as_str()
    }

    /// Integer value; numeric strings are accepted too
    pub fn get_int(&self, section: &str, key: &str) -> Option<i64> {
        match self.get(section, key)? {
            Value::Integer(i) => Some(*i),
            Value::Float(f) => Some(*f as i64),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean value; `"true"`/`"false"` strings and integers are accepted
    pub fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        match self.get(section, key)? {
            Value::Boolean(b) => Some(*b),
            Value::Integer(i) => Some(*i != 0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Set a value, creating the section if needed
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<Value>) {
        let entry = self
            .sections
            .entry(section.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        if !entry.is_table() {
            *entry = Value::Table(Table::new());
        }
        if let Value::Table(table) = entry {
            table.insert(key.to_string(), value.into());
        }
    }

    pub fn set_int(&mut self, section: &str, key: &str, value: i64) {
        self.set(section, key, Value::Integer(value));
    }

    pub fn set_bool(&mut self, section: &str, key: &str, value: bool) {
        self.set(section, key, Value::Boolean(value));
    }

    pub fn set_str(&mut self, section: &str, key: &str, value: &str) {
        self.set(section, key, Value::String(value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut store = ConfigStore::new();
        store.set_str("layout-Tabs-0-0", "name", "Logs");
        store.set_int("layout-Child-0-0-1", "pos", 4200);
        store.set_bool("layout-Screen-0", "fullscreen", true);

        assert_eq!(store.get_str("layout-Tabs-0-0", "name"), Some("Logs"));
        assert_eq!(store.get_int("layout-Child-0-0-1", "pos"), Some(4200));
        assert_eq!(store.get_bool("layout-Screen-0", "fullscreen"), Some(true));
        assert_eq!(store.get_str("layout-Tabs-0-0", "missing"), None);
        assert_eq!(store.get_str("no-such-section", "name"), None);
    }

    #[test]
    fn test_lenient_scalars() {
        let store = ConfigStore::from_toml_str(
            r#"
            [s]
            flag = "True"
            off = 0
            num = "12"
            "#,
        )
        .unwrap();
        assert_eq!(store.get_bool("s", "flag"), Some(true));
        assert_eq!(store.get_bool("s", "off"), Some(false));
        assert_eq!(store.get_int("s", "num"), Some(12));
    }

    #[test]
    fn test_remove_section_while_walking() {
        let mut store = ConfigStore::new();
        store.set_str("a", "k", "1");
        store.set_str("b", "k", "2");
        store.set_str("c", "k", "3");
        for section in store.sections() {
            if section != "b" {
                store.remove_section(&section);
            }
        }
        assert_eq!(store.sections(), vec!["b".to_string()]);
    }

    #[test]
    fn test_top_level_scalars_are_ignored() {
        let store = ConfigStore::from_toml_str("stray = 1\n[a]\nk = 2\n").unwrap();
        assert_eq!(store.sections(), vec!["a".to_string()]);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.toml");

        let mut store = ConfigStore::new();
        store.set_str("layout-Child-0-0-0", "pwd", "/home/user");
        store.set_int("layout-Child-0-0-0", "id", 0);
        store.save_to(&path).unwrap();

        let loaded = ConfigStore::load_from(&path).unwrap();
        assert_eq!(loaded, store);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::load_from(&dir.path().join("none.toml")).unwrap();
        assert!(store.sections().is_empty());
    }
}
