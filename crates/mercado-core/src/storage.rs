//! Flat key/value store persisted as a JSON object, playing the role
//! browser local storage plays for a web app.

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl LocalStore {
    /// Store that never touches the disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
        }
    }

    /// Open the store at the default location (or `$MERCADO_STORAGE`)
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Open the store backed by `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Set a key and write the whole store back. On a failed write the
    /// previous value is restored, so memory never runs ahead of the file.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let previous = self.entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush() {
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        let Some(previous) = self.entries.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.flush() {
            self.entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("MERCADO_STORAGE") {
            return Ok(PathBuf::from(path));
        }
        Ok(Self::config_dir()?.join("storage.json"))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("mercado-magico"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("nope.json")).unwrap();
        assert_eq!(store.get("groq_api_key"), None);
    }

    #[test]
    fn test_set_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut store = LocalStore::open(&path).unwrap();
        store.set("system_prompt", "Sé breve").unwrap();
        store.set("groq_api_key", "gsk_123").unwrap();

        let reloaded = LocalStore::open(&path).unwrap();
        assert_eq!(reloaded.get("system_prompt"), Some("Sé breve"));
        assert_eq!(reloaded.get("groq_api_key"), Some("gsk_123"));

        let mut reloaded = reloaded;
        reloaded.remove("groq_api_key").unwrap();
        let again = LocalStore::open(&path).unwrap();
        assert_eq!(again.get("groq_api_key"), None);
    }

    #[test]
    fn test_failed_write_keeps_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        // the parent "directory" is a plain file, so every write fails
        let mut store = LocalStore::open(blocker.join("storage.json")).unwrap();
        assert!(store.set("groq_api_key", "gsk").is_err());
        assert_eq!(store.get("groq_api_key"), None);
    }

    #[test]
    fn test_failed_remove_keeps_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let mut store = LocalStore::open(&path).unwrap();
        store.set("provider", "groq").unwrap();

        // swap the file's location out from under the store
        store.path = Some(dir.path().join("storage.json").join("storage.json"));
        assert!(store.remove("provider").is_err());
        assert_eq!(store.get("provider"), Some("groq"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();
        assert!(LocalStore::open(&path).is_err());
    }
}
