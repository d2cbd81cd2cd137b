//! Last-commit state persistence
//!
//! A single JSON file mapping repository full name to the last-notified
//! commit sha. Loads degrade to an empty map (first run, corrupt file);
//! saves are atomic via write-to-temp-then-rename so a crash mid-save
//! leaves either the old or the new complete state on disk.

use eyre::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Mapping from repository full name to last-notified commit sha
pub type StateMap = BTreeMap<String, String>;

/// Persistent store for per-repository last-commit state
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Create a store backed by the given file path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state map
    ///
    /// A missing or unreadable or corrupt file yields an empty map; state
    /// problems on load are never fatal.
    pub fn load(&self) -> StateMap {
        if !self.path.exists() {
            debug!(path = ?self.path, "No state file, starting with empty state");
            return StateMap::new();
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Failed to read state file, starting with empty state");
                return StateMap::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(map) => {
                debug!(path = ?self.path, "Loaded state");
                map
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Corrupt state file, starting with empty state");
                StateMap::new()
            }
        }
    }

    /// Save the state map atomically
    ///
    /// Writes to a sibling temp file and renames it over the target.
    pub fn save(&self, map: &StateMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create state directory")?;
        }

        let content = serde_json::to_string_pretty(map).context("Failed to serialize state")?;

        // Temp file must live on the same filesystem for rename to be atomic
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).context(format!("Failed to write temp state file {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).context(format!("Failed to replace state file {}", self.path.display()))?;

        debug!(path = ?self.path, entries = map.len(), "Saved state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = StateStore::new(temp.path().join("nonexistent.json"));

        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = StateStore::new(temp.path().join("last_commits.json"));

        let mut map = StateMap::new();
        map.insert("acme/widgets".to_string(), "abc123".to_string());
        map.insert("acme/gadgets".to_string(), "def456".to_string());

        store.save(&map).unwrap();
        assert_eq!(store.load(), map);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let store = StateStore::new(temp.path().join("nested").join("dir").join("state.json"));

        let mut map = StateMap::new();
        map.insert("acme/widgets".to_string(), "abc123".to_string());

        store.save(&map).unwrap();
        assert_eq!(store.load(), map);
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("last_commits.json");
        fs::write(&path, "{not valid json").unwrap();

        let store = StateStore::new(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_overwrites_previous_state() {
        let temp = TempDir::new().unwrap();
        let store = StateStore::new(temp.path().join("last_commits.json"));

        let mut map = StateMap::new();
        map.insert("acme/widgets".to_string(), "abc123".to_string());
        store.save(&map).unwrap();

        map.insert("acme/widgets".to_string(), "def456".to_string());
        store.save(&map).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.get("acme/widgets"), Some(&"def456".to_string()));
    }

    #[test]
    fn test_stale_temp_file_does_not_corrupt_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("last_commits.json");
        let store = StateStore::new(&path);

        let mut map = StateMap::new();
        map.insert("acme/widgets".to_string(), "abc123".to_string());
        store.save(&map).unwrap();

        // Simulate a crash mid-save: a half-written temp file left behind
        fs::write(path.with_extension("json.tmp"), "{\"acme/wid").unwrap();

        // The real state file is untouched
        assert_eq!(store.load(), map);

        // And the next save still succeeds
        map.insert("acme/gadgets".to_string(), "def456".to_string());
        store.save(&map).unwrap();
        assert_eq!(store.load(), map);
    }
}
