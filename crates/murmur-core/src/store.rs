//! Persisted preference store.
//!
//! The overlay keeps a tiny amount of cross-session state (the last
//! user-dragged position). Rather than reaching for ambient global state,
//! persistence is an injected collaborator so tests substitute an in-memory
//! store and the host picks the backing file.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{OverlayError, Result};

/// Keyed load/save of JSON values.
///
/// Writes are single-threaded in practice (drag release, settings save);
/// read-your-own-write is all callers rely on.
pub trait PreferenceStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>>;
    fn save(&self, key: &str, value: serde_json::Value) -> Result<()>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let values = self
            .values
            .lock()
            .map_err(|e| OverlayError::Store(format!("Store mutex poisoned: {}", e)))?;
        Ok(values.get(key).cloned())
    }

    fn save(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| OverlayError::Store(format!("Store mutex poisoned: {}", e)))?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// File-backed store holding one flat JSON object.
///
/// The whole file is re-read on load and rewritten on save; the value set is
/// a handful of keys, so simplicity wins over caching.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_all(&self) -> Result<HashMap<String, serde_json::Value>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl PreferenceStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let mut all = self.read_all()?;
        Ok(all.remove(key))
    }

    fn save(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let mut all = self.read_all()?;
        all.insert(key.to_string(), value);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&all)?)?;
        tracing::debug!(key, path = %self.path.display(), "Preference saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load("missing").unwrap().is_none());

        store
            .save("overlay-position", serde_json::json!({"x": 10.0, "y": 20.0}))
            .unwrap();
        let value = store.load("overlay-position").unwrap().unwrap();
        assert_eq!(value["x"], 10.0);
        assert_eq!(value["y"], 20.0);
    }

    #[test]
    fn test_memory_store_overwrite() {
        let store = MemoryStore::new();
        store.save("k", serde_json::json!(1)).unwrap();
        store.save("k", serde_json::json!(2)).unwrap();
        assert_eq!(store.load("k").unwrap().unwrap(), serde_json::json!(2));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let store = JsonFileStore::new(path.clone());

        assert!(store.load("overlay-position").unwrap().is_none());
        store
            .save("overlay-position", serde_json::json!({"x": 1.5, "y": -3.0}))
            .unwrap();

        // A fresh store over the same file sees the write.
        let reopened = JsonFileStore::new(path);
        let value = reopened.load("overlay-position").unwrap().unwrap();
        assert_eq!(value["x"], 1.5);
        assert_eq!(value["y"], -3.0);
    }

    #[test]
    fn test_file_store_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("prefs.json"));

        store.save("a", serde_json::json!("first")).unwrap();
        store.save("b", serde_json::json!("second")).unwrap();

        assert_eq!(store.load("a").unwrap().unwrap(), serde_json::json!("first"));
        assert_eq!(store.load("b").unwrap().unwrap(), serde_json::json!("second"));
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/deeper/prefs.json"));
        store.save("k", serde_json::json!(true)).unwrap();
        assert_eq!(store.load("k").unwrap().unwrap(), serde_json::json!(true));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = JsonFileStore::new(path);
        assert!(store.load("anything").is_err());
    }
}
