//! File-backed static store.
//!
//! Loads a whole store snapshot from a YAML (or JSON) document of the form:
//!
//! ```yaml
//! secret/app:
//!   user: bob
//!   pass: hunter2
//! secret/tls:
//!   bundle: {"cert": "...", "key": "..."}
//! ```
//!
//! String values are stored verbatim. Any other value is stored as its JSON
//! text, the way a KVDN client would hand it back.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use super::SecretsClient;
use crate::error::StoreError;

/// In-memory store snapshot.
#[derive(Debug, Clone, Default)]
pub struct FileStore {
    paths: BTreeMap<String, BTreeMap<String, String>>,
}

impl FileStore {
    /// Create a store from `path -> key -> value` entries.
    pub fn new(paths: BTreeMap<String, BTreeMap<String, String>>) -> Self {
        Self { paths }
    }

    /// Insert a single value, creating the path if needed.
    pub fn insert(&mut self, path: &str, key: &str, value: &str) {
        self.paths
            .entry(path.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    /// Load a snapshot from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Load` if the file can't be read or isn't a
    /// mapping of mappings.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let load_err = |reason: String| StoreError::Load {
            path: path.to_path_buf(),
            reason,
        };

        let text = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let doc: BTreeMap<String, BTreeMap<String, serde_json::Value>> =
            serde_yaml::from_str(&text).map_err(|e| load_err(e.to_string()))?;

        let paths = doc
            .into_iter()
            .map(|(store_path, keys)| {
                let keys = keys
                    .into_iter()
                    .map(|(k, v)| {
                        let raw = match v {
                            serde_json::Value::String(s) => s,
                            other => other.to_string(),
                        };
                        (k, raw)
                    })
                    .collect();
                (store_path, keys)
            })
            .collect::<BTreeMap<_, _>>();

        debug!(path = %path.display(), paths = paths.len(), "store snapshot loaded");
        Ok(Self { paths })
    }
}

impl SecretsClient for FileStore {
    fn get(&self, path: &str, key: &str) -> Result<String, StoreError> {
        self.paths
            .get(path)
            .and_then(|keys| keys.get(key))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                path: path.to_string(),
                key: key.to_string(),
            })
    }

    fn list_keys(&self, path: &str) -> Result<Vec<String>, StoreError> {
        self.paths
            .get(path)
            .map(|keys| keys.keys().cloned().collect())
            .ok_or_else(|| StoreError::PathNotFound(path.to_string()))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
