//! Persisted address registry
//!
//! Maps contract name to a per-chain address table, stored as JSON. The
//! orchestrator loads, records, and saves around every successful
//! deployment, so runs against different chains accumulate instead of
//! overwriting each other.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// `contract name -> { chain id -> address }`.
///
/// Chain ids are stored as decimal strings since JSON object keys are
/// strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRegistry {
    #[serde(flatten)]
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl AddressRegistry {
    /// Load from disk; a missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|e| RegistryError::Io(e.to_string()))?;
        serde_json::from_str(&text)
            .map_err(|e| RegistryError::Malformed(format!("{}: {}", path.display(), e)))
    }

    /// Write to disk, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), RegistryError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| RegistryError::Io(e.to_string()))?;
        }
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| RegistryError::Malformed(e.to_string()))?;
        fs::write(path, text).map_err(|e| RegistryError::Io(e.to_string()))
    }

    /// Record a deployment, replacing any previous address for the same
    /// contract on the same chain.
    pub fn record(&mut self, name: &str, chain_id: u64, address: &str) {
        self.entries
            .entry(name.to_string())
            .or_default()
            .insert(chain_id.to_string(), address.to_string());
    }

    /// Look up a recorded address.
    pub fn get(&self, name: &str, chain_id: u64) -> Option<&str> {
        self.entries
            .get(name)?
            .get(&chain_id.to_string())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contracts(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Registry or artifact persistence failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("registry io error: {0}")]
    Io(String),

    #[error("registry file is malformed: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("ethproxy-registry-{}-{}", std::process::id(), name))
    }

    #[test]
    fn missing_file_is_empty() {
        let registry = AddressRegistry::load(&temp_path("missing.json")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn record_and_lookup() {
        let mut registry = AddressRegistry::default();
        registry.record("SimpleStorage", 1337, "0xaaaa");
        registry.record("SimpleStorage", 1, "0xbbbb");
        assert_eq!(registry.get("SimpleStorage", 1337), Some("0xaaaa"));
        assert_eq!(registry.get("SimpleStorage", 1), Some("0xbbbb"));
        assert_eq!(registry.get("SimpleStorage", 5), None);
        assert_eq!(registry.get("Other", 1337), None);
    }

    #[test]
    fn read_merge_write_accumulates_chains() {
        let path = temp_path("merge.json");
        let _ = std::fs::remove_file(&path);

        // First run on chain 1337.
        let mut registry = AddressRegistry::load(&path).unwrap();
        registry.record("Complex", 1337, "0xaaaa");
        registry.save(&path).unwrap();

        // Second run on chain 1 must keep the 1337 entry.
        let mut registry = AddressRegistry::load(&path).unwrap();
        registry.record("Complex", 1, "0xbbbb");
        registry.save(&path).unwrap();

        let merged = AddressRegistry::load(&path).unwrap();
        assert_eq!(merged.get("Complex", 1337), Some("0xaaaa"));
        assert_eq!(merged.get("Complex", 1), Some("0xbbbb"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn rejects_malformed_files() {
        let path = temp_path("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            AddressRegistry::load(&path).unwrap_err(),
            RegistryError::Malformed(_)
        ));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn json_shape_is_name_then_chain() {
        let mut registry = AddressRegistry::default();
        registry.record("Box", 1337, "0xcccc");
        let json = serde_json::to_value(&registry).unwrap();
        assert_eq!(json["Box"]["1337"], "0xcccc");
    }
}
