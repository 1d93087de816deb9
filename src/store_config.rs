use std::path::PathBuf;

use serde::Deserialize;

use crate::error::StoreError;

/// Settings for opening a [`crate::local_store::LocalStore`].
///
/// Hosts that talk to the library over FFI pass these as JSON, for example
/// `{"name": "showcase", "mapSize": 52428800}`. Any field left out keeps its
/// default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Base name; the environment lives in the `<name>.lmdb` directory.
    pub name: String,
    /// Maximum size of the memory map, in bytes.
    pub map_size: usize,
    /// Maximum concurrent read transactions.
    pub max_readers: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "showcase".to_string(),
            map_size: 32 * 1024 * 1024,
            max_readers: 126,
        }
    }
}

impl StoreConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let config: StoreConfig = serde_json::from_str(json)?;
        if config.name.trim().is_empty() {
            return Err(StoreError::validation("store name is empty"));
        }
        Ok(config)
    }

    pub fn directory(&self) -> PathBuf {
        PathBuf::from(format!("{}.lmdb", self.name))
    }
}
