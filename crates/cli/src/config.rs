//! File locations and value store persistence for the CLI

use anyhow::{Context, Result};
use ifcheck_lib::{InMemoryValueStore, RulesConfig, StoreRegistry};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default value store location
pub fn default_store_path() -> Result<PathBuf> {
    let home = dirs_next::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".cache").join("ifcheck").join("value_store.json"))
}

pub fn store_path(override_path: Option<PathBuf>) -> Result<PathBuf> {
    match override_path {
        Some(path) => Ok(path),
        None => default_store_path(),
    }
}

/// Load persisted stores; a missing file is an empty registry
pub fn load_stores(path: &Path) -> Result<StoreRegistry> {
    if !path.exists() {
        return Ok(StoreRegistry::new());
    }
    let content = std::fs::read_to_string(path).context("Failed to read value store")?;
    let snapshot: BTreeMap<String, InMemoryValueStore> =
        serde_json::from_str(&content).context("Failed to parse value store")?;
    Ok(StoreRegistry::from_snapshot(snapshot))
}

pub fn save_stores(path: &Path, stores: &StoreRegistry) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create value store directory")?;
    }
    let content =
        serde_json::to_string_pretty(&stores.snapshot()).context("Failed to serialize value store")?;
    std::fs::write(path, content).context("Failed to write value store")?;
    Ok(())
}

/// Rules from a file, or the built-in defaults
pub fn load_rules(path: Option<&Path>) -> Result<RulesConfig> {
    match path {
        Some(path) => RulesConfig::load(path),
        None => Ok(RulesConfig::default()),
    }
}
