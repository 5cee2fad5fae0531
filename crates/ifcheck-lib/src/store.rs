//! Per-item value store
//!
//! Rates and averages need the previous sample. The scheduler owns
//! persistence; the engine only sees the [`ValueStore`] trait.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A persisted sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoredValue {
    /// Last raw counter reading
    Counter { timestamp: f64, value: u64 },
    /// Last smoothed value
    Average { timestamp: f64, value: f64 },
}

/// Key/value persistence scoped to one item on one host
pub trait ValueStore: Send {
    fn get(&self, key: &str) -> Option<StoredValue>;

    fn set(&mut self, key: &str, value: StoredValue);
}

/// In-memory store; serializable so a caller can persist it between cycles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryValueStore {
    entries: HashMap<String, StoredValue>,
}

impl InMemoryValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn remove(&mut self, key: &str) -> Option<StoredValue> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl ValueStore for InMemoryValueStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        self.entries.get(key).copied()
    }

    fn set(&mut self, key: &str, value: StoredValue) {
        self.entries.insert(key.to_string(), value);
    }
}

/// Key under which a counter or average of an item is stored
pub fn item_key(item: &str, node: Option<&str>) -> String {
    match node {
        Some(node) => format!("{}@{}", item, node),
        None => item.to_string(),
    }
}

pub fn metric_key(item_key: &str, metric: &str) -> String {
    format!("{}.{}", metric, item_key)
}
