//! Value store maintenance

use anyhow::{Context, Result};
use ifcheck_lib::store::StoredValue;
use std::path::PathBuf;
use tabled::Tabled;

use crate::config::{load_stores, store_path};
use crate::output::{print_success, print_table, print_warning, OutputFormat};

#[derive(Tabled)]
struct StoreRow {
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn format_timestamp(timestamp: f64) -> String {
    chrono::DateTime::from_timestamp(timestamp as i64, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}

pub fn show(store: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let path = store_path(store)?;
    let snapshot = load_stores(&path)?.snapshot();

    let mut rows = Vec::new();
    for (item, store) in &snapshot {
        let mut keys: Vec<&str> = store.keys().collect();
        keys.sort_unstable();
        for key in keys {
            let Some(value) = ifcheck_lib::ValueStore::get(store, key) else {
                continue;
            };
            let (kind, timestamp, value) = match value {
                StoredValue::Counter { timestamp, value } => ("counter", timestamp, value.to_string()),
                StoredValue::Average { timestamp, value } => ("average", timestamp, format!("{:.2}", value)),
            };
            rows.push(StoreRow {
                item: item.clone(),
                key: key.to_string(),
                kind: kind.to_string(),
                timestamp: format_timestamp(timestamp),
                value,
            });
        }
    }

    print_table(rows, &snapshot, format);
    Ok(())
}

pub fn clear(store: Option<PathBuf>) -> Result<()> {
    let path = store_path(store)?;
    if !path.exists() {
        print_warning("Value store is already empty");
        return Ok(());
    }
    std::fs::remove_file(&path).with_context(|| format!("Failed to remove {:?}", path))?;
    print_success(&format!("Cleared value store {}", path.display()));
    Ok(())
}
