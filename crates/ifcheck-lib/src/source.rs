//! Interface sources
//!
//! The agent transport is outside the engine; a source only has to hand
//! over the raw rows of one poll.

use crate::interface::{finalize_all, Interface, RawInterfaceRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Trait for agent transport implementations
#[async_trait]
pub trait InterfaceSource: Send + Sync {
    /// Raw interface rows of the current poll
    async fn fetch(&self) -> Result<Vec<RawInterfaceRecord>>;
}

/// Reads a section from a JSON file: an array of rows, each an array of
/// fields. Numbers are stringified, `null` becomes an empty field.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl InterfaceSource for JsonFileSource {
    async fn fetch(&self) -> Result<Vec<RawInterfaceRecord>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read section from {:?}", self.path))?;
        parse_section(&content).with_context(|| format!("Invalid section in {:?}", self.path))
    }
}

fn field_text(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => anyhow::bail!("unsupported field value: {}", other),
    }
}

fn parse_row(row: &[Value]) -> Result<RawInterfaceRecord> {
    let fields = row.iter().map(field_text).collect::<Result<Vec<_>>>()?;
    Ok(RawInterfaceRecord::from_row(&fields)?)
}

/// Parse a JSON section into raw records. Malformed rows are logged and
/// skipped so the remaining interfaces can still be checked.
pub fn parse_section(content: &str) -> Result<Vec<RawInterfaceRecord>> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(content).context("Section is not an array of rows")?;
    let mut records = Vec::with_capacity(rows.len());
    for (line, row) in rows.iter().enumerate() {
        match parse_row(row) {
            Ok(record) => records.push(record),
            Err(e) => {
                let error = format!("{:#}", e);
                warn!(row = line + 1, error = %error, "Skipping malformed interface row");
            }
        }
    }
    Ok(records)
}

/// Fetch and finalize one poll
pub async fn poll(source: &dyn InterfaceSource) -> Result<Vec<Interface>> {
    let raw = source.fetch().await?;
    debug!(rows = raw.len(), "Fetched interface section");
    Ok(finalize_all(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SECTION: &str = r#"[
        ["1", "lo", "24", "", "1", 266045395, 97385, 0, 0, 0, 0,
         266045395, 97385, 0, 0, 0, 0, 0, "lo", "00:00:00:00:00:00"],
        ["5", "vboxnet0", "6", "10000000", "1", 0, 0, 0, 0, 0, 0,
         20171, 113, 0, 0, 0, 0, 0, "vboxnet0", "0A:00:27:00:00:00", null, "node1"]
    ]"#;

    #[test]
    fn test_parse_section() {
        let records = parse_section(SECTION).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].descr, "lo");
        assert_eq!(records[0].speed, 0);
        assert_eq!(records[0].in_octets, 266045395);
        assert_eq!(records[1].phys_address, vec![0x0A, 0x00, 0x27, 0x00, 0x00, 0x00]);
        assert_eq!(records[1].group, None);
        assert_eq!(records[1].node.as_deref(), Some("node1"));
    }

    #[test]
    fn test_parse_section_rejects_non_array() {
        assert!(parse_section(r#"{"rows": []}"#).is_err());
        assert!(parse_section("not json").is_err());
    }

    #[test]
    fn test_parse_section_skips_bad_rows() {
        let records = parse_section(
            r#"[
                ["1", "eth0", "6", "10000000", "1", 100, 0, 0, 0, 0, 0,
                 100, 0, 0, 0, 0, 0, 0, "eth0", ""],
                ["2", "eth1", "6", "10000000", "1", "n/a", 0, 0, 0, 0, 0,
                 0, 0, 0, 0, 0, 0, 0, "eth1", ""],
                ["3", "eth2"],
                ["4", "eth3", "6", "10000000", "1", {"octets": 1}, 0, 0, 0, 0, 0,
                 0, 0, 0, 0, 0, 0, 0, "eth3", ""]
            ]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].descr, "eth0");
        assert_eq!(records[0].in_octets, 100);
    }

    #[test]
    fn test_bad_row_error_names_field() {
        let row: Vec<Value> = serde_json::from_str(
            r#"["1", "lo", "24", "", "1", "many", 0, 0, 0, 0, 0,
                0, 0, 0, 0, 0, 0, 0, "lo", ""]"#,
        )
        .unwrap();
        let err = parse_row(&row).unwrap_err();
        assert!(format!("{:#}", err).contains("in_octets"));
    }

    #[tokio::test]
    async fn test_json_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SECTION.as_bytes()).unwrap();

        let source = JsonFileSource::new(file.path());
        let interfaces = poll(&source).await.unwrap();
        assert_eq!(interfaces.len(), 2);
        assert_eq!(interfaces[0].speed, None);
        assert_eq!(interfaces[1].mac, "0A:00:27:00:00:00");
        assert_eq!(interfaces[1].oper_status_name, "up");
    }

    #[tokio::test]
    async fn test_json_file_source_missing_file() {
        let source = JsonFileSource::new("/nonexistent/section.json");
        assert!(source.fetch().await.is_err());
    }
}
