//! Interface model
//!
//! Converts agent rows into [`RawInterfaceRecord`]s and finalizes them into
//! [`Interface`]s with derived fields (known/unknown speed, rendered MAC,
//! operational state name).

use crate::error::{CheckError, Result};
use serde::{Deserialize, Serialize};

/// Number of mandatory columns in an agent row
pub const ROW_FIELDS: usize = 20;

/// Port-type codes discovered by default (ethernet-like and physical ports)
pub const DEFAULT_PORT_TYPES: &[&str] = &[
    "6", "32", "62", "117", "127", "128", "129", "180", "181", "182", "205", "229",
];

/// One polled interface exactly as the agent reported it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInterfaceRecord {
    pub index: String,
    pub descr: String,
    pub if_type: String,
    /// Bits per second, 0 when unknown
    pub speed: u64,
    pub oper_status: String,
    pub in_octets: u64,
    pub in_ucast: u64,
    pub in_mcast: u64,
    pub in_bcast: u64,
    pub in_discards: u64,
    pub in_errors: u64,
    pub out_octets: u64,
    pub out_ucast: u64,
    pub out_mcast: u64,
    pub out_bcast: u64,
    pub out_discards: u64,
    pub out_errors: u64,
    pub out_qlen: u64,
    pub alias: String,
    pub phys_address: Vec<u8>,
    pub group: Option<String>,
    pub node: Option<String>,
}

impl RawInterfaceRecord {
    /// Parse one agent row (20 columns, optionally followed by group and node)
    pub fn from_row<S: AsRef<str>>(row: &[S]) -> Result<Self> {
        if row.len() < ROW_FIELDS || row.len() > ROW_FIELDS + 2 {
            return Err(CheckError::parse(format!(
                "expected {}-{} fields, got {}",
                ROW_FIELDS,
                ROW_FIELDS + 2,
                row.len()
            )));
        }
        let field = |i: usize| row[i].as_ref();
        let counter = |i: usize, name: &str| parse_counter(field(i), name);
        let optional = |i: usize| {
            row.get(i)
                .map(|v| v.as_ref().trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            index: field(0).trim().to_string(),
            descr: field(1).to_string(),
            if_type: field(2).trim().to_string(),
            speed: counter(3, "speed")?,
            oper_status: field(4).trim().to_string(),
            in_octets: counter(5, "in_octets")?,
            in_ucast: counter(6, "in_ucast")?,
            in_mcast: counter(7, "in_mcast")?,
            in_bcast: counter(8, "in_bcast")?,
            in_discards: counter(9, "in_discards")?,
            in_errors: counter(10, "in_errors")?,
            out_octets: counter(11, "out_octets")?,
            out_ucast: counter(12, "out_ucast")?,
            out_mcast: counter(13, "out_mcast")?,
            out_bcast: counter(14, "out_bcast")?,
            out_discards: counter(15, "out_discards")?,
            out_errors: counter(16, "out_errors")?,
            out_qlen: counter(17, "out_qlen")?,
            alias: field(18).to_string(),
            phys_address: parse_phys_address(field(19))?,
            group: optional(20),
            node: optional(21),
        })
    }
}

fn parse_counter(value: &str, name: &str) -> Result<u64> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse::<u64>()
        .map_err(|_| CheckError::parse(format!("field {} is not a number: {:?}", name, value)))
}

/// Accepts 6 raw bytes (as chars) or hex text separated by ':' or '-'
fn parse_phys_address(value: &str) -> Result<Vec<u8>> {
    let invalid = || CheckError::parse(format!("invalid hardware address: {:?}", value));
    if value.is_empty() {
        return Ok(Vec::new());
    }
    if value.chars().count() == 6 {
        return value
            .chars()
            .map(|c| u8::try_from(u32::from(c)).map_err(|_| invalid()))
            .collect();
    }
    value
        .split(|c| c == ':' || c == '-')
        .map(|part| u8::from_str_radix(part, 16).map_err(|_| invalid()))
        .collect()
}

/// An interface with derived fields, created once per poll
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub index: String,
    pub descr: String,
    pub if_type: String,
    /// Bits per second; `None` when the agent reports no speed
    pub speed: Option<u64>,
    pub oper_status: String,
    pub oper_status_name: String,
    pub in_octets: u64,
    pub in_ucast: u64,
    pub in_mcast: u64,
    pub in_bcast: u64,
    pub in_discards: u64,
    pub in_errors: u64,
    pub out_octets: u64,
    pub out_ucast: u64,
    pub out_mcast: u64,
    pub out_bcast: u64,
    pub out_discards: u64,
    pub out_errors: u64,
    pub out_qlen: u64,
    pub alias: String,
    /// Uppercase colon-separated hex, empty when absent
    pub mac: String,
    pub group: Option<String>,
    pub node: Option<String>,
}

impl Interface {
    pub fn in_nucast(&self) -> u64 {
        self.in_mcast.saturating_add(self.in_bcast)
    }

    pub fn out_nucast(&self) -> u64 {
        self.out_mcast.saturating_add(self.out_bcast)
    }

    /// Index with leading zeros removed, as padded items refer to it
    pub fn matches_item(&self, item: &str) -> bool {
        let unpadded = item.trim_start_matches('0');
        item == self.index
            || (!unpadded.is_empty() && unpadded == self.index)
            || item == self.descr
            || item == self.alias
    }
}

/// Derive the finalized view of a raw record
pub fn finalize(raw: &RawInterfaceRecord) -> Interface {
    Interface {
        index: raw.index.clone(),
        descr: raw.descr.clone(),
        if_type: raw.if_type.clone(),
        speed: (raw.speed > 0).then_some(raw.speed),
        oper_status: raw.oper_status.clone(),
        oper_status_name: statename(&raw.oper_status),
        in_octets: raw.in_octets,
        in_ucast: raw.in_ucast,
        in_mcast: raw.in_mcast,
        in_bcast: raw.in_bcast,
        in_discards: raw.in_discards,
        in_errors: raw.in_errors,
        out_octets: raw.out_octets,
        out_ucast: raw.out_ucast,
        out_mcast: raw.out_mcast,
        out_bcast: raw.out_bcast,
        out_discards: raw.out_discards,
        out_errors: raw.out_errors,
        out_qlen: raw.out_qlen,
        alias: raw.alias.clone(),
        mac: render_mac(&raw.phys_address),
        group: raw.group.clone(),
        node: raw.node.clone(),
    }
}

/// Finalize a whole section
pub fn finalize_all(raw: &[RawInterfaceRecord]) -> Vec<Interface> {
    raw.iter().map(finalize).collect()
}

pub fn render_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Human-readable name of an operational state code
pub fn statename(code: &str) -> String {
    match code {
        "1" => "up",
        "2" => "down",
        "3" => "testing",
        "4" => "unknown",
        "5" => "dormant",
        "6" => "not present",
        "7" => "lower layer down",
        "8" => "degraded",
        "9" => "admin down",
        other => other,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: &str, speed: &str, mac: &str) -> Vec<String> {
        let row = vec![
            index, "eth0", "6", speed, "1", "100", "10", "1", "2", "0", "0", "200", "20", "3",
            "4", "0", "0", "0", "uplink", mac,
        ];
        row.into_iter().map(str::to_string).collect()
    }

    #[test]
    fn test_from_row_parses_counters() {
        let raw = RawInterfaceRecord::from_row(&row("2", "1000000000", "")).unwrap();
        assert_eq!(raw.index, "2");
        assert_eq!(raw.speed, 1_000_000_000);
        assert_eq!(raw.in_octets, 100);
        assert_eq!(raw.out_bcast, 4);
        assert_eq!(raw.alias, "uplink");
        assert!(raw.phys_address.is_empty());
        assert_eq!(raw.group, None);
    }

    #[test]
    fn test_from_row_optional_columns() {
        let mut fields = row("3", "", "");
        fields.push("isg1".to_string());
        fields.push("node1".to_string());
        let raw = RawInterfaceRecord::from_row(&fields).unwrap();
        assert_eq!(raw.speed, 0);
        assert_eq!(raw.group.as_deref(), Some("isg1"));
        assert_eq!(raw.node.as_deref(), Some("node1"));

        let mut fields = row("3", "", "");
        fields.push(String::new());
        let raw = RawInterfaceRecord::from_row(&fields).unwrap();
        assert_eq!(raw.group, None);
    }

    #[test]
    fn test_from_row_rejects_bad_input() {
        let err = RawInterfaceRecord::from_row(&["1", "lo"]).unwrap_err();
        assert!(matches!(err, CheckError::Parse(_)));

        let err = RawInterfaceRecord::from_row(&row("1", "fast", "")).unwrap_err();
        assert!(err.to_string().contains("speed"));
    }

    #[test]
    fn test_finalize_speed_and_mac() {
        let raw = RawInterfaceRecord::from_row(&row("5", "10000000", "\n\u{0}'\u{0}\u{0}\u{0}"))
            .unwrap();
        let iface = finalize(&raw);
        assert_eq!(iface.speed, Some(10_000_000));
        assert_eq!(iface.mac, "0A:00:27:00:00:00");
        assert_eq!(iface.oper_status_name, "up");

        let raw = RawInterfaceRecord::from_row(&row("6", "0", "0a-00-27-00-00-01")).unwrap();
        let iface = finalize(&raw);
        assert_eq!(iface.speed, None);
        assert_eq!(iface.mac, "0A:00:27:00:00:01");
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let raw = RawInterfaceRecord::from_row(&row("1", "100", "")).unwrap();
        assert_eq!(finalize(&raw), finalize(&raw));
        assert_eq!(finalize(&raw).mac, "");
    }

    #[test]
    fn test_statename() {
        assert_eq!(statename("2"), "down");
        assert_eq!(statename("7"), "lower layer down");
        assert_eq!(statename("42"), "42");
    }

    #[test]
    fn test_matches_item() {
        let raw = RawInterfaceRecord::from_row(&row("5", "", "")).unwrap();
        let iface = finalize(&raw);
        assert!(iface.matches_item("5"));
        assert!(iface.matches_item("05"));
        assert!(iface.matches_item("eth0"));
        assert!(iface.matches_item("uplink"));
        assert!(!iface.matches_item("6"));
    }
}
