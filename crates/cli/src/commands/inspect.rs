//! Section inspection

use anyhow::Result;
use ifcheck_lib::source::{poll, JsonFileSource};
use std::path::Path;
use tabled::Tabled;

use crate::output::{color_status, format_speed, print_table, OutputFormat};

/// Row for the interface table
#[derive(Tabled)]
struct InterfaceRow {
    #[tabled(rename = "Index")]
    index: String,
    #[tabled(rename = "Description")]
    descr: String,
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "Type")]
    if_type: String,
    #[tabled(rename = "Speed")]
    speed: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Node")]
    node: String,
}

pub async fn inspect(section: &Path, format: OutputFormat) -> Result<()> {
    let interfaces = poll(&JsonFileSource::new(section)).await?;

    let rows: Vec<InterfaceRow> = interfaces
        .iter()
        .map(|iface| InterfaceRow {
            index: iface.index.clone(),
            descr: iface.descr.clone(),
            alias: iface.alias.clone(),
            if_type: iface.if_type.clone(),
            speed: format_speed(iface.speed),
            status: color_status(&iface.oper_status_name),
            mac: iface.mac.clone(),
            node: iface.node.clone().unwrap_or_default(),
        })
        .collect();

    print_table(rows, &interfaces, format);
    Ok(())
}
