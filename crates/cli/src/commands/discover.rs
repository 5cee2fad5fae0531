//! Service discovery command

use anyhow::{Context, Result};
use ifcheck_lib::source::{poll, JsonFileSource};
use ifcheck_lib::{discover as discover_services, EngineConfig, EngineMetrics, StructuredLogger};
use std::path::Path;
use tabled::Tabled;

use crate::config::load_rules;
use crate::output::{format_speed, print_info, print_success, print_table, OutputFormat};

/// Row for the services table
#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "States")]
    states: String,
    #[tabled(rename = "Speed")]
    speed: String,
}

pub async fn discover(
    engine: &EngineConfig,
    section: &Path,
    rules: Option<&Path>,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let interfaces = poll(&JsonFileSource::new(section)).await?;
    let rules = load_rules(rules)?;
    let services = discover_services(&rules.layers(), &interfaces);

    let metrics = EngineMetrics::new();
    metrics.set_interfaces_polled(interfaces.len() as i64);
    metrics.set_services_discovered(services.len() as i64);
    StructuredLogger::new(engine.host_name.clone()).log_discovery(interfaces.len(), services.len());

    if let Some(output) = output {
        let content = serde_json::to_string_pretty(&services)?;
        std::fs::write(output, content)
            .with_context(|| format!("Failed to write services to {:?}", output))?;
        print_success(&format!("Wrote {} services to {}", services.len(), output.display()));
        return Ok(());
    }

    let rows: Vec<ServiceRow> = services
        .iter()
        .map(|service| ServiceRow {
            item: service.item.clone(),
            kind: if service.parameters.aggregate.is_some() {
                "group".to_string()
            } else {
                "interface".to_string()
            },
            states: service.parameters.discovered_state.join(", "),
            speed: format_speed(Some(service.parameters.discovered_speed).filter(|s| *s > 0)),
        })
        .collect();

    print_table(rows, &services, format);
    if matches!(format, OutputFormat::Table) && !services.is_empty() {
        print_info(&format!("Total: {} services", services.len()));
    }
    Ok(())
}
