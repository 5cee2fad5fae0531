//! Check cycle command

use anyhow::Result;
use ifcheck_lib::config::load_services;
use ifcheck_lib::source::{poll, JsonFileSource};
use ifcheck_lib::{discover, CheckRunner, CheckTask, EngineConfig, ItemOutcome, State};
use std::path::PathBuf;
use std::sync::Arc;
use tabled::Tabled;

use crate::config::{load_rules, load_stores, save_stores, store_path};
use crate::output::{color_state, print_table, print_warning, OutputFormat};

pub struct CheckArgs {
    pub section: PathBuf,
    pub rules: Option<PathBuf>,
    pub services: Option<PathBuf>,
    pub store: Option<PathBuf>,
    pub timestamp: Option<f64>,
    pub items: Vec<String>,
}

/// Row for the findings table
#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Summary")]
    summary: String,
}

fn now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Run one check cycle. Returns the worst state among the findings.
pub async fn check(engine: &EngineConfig, args: CheckArgs, format: OutputFormat) -> Result<State> {
    let interfaces = poll(&JsonFileSource::new(&args.section)).await?;
    let rules = load_rules(args.rules.as_deref())?;
    let services = match &args.services {
        Some(path) => load_services(path)?,
        None => discover(&rules.layers(), &interfaces),
    };

    let tasks: Vec<CheckTask> = services
        .iter()
        .filter(|s| args.items.is_empty() || args.items.contains(&s.item))
        .map(|s| CheckTask::new(s.item.clone(), rules.params_for(&s.item, Some(&s.parameters))))
        .collect();
    if tasks.is_empty() {
        print_warning("No services to check");
        return Ok(State::Ok);
    }

    let path = store_path(args.store)?;
    let stores = Arc::new(load_stores(&path)?);
    let runner = CheckRunner::new(engine, Arc::clone(&stores));

    let reports = runner
        .run_cycle(tasks, Arc::new(interfaces), args.timestamp.unwrap_or_else(now))
        .await;

    if args.items.is_empty() {
        stores.retain_items(services.iter().map(|s| s.item.as_str()));
    }
    save_stores(&path, &stores)?;

    let rows: Vec<FindingRow> = reports
        .iter()
        .map(|report| {
            let (state, summary) = match &report.outcome {
                ItemOutcome::Finding(finding) => (color_state(finding.state()), finding.summary()),
                ItemOutcome::Pending(_) => (
                    "PENDING".to_string(),
                    "Counters initialized, waiting for next cycle".to_string(),
                ),
                ItemOutcome::Failed(error) => (color_state(State::Unknown), error.clone()),
            };
            FindingRow {
                item: report.item.clone(),
                state,
                summary,
            }
        })
        .collect();
    print_table(rows, &reports, format);

    Ok(reports
        .iter()
        .filter_map(|r| r.outcome.state())
        .fold(State::Ok, State::worst))
}
