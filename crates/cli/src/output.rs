//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use ifcheck_lib::render;
use ifcheck_lib::State;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table, or the serializable source values as JSON
pub fn print_table<R: Tabled, T: Serialize>(rows: Vec<R>, values: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => print_json(values),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    if let Ok(json) = serde_json::to_string_pretty(value) {
        println!("{}", json);
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Link speed, or a dash when the agent did not report one
pub fn format_speed(speed: Option<u64>) -> String {
    speed
        .map(|bps| render::nicspeed(bps as f64))
        .unwrap_or_else(|| "-".to_string())
}

/// Color a monitoring state
pub fn color_state(state: State) -> String {
    match state {
        State::Ok => state.as_str().green().to_string(),
        State::Warn => state.as_str().yellow().to_string(),
        State::Crit => state.as_str().red().to_string(),
        State::Unknown => state.as_str().magenta().to_string(),
    }
}

/// Color an operational state name
pub fn color_status(status: &str) -> String {
    match status {
        "up" => status.green().to_string(),
        "degraded" | "dormant" | "testing" => status.yellow().to_string(),
        "down" | "lower layer down" => status.red().to_string(),
        _ => status.to_string(),
    }
}
