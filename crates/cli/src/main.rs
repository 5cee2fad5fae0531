//! Network interface check CLI
//!
//! Runs discovery and check cycles over an interface section stored as
//! JSON, keeping the per-item value store on disk between invocations.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, discover, inspect, store};
use ifcheck_lib::{EngineConfig, State, StructuredLogger};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Network interface check engine
#[derive(Parser)]
#[command(name = "ifcheck")]
#[command(author, version, about = "Network interface discovery and checks", long_about = None)]
pub struct Cli {
    /// Engine configuration file (settings can also come from IFCHECK_* env vars)
    #[arg(long, env = "IFCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table", global = true)]
    pub format: output::OutputFormat,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the interfaces of a section
    Inspect {
        /// Section file (JSON array of agent rows)
        #[arg(long, short)]
        section: PathBuf,
    },

    /// Discover services in a section
    Discover {
        /// Section file (JSON array of agent rows)
        #[arg(long, short)]
        section: PathBuf,

        /// Rule file with discovery layers
        #[arg(long, short)]
        rules: Option<PathBuf>,

        /// Write the discovered services to this file
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Evaluate services against a section
    Check {
        /// Section file (JSON array of agent rows)
        #[arg(long, short)]
        section: PathBuf,

        /// Rule file with discovery layers and check parameters
        #[arg(long, short)]
        rules: Option<PathBuf>,

        /// Services file written by `discover` (discovers on the fly if omitted)
        #[arg(long)]
        services: Option<PathBuf>,

        /// Value store file (defaults to ~/.cache/ifcheck/value_store.json)
        #[arg(long, env = "IFCHECK_STORE")]
        store: Option<PathBuf>,

        /// Poll time in seconds since the epoch (defaults to now)
        #[arg(long)]
        timestamp: Option<f64>,

        /// Only check these items
        items: Vec<String>,
    },

    /// Manage the value store
    #[command(subcommand)]
    Store(StoreCommands),
}

#[derive(Subcommand)]
pub enum StoreCommands {
    /// Show stored counters and averages
    Show {
        #[arg(long, env = "IFCHECK_STORE")]
        store: Option<PathBuf>,
    },

    /// Forget all stored values
    Clear {
        #[arg(long, env = "IFCHECK_STORE")]
        store: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool, log_json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let engine = EngineConfig::load(cli.config.as_deref())?;
    StructuredLogger::new(engine.host_name.clone()).log_startup(
        env!("CARGO_PKG_VERSION"),
        engine.fallback_speed,
        engine.max_concurrent_checks,
    );

    let state = match cli.command {
        Commands::Inspect { section } => {
            inspect::inspect(&section, cli.format).await?;
            State::Ok
        }
        Commands::Discover {
            section,
            rules,
            output,
        } => {
            discover::discover(&engine, &section, rules.as_deref(), output.as_deref(), cli.format)
                .await?;
            State::Ok
        }
        Commands::Check {
            section,
            rules,
            services,
            store,
            timestamp,
            items,
        } => {
            let args = check::CheckArgs {
                section,
                rules,
                services,
                store,
                timestamp,
                items,
            };
            check::check(&engine, args, cli.format).await?
        }
        Commands::Store(store_cmd) => {
            match store_cmd {
                StoreCommands::Show { store: path } => store::show(path, cli.format)?,
                StoreCommands::Clear { store: path } => store::clear(path)?,
            }
            State::Ok
        }
    };

    // Exit status follows monitoring plugin convention
    if state != State::Ok {
        std::process::exit(i32::from(state.code()));
    }
    Ok(())
}
