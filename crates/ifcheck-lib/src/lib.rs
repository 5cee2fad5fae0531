//! Network interface check engine
//!
//! This crate provides the core functionality for:
//! - Parsing agent interface rows into a normalized interface model
//! - Rule-based service discovery of single interfaces and groups
//! - Counter-to-rate conversion and moving averages over a value store
//! - Threshold evaluation relative to link speed
//! - Cluster-aware aggregation of interface groups
//! - Bounded parallel evaluation of many items, with metrics and logging

pub mod check;
pub mod config;
pub mod counters;
pub mod discovery;
pub mod error;
pub mod interface;
pub mod models;
pub mod observability;
pub mod render;
pub mod runner;
pub mod source;
pub mod store;
pub mod threshold;

pub use check::{CheckParams, InterfaceCheck};
pub use config::{EngineConfig, RulesConfig};
pub use discovery::{discover, DiscoveryLayer};
pub use error::{CheckError, Result};
pub use interface::{Interface, RawInterfaceRecord};
pub use models::*;
pub use observability::{EngineMetrics, StructuredLogger};
pub use runner::{CheckRunner, CheckTask, ItemOutcome, ItemReport, StoreRegistry};
pub use source::{InterfaceSource, JsonFileSource};
pub use store::{InMemoryValueStore, ValueStore};
