//! Interface discovery
//!
//! Turns a finalized interface section plus an ordered list of rule layers
//! into the services that should be monitored: single interfaces and
//! aggregated groups (rule-defined or agent-declared).

mod conditions;
mod engine;
mod layers;

pub use conditions::{ConditionSet, Pattern};
pub use engine::{discover, item_name};
pub use layers::{DiscoveryLayer, GroupSpec, Grouping, LegacyLayer, RuleLayer, SingleDiscovery};
