//! Core data models for discovery and check evaluation

use crate::discovery::ConditionSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monitoring state of a result line or a whole finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum State {
    #[default]
    Ok,
    Warn,
    Crit,
    Unknown,
}

impl State {
    /// Numeric monitoring code (OK=0, WARN=1, CRIT=2, UNKNOWN=3)
    pub fn code(self) -> u8 {
        match self {
            State::Ok => 0,
            State::Warn => 1,
            State::Crit => 2,
            State::Unknown => 3,
        }
    }

    fn severity(self) -> u8 {
        match self {
            State::Ok => 0,
            State::Warn => 1,
            State::Unknown => 2,
            State::Crit => 3,
        }
    }

    /// The more severe of two states; CRIT outranks UNKNOWN
    pub fn worst(self, other: State) -> State {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            State::Ok => "OK",
            State::Warn => "WARN",
            State::Crit => "CRIT",
            State::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A human-readable result line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub state: State,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl CheckResult {
    pub fn new(state: State, summary: impl Into<String>) -> Self {
        Self {
            state,
            summary: summary.into(),
            details: None,
        }
    }

    /// Long output; falls back to the summary
    pub fn details(&self) -> &str {
        self.details.as_deref().unwrap_or(&self.summary)
    }
}

/// A numeric performance value with optional alert levels and boundaries.
/// `None` is distinct from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub levels: (Option<f64>, Option<f64>),
    pub boundaries: (Option<f64>, Option<f64>),
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            levels: (None, None),
            boundaries: (None, None),
        }
    }

    pub fn with_levels(mut self, levels: Option<(f64, f64)>) -> Self {
        if let Some((warn, crit)) = levels {
            self.levels = (Some(warn), Some(crit));
        }
        self
    }

    pub fn with_boundaries(mut self, min: f64, max: f64) -> Self {
        self.boundaries = (Some(min), Some(max));
        self
    }
}

/// One entry of a finding, in emission order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CheckOutput {
    Result(CheckResult),
    Metric(Metric),
}

/// Outcome of evaluating one item for one cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    state: State,
    outputs: Vec<CheckOutput>,
}

impl Finding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Worst state among all emitted results and classified values
    pub fn state(&self) -> State {
        self.state
    }

    pub fn outputs(&self) -> &[CheckOutput] {
        &self.outputs
    }

    pub fn results(&self) -> impl Iterator<Item = &CheckResult> {
        self.outputs.iter().filter_map(|o| match o {
            CheckOutput::Result(r) => Some(r),
            CheckOutput::Metric(_) => None,
        })
    }

    pub fn metrics(&self) -> impl Iterator<Item = &Metric> {
        self.outputs.iter().filter_map(|o| match o {
            CheckOutput::Metric(m) => Some(m),
            CheckOutput::Result(_) => None,
        })
    }

    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics().find(|m| m.name == name)
    }

    /// Summaries joined the way a monitoring core shows them
    pub fn summary(&self) -> String {
        self.results()
            .map(|r| match r.state {
                State::Ok => r.summary.clone(),
                State::Warn => format!("{}(!)", r.summary),
                State::Crit => format!("{}(!!)", r.summary),
                State::Unknown => format!("{}(?)", r.summary),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn push_result(&mut self, state: State, summary: impl Into<String>) {
        self.raise(state);
        self.outputs
            .push(CheckOutput::Result(CheckResult::new(state, summary)));
    }

    pub fn push_metric(&mut self, metric: Metric) {
        self.outputs.push(CheckOutput::Metric(metric));
    }

    /// Raise the finding state without adding a line
    pub fn raise(&mut self, state: State) {
        self.state = self.state.worst(state);
    }
}

/// How group members (or discovered items) are named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemAppearance {
    #[default]
    Index,
    #[serde(alias = "description")]
    Descr,
    Alias,
}

/// Aggregation descriptor stored in a group service's parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum AggregateSpec {
    /// Rule-defined group: members are re-evaluated against the recorded conditions
    Rules {
        member_appearance: ItemAppearance,
        inclusion_condition: ConditionSet,
        #[serde(default)]
        exclusion_conditions: Vec<ConditionSet>,
    },
    /// Agent-declared group: members carry the group tag
    AgentDeclared { member_appearance: ItemAppearance },
}

impl AggregateSpec {
    pub fn member_appearance(&self) -> ItemAppearance {
        match self {
            AggregateSpec::Rules {
                member_appearance, ..
            }
            | AggregateSpec::AgentDeclared { member_appearance } => *member_appearance,
        }
    }
}

/// Parameters recorded for a service at discovery time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredParams {
    pub discovered_state: Vec<String>,
    pub discovered_speed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<AggregateSpec>,
}

/// A service proposed by discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredService {
    pub item: String,
    pub parameters: DiscoveredParams,
}
