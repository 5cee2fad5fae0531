//! Discovery rule layers
//!
//! A layer pairs matching conditions with single-interface and grouping
//! settings. Layers are evaluated in order; each concern (single discovery,
//! grouping) is decided by the first matching layer that configures it.

use super::ConditionSet;
use crate::interface::DEFAULT_PORT_TYPES;
use crate::models::ItemAppearance;
use serde::{Deserialize, Serialize};

fn enabled() -> bool {
    true
}

/// Single-interface discovery toggle with its naming options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SingleDiscovery {
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub item_appearance: ItemAppearance,
    #[serde(default = "enabled")]
    pub pad_portnumbers: bool,
}

impl SingleDiscovery {
    pub fn on(item_appearance: ItemAppearance) -> Self {
        Self {
            enabled: true,
            item_appearance,
            pad_portnumbers: true,
        }
    }

    pub fn off() -> Self {
        Self {
            enabled: false,
            ..Self::on(ItemAppearance::Index)
        }
    }
}

/// A named ad-hoc group declared by a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSpec {
    pub group_name: String,
    #[serde(default)]
    pub member_appearance: ItemAppearance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusion_condition: Option<ConditionSet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusion_conditions: Vec<ConditionSet>,
}

impl GroupSpec {
    pub fn new(group_name: impl Into<String>, member_appearance: ItemAppearance) -> Self {
        Self {
            group_name: group_name.into(),
            member_appearance,
            inclusion_condition: None,
            exclusion_conditions: Vec::new(),
        }
    }

    pub(crate) fn admits(&self, iface: &crate::interface::Interface) -> bool {
        self.inclusion_condition
            .as_ref()
            .map_or(true, |c| c.matches(iface))
            && !self.exclusion_conditions.iter().any(|c| c.matches(iface))
    }
}

/// Grouping toggle with zero or more group specs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Grouping {
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryLayer {
    /// `None` matches every interface
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_conditions: Option<ConditionSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_single: Option<SingleDiscovery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping: Option<Grouping>,
}

impl Default for DiscoveryLayer {
    /// Up ethernet-like ports, one service each, named by padded index
    fn default() -> Self {
        Self {
            matching_conditions: Some(
                ConditionSet::new()
                    .with_port_types(DEFAULT_PORT_TYPES.iter().copied())
                    .with_port_states(["1"]),
            ),
            discovery_single: Some(SingleDiscovery::on(ItemAppearance::Index)),
            grouping: None,
        }
    }
}

impl DiscoveryLayer {
    /// A layer that matches everything and configures nothing
    pub fn match_all() -> Self {
        Self {
            matching_conditions: None,
            discovery_single: None,
            grouping: None,
        }
    }

    pub fn with_conditions(mut self, conditions: ConditionSet) -> Self {
        self.matching_conditions = Some(conditions);
        self
    }

    pub fn with_single(mut self, single: SingleDiscovery) -> Self {
        self.discovery_single = Some(single);
        self
    }

    pub fn with_groups(mut self, groups: Vec<GroupSpec>) -> Self {
        self.grouping = Some(Grouping {
            enabled: true,
            groups,
        });
        self
    }

    pub fn with_grouping_disabled(mut self) -> Self {
        self.grouping = Some(Grouping {
            enabled: false,
            groups: Vec::new(),
        });
        self
    }

    pub fn matches(&self, iface: &crate::interface::Interface) -> bool {
        self.matching_conditions
            .as_ref()
            .map_or(true, |c| c.matches(iface))
    }

    /// Conditions that must not be treated as match-all
    pub(crate) fn restricting_conditions(&self) -> Option<&ConditionSet> {
        self.matching_conditions
            .as_ref()
            .filter(|c| !c.is_match_all())
    }
}

/// Flat rule format from older configurations
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegacyLayer {
    #[serde(default)]
    pub item_appearance: ItemAppearance,
    #[serde(default = "enabled")]
    pub pad_portnumbers: bool,
    #[serde(default)]
    pub match_index: Option<Vec<String>>,
    #[serde(default)]
    pub match_desc: Option<Vec<super::Pattern>>,
    #[serde(default)]
    pub match_alias: Option<Vec<super::Pattern>>,
    #[serde(default)]
    pub porttypes: Option<Vec<String>>,
    #[serde(default)]
    pub portstates: Option<Vec<String>>,
}

impl Default for LegacyLayer {
    fn default() -> Self {
        Self {
            item_appearance: ItemAppearance::default(),
            pad_portnumbers: true,
            match_index: None,
            match_desc: None,
            match_alias: None,
            porttypes: None,
            portstates: None,
        }
    }
}

impl From<LegacyLayer> for DiscoveryLayer {
    fn from(legacy: LegacyLayer) -> Self {
        let conditions = ConditionSet {
            match_index: legacy.match_index,
            match_desc: legacy.match_desc,
            match_alias: legacy.match_alias,
            porttypes: legacy.porttypes,
            portstates: legacy.portstates,
            negate: false,
        };
        Self {
            matching_conditions: (!conditions.is_match_all()).then_some(conditions),
            discovery_single: Some(SingleDiscovery {
                enabled: true,
                item_appearance: legacy.item_appearance,
                pad_portnumbers: legacy.pad_portnumbers,
            }),
            grouping: None,
        }
    }
}

/// A layer as written in a rule file: current or legacy format
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RuleLayer {
    Layer(DiscoveryLayer),
    Legacy(LegacyLayer),
}

impl From<RuleLayer> for DiscoveryLayer {
    fn from(rule: RuleLayer) -> Self {
        match rule {
            RuleLayer::Layer(layer) => layer,
            RuleLayer::Legacy(legacy) => legacy.into(),
        }
    }
}
