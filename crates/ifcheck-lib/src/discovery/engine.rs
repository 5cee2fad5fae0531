//! Service discovery over a finalized interface section

use super::{ConditionSet, DiscoveryLayer, GroupSpec};
use crate::interface::Interface;
use crate::models::{AggregateSpec, DiscoveredParams, DiscoveredService, ItemAppearance};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// Name an interface according to a naming mode. Empty descriptions or
/// aliases fall back to the index.
pub fn item_name(iface: &Interface, appearance: ItemAppearance, pad_width: Option<usize>) -> String {
    let fallback = |value: &str| {
        if value.is_empty() {
            iface.index.clone()
        } else {
            value.to_string()
        }
    };
    match appearance {
        ItemAppearance::Index => match pad_width {
            Some(width) if iface.index.chars().all(|c| c.is_ascii_digit()) => {
                format!("{:0>width$}", iface.index, width = width)
            }
            _ => iface.index.clone(),
        },
        ItemAppearance::Descr => fallback(&iface.descr),
        ItemAppearance::Alias => fallback(&iface.alias),
    }
}

#[derive(Debug)]
struct GroupAccumulator {
    member_appearance: ItemAppearance,
    conditions: Option<(ConditionSet, Vec<ConditionSet>)>,
    members: HashSet<(Option<String>, String)>,
    states: BTreeSet<String>,
    speed: u64,
}

impl GroupAccumulator {
    fn new(member_appearance: ItemAppearance) -> Self {
        Self {
            member_appearance,
            conditions: None,
            members: HashSet::new(),
            states: BTreeSet::new(),
            speed: 0,
        }
    }

    fn add(&mut self, iface: &Interface) {
        if !self
            .members
            .insert((iface.node.clone(), iface.index.clone()))
        {
            return;
        }
        self.states.insert(iface.oper_status.clone());
        self.speed = self.speed.saturating_add(iface.speed.unwrap_or(0));
    }

    fn into_params(self) -> DiscoveredParams {
        let aggregate = match self.conditions {
            Some((inclusion_condition, exclusion_conditions)) => AggregateSpec::Rules {
                member_appearance: self.member_appearance,
                inclusion_condition,
                exclusion_conditions,
            },
            None => AggregateSpec::AgentDeclared {
                member_appearance: self.member_appearance,
            },
        };
        DiscoveredParams {
            discovered_state: self.states.into_iter().collect(),
            discovered_speed: self.speed,
            aggregate: Some(aggregate),
        }
    }
}

/// Conditions stored with a rule group so check-time membership reproduces
/// the layer resolution that happened here
fn recorded_conditions(
    earlier: &[&DiscoveryLayer],
    governing: &DiscoveryLayer,
    spec: &GroupSpec,
) -> (ConditionSet, Vec<ConditionSet>) {
    let inclusion = spec
        .inclusion_condition
        .clone()
        .or_else(|| governing.matching_conditions.clone())
        .unwrap_or_default();
    let exclusions = earlier
        .iter()
        .filter(|layer| layer.grouping.is_some())
        .filter_map(|layer| layer.restricting_conditions().cloned())
        .chain(spec.exclusion_conditions.iter().cloned())
        .collect();
    (inclusion, exclusions)
}

/// Propose services for a section. The default layer is always consulted
/// last. Single services come first in section order, then groups by name.
pub fn discover(layers: &[DiscoveryLayer], interfaces: &[Interface]) -> Vec<DiscoveredService> {
    let default_layer = DiscoveryLayer::default();
    let layers: Vec<&DiscoveryLayer> = layers
        .iter()
        .chain(std::iter::once(&default_layer))
        .collect();
    let pad_width = interfaces.iter().map(|i| i.index.len()).max().unwrap_or(0);

    let mut singles = Vec::new();
    let mut groups: BTreeMap<String, GroupAccumulator> = BTreeMap::new();

    for iface in interfaces {
        let single = layers
            .iter()
            .find(|layer| layer.discovery_single.is_some() && layer.matches(iface))
            .and_then(|layer| layer.discovery_single.as_ref())
            .filter(|single| single.enabled);
        if let Some(single) = single {
            let pad = single.pad_portnumbers.then_some(pad_width);
            singles.push(DiscoveredService {
                item: item_name(iface, single.item_appearance, pad),
                parameters: DiscoveredParams {
                    discovered_state: vec![iface.oper_status.clone()],
                    discovered_speed: iface.speed.unwrap_or(0),
                    aggregate: None,
                },
            });
        }

        let governing = layers
            .iter()
            .position(|layer| layer.grouping.is_some() && layer.matches(iface));
        let grouping = governing
            .and_then(|pos| layers[pos].grouping.as_ref())
            .filter(|grouping| grouping.enabled);

        if let Some(tag) = &iface.group {
            let naming = grouping
                .and_then(|g| g.groups.iter().find(|spec| &spec.group_name == tag))
                .map(|spec| spec.member_appearance)
                .unwrap_or_default();
            groups
                .entry(tag.clone())
                .or_insert_with(|| GroupAccumulator::new(naming))
                .add(iface);
        }

        let (Some(pos), Some(grouping)) = (governing, grouping) else {
            continue;
        };
        for spec in grouping.groups.iter().filter(|spec| spec.admits(iface)) {
            let group = groups
                .entry(spec.group_name.clone())
                .or_insert_with(|| GroupAccumulator::new(spec.member_appearance));
            if group.conditions.is_none() {
                group.conditions = Some(recorded_conditions(&layers[..pos], layers[pos], spec));
            }
            group.add(iface);
        }
    }

    let mut seen = HashSet::new();
    let services: Vec<DiscoveredService> = singles
        .into_iter()
        .chain(groups.into_iter().map(|(item, group)| DiscoveredService {
            item,
            parameters: group.into_params(),
        }))
        .filter(|service| seen.insert(service.item.clone()))
        .collect();

    debug!(
        interfaces = interfaces.len(),
        services = services.len(),
        "Interface discovery complete"
    );
    services
}
