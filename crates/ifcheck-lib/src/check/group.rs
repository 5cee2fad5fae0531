//! Aggregation of several interfaces into one group interface

use crate::discovery::item_name;
use crate::interface::{statename, Interface};
use crate::models::AggregateSpec;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Operational state codes of an aggregated group
const GROUP_UP: &str = "1";
const GROUP_DOWN: &str = "2";
const GROUP_DEGRADED: &str = "8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub name: String,
    pub state_name: String,
}

impl GroupMember {
    pub fn new(name: impl Into<String>, state_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state_name: state_name.into(),
        }
    }
}

/// Members of a group in encounter order, bucketed by cluster node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupMembers {
    nodes: Vec<(Option<String>, Vec<GroupMember>)>,
}

impl GroupMembers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: Option<&str>, member: GroupMember) {
        match self
            .nodes
            .iter_mut()
            .find(|(n, _)| n.as_deref() == node)
        {
            Some((_, members)) => members.push(member),
            None => self.nodes.push((node.map(str::to_string), vec![member])),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().map(|(_, members)| members.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `[a (up), b (down)]`, or one bracket per node when members come from
    /// several nodes
    pub fn render(&self) -> String {
        let list = |members: &[GroupMember]| {
            members
                .iter()
                .map(|m| format!("{} ({})", m.name, m.state_name))
                .collect::<Vec<_>>()
                .join(", ")
        };
        if self.nodes.len() <= 1 {
            let members = self.nodes.first().map(|(_, m)| m.as_slice()).unwrap_or(&[]);
            return format!("[{}]", list(members));
        }
        self.nodes
            .iter()
            .map(|(node, members)| match node {
                Some(node) => format!("[{} on node {}]", list(members), node),
                None => format!("[{}]", list(members)),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Synthetic interface standing for a group, plus its member listing
#[derive(Debug, Clone)]
pub struct GroupAggregate {
    pub interface: Interface,
    pub members: GroupMembers,
}

fn is_member(item: &str, spec: &AggregateSpec, iface: &Interface) -> bool {
    match spec {
        AggregateSpec::Rules {
            inclusion_condition,
            exclusion_conditions,
            ..
        } => {
            inclusion_condition.matches(iface)
                && !exclusion_conditions.iter().any(|c| c.matches(iface))
        }
        AggregateSpec::AgentDeclared { .. } => iface.group.as_deref() == Some(item),
    }
}

/// Sums wrap on overflow, like the member counters themselves
fn add_counters(group: &mut Interface, iface: &Interface) {
    group.in_octets = group.in_octets.wrapping_add(iface.in_octets);
    group.in_ucast = group.in_ucast.wrapping_add(iface.in_ucast);
    group.in_mcast = group.in_mcast.wrapping_add(iface.in_mcast);
    group.in_bcast = group.in_bcast.wrapping_add(iface.in_bcast);
    group.in_discards = group.in_discards.wrapping_add(iface.in_discards);
    group.in_errors = group.in_errors.wrapping_add(iface.in_errors);
    group.out_octets = group.out_octets.wrapping_add(iface.out_octets);
    group.out_ucast = group.out_ucast.wrapping_add(iface.out_ucast);
    group.out_mcast = group.out_mcast.wrapping_add(iface.out_mcast);
    group.out_bcast = group.out_bcast.wrapping_add(iface.out_bcast);
    group.out_discards = group.out_discards.wrapping_add(iface.out_discards);
    group.out_errors = group.out_errors.wrapping_add(iface.out_errors);
    group.out_qlen = group.out_qlen.wrapping_add(iface.out_qlen);
}

/// Combine the current members of a group. Counters are summed over all
/// members; speed only over members in `up_states`.
pub fn aggregate(
    item: &str,
    spec: &AggregateSpec,
    interfaces: &[Interface],
    up_states: &[String],
) -> GroupAggregate {
    let mut group = Interface {
        index: item.to_string(),
        descr: item.to_string(),
        alias: item.to_string(),
        ..Default::default()
    };
    let mut members = GroupMembers::new();
    let mut seen = HashSet::new();
    let mut speed: u64 = 0;
    let mut up_count = 0usize;

    for iface in interfaces.iter().filter(|i| is_member(item, spec, i)) {
        if !seen.insert((iface.node.as_deref(), iface.index.as_str())) {
            debug!(item = %item, index = %iface.index, "Skipping duplicate group member");
            continue;
        }
        if up_states.iter().any(|s| s == &iface.oper_status) {
            up_count += 1;
            speed = speed.saturating_add(iface.speed.unwrap_or(0));
        }
        add_counters(&mut group, iface);

        members.add(
            iface.node.as_deref(),
            GroupMember::new(
                item_name(iface, spec.member_appearance(), None),
                iface.oper_status_name.clone(),
            ),
        );
    }

    if members.is_empty() {
        warn!(item = %item, "No interfaces currently belong to group");
    }

    let status = if members.is_empty() || up_count == 0 {
        GROUP_DOWN
    } else if up_count == members.len() {
        GROUP_UP
    } else {
        GROUP_DEGRADED
    };
    group.oper_status = status.to_string();
    group.oper_status_name = statename(status);
    group.speed = (speed > 0).then_some(speed);

    GroupAggregate {
        interface: group,
        members,
    }
}
