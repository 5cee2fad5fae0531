//! Interface check evaluation
//!
//! Converts counters into rates, classifies traffic, error rates, speed and
//! operational state, and aggregates interface groups on the fly.

mod group;
mod params;
mod single;


pub use group::{aggregate, GroupAggregate, GroupMember, GroupMembers};
pub use params::{
    CheckParams, Direction, OperStateMapping, TrafficLevels, TrafficUnit, DEFAULT_UP_STATES,
};

use crate::error::{CheckError, Result};
use crate::interface::Interface;
use crate::models::Finding;
use crate::store::ValueStore;

/// Speed assumed when neither the agent, the rules nor discovery know it
pub const DEFAULT_FALLBACK_SPEED_BPS: u64 = 100_000_000;

/// The interface check with its engine-wide settings
#[derive(Debug, Clone)]
pub struct InterfaceCheck {
    fallback_speed_bps: u64,
}

impl Default for InterfaceCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl InterfaceCheck {
    pub fn new() -> Self {
        Self {
            fallback_speed_bps: DEFAULT_FALLBACK_SPEED_BPS,
        }
    }

    pub fn with_fallback_speed(mut self, bits_per_sec: u64) -> Self {
        self.fallback_speed_bps = bits_per_sec;
        self
    }

    /// Evaluate an item against a whole section. Groups are aggregated from
    /// their current members; a plain item is the first interface that
    /// answers to it (first node wins in a cluster).
    pub fn check_multiple_interfaces(
        &self,
        item: &str,
        params: &CheckParams,
        interfaces: &[Interface],
        timestamp: f64,
        store: &mut dyn ValueStore,
    ) -> Result<Finding> {
        params.validate()?;
        if let Some(spec) = &params.aggregate {
            let group = aggregate(item, spec, interfaces, &params.up_states());
            return self.check_single_interface(
                item,
                params,
                &group.interface,
                Some(&group.members),
                timestamp,
                store,
            );
        }

        let iface = interfaces
            .iter()
            .find(|iface| iface.matches_item(item))
            .ok_or_else(|| CheckError::ItemNotFound(item.to_string()))?;
        self.check_single_interface(item, params, iface, None, timestamp, store)
    }
}
