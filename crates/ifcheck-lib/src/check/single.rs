//! Evaluation of one (possibly synthetic) interface

use super::group::GroupMembers;
use super::params::{CheckParams, Direction, TrafficUnit};
use super::InterfaceCheck;
use crate::counters::{get_average, get_rate};
use crate::error::Result;
use crate::interface::Interface;
use crate::models::{Finding, Metric, State};
use crate::render;
use crate::store::{item_key, ValueStore};
use crate::threshold::{evaluate, evaluate_speed, Bound, Levels};
use tracing::debug;

/// Counters turned into rates, in output order
fn rate_counters(iface: &Interface) -> [(&'static str, u64); 14] {
    [
        ("in", iface.in_octets),
        ("inmcast", iface.in_mcast),
        ("inbcast", iface.in_bcast),
        ("inucast", iface.in_ucast),
        ("innucast", iface.in_nucast()),
        ("indisc", iface.in_discards),
        ("inerr", iface.in_errors),
        ("out", iface.out_octets),
        ("outmcast", iface.out_mcast),
        ("outbcast", iface.out_bcast),
        ("outucast", iface.out_ucast),
        ("outnucast", iface.out_nucast()),
        ("outdisc", iface.out_discards),
        ("outerr", iface.out_errors),
    ]
}

fn upper_levels(levels: &[Levels]) -> Option<(f64, f64)> {
    levels
        .iter()
        .find(|l| l.bound == Bound::Upper)
        .map(|l| (l.warn, l.crit))
}

/// `[alias] (up)`, `[alias] on node1: (up)`
fn status_text(item: &str, iface: &Interface) -> String {
    let label = [&iface.alias, &iface.descr]
        .into_iter()
        .find(|label| !label.is_empty() && label.as_str() != item);
    let mut text = String::new();
    if let Some(label) = label {
        text.push_str(&format!("[{}] ", label));
    }
    if let Some(node) = &iface.node {
        text.push_str(&format!("on {}: ", node));
    }
    text.push_str(&format!("({})", iface.oper_status_name));
    text
}

struct Traffic<'a> {
    label: String,
    rate: f64,
    levels: &'a [Levels],
    reference_bytes: f64,
    unit: TrafficUnit,
}

impl Traffic<'_> {
    fn result(&self) -> (State, String) {
        let renderer: fn(f64) -> String = match self.unit {
            TrafficUnit::Byte => render::iobandwidth,
            TrafficUnit::Bit => render::networkbandwidth,
        };
        let (state, text) = evaluate(self.rate, self.levels, &renderer);
        let text = if self.reference_bytes > 0.0 {
            format!(
                "{}: {} ({})",
                self.label,
                text,
                render::percent(self.rate / self.reference_bytes * 100.0)
            )
        } else {
            format!("{}: {}", self.label, text)
        };
        (state, text)
    }
}

impl InterfaceCheck {
    /// Evaluate one interface. With `group_members` the status line is
    /// replaced by the group status and member listing.
    ///
    /// Every counter is stored before `NoBaselineYet` is returned, so a
    /// first poll seeds the whole item.
    pub fn check_single_interface(
        &self,
        item: &str,
        params: &CheckParams,
        iface: &Interface,
        group_members: Option<&GroupMembers>,
        timestamp: f64,
        store: &mut dyn ValueStore,
    ) -> Result<Finding> {
        let key = item_key(item, iface.node.as_deref());

        let mut rates = Vec::with_capacity(14);
        let mut pending = None;
        for (name, counter) in rate_counters(iface) {
            match get_rate(store, &key, name, counter, timestamp) {
                Ok(rate) => rates.push((name, rate)),
                Err(err) if err.is_pending() => {
                    pending.get_or_insert(err);
                }
                Err(err) => return Err(err),
            }
        }
        if let Some(err) = pending {
            debug!(item = %item, "Initialized counters");
            return Err(err);
        }

        let mut finding = Finding::new();

        let status_state = params.oper_state(&iface.oper_status);
        match group_members {
            Some(members) => {
                finding.push_result(
                    status_state,
                    format!("Group Status ({})", iface.oper_status_name),
                );
                finding.push_result(State::Ok, format!("Members: {}", members.render()));
            }
            None => finding.push_result(status_state, status_text(item, iface)),
        }

        if !iface.mac.is_empty() {
            finding.push_result(State::Ok, format!("MAC: {}", iface.mac));
        }

        let assumed = params
            .speed
            .or(params.discovered_speed.filter(|speed| *speed > 0))
            .unwrap_or(self.fallback_speed_bps);
        let speed = evaluate_speed(iface.speed, params.speed, assumed);
        finding.push_result(speed.state, speed.text);
        let reference_bytes = speed.reference_bps as f64 / 8.0;

        let in_levels = params.traffic_levels(Direction::In, reference_bytes);
        let out_levels = params.traffic_levels(Direction::Out, reference_bytes);

        for &(name, rate) in &rates {
            let metric = Metric::new(name, rate);
            let metric = match name {
                "in" => metric
                    .with_levels(upper_levels(&in_levels))
                    .with_boundaries(0.0, reference_bytes),
                "out" => metric
                    .with_levels(upper_levels(&out_levels))
                    .with_boundaries(0.0, reference_bytes),
                "inerr" | "outerr" => {
                    if let Some((warn, crit)) = params.errors {
                        finding.raise(Levels::upper(warn, crit).classify(rate));
                    }
                    metric.with_levels(params.errors)
                }
                _ => metric,
            };
            finding.push_metric(metric);
        }
        finding.push_metric(Metric::new("outqlen", iface.out_qlen as f64));

        let rate_of = |wanted: &str| {
            rates
                .iter()
                .find(|(name, _)| *name == wanted)
                .map_or(0.0, |(_, rate)| *rate)
        };
        for (direction, label, levels) in [("in", "In", &in_levels), ("out", "Out", &out_levels)] {
            let rate = rate_of(direction);
            let traffic = match params.average_minutes() {
                Some(minutes) => {
                    let average = get_average(
                        store,
                        &key,
                        &format!("{}_avg", direction),
                        rate,
                        timestamp,
                        f64::from(minutes) * 60.0,
                    );
                    finding.push_metric(
                        Metric::new(format!("{}_avg_{}", direction, minutes), average)
                            .with_levels(upper_levels(levels))
                            .with_boundaries(0.0, reference_bytes),
                    );
                    Traffic {
                        label: format!("{} average {}min", label, minutes),
                        rate: average,
                        levels,
                        reference_bytes,
                        unit: params.unit,
                    }
                }
                None => Traffic {
                    label: label.to_string(),
                    rate,
                    levels,
                    reference_bytes,
                    unit: params.unit,
                },
            };
            let (state, text) = traffic.result();
            finding.push_result(state, text);
        }

        Ok(finding)
    }
}
