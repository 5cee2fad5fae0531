//! Check parameters as merged from rules and discovery

use crate::error::{CheckError, Result};
use crate::models::{AggregateSpec, DiscoveredParams, State};
use crate::threshold::{Bound, Levels, LevelsSpec};
use serde::{Deserialize, Serialize};

/// Group member states that count as up unless configured otherwise
pub const DEFAULT_UP_STATES: &[&str] = &["1"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Both,
    In,
    Out,
}

/// Traffic levels for one or both directions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrafficLevels {
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub bound: Bound,
    pub levels: LevelsSpec,
}

impl TrafficLevels {
    pub fn upper(direction: Direction, levels: LevelsSpec) -> Self {
        Self {
            direction,
            bound: Bound::Upper,
            levels,
        }
    }

    pub fn lower(direction: Direction, levels: LevelsSpec) -> Self {
        Self {
            direction,
            bound: Bound::Lower,
            levels,
        }
    }

    fn applies_to(&self, direction: Direction) -> bool {
        self.direction == Direction::Both || self.direction == direction
    }
}

/// Monitoring state forced for a set of operational states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperStateMapping {
    pub states: Vec<String>,
    pub state: State,
}

/// Unit used when rendering traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficUnit {
    #[default]
    Byte,
    Bit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckParams {
    /// Upper levels for error rates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<(f64, f64)>,
    /// Expected link speed, bits per second
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub traffic: Vec<TrafficLevels>,
    /// Target operational states
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub map_operstates: Vec<OperStateMapping>,
    /// Averaging window in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<u32>,
    pub unit: TrafficUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_states: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovered_state: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovered_speed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<AggregateSpec>,
}

impl CheckParams {
    /// Reject parameter sets that would make every threshold meaningless
    pub fn validate(&self) -> Result<()> {
        if self.speed == Some(0) {
            return Err(CheckError::configuration("speed must be greater than zero"));
        }
        if let Some((warn, crit)) = self.errors {
            if warn < 0.0 || crit < 0.0 {
                return Err(CheckError::configuration("error levels must not be negative"));
            }
        }
        Ok(())
    }

    /// Merge what discovery recorded for the service; rule values win
    pub fn with_discovered(mut self, discovered: &DiscoveredParams) -> Self {
        self.discovered_state = Some(discovered.discovered_state.clone());
        self.discovered_speed = Some(discovered.discovered_speed);
        if self.aggregate.is_none() {
            self.aggregate = discovered.aggregate.clone();
        }
        self
    }

    /// Explicit target states, else the states seen at discovery
    pub fn target_states(&self) -> Option<&[String]> {
        self.state
            .as_deref()
            .or(self.discovered_state.as_deref())
            .filter(|states| !states.is_empty())
    }

    pub fn up_states(&self) -> Vec<String> {
        match &self.up_states {
            Some(states) => states.clone(),
            None => DEFAULT_UP_STATES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn average_minutes(&self) -> Option<u32> {
        self.average.filter(|minutes| *minutes > 0)
    }

    /// Monitoring state for an operational state code
    pub fn oper_state(&self, oper_status: &str) -> State {
        if let Some(mapping) = self
            .map_operstates
            .iter()
            .find(|m| m.states.iter().any(|s| s == oper_status))
        {
            return mapping.state;
        }
        match self.target_states() {
            Some(targets) if !targets.iter().any(|s| s == oper_status) => State::Crit,
            _ => State::Ok,
        }
    }

    /// Absolute traffic levels for a direction. Later entries override
    /// earlier ones for the same bound; upper levels come first.
    pub fn traffic_levels(&self, direction: Direction, reference_bytes: f64) -> Vec<Levels> {
        let mut upper = None;
        let mut lower = None;
        for entry in self.traffic.iter().filter(|t| t.applies_to(direction)) {
            let resolved = entry.levels.resolve(Some(reference_bytes));
            match entry.bound {
                Bound::Upper => upper = resolved.map(|(w, c)| Levels::upper(w, c)),
                Bound::Lower => lower = resolved.map(|(w, c)| Levels::lower(w, c)),
            }
        }
        upper.into_iter().chain(lower).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        let params: CheckParams = serde_json::from_str(
            r#"{
                "errors": [0.01, 0.1],
                "speed": 10000000,
                "traffic": [{"direction": "both", "levels": {"perc": [5.0, 20.0]}}],
                "state": ["1"],
                "map_operstates": [{"states": ["2"], "state": "WARN"}],
                "unit": "bit"
            }"#,
        )
        .unwrap();
        assert_eq!(params.errors, Some((0.01, 0.1)));
        assert_eq!(params.speed, Some(10_000_000));
        assert_eq!(params.traffic[0].bound, Bound::Upper);
        assert_eq!(params.unit, TrafficUnit::Bit);
        assert_eq!(params.oper_state("2"), State::Warn);
        assert_eq!(params.oper_state("5"), State::Crit);
        assert_eq!(params.oper_state("1"), State::Ok);
    }

    #[test]
    fn test_misspelled_keys_are_rejected() {
        let result = serde_json::from_str::<CheckParams>(
            r#"{"trafic": [{"levels": {"perc": [5.0, 20.0]}}], "erors": [0.01, 0.1]}"#,
        );
        assert!(result.is_err());

        let result = serde_json::from_str::<CheckParams>(
            r#"{"traffic": [{"direktion": "in", "levels": {"perc": [5.0, 20.0]}}]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_zero_speed() {
        let params = CheckParams {
            speed: Some(0),
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(CheckError::Configuration(_))));

        let params = CheckParams {
            errors: Some((-1.0, 0.1)),
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = CheckParams {
            speed: Some(1_000_000_000),
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_target_states_fall_back_to_discovered() {
        let params = CheckParams::default().with_discovered(&DiscoveredParams {
            discovered_state: vec!["1".to_string()],
            discovered_speed: 0,
            aggregate: None,
        });
        assert_eq!(params.target_states(), Some(&["1".to_string()][..]));
        assert_eq!(params.oper_state("2"), State::Crit);

        assert_eq!(CheckParams::default().oper_state("2"), State::Ok);
    }

    #[test]
    fn test_traffic_levels_per_direction() {
        let params = CheckParams {
            traffic: vec![
                TrafficLevels::upper(Direction::Both, LevelsSpec::Perc(5.0, 20.0)),
                TrafficLevels::upper(Direction::Out, LevelsSpec::Abs(1_000.0, 2_000.0)),
                TrafficLevels::lower(Direction::In, LevelsSpec::Abs(10.0, 5.0)),
            ],
            ..Default::default()
        };
        assert_eq!(
            params.traffic_levels(Direction::In, 1_250_000.0),
            vec![Levels::upper(62_500.0, 250_000.0), Levels::lower(10.0, 5.0)]
        );
        assert_eq!(
            params.traffic_levels(Direction::Out, 1_250_000.0),
            vec![Levels::upper(1_000.0, 2_000.0)]
        );
    }

    #[test]
    fn test_up_states_default() {
        assert_eq!(CheckParams::default().up_states(), vec!["1".to_string()]);
        assert_eq!(CheckParams::default().average_minutes(), None);
    }
}
