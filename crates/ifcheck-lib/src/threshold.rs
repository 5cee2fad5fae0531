//! Threshold evaluation
//!
//! Levels are configured either as absolute values or as a percentage of a
//! reference (the interface speed). Percentages are resolved against the
//! reference before a value is classified.

use crate::models::State;
use crate::render;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configured warn/crit pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelsSpec {
    Abs(f64, f64),
    Perc(f64, f64),
}

impl LevelsSpec {
    /// Absolute warn/crit; percentages need a reference
    pub fn resolve(&self, reference: Option<f64>) -> Option<(f64, f64)> {
        match *self {
            LevelsSpec::Abs(warn, crit) => Some((warn, crit)),
            LevelsSpec::Perc(warn, crit) => match reference {
                Some(reference) => Some((reference * warn / 100.0, reference * crit / 100.0)),
                None => {
                    debug!(warn, crit, "Percentage levels without reference value");
                    None
                }
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bound {
    #[default]
    Upper,
    Lower,
}

/// Absolute levels ready for classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    pub bound: Bound,
    pub warn: f64,
    pub crit: f64,
}

impl Levels {
    pub fn upper(warn: f64, crit: f64) -> Self {
        Self {
            bound: Bound::Upper,
            warn,
            crit,
        }
    }

    pub fn lower(warn: f64, crit: f64) -> Self {
        Self {
            bound: Bound::Lower,
            warn,
            crit,
        }
    }

    pub fn classify(&self, value: f64) -> State {
        match self.bound {
            Bound::Upper if value >= self.crit => State::Crit,
            Bound::Upper if value >= self.warn => State::Warn,
            Bound::Lower if value < self.crit => State::Crit,
            Bound::Lower if value < self.warn => State::Warn,
            _ => State::Ok,
        }
    }

    fn annotation(&self, render: &dyn Fn(f64) -> String) -> String {
        let word = match self.bound {
            Bound::Upper => "at",
            Bound::Lower => "below",
        };
        format!(
            " (warn/crit {} {}/{})",
            word,
            render(self.warn),
            render(self.crit)
        )
    }
}

/// Classify a value and render it, annotated with the levels it violates
pub fn evaluate(value: f64, levels: &[Levels], render: &dyn Fn(f64) -> String) -> (State, String) {
    let mut state = State::Ok;
    let mut text = render(value);
    for level in levels {
        let verdict = level.classify(value);
        if verdict != State::Ok {
            text.push_str(&level.annotation(render));
            state = state.worst(verdict);
        }
    }
    (state, text)
}

/// Outcome of comparing observed and expected link speed
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedVerdict {
    pub state: State,
    pub text: String,
    /// Speed used as 100% for traffic levels, bits per second
    pub reference_bps: u64,
}

/// Compare the observed speed with the configured one. Unknown speeds are
/// replaced by `assumed_bps`.
pub fn evaluate_speed(observed: Option<u64>, expected: Option<u64>, assumed_bps: u64) -> SpeedVerdict {
    match observed {
        Some(observed) => {
            let text = render::nicspeed(observed as f64);
            match expected {
                Some(expected) if expected != observed => SpeedVerdict {
                    state: State::Warn,
                    text: format!(
                        "{} (wrong speed, expected: {})",
                        text,
                        render::nicspeed(expected as f64)
                    ),
                    reference_bps: observed,
                },
                _ => SpeedVerdict {
                    state: State::Ok,
                    text,
                    reference_bps: observed,
                },
            }
        }
        None => SpeedVerdict {
            state: State::Ok,
            text: format!("assuming {}", render::nicspeed(assumed_bps as f64)),
            reference_bps: assumed_bps,
        },
    }
}
