//! Interface matching conditions

use crate::error::CheckError;
use crate::interface::Interface;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A description/alias pattern, compiled once when the rule is parsed
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Result<Self, CheckError> {
        let source = source.into();
        let regex = Regex::new(&source).map_err(|e| {
            CheckError::configuration(format!("invalid pattern {:?}: {}", source, e))
        })?;
        Ok(Self { source, regex })
    }

    /// Unanchored search
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl TryFrom<String> for Pattern {
    type Error = CheckError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Pattern::new(value)
    }
}

impl Serialize for Pattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(source).map_err(serde::de::Error::custom)
    }
}

/// Conjunction of attribute tests; absent or empty lists don't restrict
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConditionSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_index: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_desc: Option<Vec<Pattern>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_alias: Option<Vec<Pattern>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub porttypes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portstates: Option<Vec<String>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub negate: bool,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index<I, S>(mut self, indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.match_index = Some(indices.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_port_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.porttypes = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_port_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.portstates = Some(states.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_desc<I, S>(mut self, patterns: I) -> Result<Self, CheckError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.match_desc = Some(compile(patterns)?);
        Ok(self)
    }

    pub fn with_alias<I, S>(mut self, patterns: I) -> Result<Self, CheckError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.match_alias = Some(compile(patterns)?);
        Ok(self)
    }

    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    /// True when no test is configured and the set is not negated
    pub fn is_match_all(&self) -> bool {
        !self.negate
            && is_unset(&self.match_index)
            && is_unset(&self.match_desc)
            && is_unset(&self.match_alias)
            && is_unset(&self.porttypes)
            && is_unset(&self.portstates)
    }

    pub fn matches(&self, iface: &Interface) -> bool {
        let hit = contains(&self.match_index, &iface.index)
            && searches(&self.match_desc, &iface.descr)
            && searches(&self.match_alias, &iface.alias)
            && contains(&self.porttypes, &iface.if_type)
            && contains(&self.portstates, &iface.oper_status);
        hit != self.negate
    }
}

fn compile<I, S>(patterns: I) -> Result<Vec<Pattern>, CheckError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    patterns.into_iter().map(Pattern::new).collect()
}

fn is_unset<T>(list: &Option<Vec<T>>) -> bool {
    list.as_ref().map_or(true, Vec::is_empty)
}

fn contains(list: &Option<Vec<String>>, value: &str) -> bool {
    match list {
        Some(values) if !values.is_empty() => values.iter().any(|v| v == value),
        _ => true,
    }
}

fn searches(patterns: &Option<Vec<Pattern>>, text: &str) -> bool {
    match patterns {
        Some(patterns) if !patterns.is_empty() => patterns.iter().any(|p| p.is_match(text)),
        _ => true,
    }
}
