//! Engine configuration and rule files

use crate::check::{CheckParams, DEFAULT_FALLBACK_SPEED_BPS};
use crate::discovery::{DiscoveryLayer, RuleLayer};
use crate::error::CheckError;
use crate::models::{DiscoveredParams, DiscoveredService};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Engine-wide settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Host name attached to log events
    #[serde(default = "default_host_name")]
    pub host_name: String,

    /// Speed assumed for interfaces without a known speed, bits per second
    #[serde(default = "default_fallback_speed")]
    pub fallback_speed: u64,

    /// Upper bound on items evaluated at the same time
    #[serde(default = "default_max_concurrent_checks")]
    pub max_concurrent_checks: usize,
}

fn default_host_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

fn default_fallback_speed() -> u64 {
    DEFAULT_FALLBACK_SPEED_BPS
}

fn default_max_concurrent_checks() -> usize {
    8
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host_name: default_host_name(),
            fallback_speed: default_fallback_speed(),
            max_concurrent_checks: default_max_concurrent_checks(),
        }
    }
}

impl EngineConfig {
    /// Load from an optional config file, then `IFCHECK_*` environment
    /// variables (e.g. `IFCHECK_FALLBACK_SPEED`)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let config = builder
            .add_source(config::Environment::with_prefix("IFCHECK").try_parsing(true))
            .build()
            .context("Failed to read engine configuration")?;

        let mut engine: EngineConfig = config
            .try_deserialize()
            .context("Invalid engine configuration")?;
        if engine.fallback_speed == 0 {
            return Err(CheckError::configuration("fallback_speed must be greater than zero").into());
        }
        if engine.max_concurrent_checks == 0 {
            engine.max_concurrent_checks = 1;
        }
        Ok(engine)
    }
}

/// Discovery layers plus check parameters, as read from a JSON rule file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesConfig {
    /// Discovery rule layers, most specific first
    pub discovery: Vec<RuleLayer>,
    /// Parameters for every item without its own entry
    pub check: CheckParams,
    /// Per-item parameters; replace `check` for that item
    pub items: HashMap<String, CheckParams>,
}

impl RulesConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules from {:?}", path))?;
        Self::from_json(&content).with_context(|| format!("Invalid rules in {:?}", path))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let rules: Self = serde_json::from_str(content)
            .map_err(|e| CheckError::configuration(e.to_string()))?;
        rules.check.validate()?;
        for (item, params) in &rules.items {
            params
                .validate()
                .with_context(|| format!("Invalid parameters for item {:?}", item))?;
        }
        Ok(rules)
    }

    /// Discovery layers in evaluation order
    pub fn layers(&self) -> Vec<DiscoveryLayer> {
        self.discovery.iter().cloned().map(DiscoveryLayer::from).collect()
    }

    /// Effective parameters for an item, merged with what discovery recorded
    pub fn params_for(&self, item: &str, discovered: Option<&DiscoveredParams>) -> CheckParams {
        let params = self.items.get(item).unwrap_or(&self.check).clone();
        match discovered {
            Some(discovered) => params.with_discovered(discovered),
            None => params,
        }
    }
}

/// Read a services file as written by discovery
pub fn load_services(path: &Path) -> Result<Vec<DiscoveredService>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read services from {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid services in {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemAppearance;
    use std::io::Write;

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::load(None).unwrap();
        assert_eq!(config.fallback_speed, 100_000_000);
        assert_eq!(config.max_concurrent_checks, 8);
    }

    #[test]
    fn test_engine_config_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"fallback_speed": 1000000000, "host_name": "core-sw1"}}"#).unwrap();

        let config = EngineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.fallback_speed, 1_000_000_000);
        assert_eq!(config.host_name, "core-sw1");
        assert_eq!(config.max_concurrent_checks, 8);
    }

    #[test]
    fn test_zero_fallback_speed_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"fallback_speed": 0}}"#).unwrap();

        let err = EngineConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CheckError>(),
            Some(CheckError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let result = EngineConfig::load(Some(Path::new("/nonexistent/ifcheck.json")));
        assert!(result.is_err());
    }

    #[test]
    fn test_rules_config() {
        let rules = RulesConfig::from_json(
            r#"{
                "discovery": [
                    {"matching_conditions": {"match_desc": ["^eth"]},
                     "discovery_single": {"item_appearance": "descr"}},
                    {"item_appearance": "alias", "porttypes": ["6"]}
                ],
                "check": {"errors": [0.01, 0.1]},
                "items": {"eth0": {"speed": 1000000000}}
            }"#,
        )
        .unwrap();

        let layers = rules.layers();
        assert_eq!(layers.len(), 2);
        assert_eq!(
            layers[1].discovery_single.as_ref().unwrap().item_appearance,
            ItemAppearance::Alias
        );

        assert_eq!(rules.params_for("eth1", None).errors, Some((0.01, 0.1)));
        let eth0 = rules.params_for(
            "eth0",
            Some(&DiscoveredParams {
                discovered_state: vec!["1".to_string()],
                discovered_speed: 10_000_000,
                aggregate: None,
            }),
        );
        assert_eq!(eth0.speed, Some(1_000_000_000));
        assert_eq!(eth0.errors, None);
        assert_eq!(eth0.discovered_speed, Some(10_000_000));
    }

    #[test]
    fn test_rules_reject_unknown_fields() {
        assert!(RulesConfig::from_json(r#"{"dicsovery": []}"#).is_err());
        assert!(RulesConfig::from_json(r#"{"discovery": [{"match_desc": ["("]}]}"#).is_err());

        let err = RulesConfig::from_json(
            r#"{"check": {"trafic": [{"levels": {"perc": [5.0, 20.0]}}], "erors": [0.01, 0.1]}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CheckError>(),
            Some(CheckError::Configuration(_))
        ));

        let err = RulesConfig::from_json(
            r#"{"discovery": [{"grouping": {"groups": [
                {"group_name": "wired", "exclusion_condition": [{"match_desc": ["^docker"]}]}
            ]}}]}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_rules_reject_zero_speed() {
        assert!(RulesConfig::from_json(r#"{"check": {"speed": 0}}"#).is_err());
        let err = RulesConfig::from_json(r#"{"items": {"eth0": {"speed": 0}}}"#).unwrap_err();
        assert!(format!("{:#}", err).contains("eth0"));
    }
}
