//! Engine configuration.
//!
//! Precedence, lowest to highest: built-in defaults, JSON document,
//! `VERDICT_*` environment overrides. The result is validated once; the
//! engine then reads `thresholds` once per resolution call.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::path::Path;

pub const ENV_FUZZY_MATCHING: &str = "VERDICT_FUZZY_MATCHING";
pub const ENV_FUZZY_THRESHOLD: &str = "VERDICT_FUZZY_THRESHOLD";
pub const ENV_MAX_ACTIVE_RULES: &str = "VERDICT_MAX_ACTIVE_RULES";

/// Largest edit distance the fuzzy matcher may accept.
pub const MAX_FUZZY_THRESHOLD: usize = 8;

/// Fuzzy-matching knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Thresholds {
    pub enable_fuzzy_matching: bool,
    pub fuzzy_match_threshold: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { enable_fuzzy_matching: true, fuzzy_match_threshold: 2 }
    }
}

/// Day boundaries for review staleness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FreshnessPolicy {
    pub aging_after_days: i64,
    pub stale_after_days: i64,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self { aging_after_days: 90, stale_after_days: 180 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub thresholds: Thresholds,
    pub freshness: FreshnessPolicy,
    /// Cap on active rules fetched per evaluation.
    pub max_active_rules: usize,
    /// Catalog entries fetched per store round-trip.
    pub catalog_page_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            freshness: FreshnessPolicy::default(),
            max_active_rules: 100,
            catalog_page_size: 500,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json).map_err(|err| EngineError::Config {
            field: "<document>".into(),
            value: String::new(),
            reason: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| EngineError::Config {
            field: "<file>".into(),
            value: path.display().to_string(),
            reason: err.to_string(),
        })?;
        let config = Self::from_json_str(&text)?;
        tracing::info!(path = %path.display(), ?config, "engine configuration loaded");
        Ok(config)
    }

    /// Apply `VERDICT_*` overrides from `env`, returning the keys that were used.
    ///
    /// Takes the environment as a map so callers (and tests) decide where it
    /// comes from; pass `std::env::vars().collect()` for the process env.
    pub fn apply_env_overrides<S: BuildHasher>(&mut self, env: &HashMap<String, String, S>) -> Result<Vec<String>> {
        let mut keys_used = Vec::new();

        if let Some(value) = env.get(ENV_FUZZY_MATCHING) {
            self.thresholds.enable_fuzzy_matching = parse_bool(value, "thresholds.enableFuzzyMatching")?;
            keys_used.push(ENV_FUZZY_MATCHING.to_string());
        }

        if let Some(value) = env.get(ENV_FUZZY_THRESHOLD) {
            self.thresholds.fuzzy_match_threshold = parse_usize(value, "thresholds.fuzzyMatchThreshold")?;
            keys_used.push(ENV_FUZZY_THRESHOLD.to_string());
        }

        if let Some(value) = env.get(ENV_MAX_ACTIVE_RULES) {
            self.max_active_rules = parse_usize(value, "maxActiveRules")?;
            keys_used.push(ENV_MAX_ACTIVE_RULES.to_string());
        }

        self.validate()?;
        Ok(keys_used)
    }

    pub fn validate(&self) -> Result<()> {
        if self.thresholds.fuzzy_match_threshold > MAX_FUZZY_THRESHOLD {
            return Err(invalid(
                "thresholds.fuzzyMatchThreshold",
                self.thresholds.fuzzy_match_threshold,
                &format!("must be at most {MAX_FUZZY_THRESHOLD}"),
            ));
        }
        if self.freshness.aging_after_days < 0 {
            return Err(invalid("freshness.agingAfterDays", self.freshness.aging_after_days, "must not be negative"));
        }
        if self.freshness.stale_after_days < self.freshness.aging_after_days {
            return Err(invalid(
                "freshness.staleAfterDays",
                self.freshness.stale_after_days,
                "must not be smaller than agingAfterDays",
            ));
        }
        if self.max_active_rules == 0 {
            return Err(invalid("maxActiveRules", 0, "must be positive"));
        }
        if self.catalog_page_size == 0 {
            return Err(invalid("catalogPageSize", 0, "must be positive"));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> EngineError {
    EngineError::Config { field: field.into(), value: value.to_string(), reason: reason.into() }
}

fn parse_bool(value: &str, field: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(field, value, "expected boolean (true/false/1/0/yes/no/on/off)")),
    }
}

fn parse_usize(value: &str, field: &str) -> Result<usize> {
    value.trim().parse::<usize>().map_err(|_| invalid(field, value, "expected unsigned integer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.thresholds.enable_fuzzy_matching);
        assert_eq!(config.thresholds.fuzzy_match_threshold, 2);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = EngineConfig::from_json_str(r#"{"thresholds": {"fuzzyMatchThreshold": 3}}"#).unwrap();
        assert_eq!(config.thresholds.fuzzy_match_threshold, 3);
        assert!(config.thresholds.enable_fuzzy_matching);
        assert_eq!(config.max_active_rules, 100);
    }

    #[test]
    fn env_overrides_win_and_are_reported() {
        let mut config = EngineConfig::default();
        let env = HashMap::from([
            (ENV_FUZZY_MATCHING.to_string(), "off".to_string()),
            (ENV_FUZZY_THRESHOLD.to_string(), "1".to_string()),
        ]);

        let used = config.apply_env_overrides(&env).unwrap();
        assert!(!config.thresholds.enable_fuzzy_matching);
        assert_eq!(config.thresholds.fuzzy_match_threshold, 1);
        assert_eq!(used.len(), 2);
    }

    #[test]
    fn bad_env_value_is_a_config_error() {
        let mut config = EngineConfig::default();
        let env = HashMap::from([(ENV_FUZZY_THRESHOLD.to_string(), "lots".to_string())]);
        let err = config.apply_env_overrides(&env).unwrap_err();
        assert!(matches!(err, EngineError::Config { ref field, .. } if field == "thresholds.fuzzyMatchThreshold"));
    }

    #[test]
    fn validation_rejects_inverted_freshness_window() {
        let err = EngineConfig::from_json_str(r#"{"freshness": {"agingAfterDays": 200, "staleAfterDays": 100}}"#)
            .unwrap_err();
        assert!(matches!(err, EngineError::Config { .. }));
    }

    #[test]
    fn validation_caps_fuzzy_threshold() {
        let err = EngineConfig::from_json_str(r#"{"thresholds": {"fuzzyMatchThreshold": 20}}"#).unwrap_err();
        assert!(err.to_string().contains("fuzzyMatchThreshold"));
    }
}
