//! Engine configuration.

use crate::error::{DisinheritError, Result};
use crate::eviction::EvictionPolicy;
use serde::{Deserialize, Serialize};

/// What to do when a request finds its origin rewritten under another set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Fail the request with `DisinheritError::Conflict`.
    #[default]
    Error,
    /// Log a warning and return the result.
    Warn,
}

/// Configuration for the rewrite engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,

    /// Check that no excluded name is reachable from each result.
    #[serde(default = "default_verify")]
    pub verify_postcondition: bool,

    #[serde(default)]
    pub eviction: EvictionPolicy,
}

fn default_verify() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            conflict_policy: ConflictPolicy::Error,
            verify_postcondition: true,
            eviction: EvictionPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON configuration document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| DisinheritError::Config(e.to_string()))
    }
}

/// Builder for engine configuration.
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.config.conflict_policy = policy;
        self
    }

    pub fn verify_postcondition(mut self, enabled: bool) -> Self {
        self.config.verify_postcondition = enabled;
        self
    }

    pub fn eviction(mut self, policy: EvictionPolicy) -> Self {
        self.config.eviction = policy;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.conflict_policy, ConflictPolicy::Error);
        assert!(config.verify_postcondition);
        assert!(!config.eviction.auto_evict);
    }

    #[test]
    fn test_builder() {
        let config = EngineConfigBuilder::new()
            .conflict_policy(ConflictPolicy::Warn)
            .verify_postcondition(false)
            .eviction(EvictionPolicy {
                max_exclusion_sets: Some(4),
                ..Default::default()
            })
            .build();

        assert_eq!(config.conflict_policy, ConflictPolicy::Warn);
        assert!(!config.verify_postcondition);
        assert_eq!(config.eviction.max_exclusion_sets, Some(4));
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json(r#"{ "conflict_policy": "warn" }"#).unwrap();
        assert_eq!(config.conflict_policy, ConflictPolicy::Warn);
        assert!(config.verify_postcondition);
        assert_eq!(config.eviction, EvictionPolicy::default());
    }

    #[test]
    fn test_from_json_invalid() {
        let err = EngineConfig::from_json(r#"{ "conflict_policy": "explode" }"#).unwrap_err();
        assert!(matches!(err, DisinheritError::Config(_)));
    }
}
