//! Runtime configuration for contract checking

use serde::{Deserialize, Serialize};

use dbc_parser::DEFAULT_MAX_DEPTH;

/// What a hard-invariant check does when an invariant reads an attribute
/// the object does not have yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingAttributePolicy {
    /// Treat the invariant as not violated
    #[default]
    Tolerate,
    /// Propagate the `MissingAttribute` error
    Strict,
}

/// Configuration for contract checking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// When false, wrapped callables call straight through and writes are
    /// never checked
    pub enabled: bool,

    pub missing_attributes: MissingAttributePolicy,

    /// Nesting limit applied when predicate text is parsed
    pub max_expression_depth: usize,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            missing_attributes: MissingAttributePolicy::Tolerate,
            max_expression_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ContractConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration with every check switched off
    pub fn disabled() -> Self {
        Self::default().with_enabled(false)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_missing_attributes(mut self, policy: MissingAttributePolicy) -> Self {
        self.missing_attributes = policy;
        self
    }

    pub fn with_max_expression_depth(mut self, depth: usize) -> Self {
        self.max_expression_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ContractConfig::default();
        assert!(config.enabled);
        assert_eq!(config.missing_attributes, MissingAttributePolicy::Tolerate);
        assert_eq!(config.max_expression_depth, 64);
    }

    #[test]
    fn test_builder() {
        let config = ContractConfig::new()
            .with_missing_attributes(MissingAttributePolicy::Strict)
            .with_max_expression_depth(8);
        assert_eq!(config.missing_attributes, MissingAttributePolicy::Strict);
        assert_eq!(config.max_expression_depth, 8);
        assert!(!ContractConfig::disabled().enabled);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ContractConfig =
            serde_json::from_str(r#"{ "missing_attributes": "strict" }"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.missing_attributes, MissingAttributePolicy::Strict);
        assert_eq!(config.max_expression_depth, 64);
    }

    #[test]
    fn test_json_round_trip() {
        let config = ContractConfig::disabled().with_max_expression_depth(16);
        let json = serde_json::to_string(&config).unwrap();
        let back: ContractConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
