use serde::{Deserialize, Serialize};

use crate::error::WishError;
use crate::registry::DEFAULT_ID_PREFIX;
use crate::types::Priority;

/// Tuning knobs for the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Prefix for identifiers issued by a fresh registry.
    pub id_prefix: String,
    /// Among feasible carriers, pick one already standing at the wish's
    /// destination before falling back to id order.
    pub prefer_colocated: bool,
    /// Stop assigning after this many links in a single pass.
    pub max_assignments_per_pass: Option<usize>,
    /// Wishes valued below this wait for a later pass.
    pub min_value: Priority,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            prefer_colocated: true,
            max_assignments_per_pass: None,
            min_value: 0,
        }
    }
}

impl PlannerConfig {
    /// Parse a config from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, WishError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PlannerConfig::from_json(r#"{ "min_value": 25 }"#).unwrap();
        assert_eq!(config.min_value, 25);
        assert_eq!(config.id_prefix, "am");
        assert!(config.prefer_colocated);
        assert_eq!(config.max_assignments_per_pass, None);
    }

    #[test]
    fn test_bad_json_is_reported() {
        let err = PlannerConfig::from_json("{ min_value: }").unwrap_err();
        assert!(matches!(err, WishError::Json(_)));
    }
}
