//! Per-pattern outcome of matching one component.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outcome of evaluating one pattern against one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MatchResult {
    /// Pattern that was evaluated
    pub pattern_id: String,
    /// Component it was evaluated against
    pub component_id: String,
    /// Component type the pattern recognizes
    pub component_type: String,
    /// Whether the pattern matched
    pub matched: bool,
    /// Mean score over fired rules, in `[0, 1]`
    pub confidence: f64,
    /// Properties extracted by pluck rules
    pub extracted_properties: BTreeMap<String, serde_json::Value>,
    /// Whether a trap rule vetoed the pattern
    #[serde(default)]
    pub disqualified: bool,
}

impl MatchResult {
    /// Extracted property as a string, if it is one.
    pub fn property_str(&self, name: &str) -> Option<&str> {
        self.extracted_properties.get(name).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MatchResult {
        let mut extracted_properties = BTreeMap::new();
        extracted_properties.insert("button_text".to_string(), serde_json::json!("OK"));
        extracted_properties.insert("labels".to_string(), serde_json::json!(["a", "b"]));
        MatchResult {
            pattern_id: "Button".to_string(),
            component_id: "c1".to_string(),
            component_type: "button".to_string(),
            matched: true,
            confidence: 1.0,
            extracted_properties,
            disqualified: false,
        }
    }

    #[test]
    fn test_property_str() {
        let result = sample();
        assert_eq!(result.property_str("button_text"), Some("OK"));
        assert_eq!(result.property_str("labels"), None);
        assert_eq!(result.property_str("missing"), None);
    }

    #[test]
    fn test_match_result_serialization() {
        let result = sample();
        let json = serde_json::to_string(&result).unwrap();
        let back: MatchResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }
}
