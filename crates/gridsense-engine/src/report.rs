//! Report assembly from match results.

use gridsense_core::MatchResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::confidence::ConfidenceBand;
use crate::matcher::{ComponentMatches, RuleMatcher};

/// Classification report for one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComponentReport {
    /// Component that was classified
    pub component_id: String,
    /// Report timestamp (RFC 3339)
    pub timestamp: String,
    /// Pattern id of the best matched result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_match: Option<String>,
    /// Results, highest confidence first
    pub results: Vec<MatchResult>,
}

/// Report assembler.
///
/// Turns matcher output into timestamped reports.
pub struct ReportAssembler;

impl ReportAssembler {
    /// Create a new assembler.
    pub fn new() -> Self {
        Self
    }

    /// Assemble a report from one component's results.
    pub fn assemble(&self, matches: ComponentMatches) -> ComponentReport {
        let best_match = RuleMatcher::best_match(&matches.results).map(|r| r.pattern_id.clone());

        ComponentReport {
            component_id: matches.component_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
            best_match,
            results: matches.results,
        }
    }

    /// Assemble with confidence filtering.
    ///
    /// Only includes results whose confidence band meets the minimum.
    pub fn assemble_with_confidence(
        &self,
        matches: ComponentMatches,
        min_confidence: ConfidenceBand,
    ) -> ComponentReport {
        let results = matches
            .results
            .into_iter()
            .filter(|r| ConfidenceBand::from_score(r.confidence) >= min_confidence)
            .collect();

        self.assemble(ComponentMatches {
            component_id: matches.component_id,
            results,
        })
    }

    /// Assemble one report per component, preserving order.
    pub fn assemble_batch(
        &self,
        batch: Vec<ComponentMatches>,
        min_confidence: ConfidenceBand,
    ) -> Vec<ComponentReport> {
        batch
            .into_iter()
            .map(|matches| self.assemble_with_confidence(matches, min_confidence))
            .collect()
    }
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new()
    }
}
