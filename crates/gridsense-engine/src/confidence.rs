//! Coarse confidence bands over numeric match scores.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Match confidence level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    /// Low confidence (<60% certain)
    Low,
    /// Medium confidence (60-90% certain)
    Medium,
    /// High confidence (>=90% certain)
    High,
}

impl ConfidenceBand {
    /// Band of a score in `[0, 1]`.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            ConfidenceBand::High
        } else if score >= 0.6 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceBand::Low => f.write_str("low"),
            ConfidenceBand::Medium => f.write_str("medium"),
            ConfidenceBand::High => f.write_str("high"),
        }
    }
}

impl FromStr for ConfidenceBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(ConfidenceBand::Low),
            "medium" => Ok(ConfidenceBand::Medium),
            "high" => Ok(ConfidenceBand::High),
            other => Err(format!("unknown confidence band '{other}' (expected low, medium or high)")),
        }
    }
}
