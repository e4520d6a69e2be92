//! Confidence-weighted matching of components against registered patterns.

use std::collections::BTreeMap;
use std::sync::Arc;

use gridsense_core::{Component, GridContext, MatchResult, MatcherSettings, PatternDefinition, Rule};
use serde::Serialize;

use crate::evaluate::{EvaluationContext, RuleOutcome};
use crate::registry::{PatternRegistry, RegistrySnapshot};

/// Match results for one component of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentMatches {
    /// Component the results belong to
    pub component_id: String,
    /// Results sorted by confidence, highest first
    pub results: Vec<MatchResult>,
}

/// Scores components against every pattern of a registry.
///
/// The matcher holds no per-call state; one instance may serve any number of
/// concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct RuleMatcher {
    settings: MatcherSettings,
}

impl RuleMatcher {
    /// Create a matcher with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a matcher with the given settings.
    pub fn with_settings(settings: MatcherSettings) -> Self {
        Self { settings }
    }

    /// Settings in use.
    pub fn settings(&self) -> &MatcherSettings {
        &self.settings
    }

    /// Match one component against the current registry contents.
    pub fn match_component(
        &self,
        component: &Component,
        grid: &dyn GridContext,
        registry: &PatternRegistry,
    ) -> Vec<MatchResult> {
        self.match_snapshot(component, grid, &registry.snapshot())
    }

    /// Match one component against a registry snapshot.
    ///
    /// One result per pattern, sorted by confidence descending; ties keep
    /// registration order.
    pub fn match_snapshot(
        &self,
        component: &Component,
        grid: &dyn GridContext,
        snapshot: &RegistrySnapshot,
    ) -> Vec<MatchResult> {
        let ctx = EvaluationContext::new(component, grid, &self.settings);

        let mut results: Vec<MatchResult> = snapshot
            .iter()
            .map(|pattern| self.evaluate_pattern(pattern, &ctx))
            .filter(|result| self.settings.include_non_matches || result.matched)
            .collect();

        // Stable sort keeps registration order among equal scores
        results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        tracing::debug!(
            component_id = %component.id,
            patterns = snapshot.len(),
            matched = results.iter().filter(|r| r.matched).count(),
            "matched component"
        );

        results
    }

    /// Score one pattern.
    ///
    /// Tag and pluck rules run in declaration order, then traps run against
    /// the extracted properties. Confidence is the mean score of the rules
    /// that fired.
    pub fn evaluate_pattern(
        &self,
        pattern: &PatternDefinition,
        ctx: &EvaluationContext<'_>,
    ) -> MatchResult {
        let mut scores: Vec<f64> = Vec::with_capacity(pattern.rules.len());
        let mut extracted_properties = BTreeMap::new();

        for rule in &pattern.rules {
            match rule {
                Rule::Tag(tag) => {
                    if let RuleOutcome::Fired(score) = ctx.evaluate_tag(tag) {
                        scores.push(score);
                    }
                }
                Rule::Pluck(pluck) => {
                    if let Some(value) = ctx.pluck(pluck) {
                        extracted_properties.insert(pluck.target_property.clone(), value);
                        scores.push(1.0);
                    }
                }
                Rule::Trap(_) => {}
            }
        }

        let mut disqualified = false;
        for rule in &pattern.rules {
            if let Rule::Trap(trap) = rule {
                if ctx.evaluate_trap(&trap.constraint, &extracted_properties)
                    == RuleOutcome::Violated
                {
                    tracing::trace!(
                        pattern_id = %pattern.id,
                        component_id = %ctx.component.id,
                        constraint = %trap.constraint,
                        "trap violated"
                    );
                    scores.push(0.0);
                    disqualified = true;
                }
            }
        }

        let confidence = if scores.is_empty() {
            0.0
        } else {
            (scores.iter().sum::<f64>() / scores.len() as f64).clamp(0.0, 1.0)
        };
        let matched = !disqualified && confidence >= pattern.confidence_threshold;

        if matched {
            if let Some(label) = &pattern.log_label {
                tracing::info!(
                    pattern_id = %pattern.id,
                    component_id = %ctx.component.id,
                    confidence,
                    "{label}"
                );
            }
        }

        MatchResult {
            pattern_id: pattern.id.clone(),
            component_id: ctx.component.id.clone(),
            component_type: pattern.component_type.clone(),
            matched,
            confidence,
            extracted_properties,
            disqualified,
        }
    }

    /// Match several components sequentially, preserving input order.
    pub fn match_batch(
        &self,
        components: &[Component],
        grid: &dyn GridContext,
        registry: &PatternRegistry,
    ) -> Vec<ComponentMatches> {
        let snapshot = registry.snapshot();
        components
            .iter()
            .map(|component| ComponentMatches {
                component_id: component.id.clone(),
                results: self.match_snapshot(component, grid, &snapshot),
            })
            .collect()
    }

    /// Match several components on the blocking thread pool.
    ///
    /// Every component sees the same snapshot. Output order follows input
    /// order; a component whose task fails gets an empty result set.
    pub async fn match_batch_concurrent(
        &self,
        components: Vec<Component>,
        grid: Arc<dyn GridContext>,
        snapshot: RegistrySnapshot,
    ) -> Vec<ComponentMatches> {
        let mut handles = Vec::with_capacity(components.len());

        for component in components {
            let component_id = component.id.clone();
            let matcher = self.clone();
            let grid = Arc::clone(&grid);
            let snapshot = snapshot.clone();

            let handle = tokio::task::spawn_blocking(move || {
                matcher.match_snapshot(&component, grid.as_ref(), &snapshot)
            });
            handles.push((component_id, handle));
        }

        let mut batch = Vec::with_capacity(handles.len());
        for (component_id, handle) in handles {
            let results = match handle.await {
                Ok(results) => results,
                Err(e) => {
                    tracing::error!(component_id = %component_id, "matching task failed: {e}");
                    Vec::new()
                }
            };
            batch.push(ComponentMatches {
                component_id,
                results,
            });
        }

        batch
    }

    /// Highest-confidence matched result, if any.
    pub fn best_match(results: &[MatchResult]) -> Option<&MatchResult> {
        results
            .iter()
            .filter(|r| r.matched)
            .fold(None, |best: Option<&MatchResult>, r| match best {
                Some(b) if b.confidence >= r.confidence => Some(b),
                _ => Some(r),
            })
    }
}
