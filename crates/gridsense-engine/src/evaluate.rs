//! Evaluation of individual rules against one component.

use std::collections::BTreeMap;

use gridsense_core::{
    Component, Constraint, GridContext, MatcherSettings, PluckMode, PluckRule, TagRule,
};
use regex::Captures;
use serde_json::Value;

/// Outcome of evaluating one rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// The rule contributes this score to the pattern confidence
    Fired(f64),
    /// The rule does not contribute
    NotFired,
    /// A trap constraint does not hold; the pattern is vetoed
    Violated,
}

/// Per-component state shared by every rule evaluated against it.
///
/// Text gathered from the grid is computed once up front so each pattern
/// reads the same view of the component.
pub struct EvaluationContext<'a> {
    /// Component being classified
    pub component: &'a Component,
    boundary_text: String,
    interior_text: String,
    max_pluck_input: usize,
}

impl<'a> EvaluationContext<'a> {
    /// Build the evaluation view of a component.
    pub fn new(
        component: &'a Component,
        grid: &dyn GridContext,
        settings: &MatcherSettings,
    ) -> Self {
        Self {
            component,
            boundary_text: grid.text_of_cells(&component.boundary_cells),
            interior_text: grid.text_of_cells(&component.interior_cells),
            max_pluck_input: settings.max_pluck_input,
        }
    }

    /// Check whether a marker occurs in the boundary, the interior or the text.
    pub fn contains_marker(&self, marker: &str) -> bool {
        self.boundary_text.contains(marker)
            || self.interior_text.contains(marker)
            || self.component.text_content.contains(marker)
    }

    /// Evaluate a tag rule: full score when every marker is present.
    pub fn evaluate_tag(&self, rule: &TagRule) -> RuleOutcome {
        if rule.marker_values.is_empty() {
            return RuleOutcome::NotFired;
        }
        if rule.marker_values.iter().all(|m| self.contains_marker(m)) {
            RuleOutcome::Fired(1.0)
        } else {
            RuleOutcome::NotFired
        }
    }

    /// Run a pluck rule over the component text.
    ///
    /// Returns `None` when nothing was captured or the text is over the input
    /// bound. Regex matching is linear in the input, so the bound also caps
    /// the work done per rule.
    pub fn pluck(&self, rule: &PluckRule) -> Option<Value> {
        let text = self.component.text_content.as_str();
        if text.len() > self.max_pluck_input {
            tracing::warn!(
                component_id = %self.component.id,
                property = %rule.target_property,
                len = text.len(),
                limit = self.max_pluck_input,
                "text too large to pluck, skipping"
            );
            return None;
        }

        match rule.mode {
            PluckMode::Gather => rule
                .regex()
                .captures(text)
                .and_then(|caps| capture_text(rule, &caps))
                .map(Value::String),
            PluckMode::Harvest => {
                let values: Vec<Value> = rule
                    .regex()
                    .captures_iter(text)
                    .filter_map(|caps| capture_text(rule, &caps))
                    .map(Value::String)
                    .collect();
                (!values.is_empty()).then_some(Value::Array(values))
            }
        }
    }

    /// Check a trap constraint.
    pub fn evaluate_trap(
        &self,
        constraint: &Constraint,
        extracted: &BTreeMap<String, Value>,
    ) -> RuleOutcome {
        let component = self.component;
        let holds = match constraint {
            Constraint::MinWidth(n) => component.width() >= *n,
            Constraint::MaxWidth(n) => component.width() <= *n,
            Constraint::MinHeight(n) => component.height() >= *n,
            Constraint::MaxHeight(n) => component.height() <= *n,
            Constraint::Requires(property) => extracted.contains_key(property),
            Constraint::Contains(text) => component.text_content.contains(text.as_str()),
            Constraint::Excludes(text) => !component.text_content.contains(text.as_str()),
        };

        if holds {
            RuleOutcome::NotFired
        } else {
            RuleOutcome::Violated
        }
    }
}

/// Group 1 when the pattern has groups, the whole match otherwise.
///
/// A group 1 that did not take part in the match captures nothing.
fn capture_text(rule: &PluckRule, caps: &Captures<'_>) -> Option<String> {
    let group = if rule.regex().captures_len() > 1 { 1 } else { 0 };
    caps.get(group).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridsense_core::{Bounds, NoGrid, Position, TextGrid};

    fn settings() -> MatcherSettings {
        MatcherSettings::default()
    }

    fn pluck(pattern: &str, mode: PluckMode) -> PluckRule {
        PluckRule::new("value", pattern, mode, 1 << 20).unwrap()
    }

    #[test]
    fn test_tag_fires_when_all_markers_present() {
        let component = Component::from_text("c1", "[ OK ]");
        let ctx = EvaluationContext::new(&component, &NoGrid, &settings());

        assert_eq!(ctx.evaluate_tag(&TagRule::new(["[", "]"])), RuleOutcome::Fired(1.0));
        assert_eq!(ctx.evaluate_tag(&TagRule::new(["[", "("])), RuleOutcome::NotFired);
    }

    #[test]
    fn test_tag_reads_boundary_cells_from_grid() {
        let grid = TextGrid::from_text("+--+\n|ab|\n+--+");
        let component = Component::new("box", Bounds::new(0, 0, 4, 3))
            .with_boundary(vec![Position::new(0, 0), Position::new(0, 1)]);
        let ctx = EvaluationContext::new(&component, &grid, &settings());

        assert_eq!(ctx.evaluate_tag(&TagRule::new(["+-"])), RuleOutcome::Fired(1.0));
        assert_eq!(ctx.evaluate_tag(&TagRule::new(["|"])), RuleOutcome::NotFired);
    }

    #[test]
    fn test_tag_with_no_markers_does_not_fire() {
        let component = Component::from_text("c1", "anything");
        let ctx = EvaluationContext::new(&component, &NoGrid, &settings());
        assert_eq!(ctx.evaluate_tag(&TagRule::new(Vec::<String>::new())), RuleOutcome::NotFired);
    }

    #[test]
    fn test_pluck_gather_first_group() {
        let component = Component::from_text("c1", "[ OK ] [Cancel]");
        let ctx = EvaluationContext::new(&component, &NoGrid, &settings());

        let value = ctx.pluck(&pluck(r"\[(.+?)\]", PluckMode::Gather));
        assert_eq!(value, Some(Value::String(" OK ".to_string())));
    }

    #[test]
    fn test_pluck_harvest_all_matches() {
        let component = Component::from_text("c1", "[a] [b] [c]");
        let ctx = EvaluationContext::new(&component, &NoGrid, &settings());

        let value = ctx.pluck(&pluck(r"\[(\w)\]", PluckMode::Harvest));
        assert_eq!(value, Some(serde_json::json!(["a", "b", "c"])));
    }

    #[test]
    fn test_pluck_without_groups_uses_whole_match() {
        let component = Component::from_text("c1", "id=42");
        let ctx = EvaluationContext::new(&component, &NoGrid, &settings());

        let value = ctx.pluck(&pluck(r"\d+", PluckMode::Gather));
        assert_eq!(value, Some(Value::String("42".to_string())));
    }

    #[test]
    fn test_pluck_no_match() {
        let component = Component::from_text("c1", "plain");
        let ctx = EvaluationContext::new(&component, &NoGrid, &settings());

        assert_eq!(ctx.pluck(&pluck(r"\[(.+)\]", PluckMode::Gather)), None);
        assert_eq!(ctx.pluck(&pluck(r"\[(.+)\]", PluckMode::Harvest)), None);
    }

    #[test]
    fn test_pluck_unparticipating_group() {
        let component = Component::from_text("c1", "b");
        let ctx = EvaluationContext::new(&component, &NoGrid, &settings());
        assert_eq!(ctx.pluck(&pluck(r"(a)?b", PluckMode::Gather)), None);
    }

    #[test]
    fn test_pluck_skips_oversized_input() {
        let component = Component::from_text("c1", "[abcdef]");
        let settings = MatcherSettings {
            max_pluck_input: 4,
            ..MatcherSettings::default()
        };
        let ctx = EvaluationContext::new(&component, &NoGrid, &settings);
        assert_eq!(ctx.pluck(&pluck(r"\[(.+)\]", PluckMode::Gather)), None);
    }

    #[test]
    fn test_trap_dimensions() {
        let component = Component::new("c1", Bounds::new(0, 0, 6, 1));
        let ctx = EvaluationContext::new(&component, &NoGrid, &settings());
        let none = BTreeMap::new();

        assert_eq!(ctx.evaluate_trap(&Constraint::MinWidth(3), &none), RuleOutcome::NotFired);
        assert_eq!(ctx.evaluate_trap(&Constraint::MaxWidth(5), &none), RuleOutcome::Violated);
        assert_eq!(ctx.evaluate_trap(&Constraint::MinHeight(2), &none), RuleOutcome::Violated);
        assert_eq!(ctx.evaluate_trap(&Constraint::MaxHeight(1), &none), RuleOutcome::NotFired);
    }

    #[test]
    fn test_trap_requires_extracted_property() {
        let component = Component::from_text("c1", "[OK]");
        let ctx = EvaluationContext::new(&component, &NoGrid, &settings());
        let mut extracted = BTreeMap::new();

        let requires = Constraint::Requires("label".to_string());
        assert_eq!(ctx.evaluate_trap(&requires, &extracted), RuleOutcome::Violated);

        extracted.insert("label".to_string(), Value::String("OK".to_string()));
        assert_eq!(ctx.evaluate_trap(&requires, &extracted), RuleOutcome::NotFired);
    }

    #[test]
    fn test_trap_text_constraints() {
        let component = Component::from_text("c1", "[x] Remember me");
        let ctx = EvaluationContext::new(&component, &NoGrid, &settings());
        let none = BTreeMap::new();

        let contains = Constraint::Contains("Remember".to_string());
        let excludes = Constraint::Excludes("[x]".to_string());
        assert_eq!(ctx.evaluate_trap(&contains, &none), RuleOutcome::NotFired);
        assert_eq!(ctx.evaluate_trap(&excludes, &none), RuleOutcome::Violated);
    }
}
