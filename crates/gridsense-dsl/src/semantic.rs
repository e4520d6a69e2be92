//! Semantic analysis of parsed pattern DSL.
//!
//! The analyzer walks the whole tree and collects every diagnostic instead of
//! stopping at the first one. Compilation is rejected when any diagnostic has
//! error severity; warnings are reported and otherwise ignored.

use gridsense_core::{CompilerSettings, Constraint, ConstraintArg};
use regex::RegexBuilder;

use crate::ast::{Ast, Literal, NodeId};
use crate::error::{SemanticError, SemanticErrorKind};
use crate::keyword::{Command, Mode, Param};
use crate::naming::Convention;
use crate::span::Span;

/// A tree that went through semantic analysis.
///
/// Only [`Analyzer::analyze`] creates one, so the interpreter can rely on
/// argument shapes having been checked.
#[derive(Debug, Clone)]
pub struct ValidatedAst {
    ast: Ast,
}

impl ValidatedAst {
    /// The analyzed tree.
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Give back the tree.
    pub fn into_inner(self) -> Ast {
        self.ast
    }
}

/// Analyze a tree with default settings.
pub fn analyze(ast: Ast) -> (ValidatedAst, Vec<SemanticError>) {
    Analyzer::new().analyze(ast)
}

/// Semantic analyzer.
#[derive(Debug, Clone)]
pub struct Analyzer {
    strict_naming: bool,
    regex_size_limit: usize,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::from_settings(&CompilerSettings::default())
    }
}

impl Analyzer {
    /// Create an analyzer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer from compiler settings.
    pub fn from_settings(settings: &CompilerSettings) -> Self {
        Self {
            strict_naming: settings.strict_naming,
            regex_size_limit: settings.regex_size_limit,
        }
    }

    /// Report naming violations as errors instead of warnings.
    pub fn strict_naming(mut self, strict: bool) -> Self {
        self.strict_naming = strict;
        self
    }

    /// Analyze a tree, collecting every diagnostic.
    pub fn analyze(&self, ast: Ast) -> (ValidatedAst, Vec<SemanticError>) {
        let diagnostics = {
            let mut checker = Checker {
                analyzer: self,
                ast: &ast,
                diagnostics: Vec::new(),
            };
            for root in ast.roots() {
                checker.check_alpha(*root);
            }
            checker.diagnostics
        };

        tracing::debug!(
            blocks = ast.roots().len(),
            diagnostics = diagnostics.len(),
            "semantic analysis finished"
        );
        (ValidatedAst { ast }, diagnostics)
    }
}

/// Per-block state folded while walking one Alpha.
#[derive(Default)]
struct BlockState {
    threshold_seen: bool,
    component_type: Option<String>,
}

struct Checker<'a> {
    analyzer: &'a Analyzer,
    ast: &'a Ast,
    diagnostics: Vec<SemanticError>,
}

impl Checker<'_> {
    fn error(&mut self, kind: SemanticErrorKind, span: Span) {
        self.diagnostics.push(SemanticError::error(kind, span));
    }

    fn naming(&mut self, role: &'static str, name: &str, convention: Convention, span: Span) {
        if convention.matches(name) {
            return;
        }
        let kind = SemanticErrorKind::Naming {
            role,
            name: name.to_string(),
            convention: convention.as_str(),
        };
        if self.analyzer.strict_naming {
            self.diagnostics.push(SemanticError::error(kind, span));
        } else {
            self.diagnostics.push(SemanticError::warning(kind, span));
        }
    }

    fn check_alpha(&mut self, id: NodeId) {
        let ast = self.ast;
        let span = ast.node(id).span;
        let head = ast.head(id).unwrap_or_default();

        let command = Command::lookup(head);
        match command {
            None => self.error(
                SemanticErrorKind::NotACommand {
                    found: head.to_string(),
                },
                span,
            ),
            Some(command) if command.defines_pattern() && ast.bridge(id).is_none() => {
                self.error(SemanticErrorKind::MissingPatternId { command }, span)
            }
            Some(_) => {}
        }

        if let Some(bridge) = ast.bridge(id) {
            self.naming("pattern id", bridge, Convention::PascalCase, span);
        }

        let mut block = BlockState::default();
        for (beta, _) in ast.children(id) {
            self.check_beta(beta, command, &mut block);
        }
    }

    fn check_beta(&mut self, id: NodeId, command: Option<Command>, block: &mut BlockState) {
        let ast = self.ast;
        let span = ast.node(id).span;
        let head = ast.head(id).unwrap_or_default();

        if Command::lookup(head).is_some() {
            self.error(
                SemanticErrorKind::CommandAsSectionHead {
                    found: head.to_string(),
                },
                span,
            );
        } else if Mode::lookup(head).is_some() {
            self.error(
                SemanticErrorKind::ModeOutsideTrack {
                    mode: head.to_string(),
                },
                span,
            );
        } else {
            self.naming("section", head, Convention::ScreamingSnakeCase, span);
        }

        let under_track = command == Some(Command::Track);
        match ast.assign(id) {
            Some(assign) if Command::lookup(assign).is_some() => self.error(
                SemanticErrorKind::CommandAsAssign {
                    found: assign.to_string(),
                },
                span,
            ),
            Some(assign) if Mode::lookup(assign).is_some() => {
                if !under_track {
                    self.error(
                        SemanticErrorKind::ModeOutsideTrack {
                            mode: assign.to_string(),
                        },
                        span,
                    );
                }
            }
            found if under_track => self.error(
                SemanticErrorKind::TrackModeRequired {
                    found: found.map(str::to_string),
                },
                span,
            ),
            _ => {}
        }

        for (gamma, _) in ast.children(id) {
            self.check_gamma(gamma, command, block);
        }
    }

    fn check_gamma(&mut self, id: NodeId, command: Option<Command>, block: &mut BlockState) {
        let ast = self.ast;
        let span = ast.node(id).span;
        let head = ast.head(id).unwrap_or_default();

        let Some(param) = Param::lookup(head) else {
            self.error(
                SemanticErrorKind::UnknownParam {
                    found: head.to_string(),
                },
                span,
            );
            return;
        };

        let in_directive = command.is_some_and(|c| !c.defines_pattern());
        if in_directive && !param.allowed_in_directive() {
            if let Some(command) = command {
                self.error(SemanticErrorKind::ParamNotAllowed { param, command }, span);
            }
        }

        let bridge = ast.bridge(id);
        if let Some(bridge) = bridge {
            if param != Param::From {
                self.naming("parameter bridge", bridge, Convention::CamelCase, span);
            }
        }

        let values = gamma_values(ast, id);
        for (value, value_span) in &values {
            self.check_literal_naming(value, *value_span);
        }

        let declares_type = !in_directive;
        match param {
            Param::Tag => {
                if values.is_empty() || values.iter().any(|(v, _)| !v.is_plain()) {
                    self.invalid(param, "expects one or more plain markers", span);
                }
                if let (Some(bridge), true) = (bridge, declares_type) {
                    self.declare_component_type(block, bridge, span);
                }
            }
            Param::Pluck => {
                match pluck_args(values.iter().map(|(v, _)| *v)) {
                    Some((_, pattern)) => {
                        if let Err(e) = RegexBuilder::new(pattern)
                            .size_limit(self.analyzer.regex_size_limit)
                            .build()
                        {
                            self.error(
                                SemanticErrorKind::InvalidRegex {
                                    pattern: pattern.to_string(),
                                    reason: e.to_string(),
                                },
                                span,
                            );
                        }
                    }
                    None => self.invalid(
                        param,
                        "expects (target, pattern) or (target:(..), pattern:(..))",
                        span,
                    ),
                }
                if let (Some(bridge), true) = (bridge, declares_type) {
                    self.declare_component_type(block, bridge, span);
                }
            }
            Param::Trap => {
                if values.is_empty() {
                    self.invalid(param, "expects one or more key:(value) constraints", span);
                }
                for (value, value_span) in &values {
                    match value.as_pair() {
                        Some((key, arg)) => match constraint_arg(arg) {
                            Some(arg) => {
                                if let Err(e) = Constraint::build(key, arg) {
                                    self.error(SemanticErrorKind::InvalidConstraint(e), *value_span);
                                }
                            }
                            None => self.invalid(param, "constraint values cannot be nested", *value_span),
                        },
                        None => self.invalid(param, "expects key:(value) constraints", *value_span),
                    }
                }
                if let (Some(bridge), true) = (bridge, declares_type) {
                    self.declare_component_type(block, bridge, span);
                }
            }
            Param::Boil => {
                match values.as_slice() {
                    [(Literal::Number(value), value_span)] => {
                        if !(0.0..=1.0).contains(value) {
                            self.error(
                                SemanticErrorKind::ThresholdOutOfRange { value: *value },
                                *value_span,
                            );
                        }
                    }
                    _ => self.invalid(param, "expects exactly one number", span),
                }
                if block.threshold_seen {
                    self.error(SemanticErrorKind::DuplicateThreshold, span);
                }
                block.threshold_seen = true;
            }
            Param::Skin => {
                let well_formed = !values.is_empty()
                    && values
                        .iter()
                        .all(|(v, _)| v.as_pair().is_some_and(|(_, value)| value.is_plain()));
                if !well_formed {
                    self.invalid(param, "expects one or more key:(value) hints", span);
                }
            }
            Param::Log => {
                if !matches!(values.as_slice(), [(Literal::Str(_), _)]) {
                    self.invalid(param, "expects exactly one string", span);
                }
            }
            Param::From => match (bridge, values.as_slice()) {
                (Some(_), []) => {}
                (Some(_), _) => self.invalid(param, "inheritance takes no values", span),
                (None, [(value, _)]) => match value.as_text() {
                    Some(component_type) if declares_type => {
                        self.declare_component_type(block, component_type, span)
                    }
                    Some(_) => {}
                    None => self.invalid(param, "expects a component type name", span),
                },
                (None, _) => self.invalid(
                    param,
                    "expects one component type or a pattern id bridge",
                    span,
                ),
            },
        }
    }

    fn check_literal_naming(&mut self, literal: &Literal, span: Span) {
        match literal {
            Literal::Ident(name) => self.naming("value", name, Convention::SnakeCase, span),
            Literal::Pair { key, value } => {
                self.naming("key", key, Convention::SnakeCase, span);
                self.check_literal_naming(value, span);
            }
            Literal::Str(_) | Literal::Number(_) => {}
        }
    }

    fn invalid(&mut self, param: Param, reason: &str, span: Span) {
        self.error(
            SemanticErrorKind::InvalidArguments {
                param,
                reason: reason.to_string(),
            },
            span,
        );
    }

    fn declare_component_type(&mut self, block: &mut BlockState, name: &str, span: Span) {
        match &block.component_type {
            Some(first) if first != name => {
                let first = first.clone();
                self.error(
                    SemanticErrorKind::ConflictingComponentType {
                        first,
                        second: name.to_string(),
                    },
                    span,
                );
            }
            Some(_) => {}
            None => block.component_type = Some(name.to_string()),
        }
    }
}

/// Every value of a Gamma's Deltas, in order, with the span of its Delta.
pub(crate) fn gamma_values(ast: &Ast, gamma: NodeId) -> Vec<(&Literal, Span)> {
    ast.children(gamma)
        .flat_map(|(_, delta)| delta.values.iter().map(move |v| (v, delta.span)))
        .collect()
}

/// Resolve `pluck` arguments into `(target, pattern)`.
///
/// Accepts two positional text values or `target:`/`pattern:` pairs in
/// either order.
pub(crate) fn pluck_args<'v>(
    values: impl IntoIterator<Item = &'v Literal>,
) -> Option<(&'v str, &'v str)> {
    let values: Vec<&Literal> = values.into_iter().collect();
    let [first, second] = *values.as_slice() else {
        return None;
    };

    if let (Some(target), Some(pattern)) = (first.as_text(), second.as_text()) {
        return Some((target, pattern));
    }

    let mut target = None;
    let mut pattern = None;
    for value in [first, second] {
        let (key, inner) = value.as_pair()?;
        let text = inner.as_text()?;
        match key {
            "target" if target.is_none() => target = Some(text),
            "pattern" if pattern.is_none() => pattern = Some(text),
            _ => return None,
        }
    }
    Some((target?, pattern?))
}

/// Argument of a constraint pair value; nested pairs have none.
pub(crate) fn constraint_arg(value: &Literal) -> Option<ConstraintArg<'_>> {
    match value {
        Literal::Number(n) => Some(ConstraintArg::Number(*n)),
        Literal::Str(s) | Literal::Ident(s) => Some(ConstraintArg::Text(s)),
        Literal::Pair { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Severity;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn diagnostics(source: &str) -> Vec<SemanticError> {
        let ast = parse(&tokenize(source).unwrap()).unwrap();
        analyze(ast).1
    }

    fn errors(source: &str) -> Vec<SemanticErrorKind> {
        diagnostics(source)
            .into_iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.kind)
            .collect()
    }

    fn warnings(source: &str) -> Vec<SemanticErrorKind> {
        diagnostics(source)
            .into_iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| d.kind)
            .collect()
    }

    #[test]
    fn test_valid_button_is_clean() {
        let source = r#"<hunt:Button [MARKERS {tag ("[", "]")} {pluck ("button_text", "\[(.+?)\]")}]> EXEC"#;
        assert!(diagnostics(source).is_empty());
    }

    #[test]
    fn test_alpha_head_must_be_command() {
        assert_eq!(
            errors("<find:Button> EXEC"),
            vec![SemanticErrorKind::NotACommand {
                found: "find".to_string()
            }]
        );
    }

    #[test]
    fn test_pattern_command_requires_id() {
        assert_eq!(
            errors("<hunt [MARKERS {tag (x)}]> EXEC"),
            vec![SemanticErrorKind::MissingPatternId {
                command: Command::Hunt
            }]
        );
        assert!(errors("<forge> EXEC").is_empty());
    }

    #[test]
    fn test_mode_only_under_track() {
        assert!(errors("<Track:Menu [ITEMS=HARVEST {tag (x)}]> EXEC").is_empty());
        assert_eq!(
            errors("<hunt:Menu [ITEMS=HARVEST {tag (x)}]> EXEC"),
            vec![SemanticErrorKind::ModeOutsideTrack {
                mode: "HARVEST".to_string()
            }]
        );
    }

    #[test]
    fn test_track_sections_need_mode() {
        assert_eq!(
            errors("<Track:Menu [ITEMS {tag (x)}]> EXEC"),
            vec![SemanticErrorKind::TrackModeRequired { found: None }]
        );
        assert_eq!(
            errors("<Track:Menu [ITEMS=LIST {tag (x)}]> EXEC"),
            vec![SemanticErrorKind::TrackModeRequired {
                found: Some("LIST".to_string())
            }]
        );
    }

    #[test]
    fn test_command_cannot_be_section_or_assign() {
        let errs = errors("<hunt:A [hunt {tag (x)}] [S=forge {tag (y)}]> EXEC");
        assert!(errs.contains(&SemanticErrorKind::CommandAsSectionHead {
            found: "hunt".to_string()
        }));
        assert!(errs.contains(&SemanticErrorKind::CommandAsAssign {
            found: "forge".to_string()
        }));
    }

    #[test]
    fn test_unknown_param() {
        assert_eq!(
            errors("<hunt:A [S {colour (red)}]> EXEC"),
            vec![SemanticErrorKind::UnknownParam {
                found: "colour".to_string()
            }]
        );
    }

    #[test]
    fn test_rule_params_not_allowed_in_directives() {
        assert_eq!(
            errors("<weave:Form [S {tag (x)} {skin (color:(red))}]> EXEC"),
            vec![SemanticErrorKind::ParamNotAllowed {
                param: Param::Tag,
                command: Command::Weave
            }]
        );
    }

    #[test]
    fn test_tag_arity() {
        assert!(matches!(
            errors("<hunt:A [S {tag}]> EXEC").as_slice(),
            [SemanticErrorKind::InvalidArguments { param: Param::Tag, .. }]
        ));
        assert!(matches!(
            errors("<hunt:A [S {tag (key:(x))}]> EXEC").as_slice(),
            [SemanticErrorKind::InvalidArguments { param: Param::Tag, .. }]
        ));
    }

    #[test]
    fn test_pluck_shapes() {
        assert!(errors(r#"<hunt:A [S {pluck (label, "(\w+)")}]> EXEC"#).is_empty());
        assert!(errors(r#"<hunt:A [S {pluck (pattern:("(\w+)"), target:(label))}]> EXEC"#).is_empty());
        assert!(matches!(
            errors(r#"<hunt:A [S {pluck ("(\w+)")}]> EXEC"#).as_slice(),
            [SemanticErrorKind::InvalidArguments { param: Param::Pluck, .. }]
        ));
        assert!(matches!(
            errors(r#"<hunt:A [S {pluck (target:(a), target:(b))}]> EXEC"#).as_slice(),
            [SemanticErrorKind::InvalidArguments { param: Param::Pluck, .. }]
        ));
    }

    #[test]
    fn test_pluck_invalid_regex() {
        assert!(matches!(
            errors(r#"<hunt:A [S {pluck (label, "([unclosed")}]> EXEC"#).as_slice(),
            [SemanticErrorKind::InvalidRegex { .. }]
        ));
    }

    #[test]
    fn test_trap_constraints() {
        assert!(errors("<hunt:A [S {trap (min_width:(3), requires:(label))}]> EXEC").is_empty());
        assert!(matches!(
            errors("<hunt:A [S {trap (min_width:(wide))}]> EXEC").as_slice(),
            [SemanticErrorKind::InvalidConstraint(_)]
        ));
        assert!(matches!(
            errors("<hunt:A [S {trap (colour:(red))}]> EXEC").as_slice(),
            [SemanticErrorKind::InvalidConstraint(_)]
        ));
        assert!(matches!(
            errors("<hunt:A [S {trap (min_width)}]> EXEC").as_slice(),
            [SemanticErrorKind::InvalidArguments { param: Param::Trap, .. }]
        ));
    }

    #[test]
    fn test_boil() {
        assert!(errors("<hunt:A [S {boil (0.8)}]> EXEC").is_empty());
        assert_eq!(
            errors("<hunt:A [S {boil (1.5)}]> EXEC"),
            vec![SemanticErrorKind::ThresholdOutOfRange { value: 1.5 }]
        );
        assert_eq!(
            errors("<hunt:A [S {boil (0.5)}] [T {boil (0.6)}]> EXEC"),
            vec![SemanticErrorKind::DuplicateThreshold]
        );
        assert!(matches!(
            errors("<hunt:A [S {boil (high)}]> EXEC").as_slice(),
            [SemanticErrorKind::InvalidArguments { param: Param::Boil, .. }]
        ));
    }

    #[test]
    fn test_skin_and_log() {
        assert!(errors(r#"<forge:Tpl [STYLE {skin (color:(red), border:("double"))} {log ("styled")}]> EXEC"#).is_empty());
        assert!(matches!(
            errors("<forge:Tpl [STYLE {skin (red)}]> EXEC").as_slice(),
            [SemanticErrorKind::InvalidArguments { param: Param::Skin, .. }]
        ));
        assert!(matches!(
            errors("<hunt:A [S {log (a, b)}]> EXEC").as_slice(),
            [SemanticErrorKind::InvalidArguments { param: Param::Log, .. }]
        ));
    }

    #[test]
    fn test_from_forms() {
        assert!(errors("<hunt:A [S {from (button)}]> EXEC").is_empty());
        assert!(errors("<hunt:B [S {from:A}]> EXEC").is_empty());
        assert!(matches!(
            errors("<hunt:B [S {from:A (button)}]> EXEC").as_slice(),
            [SemanticErrorKind::InvalidArguments { param: Param::From, .. }]
        ));
        assert!(matches!(
            errors("<hunt:B [S {from (a, b)}]> EXEC").as_slice(),
            [SemanticErrorKind::InvalidArguments { param: Param::From, .. }]
        ));
    }

    #[test]
    fn test_conflicting_component_types() {
        assert_eq!(
            errors("<hunt:A [S {from (button)} {tag:checkbox (x)}]> EXEC"),
            vec![SemanticErrorKind::ConflictingComponentType {
                first: "button".to_string(),
                second: "checkbox".to_string()
            }]
        );
        assert!(errors("<hunt:A [S {from (button)} {tag:button (x)}]> EXEC").is_empty());
    }

    #[test]
    fn test_naming_warnings() {
        let warns = warnings("<hunt:button [markers {tag:Primary (Mark)}]> EXEC");
        let roles: Vec<&str> = warns
            .iter()
            .map(|w| match w {
                SemanticErrorKind::Naming { role, .. } => *role,
                _ => "other",
            })
            .collect();
        assert_eq!(roles, vec!["pattern id", "section", "parameter bridge", "value"]);
    }

    #[test]
    fn test_strict_naming_turns_warnings_into_errors() {
        let ast = parse(&tokenize("<hunt:button [S {tag (x)}]> EXEC").unwrap()).unwrap();
        let (_, diagnostics) = Analyzer::new().strict_naming(true).analyze(ast);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_error());
    }

    #[test]
    fn test_collects_every_error() {
        let errs = errors("<find [S {colour (x)} {boil (2)}]> EXEC @@ <hunt [T {tag}]> EXEC");
        assert_eq!(errs.len(), 5);
    }
}
