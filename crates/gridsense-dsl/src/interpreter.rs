//! Interpreter for validated pattern DSL.
//!
//! Each top-level block is dispatched on its [`Command`]. `hunt` and `Track`
//! fold their subtree into one [`PatternDefinition`] and register it;
//! `forge` and `weave` emit an opaque [`Directive`] for the code generation
//! collaborator. A failing block records an [`InterpretError`] and the
//! following blocks still run.

use std::collections::BTreeMap;

use gridsense_core::{
    Constraint, Directive, GridsenseConfig, PatternDefinition, PluckMode, PluckRule, Rule,
    TagRule, TrapRule, DEFAULT_CONFIDENCE_THRESHOLD,
};
use gridsense_engine::PatternRegistry;
use serde_json::{json, Map, Value};

use crate::ast::{Ast, Literal, NodeId};
use crate::error::InterpretError;
use crate::keyword::{Command, Mode, Param};
use crate::naming::to_snake_case;
use crate::semantic::{constraint_arg, gamma_values, pluck_args, ValidatedAst};
use crate::span::Span;

/// Directive kind emitted by `forge`.
pub const TEMPLATE_DIRECTIVE: &str = "template";
/// Directive kind emitted by `weave`.
pub const CODEGEN_DIRECTIVE: &str = "codegen";

/// Everything produced from one compilation unit.
#[derive(Debug, Default)]
pub struct Interpretation {
    /// Patterns registered, in source order
    pub patterns: Vec<PatternDefinition>,
    /// Directives emitted, in source order
    pub directives: Vec<Directive>,
    /// Per-block failures
    pub errors: Vec<InterpretError>,
}

impl Interpretation {
    /// Whether every block succeeded.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// One level of the scope stack.
#[derive(Debug, Clone, Copy)]
enum Frame<'a> {
    Alpha {
        command: Command,
        bridge: Option<&'a str>,
    },
    Beta {
        head: &'a str,
        mode: Option<Mode>,
    },
    Gamma {
        param: Param,
        bridge: Option<&'a str>,
    },
}

/// Enclosing frames visible to parameter handlers.
#[derive(Debug, Default)]
struct Scope<'a> {
    frames: Vec<Frame<'a>>,
}

impl<'a> Scope<'a> {
    fn push(&mut self, frame: Frame<'a>) {
        self.frames.push(frame);
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    fn command(&self) -> Option<Command> {
        self.frames.iter().rev().find_map(|f| match f {
            Frame::Alpha { command, .. } => Some(*command),
            _ => None,
        })
    }

    fn block_name(&self) -> Option<&'a str> {
        self.frames.iter().rev().find_map(|f| match f {
            Frame::Alpha { bridge, .. } => *bridge,
            _ => None,
        })
    }

    fn section(&self) -> Option<(&'a str, Option<Mode>)> {
        self.frames.iter().rev().find_map(|f| match f {
            Frame::Beta { head, mode } => Some((*head, *mode)),
            _ => None,
        })
    }

    /// Pluck mode of the innermost section; Gather unless it says HARVEST.
    fn pluck_mode(&self) -> PluckMode {
        match self.section() {
            Some((_, Some(mode))) => mode.into(),
            _ => PluckMode::Gather,
        }
    }

    fn param(&self) -> Option<(Param, Option<&'a str>)> {
        self.frames.iter().rev().find_map(|f| match f {
            Frame::Gamma { param, bridge } => Some((*param, *bridge)),
            _ => None,
        })
    }
}

/// Pattern fields folded from one block.
#[derive(Debug, Default)]
struct PatternDraft {
    rules: Vec<Rule>,
    threshold: Option<f64>,
    component_type: Option<String>,
    inherited_type: Option<String>,
    skin: BTreeMap<String, String>,
    log_label: Option<String>,
}

/// Interpret a validated tree into the registry with default settings.
pub fn interpret(validated: &ValidatedAst, registry: &PatternRegistry) -> Interpretation {
    Interpreter::new(registry).interpret(validated)
}

/// Command dispatcher writing into a pattern registry.
pub struct Interpreter<'r> {
    registry: &'r PatternRegistry,
    default_threshold: f64,
    regex_size_limit: usize,
}

impl<'r> Interpreter<'r> {
    /// Create an interpreter with default settings.
    pub fn new(registry: &'r PatternRegistry) -> Self {
        Self {
            registry,
            default_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            regex_size_limit: GridsenseConfig::default().compiler.regex_size_limit,
        }
    }

    /// Create an interpreter using configured defaults.
    pub fn with_config(registry: &'r PatternRegistry, config: &GridsenseConfig) -> Self {
        Self {
            registry,
            default_threshold: config.matcher.default_threshold,
            regex_size_limit: config.compiler.regex_size_limit,
        }
    }

    /// Run every top-level block in source order.
    pub fn interpret(&self, validated: &ValidatedAst) -> Interpretation {
        let ast = validated.ast();
        let mut out = Interpretation::default();

        for root in ast.roots() {
            let Some(command) = ast.head(*root).and_then(Command::lookup) else {
                continue;
            };

            match command {
                Command::Hunt | Command::Track => match self.run_pattern(ast, *root, command) {
                    Ok(pattern) => out.patterns.push(pattern),
                    Err(e) => {
                        tracing::warn!("skipping block: {e}");
                        out.errors.push(e);
                    }
                },
                Command::Forge => out
                    .directives
                    .push(self.run_directive(ast, *root, command, TEMPLATE_DIRECTIVE)),
                Command::Weave => out
                    .directives
                    .push(self.run_directive(ast, *root, command, CODEGEN_DIRECTIVE)),
            }
        }

        tracing::info!(
            patterns = out.patterns.len(),
            directives = out.directives.len(),
            errors = out.errors.len(),
            "interpretation finished"
        );
        out
    }

    fn run_pattern(
        &self,
        ast: &Ast,
        root: NodeId,
        command: Command,
    ) -> Result<PatternDefinition, InterpretError> {
        let span = ast.node(root).span;
        let mut scope = Scope::default();
        scope.push(Frame::Alpha {
            command,
            bridge: ast.bridge(root),
        });
        let id = scope.block_name().unwrap_or_default().to_string();

        let mut draft = PatternDraft::default();
        for (beta, _) in ast.children(root) {
            scope.push(Frame::Beta {
                head: ast.head(beta).unwrap_or_default(),
                mode: ast.assign(beta).and_then(Mode::lookup),
            });
            for (gamma, node) in ast.children(beta) {
                let Some(param) = ast.head(gamma).and_then(Param::lookup) else {
                    continue;
                };
                scope.push(Frame::Gamma {
                    param,
                    bridge: ast.bridge(gamma),
                });
                self.apply_param(ast, gamma, node.span, &scope, &mut draft)?;
                scope.pop();
            }
            scope.pop();
        }

        let component_type = draft
            .component_type
            .or(draft.inherited_type)
            .unwrap_or_else(|| to_snake_case(&id));
        let mut pattern = PatternDefinition::new(id, component_type)
            .with_threshold(draft.threshold.unwrap_or(self.default_threshold));
        pattern.rules = draft.rules;
        pattern.skin = draft.skin;
        pattern.log_label = draft.log_label;

        self.registry
            .register(pattern.clone())
            .map_err(|source| InterpretError::Duplicate { source, span })?;

        tracing::info!(
            pattern_id = %pattern.id,
            component_type = %pattern.component_type,
            rules = pattern.rules.len(),
            command = %command,
            "compiled pattern"
        );
        Ok(pattern)
    }

    fn apply_param(
        &self,
        ast: &Ast,
        gamma: NodeId,
        span: Span,
        scope: &Scope<'_>,
        draft: &mut PatternDraft,
    ) -> Result<(), InterpretError> {
        let Some((param, bridge)) = scope.param() else {
            return Ok(());
        };
        let values: Vec<&Literal> = gamma_values(ast, gamma).into_iter().map(|(v, _)| v).collect();
        tracing::trace!(command = ?scope.command(), param = %param, values = values.len(), "applying parameter");

        match param {
            Param::Tag => {
                let markers: Vec<String> = values.iter().filter_map(|v| literal_text(v)).collect();
                draft.rules.push(Rule::Tag(TagRule::new(markers)));
            }
            Param::Pluck => {
                if let Some((target, pattern)) = pluck_args(values.iter().copied()) {
                    match PluckRule::new(target, pattern, scope.pluck_mode(), self.regex_size_limit) {
                        Ok(rule) => draft.rules.push(Rule::Pluck(rule)),
                        Err(e) => tracing::warn!(pattern, "dropping pluck rule: {e}"),
                    }
                }
            }
            Param::Trap => {
                for (key, arg) in values.iter().filter_map(|v| v.as_pair()) {
                    let built = constraint_arg(arg).map(|arg| Constraint::build(key, arg));
                    match built {
                        Some(Ok(constraint)) => draft.rules.push(Rule::Trap(TrapRule::new(constraint))),
                        Some(Err(e)) => tracing::warn!("dropping trap rule: {e}"),
                        None => tracing::warn!(key, "dropping nested trap value"),
                    }
                }
            }
            Param::Boil => {
                draft.threshold = values.first().and_then(|v| v.as_number());
            }
            Param::Skin => {
                for (key, value) in values.iter().filter_map(|v| v.as_pair()) {
                    if let Some(text) = literal_text(value) {
                        draft.skin.insert(key.to_string(), text);
                    }
                }
            }
            Param::Log => {
                draft.log_label = values.first().and_then(|v| v.as_text()).map(str::to_string);
            }
            Param::From => match bridge {
                Some(target) => {
                    let parent = self.registry.get(target).ok_or_else(|| {
                        InterpretError::UndefinedPattern {
                            target: target.to_string(),
                            span,
                        }
                    })?;
                    draft.rules.extend(parent.rules.iter().cloned());
                    if draft.inherited_type.is_none() {
                        draft.inherited_type = Some(parent.component_type.clone());
                    }
                }
                None => {
                    draft.component_type = values.first().and_then(|v| v.as_text()).map(str::to_string);
                }
            },
        }

        if matches!(param, Param::Tag | Param::Pluck | Param::Trap) {
            if let (Some(bridge), None) = (bridge, &draft.component_type) {
                draft.component_type = Some(to_snake_case(bridge));
            }
        }

        Ok(())
    }

    fn run_directive(&self, ast: &Ast, root: NodeId, command: Command, kind: &str) -> Directive {
        let name = ast.bridge(root).map(str::to_string);

        let sections: Vec<Value> = ast
            .children(root)
            .map(|(beta, _)| {
                let params: Vec<Value> = ast
                    .children(beta)
                    .map(|(gamma, _)| {
                        let values: Vec<Value> = gamma_values(ast, gamma)
                            .into_iter()
                            .map(|(v, _)| literal_json(v))
                            .collect();
                        json!({
                            "param": ast.head(gamma),
                            "target": ast.bridge(gamma),
                            "values": values,
                        })
                    })
                    .collect();
                json!({
                    "name": ast.head(beta),
                    "mode": ast.assign(beta),
                    "params": params,
                })
            })
            .collect();

        tracing::debug!(kind, name = ?name, command = %command, "emitted directive");
        Directive::new(
            kind,
            name.clone(),
            json!({
                "name": name,
                "sections": sections,
            }),
        )
    }
}

/// Text of a plain literal; numbers use their shortest form.
fn literal_text(literal: &Literal) -> Option<String> {
    match literal {
        Literal::Str(s) | Literal::Ident(s) => Some(s.clone()),
        Literal::Number(n) => Some(n.to_string()),
        Literal::Pair { .. } => None,
    }
}

fn literal_json(literal: &Literal) -> Value {
    match literal {
        Literal::Str(s) | Literal::Ident(s) => Value::String(s.clone()),
        Literal::Number(n) => Value::from(*n),
        Literal::Pair { key, value } => {
            let mut map = Map::new();
            map.insert(key.clone(), literal_json(value));
            Value::Object(map)
        }
    }
}
