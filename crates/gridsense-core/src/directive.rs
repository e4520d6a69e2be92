//! Non-pattern instructions handed to the code-generation collaborator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Interpreted template or codegen instruction.
///
/// The payload is opaque to this workspace; only its producer (the DSL
/// interpreter) and its consumer (code generation) know its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Directive {
    /// Directive kind (e.g. "template", "codegen")
    pub kind: String,
    /// Optional directive name (the block's bridge target)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Opaque payload
    pub payload: serde_json::Value,
}

impl Directive {
    /// Create a directive.
    pub fn new(kind: impl Into<String>, name: Option<String>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            name,
            payload,
        }
    }
}
