//! JSON Schema output for report consumers.
//!
//! schemars emits draft 2020-12. Downstream code generators read draft-07,
//! so the schema is rewritten:
//! - `$defs` → `definitions`, with `$ref`s updated
//! - nullable `anyOf` pairs and `["T", "null"]` type arrays → the non-null type
//! - `$schema` → the draft-07 URI

use gridsense_engine::ComponentReport;
use serde_json::{Map, Value};

/// Draft-07 meta-schema URI.
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Schema of one [`ComponentReport`], rewritten to draft-07.
pub fn report_schema() -> Value {
    let schema = schemars::schema_for!(ComponentReport);
    SchemaTransformer::transform(schema.to_value())
}

/// Schema transformer for draft-07 consumers.
pub struct SchemaTransformer;

impl SchemaTransformer {
    /// Apply every rewrite in sequence.
    pub fn transform(mut schema: Value) -> Value {
        schema = Self::convert_defs_to_definitions(schema);
        schema = Self::simplify_nullable(schema);
        if let Some(obj) = schema.as_object_mut() {
            obj.insert("$schema".to_string(), Value::String(DRAFT_07.to_string()));
        }
        schema
    }

    /// Move `$defs` to `definitions` and update `#/$defs/` references.
    fn convert_defs_to_definitions(mut schema: Value) -> Value {
        if let Some(obj) = schema.as_object_mut() {
            if let Some(defs) = obj.remove("$defs") {
                obj.insert("definitions".to_string(), defs);
            }
            Self::update_references(obj);
        }
        schema
    }

    fn update_references(obj: &mut Map<String, Value>) {
        for (key, val) in obj.iter_mut() {
            if key == "$ref" {
                if let Some(target) = val.as_str().and_then(|r| r.strip_prefix("#/$defs/")) {
                    *val = Value::String(format!("#/definitions/{target}"));
                }
                continue;
            }
            match val {
                Value::Object(nested) => Self::update_references(nested),
                Value::Array(items) => {
                    for nested in items.iter_mut().filter_map(Value::as_object_mut) {
                        Self::update_references(nested);
                    }
                }
                _ => {}
            }
        }
    }

    fn simplify_nullable(mut schema: Value) -> Value {
        if let Some(obj) = schema.as_object_mut() {
            Self::simplify_in_object(obj);
        }
        schema
    }

    fn simplify_in_object(obj: &mut Map<String, Value>) {
        if let Some(simplified) = obj
            .get("anyOf")
            .and_then(Value::as_array)
            .and_then(|any_of| Self::try_simplify_anyof(any_of))
        {
            obj.remove("anyOf");
            if let Value::Object(fields) = simplified {
                obj.extend(fields);
            }
        }

        if let Some(Value::Array(types)) = obj.get("type") {
            let non_null: Vec<Value> = types
                .iter()
                .filter(|t| t.as_str() != Some("null"))
                .cloned()
                .collect();
            if non_null.len() == 1 && types.len() == 2 {
                obj.insert("type".to_string(), non_null[0].clone());
            }
        }

        for val in obj.values_mut() {
            match val {
                Value::Object(nested) => Self::simplify_in_object(nested),
                Value::Array(items) => {
                    for nested in items.iter_mut().filter_map(Value::as_object_mut) {
                        Self::simplify_in_object(nested);
                    }
                }
                _ => {}
            }
        }
    }

    /// The non-null branch of a two-branch nullable `anyOf`.
    fn try_simplify_anyof(any_of: &[Value]) -> Option<Value> {
        let [first, second] = any_of else {
            return None;
        };
        let (type_schema, null_schema) = if Self::is_null_type(second) {
            (first, second)
        } else if Self::is_null_type(first) {
            (second, first)
        } else {
            return None;
        };

        // A null branch carrying anything besides `type` is kept as is
        if null_schema.as_object().is_some_and(|o| o.len() == 1) {
            Some(type_schema.clone())
        } else {
            None
        }
    }

    fn is_null_type(schema: &Value) -> bool {
        schema.get("type").and_then(Value::as_str) == Some("null")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_convert_defs_to_definitions() {
        let schema = json!({
            "$defs": {
                "MatchResult": {"type": "object"}
            },
            "properties": {
                "results": {
                    "type": "array",
                    "items": {"$ref": "#/$defs/MatchResult"}
                }
            }
        });

        let result = SchemaTransformer::convert_defs_to_definitions(schema);

        assert!(result["$defs"].is_null());
        assert!(result["definitions"]["MatchResult"].is_object());
        assert_eq!(
            result["properties"]["results"]["items"]["$ref"],
            "#/definitions/MatchResult"
        );
    }

    #[test]
    fn test_simplify_nullable_anyof() {
        let schema = json!({
            "anyOf": [
                {"$ref": "#/$defs/Bounds"},
                {"type": "null"}
            ]
        });

        let result = SchemaTransformer::simplify_nullable(schema);

        assert!(result["anyOf"].is_null());
        assert_eq!(result["$ref"], "#/$defs/Bounds");
    }

    #[test]
    fn test_simplify_nullable_type_array() {
        let schema = json!({
            "properties": {
                "best_match": {"type": ["string", "null"]},
                "mixed": {"type": ["string", "number"]}
            }
        });

        let result = SchemaTransformer::simplify_nullable(schema);

        assert_eq!(result["properties"]["best_match"]["type"], "string");
        assert_eq!(result["properties"]["mixed"]["type"], json!(["string", "number"]));
    }

    #[test]
    fn test_described_null_branch_is_kept() {
        let any_of = [json!({"type": "string"}), json!({"type": "null", "description": "unset"})];
        assert!(SchemaTransformer::try_simplify_anyof(&any_of).is_none());
    }

    #[test]
    fn test_report_schema() {
        let schema = report_schema();

        assert_eq!(schema["$schema"], DRAFT_07);
        assert!(schema.get("$defs").is_none());
        assert!(schema["properties"]["component_id"].is_object());
        assert!(schema["properties"]["results"].is_object());
        assert!(schema["definitions"]["MatchResult"].is_object());
        assert_eq!(
            schema["properties"]["results"]["items"]["$ref"],
            "#/definitions/MatchResult"
        );
    }
}
