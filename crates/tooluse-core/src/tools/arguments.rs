//! Validated tool arguments
//!
//! The model emits arguments as a JSON string. Before anything reaches the
//! tool server it is parsed into an object and checked against the tool's
//! declared input schema.

use serde_json::Value;

use crate::session::{JsonObject, SessionError, SessionResult};
use crate::types::ToolDescriptor;

/// Upper bound on schema violations quoted in one error message
const MAX_REPORTED_VIOLATIONS: usize = 5;

/// A key-value argument map that matched its tool's input schema
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolArguments(JsonObject);

impl ToolArguments {
    /// Parse `arguments_json` and validate it against `tool.input_schema`
    ///
    /// Blank input means "no arguments" and yields an empty map, which is
    /// still validated (so missing required fields are reported).
    pub fn parse(arguments_json: &str, tool: &ToolDescriptor) -> SessionResult<Self> {
        let map = if arguments_json.trim().is_empty() {
            JsonObject::new()
        } else {
            match serde_json::from_str::<Value>(arguments_json) {
                Ok(Value::Object(map)) => map,
                Ok(other) => {
                    return Err(SessionError::invalid_arguments(
                        &tool.name,
                        format!("expected a JSON object, got {}", json_kind(&other)),
                    ))
                }
                Err(e) => {
                    return Err(SessionError::invalid_arguments(
                        &tool.name,
                        format!("not valid JSON: {}", e),
                    ))
                }
            }
        };

        Self::validate(map, tool)
    }

    /// Validate an already-built map
    pub fn validate(map: JsonObject, tool: &ToolDescriptor) -> SessionResult<Self> {
        let validator = jsonschema::validator_for(&tool.input_schema).map_err(|e| {
            SessionError::invalid_arguments(&tool.name, format!("tool declares an unusable schema: {}", e))
        })?;

        let instance = Value::Object(map);
        let violations: Vec<String> = validator
            .iter_errors(&instance)
            .take(MAX_REPORTED_VIOLATIONS)
            .map(|e| e.to_string())
            .collect();

        if !violations.is_empty() {
            return Err(SessionError::invalid_arguments(&tool.name, violations.join("; ")));
        }

        let Value::Object(map) = instance else {
            return Err(SessionError::invalid_arguments(&tool.name, "expected a JSON object"));
        };
        Ok(Self(map))
    }

    pub fn as_map(&self) -> &JsonObject {
        &self.0
    }

    pub fn into_map(self) -> JsonObject {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
