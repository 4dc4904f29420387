//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool as declared by the remote server at discovery time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name, unique within a catalog
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Create a new tool descriptor with an empty object schema
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({ "type": "object" }),
        }
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }
}

/// Ordered set of tools a server currently exposes, in discovery order
pub type ToolCatalog = Vec<ToolDescriptor>;

/// Model-facing translation of a [`ToolDescriptor`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelToolSpec {
    /// Always `"function"`
    pub kind: String,
    pub name: String,
    pub description: String,
    /// The descriptor's input schema, forwarded unchanged
    pub parameters: Value,
}

impl ModelToolSpec {
    pub const FUNCTION: &'static str = "function";

    /// Create a function tool spec
    pub fn function(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            kind: Self::FUNCTION.to_string(),
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Tool call requested by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Opaque identifier correlating this request with its result
    pub id: String,
    /// Name of the tool being called
    #[serde(rename = "toolName")]
    pub tool_name: String,
    /// Raw arguments as emitted by the model, expected to be a JSON object
    #[serde(rename = "argumentsJson")]
    pub arguments_json: String,
}

impl ToolCallRequest {
    /// Create a new tool call request
    pub fn new(id: impl Into<String>, tool_name: impl Into<String>, arguments_json: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments_json: arguments_json.into(),
        }
    }
}

/// Result of one tool invocation, joined to its request by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// ID of the tool call this is responding to
    #[serde(rename = "correlatesTo")]
    pub correlates_to: String,
    /// Text of the first content item, empty when the tool returned nothing
    #[serde(rename = "textContent")]
    pub text_content: String,
}

impl ToolCallResult {
    pub fn new(correlates_to: impl Into<String>, text_content: impl Into<String>) -> Self {
        Self {
            correlates_to: correlates_to.into(),
            text_content: text_content.into(),
        }
    }
}

/// Tool choice directive sent with each model request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Let the model decide whether to use tools
    Auto,
    /// Don't use tools
    None,
}

impl ToolChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::None => "none",
        }
    }
}

impl Default for ToolChoice {
    fn default() -> Self {
        ToolChoice::Auto
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_creation() {
        let tool = ToolDescriptor::new("add", "Add two numbers").with_schema(json!({
            "type": "object",
            "properties": {
                "a": { "type": "integer" },
                "b": { "type": "integer" }
            },
            "required": ["a", "b"]
        }));

        assert_eq!(tool.name, "add");
        assert_eq!(tool.input_schema["required"], json!(["a", "b"]));
    }

    #[test]
    fn test_function_spec_kind() {
        let spec = ModelToolSpec::function("add", "Add", json!({}));
        assert_eq!(spec.kind, "function");
    }

    #[test]
    fn test_tool_choice_serialization() {
        assert_eq!(serde_json::to_string(&ToolChoice::Auto).unwrap(), "\"auto\"");
        assert_eq!(serde_json::to_string(&ToolChoice::None).unwrap(), "\"none\"");
        assert_eq!(ToolChoice::default(), ToolChoice::Auto);
        assert_eq!(ToolChoice::None.as_str(), "none");
    }
}
