//! Tool catalog translation
//!
//! Converts MCP tool declarations into [`ToolDescriptor`]s and descriptors
//! into the function specs sent to the model. Translation is pure: schemas
//! are forwarded untouched and order is preserved.

use std::collections::HashSet;

use serde_json::Value;

use crate::mcp::McpTool;
use crate::session::{SessionError, SessionResult};
use crate::types::{ModelToolSpec, ToolCatalog, ToolDescriptor};

impl From<&ToolDescriptor> for ModelToolSpec {
    fn from(descriptor: &ToolDescriptor) -> Self {
        ModelToolSpec::function(
            descriptor.name.clone(),
            descriptor.description.clone(),
            descriptor.input_schema.clone(),
        )
    }
}

/// Translate a catalog into model-facing function specs
///
/// One spec per descriptor, in catalog order. Nothing is filtered.
pub fn to_model_specs(catalog: &ToolCatalog) -> Vec<ModelToolSpec> {
    catalog.iter().map(ModelToolSpec::from).collect()
}

/// Convert one MCP tool declaration, rejecting nameless tools
///
/// The name is kept exactly as declared; it is what `tools/call` sends back.
pub fn descriptor_from_mcp(index: usize, tool: McpTool) -> SessionResult<ToolDescriptor> {
    if tool.name.trim().is_empty() {
        return Err(SessionError::MalformedToolDescriptor {
            index,
            reason: "missing name".to_string(),
        });
    }

    Ok(ToolDescriptor {
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
        input_schema: Value::Object(tool.input_schema.as_ref().clone()),
    })
}

/// Convert a full MCP tool listing into a validated catalog
pub fn catalog_from_mcp(tools: Vec<McpTool>) -> SessionResult<ToolCatalog> {
    let catalog = tools
        .into_iter()
        .enumerate()
        .map(|(index, tool)| descriptor_from_mcp(index, tool))
        .collect::<SessionResult<ToolCatalog>>()?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

/// Explain why a raw `tools/list` page could not be read as tool declarations
///
/// `offset` is the catalog position of the page's first entry. Returns the
/// first entry without a string `name`, else the first entry that does not
/// parse as a tool, else a discovery error for the page as a whole.
pub fn malformed_listing(offset: usize, page: &Value) -> SessionError {
    let Some(entries) = page.get("tools").and_then(Value::as_array) else {
        return SessionError::Discovery("tools/list result has no tools array".to_string());
    };

    for (position, entry) in entries.iter().enumerate() {
        if entry.get("name").and_then(Value::as_str).is_none() {
            return SessionError::MalformedToolDescriptor {
                index: offset + position,
                reason: "missing name".to_string(),
            };
        }
    }

    for (position, entry) in entries.iter().enumerate() {
        if let Err(e) = serde_json::from_value::<McpTool>(entry.clone()) {
            return SessionError::MalformedToolDescriptor {
                index: offset + position,
                reason: e.to_string(),
            };
        }
    }

    SessionError::Discovery("unexpected tools/list result".to_string())
}

/// Check catalog-level invariants: names present and unique
pub fn validate_catalog(catalog: &ToolCatalog) -> SessionResult<()> {
    let mut seen = HashSet::new();
    for (index, tool) in catalog.iter().enumerate() {
        if tool.name.trim().is_empty() {
            return Err(SessionError::MalformedToolDescriptor {
                index,
                reason: "missing name".to_string(),
            });
        }
        if !seen.insert(tool.name.as_str()) {
            return Err(SessionError::MalformedToolDescriptor {
                index,
                reason: format!("duplicate name {}", tool.name),
            });
        }
    }
    Ok(())
}

/// Look up a tool by name
pub fn find_tool<'a>(catalog: &'a ToolCatalog, name: &str) -> Option<&'a ToolDescriptor> {
    catalog.iter().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn mcp_tool(name: &str, description: Option<&str>, schema: Value) -> McpTool {
        let schema = schema.as_object().cloned().unwrap_or_default();
        let mut tool = McpTool::new(name.to_string(), String::new(), Arc::new(schema));
        tool.description = description.map(|d| d.to_string().into());
        tool
    }

    #[test]
    fn test_to_model_specs_preserves_order_and_metadata() {
        let catalog = vec![
            ToolDescriptor::new("add", "Add two numbers").with_schema(json!({
                "type": "object",
                "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}},
                "required": ["a", "b"]
            })),
            ToolDescriptor::new("echo", "Echo text"),
            ToolDescriptor::new("noop", ""),
        ];

        let specs = to_model_specs(&catalog);
        assert_eq!(specs.len(), catalog.len());
        for (spec, descriptor) in specs.iter().zip(&catalog) {
            assert_eq!(spec.kind, "function");
            assert_eq!(spec.name, descriptor.name);
            assert_eq!(spec.description, descriptor.description);
            assert_eq!(spec.parameters, descriptor.input_schema);
        }
    }

    #[test]
    fn test_to_model_specs_empty() {
        assert!(to_model_specs(&Vec::new()).is_empty());
    }

    #[test]
    fn test_descriptor_from_mcp() {
        let schema = json!({"type": "object", "properties": {"a": {"type": "integer"}}});
        let descriptor = descriptor_from_mcp(0, mcp_tool("add", Some("Add"), schema.clone())).unwrap();
        assert_eq!(descriptor.name, "add");
        assert_eq!(descriptor.description, "Add");
        assert_eq!(descriptor.input_schema, schema);

        let descriptor = descriptor_from_mcp(0, mcp_tool("bare", None, json!({"type": "object"}))).unwrap();
        assert_eq!(descriptor.description, "");
    }

    #[test]
    fn test_names_are_kept_verbatim() {
        let catalog = catalog_from_mcp(vec![
            mcp_tool("add ", None, json!({"type": "object"})),
            mcp_tool(" sub", None, json!({"type": "object"})),
        ])
        .unwrap();
        assert_eq!(catalog[0].name, "add ");
        assert_eq!(catalog[1].name, " sub");
        assert!(find_tool(&catalog, "add ").is_some());
        assert!(find_tool(&catalog, "add").is_none());
    }

    #[test]
    fn test_malformed_listing_finds_missing_name() {
        let page = json!({"tools": [
            {"name": "add", "inputSchema": {"type": "object"}},
            {"description": "nameless", "inputSchema": {"type": "object"}}
        ]});
        assert_eq!(
            malformed_listing(0, &page),
            SessionError::MalformedToolDescriptor {
                index: 1,
                reason: "missing name".to_string()
            }
        );
        assert!(matches!(
            malformed_listing(10, &page),
            SessionError::MalformedToolDescriptor { index: 11, .. }
        ));
    }

    #[test]
    fn test_malformed_listing_other_shapes() {
        let page = json!({"tools": [{"name": "add", "inputSchema": "not an object"}]});
        assert!(matches!(
            malformed_listing(0, &page),
            SessionError::MalformedToolDescriptor { index: 0, .. }
        ));
        assert!(matches!(malformed_listing(0, &json!({"items": []})), SessionError::Discovery(_)));
    }

    #[test]
    fn test_nameless_tool_is_malformed() {
        let err = catalog_from_mcp(vec![
            mcp_tool("add", None, json!({"type": "object"})),
            mcp_tool("  ", None, json!({"type": "object"})),
        ])
        .unwrap_err();
        assert!(matches!(err, SessionError::MalformedToolDescriptor { index: 1, .. }));
    }

    #[test]
    fn test_duplicate_names_are_malformed() {
        let catalog = vec![ToolDescriptor::new("add", "a"), ToolDescriptor::new("add", "b")];
        assert!(matches!(
            validate_catalog(&catalog),
            Err(SessionError::MalformedToolDescriptor { index: 1, .. })
        ));
        assert!(find_tool(&catalog, "add").is_some());
        assert!(find_tool(&catalog, "mul").is_none());
    }
}
