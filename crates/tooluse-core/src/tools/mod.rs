//! Tool registry adapter
//!
//! Sits between the transport session and the model:
//!
//! ```text
//!   tool server ──tools/list──▶ ToolCatalog ──to_model_specs──▶ ModelToolSpec[]
//!                                                                   │
//!   tool server ◀──tools/call── ToolArguments ◀──parse+validate── argumentsJson
//! ```

mod arguments;
mod registry;

pub use arguments::ToolArguments;
pub use registry::{
    catalog_from_mcp, descriptor_from_mcp, find_tool, malformed_listing, to_model_specs, validate_catalog,
};
