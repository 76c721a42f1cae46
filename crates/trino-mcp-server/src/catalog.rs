//! Advertised tool catalog.
//!
//! Built once from the static tool specs, with argument defaults taken from
//! the running configuration so clients see the values that will apply.

use crate::protocol::ToolDefinition;
use trino_mcp_core::{ToolDefaults, ToolKind};

/// The tools this gateway exposes, in a stable order.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    tools: Vec<ToolDefinition>,
}

impl ToolCatalog {
    pub fn new(defaults: &ToolDefaults) -> Self {
        let tools = ToolKind::ALL
            .into_iter()
            .map(|kind| {
                let spec = kind.spec();
                ToolDefinition {
                    name: spec.name.to_string(),
                    description: spec.description.to_string(),
                    input_schema: spec.input_schema(defaults),
                }
            })
            .collect();
        Self { tools }
    }

    /// List all tools.
    pub fn list(&self) -> &[ToolDefinition] {
        &self.tools
    }
}
