//! Tool registry for lookup and execution

use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

use crate::{error::ToolError, tool::Tool, Result, ToolResult};

/// Registry of the tools offered to the model
///
/// Cheap to clone; clones share the same tools.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Arc<DashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    ///
    /// Fails if a tool with the same name is already registered.
    pub fn register<T: Tool + 'static>(&self, tool: T) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool
    pub fn register_arc(&self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::AlreadyRegistered(name));
        }

        tracing::debug!(tool = %name, "Registered tool");
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Check if a tool is registered
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get a tool by name
    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, params: Value) -> Result<ToolResult> {
        let tool = self.get_tool(name).ok_or_else(|| ToolError::not_found(name))?;

        tracing::info!(tool = %name, %params, "Executing tool");

        match tool.execute(params).await {
            Ok(result) => {
                tracing::debug!(tool = %name, success = result.success, "Tool finished");
                Ok(result)
            }
            Err(e) => {
                tracing::error!(tool = %name, error = %e, "Tool execution failed");
                Err(e)
            }
        }
    }

    /// Registered tool names, sorted
    pub fn list_tools(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of registered tools
    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// OpenAI function descriptors for every tool, sorted by name
    pub fn to_openai_functions(&self) -> Vec<Value> {
        self.list_tools()
            .iter()
            .filter_map(|name| self.get_tool(name))
            .map(|tool| {
                tool.parameters_schema()
                    .to_openai_function(tool.name(), tool.description())
            })
            .collect()
    }
}
