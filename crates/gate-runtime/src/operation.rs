//! Tools as gateable operations

use async_trait::async_trait;
use gate_approval::{gate::default_summary, Arguments, Operation};
use gate_tools::{Tool, ToolError, ToolResult};
use serde_json::Value;
use std::sync::Arc;

/// Adapts a registered [`Tool`] to the gate's [`Operation`]
///
/// The request's arguments are exactly the parameters the model sent, so
/// policy rules match on tool parameter names (`cost`, `price`, ...).
pub struct ToolOperation {
    tool: Arc<dyn Tool>,
}

impl ToolOperation {
    pub fn new(tool: Arc<dyn Tool>) -> Self {
        Self { tool }
    }
}

#[async_trait]
impl Operation for ToolOperation {
    type Input = Value;
    type Output = ToolResult;
    type Error = ToolError;

    fn name(&self) -> &str {
        self.tool.name()
    }

    fn summarize(&self, arguments: &Arguments) -> String {
        format!(
            "{}\n{}",
            default_summary(self.tool.name(), arguments),
            self.tool.description()
        )
    }

    async fn call(&self, input: Value) -> Result<ToolResult, ToolError> {
        self.tool.execute(input).await
    }
}
