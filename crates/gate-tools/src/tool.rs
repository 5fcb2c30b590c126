//! Tool trait definition

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, ToolError, ToolSchema};

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool execution was successful
    pub success: bool,

    /// The result data (if successful)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Successful result carrying a message for the model
    pub fn text(message: impl Into<String>) -> Self {
        Self::success(Value::String(message.into()))
    }

    /// Create an error result
    pub fn error<S: Into<String>>(message: S) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Text handed back to the model as the tool message content
    pub fn to_content(&self) -> String {
        if !self.success {
            return self.error.clone().unwrap_or_else(|| "Tool failed".to_string());
        }
        match &self.data {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

/// Trait for tools that can be called by the model
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name; the model calls the tool by this name
    fn name(&self) -> &str;

    /// Description included in the tool descriptor
    fn description(&self) -> &str;

    /// JSON schema of the parameters object
    fn parameters_schema(&self) -> ToolSchema;

    /// Execute the tool with given parameters
    async fn execute(&self, params: Value) -> Result<ToolResult>;
}

/// Deserialize a parameters object into a typed struct
pub fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T> {
    serde_json::from_value(params).map_err(|e| ToolError::invalid_params(e.to_string()))
}
