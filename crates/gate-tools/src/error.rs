//! Error types for tool operations

use gate_core::CoreError;

/// Result type for tool operations
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors that can occur during tool operations
///
/// Business failures (item not found, budget exhausted) are not errors; they
/// come back as a failed [`ToolResult`](crate::ToolResult) so the model can
/// read them.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Tool not found
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Tool execution failed
    #[error("Tool execution failed: {0}")]
    ExecutionError(String),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Tool already registered
    #[error("Tool already registered: {0}")]
    AlreadyRegistered(String),

    /// Error from gate-core
    #[error(transparent)]
    CoreError(#[from] CoreError),
}

impl ToolError {
    /// Create an execution error
    pub fn execution<S: Into<String>>(msg: S) -> Self {
        Self::ExecutionError(msg.into())
    }

    /// Create an invalid parameters error
    pub fn invalid_params<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameters(msg.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(tool_name: S) -> Self {
        Self::NotFound(tool_name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ToolError::not_found("purchase_yacht");
        assert_eq!(err.to_string(), "Tool not found: purchase_yacht");

        let err = ToolError::invalid_params("missing field `item`");
        assert!(matches!(err, ToolError::InvalidParameters(_)));
        assert_eq!(err.to_string(), "Invalid parameters: missing field `item`");
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: ToolError = CoreError::other("ledger offline").into();
        assert_eq!(err.to_string(), CoreError::other("ledger offline").to_string());
    }
}
