//! Error types for agent runtime

use gate_core::CoreError;
use gate_llm::LLMError;
use gate_tools::ToolError;

/// Result type for agent runtime operations
pub type Result<T> = std::result::Result<T, AgentRuntimeError>;

/// Errors that end an agent run
///
/// Denials and tool failures do not appear here: they are reported back to
/// the model and recorded on the reply.
#[derive(Debug, thiserror::Error)]
pub enum AgentRuntimeError {
    /// LLM provider error
    #[error("LLM error: {0}")]
    LLM(#[from] LLMError),

    /// Tool registry error
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Max iterations exceeded
    #[error("Max iterations exceeded: {0}")]
    MaxIterationsExceeded(usize),

    /// Malformed model response
    #[error("Failed to parse tool call: {0}")]
    ToolCallParse(String),

    /// Agent not configured properly
    #[error("Agent configuration error: {0}")]
    Configuration(String),

    /// An approval request for a tool call could not be delivered
    #[error("Approval channel '{channel}' unavailable for '{tool}': {reason}")]
    ChannelUnavailable {
        tool: String,
        channel: String,
        reason: String,
    },

    /// The run was cancelled by the caller
    #[error("Agent run cancelled")]
    Cancelled,

    /// Error from gate-core
    #[error(transparent)]
    CoreError(#[from] CoreError),
}

impl AgentRuntimeError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a tool call parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::ToolCallParse(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = AgentRuntimeError::config("LLM provider not set");
        assert!(matches!(err, AgentRuntimeError::Configuration(_)));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            AgentRuntimeError::MaxIterationsExceeded(5).to_string(),
            "Max iterations exceeded: 5"
        );

        let err = AgentRuntimeError::ChannelUnavailable {
            tool: "purchase_luxury_item".into(),
            channel: "slack".into(),
            reason: "HTTP 503".into(),
        };
        assert_eq!(
            err.to_string(),
            "Approval channel 'slack' unavailable for 'purchase_luxury_item': HTTP 503"
        );
    }
}
