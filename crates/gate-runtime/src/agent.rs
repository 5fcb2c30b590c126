//! Agent implementation

use gate_approval::{CancellationToken, Clearance, DenialReason, Gate, GateContext, GateError};
use gate_core::config::AgentSettings;
use gate_llm::{Conversation, LLMProvider, TokenUsage};
use gate_tools::{ToolRegistry, ToolResult};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AgentRuntimeError,
    operation::ToolOperation,
    parser::{self, ToolCall},
    Result,
};

/// Configuration for agent behavior
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum model round trips per run
    pub max_iterations: usize,

    /// System message for the agent
    pub system_message: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::from(&AgentSettings::default())
    }
}

impl From<&AgentSettings> for AgentConfig {
    fn from(settings: &AgentSettings) -> Self {
        let system_message = settings.system_message.trim();
        Self {
            max_iterations: settings.max_iterations,
            system_message: (!system_message.is_empty()).then(|| system_message.to_string()),
        }
    }
}

/// What happened to one tool call
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// The tool ran
    Completed {
        result: ToolResult,
        /// `None` when the tool is not gated
        clearance: Option<Clearance>,
    },
    /// The approval request was rejected or timed out; the tool never ran
    Denied {
        request_id: Uuid,
        reason: DenialReason,
        comment: Option<String>,
    },
    /// Unknown tool, bad arguments or a tool error
    Failed { error: String },
}

impl CallOutcome {
    /// Text reported back to the model for this call
    pub fn content(&self, tool: &str) -> String {
        match self {
            CallOutcome::Completed { result, .. } => result.to_content(),
            CallOutcome::Denied {
                reason: DenialReason::Rejected,
                comment,
                ..
            } => match comment {
                Some(comment) => format!(
                    "❌ A human reviewer rejected {}: {}. The action was not performed.",
                    tool, comment
                ),
                None => format!(
                    "❌ A human reviewer rejected {}. The action was not performed.",
                    tool
                ),
            },
            CallOutcome::Denied {
                reason: DenialReason::TimedOut,
                ..
            } => format!(
                "⏰ Approval for {} timed out. The action was not performed.",
                tool
            ),
            CallOutcome::Failed { error } => format!("Tool '{}' failed: {}", tool, error),
        }
    }
}

/// One tool call made during a run
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRecord {
    pub id: String,
    pub name: String,
    pub arguments: Value,
    pub outcome: CallOutcome,
}

impl ToolCallRecord {
    pub fn is_denied(&self) -> bool {
        matches!(self.outcome, CallOutcome::Denied { .. })
    }

    /// Whether a reviewer approved this call
    pub fn was_reviewed(&self) -> bool {
        matches!(
            self.outcome,
            CallOutcome::Completed {
                clearance: Some(Clearance::Approved { .. }),
                ..
            }
        )
    }
}

/// Result of [`Agent::run`]
#[derive(Debug, Clone)]
pub struct AgentReply {
    /// The model's final answer
    pub content: String,
    /// Every tool call, in order
    pub tool_calls: Vec<ToolCallRecord>,
    /// Model round trips used
    pub iterations: usize,
    pub usage: TokenUsage,
}

impl AgentReply {
    /// Calls whose approval was refused or timed out
    pub fn denied_calls(&self) -> impl Iterator<Item = &ToolCallRecord> {
        self.tool_calls.iter().filter(|call| call.is_denied())
    }
}

/// Tool-calling agent with gated tools
///
/// Tools named in the gate's policy go through [`Gate<ToolOperation>`]; all
/// others run directly.
pub struct Agent {
    provider: Arc<dyn LLMProvider>,
    tools: ToolRegistry,
    gate: GateContext,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent builder
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn gate(&self) -> &GateContext {
        &self.gate
    }

    /// Run one request in a fresh conversation
    pub async fn run(&self, user_message: &str) -> Result<AgentReply> {
        self.run_with_cancel(user_message, &CancellationToken::new())
            .await
    }

    /// Run one request, stopping early if `cancel` fires
    ///
    /// Cancelling while a tool call waits for approval abandons that
    /// request.
    pub async fn run_with_cancel(
        &self,
        user_message: &str,
        cancel: &CancellationToken,
    ) -> Result<AgentReply> {
        let mut conversation = match &self.config.system_message {
            Some(system) => Conversation::with_system(system),
            None => Conversation::new(),
        };
        conversation.add_user(user_message);
        tracing::info!("User: {}", user_message);

        let tool_defs = self.tools.to_openai_functions();
        let mut records = Vec::new();
        let mut usage = TokenUsage::default();

        for iteration in 1..=self.config.max_iterations {
            tracing::debug!("Iteration {}/{}", iteration, self.config.max_iterations);

            let raw = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AgentRuntimeError::Cancelled),
                response = self
                    .provider
                    .send_message_with_tools(conversation.messages().to_vec(), tool_defs.clone()) => response?,
            };
            if let Some(turn) = TokenUsage::from_response(&raw) {
                usage.add(turn);
            }

            let message = parser::response_message(&raw)?;
            let content = parser::message_content(message).to_string();
            let calls = parser::parse_openai_tool_calls(message)?;

            if calls.is_empty() {
                conversation.add_assistant(&content);
                tracing::info!("Assistant: {}", content);
                return Ok(AgentReply {
                    content,
                    tool_calls: records,
                    iterations: iteration,
                    usage,
                });
            }

            tracing::info!("LLM requested {} tool(s)", calls.len());
            conversation.add_assistant_tool_calls(
                content,
                calls.iter().map(ToolCall::to_wire).collect(),
            );

            for call in calls {
                let outcome = self.execute_tool_call(&call, cancel).await?;
                conversation.add_tool_result(&call.id, outcome.content(&call.name));
                records.push(ToolCallRecord {
                    id: call.id,
                    name: call.name,
                    arguments: call.parameters,
                    outcome,
                });
            }
        }

        tracing::error!("Max iterations ({}) exceeded", self.config.max_iterations);
        Err(AgentRuntimeError::MaxIterationsExceeded(
            self.config.max_iterations,
        ))
    }

    /// Execute one call, through the gate if its tool is gated
    async fn execute_tool_call(
        &self,
        call: &ToolCall,
        cancel: &CancellationToken,
    ) -> Result<CallOutcome> {
        let Some(tool) = self.tools.get_tool(&call.name) else {
            tracing::warn!("Model asked for unknown tool '{}'", call.name);
            return Ok(CallOutcome::Failed {
                error: format!("Tool not found: {}", call.name),
            });
        };

        if !self.gate.is_gated(&call.name) {
            return Ok(
                match self.tools.execute(&call.name, call.parameters.clone()).await {
                    Ok(result) => CallOutcome::Completed {
                        result,
                        clearance: None,
                    },
                    Err(e) => CallOutcome::Failed {
                        error: e.to_string(),
                    },
                },
            );
        }

        let gate = Gate::new(ToolOperation::new(tool), self.gate.clone());
        match gate
            .invoke_with_clearance(call.parameters.clone(), cancel)
            .await
        {
            Ok((result, clearance)) => Ok(CallOutcome::Completed {
                result,
                clearance: Some(clearance),
            }),
            Err(GateError::ApprovalDenied {
                request_id,
                reason,
                comment,
                ..
            }) => {
                tracing::info!("Tool '{}' denied ({})", call.name, reason);
                Ok(CallOutcome::Denied {
                    request_id,
                    reason,
                    comment,
                })
            }
            Err(GateError::NotificationChannelUnavailable { channel, reason }) => {
                Err(AgentRuntimeError::ChannelUnavailable {
                    tool: call.name.clone(),
                    channel,
                    reason,
                })
            }
            Err(GateError::Cancelled(request_id)) => {
                tracing::warn!(%request_id, "Run cancelled while '{}' awaited approval", call.name);
                Err(AgentRuntimeError::Cancelled)
            }
            Err(GateError::InvalidArguments { message, .. }) => {
                Ok(CallOutcome::Failed { error: message })
            }
            Err(GateError::Operation(e)) => Ok(CallOutcome::Failed {
                error: e.to_string(),
            }),
        }
    }
}

/// Builder for constructing an Agent
pub struct AgentBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tools: ToolRegistry,
    gate: Option<GateContext>,
    config: AgentConfig,
}

impl AgentBuilder {
    /// Create a new agent builder
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            gate: None,
            config: AgentConfig::default(),
        }
    }

    /// Set the LLM provider
    pub fn provider<P: LLMProvider + 'static>(self, provider: P) -> Self {
        self.provider_arc(Arc::new(provider))
    }

    /// Set a shared or boxed LLM provider
    pub fn provider_arc(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    /// Set the approval context
    pub fn gate(mut self, gate: GateContext) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Set the agent configuration
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Set max iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Set system message
    pub fn system_message<S: Into<String>>(mut self, msg: S) -> Self {
        self.config.system_message = Some(msg.into());
        self
    }

    /// Build the agent
    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentRuntimeError::config("LLM provider not set"))?;
        let gate = self
            .gate
            .ok_or_else(|| AgentRuntimeError::config("Approval gate not set"))?;
        if self.config.max_iterations == 0 {
            return Err(AgentRuntimeError::config("max_iterations must be at least 1"));
        }

        for operation in gate.policy().gated_operations() {
            if !self.tools.has_tool(operation) {
                tracing::warn!("Policy gates '{}' but no such tool is registered", operation);
            }
        }

        Ok(Agent {
            provider,
            tools: self.tools,
            gate,
            config: self.config,
        })
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gate_approval::{MockChannel, OperationPolicy};
    use gate_llm::OpenAIProvider;

    fn context() -> GateContext {
        GateContext::builder()
            .operation("make_company_purchase", OperationPolicy::threshold("cost", 500.0))
            .channel(MockChannel::always_approve())
            .build()
            .unwrap()
    }

    #[test]
    fn test_agent_config_default() {
        let config = AgentConfig::default();
        assert_eq!(config.max_iterations, 5);
        assert!(config.system_message.is_some());
    }

    #[test]
    fn test_config_from_settings_drops_blank_system() {
        let settings = AgentSettings {
            system_message: "   ".to_string(),
            ..Default::default()
        };
        assert!(AgentConfig::from(&settings).system_message.is_none());
    }

    #[test]
    fn test_agent_builder() {
        let agent = Agent::builder()
            .provider(OpenAIProvider::new("test-key", "gpt-4o").unwrap())
            .gate(context())
            .max_iterations(8)
            .system_message("Test agent")
            .build()
            .unwrap();

        assert_eq!(agent.config().max_iterations, 8);
        assert_eq!(agent.config().system_message.as_deref(), Some("Test agent"));
        assert!(agent.gate().is_gated("make_company_purchase"));
    }

    #[test]
    fn test_builder_missing_parts() {
        let missing_provider = Agent::builder().gate(context()).build();
        assert!(matches!(missing_provider, Err(AgentRuntimeError::Configuration(_))));

        let missing_gate = Agent::builder()
            .provider(OpenAIProvider::new("test-key", "gpt-4o").unwrap())
            .build();
        assert!(matches!(missing_gate, Err(AgentRuntimeError::Configuration(_))));

        let zero = Agent::builder()
            .provider(OpenAIProvider::new("test-key", "gpt-4o").unwrap())
            .gate(context())
            .max_iterations(0)
            .build();
        assert!(zero.is_err());
    }

    #[test]
    fn test_denial_content() {
        let rejected = CallOutcome::Denied {
            request_id: Uuid::new_v4(),
            reason: DenialReason::Rejected,
            comment: Some("Not in this quarter's budget".to_string()),
        };
        assert_eq!(
            rejected.content("purchase_luxury_item"),
            "❌ A human reviewer rejected purchase_luxury_item: Not in this quarter's budget. The action was not performed."
        );

        let timed_out = CallOutcome::Denied {
            request_id: Uuid::new_v4(),
            reason: DenialReason::TimedOut,
            comment: None,
        };
        assert!(timed_out.content("purchase_luxury_item").starts_with("⏰"));
    }
}
