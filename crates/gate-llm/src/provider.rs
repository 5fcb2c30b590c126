//! LLM provider trait definition

use async_trait::async_trait;
use serde_json::Value;

use crate::{Message, Response, Result};

/// Trait for chat-completion backends
///
/// The agent loop only needs these two calls, so tests can swap in a
/// scripted provider without any network.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send a conversation and wait for the complete response
    ///
    /// # Example
    /// ```no_run
    /// use gate_llm::{LLMProvider, Message};
    ///
    /// async fn example(provider: &dyn LLMProvider) -> Result<(), Box<dyn std::error::Error>> {
    ///     let messages = vec![Message::user("Check our current budget status")];
    ///     let response = provider.send_message(messages).await?;
    ///     println!("{}", response.content);
    ///     Ok(())
    /// }
    /// ```
    async fn send_message(&self, messages: Vec<Message>) -> Result<Response>;

    /// Send a conversation with tool descriptors and get the raw JSON response
    ///
    /// The response may contain `choices[0].message.tool_calls`.
    async fn send_message_with_tools(
        &self,
        messages: Vec<Message>,
        tools: Vec<Value>,
    ) -> Result<Value>;

    /// Model identifier
    fn model(&self) -> &str;

    /// Provider name
    fn name(&self) -> &str;
}
