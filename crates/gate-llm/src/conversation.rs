//! Conversation history for multi-turn tool use

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{Message, MessageRole};

/// A conversation consisting of multiple messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier for this conversation
    pub id: String,

    /// Messages in this conversation
    messages: Vec<Message>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When this conversation was last updated
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a conversation that starts with a system message
    pub fn with_system(content: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.add_system(content);
        conversation
    }

    /// Create a builder for fluent conversation construction
    pub fn builder() -> ConversationBuilder {
        ConversationBuilder::new()
    }

    /// Add a message to the conversation
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Add a system message
    pub fn add_system(&mut self, content: impl Into<String>) {
        self.add_message(Message::system(content));
    }

    /// Add a user message
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.add_message(Message::user(content));
    }

    /// Add an assistant message
    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.add_message(Message::assistant(content));
    }

    /// Add the assistant turn that requested tool calls
    pub fn add_assistant_tool_calls(&mut self, content: impl Into<String>, tool_calls: Vec<Value>) {
        self.add_message(Message::assistant_tool_calls(content, tool_calls));
    }

    /// Add the result of one tool call
    pub fn add_tool_result(&mut self, tool_call_id: impl Into<String>, content: impl Into<String>) {
        self.add_message(Message::tool(tool_call_id, content));
    }

    /// Get all messages in the conversation
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get the number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if conversation is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get the last message
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Get the system message if it exists
    pub fn system_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.role == MessageRole::System)
    }

    /// Messages with a given role
    pub fn by_role(&self, role: MessageRole) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| m.role == role)
    }

    /// Drop everything except the system message
    pub fn reset(&mut self) {
        self.messages.retain(|m| m.role == MessageRole::System);
        self.updated_at = Utc::now();
    }

    /// Approximate token count (characters / 4 plus per-message overhead)
    pub fn estimate_tokens(&self) -> usize {
        self.messages.iter().map(estimate_message_tokens).sum()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating conversations fluently
pub struct ConversationBuilder {
    conversation: Conversation,
}

impl ConversationBuilder {
    /// Create a new conversation builder
    pub fn new() -> Self {
        Self {
            conversation: Conversation::new(),
        }
    }

    /// Set a specific ID
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.conversation.id = id.into();
        self
    }

    /// Add a system message
    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.conversation.add_system(content);
        self
    }

    /// Add a user message
    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.conversation.add_user(content);
        self
    }

    /// Add an assistant message
    pub fn assistant(mut self, content: impl Into<String>) -> Self {
        self.conversation.add_assistant(content);
        self
    }

    /// Build the conversation
    pub fn build(self) -> Conversation {
        self.conversation
    }
}

impl Default for ConversationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Estimate tokens for a single message
pub fn estimate_message_tokens(message: &Message) -> usize {
    let content_tokens = message.content.chars().count() / 4;
    let call_tokens = message
        .tool_calls
        .as_ref()
        .map(|calls| calls.iter().map(|c| c.to_string().len() / 4).sum())
        .unwrap_or(0);
    content_tokens + call_tokens + 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conversation_creation() {
        let conv = Conversation::new();
        assert!(conv.is_empty());
        assert!(!conv.id.is_empty());
    }

    #[test]
    fn test_conversation_builder() {
        let conv = Conversation::builder()
            .system("You are an office assistant")
            .user("Check our current budget status")
            .assistant("Let me look.")
            .build();

        assert_eq!(conv.len(), 3);
        assert_eq!(conv.messages()[0].role, MessageRole::System);
        assert_eq!(conv.messages()[2].role, MessageRole::Assistant);
    }

    #[test]
    fn test_tool_round() {
        let mut conv = Conversation::with_system("You are an office assistant");
        conv.add_user("Order 50 paper clips");
        conv.add_assistant_tool_calls(
            "",
            vec![json!({
                "id": "call_1",
                "type": "function",
                "function": {"name": "purchase_basic_item", "arguments": "{\"item\":\"paper clips\",\"quantity\":50}"}
            })],
        );
        conv.add_tool_result("call_1", "Purchased 50 paper clips");

        assert_eq!(conv.len(), 4);
        assert_eq!(conv.by_role(MessageRole::Tool).count(), 1);
        assert_eq!(
            conv.last_message().unwrap().tool_call_id.as_deref(),
            Some("call_1")
        );
        assert!(conv.estimate_tokens() > 0);
    }

    #[test]
    fn test_reset_keeps_system() {
        let mut conv = Conversation::builder()
            .system("Be helpful")
            .user("Hello")
            .assistant("Hi")
            .build();

        conv.reset();
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.system_message().unwrap().content, "Be helpful");
    }

    #[test]
    fn test_serialization() {
        let conv = Conversation::builder()
            .id("test-123")
            .system("System")
            .user("Hello")
            .build();

        let json = serde_json::to_string(&conv).unwrap();
        let deserialized: Conversation = serde_json::from_str(&json).unwrap();

        assert_eq!(conv.id, deserialized.id);
        assert_eq!(conv.len(), deserialized.len());
    }
}
