//! Inference backend
//!
//! Chat-completion client for OpenAI-compatible endpoints (OpenAI, Baseten)
//! with tool descriptors and retry on rate limits and server errors.
//!
//! # Example
//!
//! ```no_run
//! use gate_llm::{OpenAIProvider, LLMProvider, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = OpenAIProvider::new("your-api-key", "deepseek-ai/DeepSeek-V3.1")?
//!         .with_base_url(gate_llm::openai::BASETEN_API_BASE)
//!         .with_temperature(0.1);
//!
//!     let messages = vec![Message::user("Check our current budget status")];
//!
//!     let response = provider.send_message(messages).await?;
//!     println!("Response: {}", response.content);
//!
//!     Ok(())
//! }
//! ```

pub mod conversation;
pub mod error;
pub mod openai;
pub mod provider;
pub mod types;

// Re-exports
pub use conversation::Conversation;
pub use error::{LLMError, Result};
pub use openai::OpenAIProvider;
pub use provider::LLMProvider;
pub use types::{Message, MessageRole, Response, TokenUsage};

use gate_core::InferenceConfig;

/// Create a provider from the `[inference]` config section
///
/// `openai` and `baseten` both speak the OpenAI wire format; the section's
/// `base_url` decides where requests go.
pub fn create_provider(config: &InferenceConfig) -> Result<Box<dyn LLMProvider>> {
    match config.provider.to_lowercase().as_str() {
        "openai" | "baseten" => Ok(Box::new(OpenAIProvider::from_config(config)?)),
        _ => Err(LLMError::UnsupportedProvider(config.provider.clone())),
    }
}
