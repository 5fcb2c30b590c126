//! Basic completion example
//!
//! Sends one prompt to the configured inference backend.
//!
//! Run with:
//! ```bash
//! BASETEN_API_KEY=your-key cargo run -p gate-llm --example basic_completion
//! OPENAI_API_KEY=your-key cargo run -p gate-llm --example basic_completion -- openai
//! ```

use gate_core::InferenceConfig;
use gate_llm::{create_provider, openai::OPENAI_API_BASE, Conversation};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let provider_name = env::args().nth(1).unwrap_or_else(|| "baseten".to_string());

    let mut config = InferenceConfig::default();
    if provider_name == "openai" {
        config.provider = "openai".to_string();
        config.base_url = OPENAI_API_BASE.to_string();
        config.model = "gpt-4o-mini".to_string();
        config.api_key_env = "OPENAI_API_KEY".to_string();
    }

    println!("🤖 Basic Completion");
    println!("Provider: {} ({})\n", config.provider, config.model);

    let provider = create_provider(&config)?;

    let conversation = Conversation::builder()
        .system("You are a helpful office assistant. Answer in one sentence.")
        .user("What office supplies does a small team need most?")
        .build();

    let response = provider.send_message(conversation.messages().to_vec()).await?;
    println!("{}", response.content);

    if let Some(usage) = response.usage {
        println!(
            "\nTokens: {} prompt + {} completion = {}",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        );
    }

    Ok(())
}
