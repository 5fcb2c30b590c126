//! Agent runtime
//!
//! Runs the tool-calling loop: send the conversation and tool descriptors
//! to the model, parse the tool calls it asks for, and execute each one.
//! Calls to tools the approval policy names are wrapped in a
//! [`Gate`](gate_approval::Gate) and wait for a human decision first.
//!
//! # Example
//!
//! ```no_run
//! use gate_approval::{ConsoleChannel, GateContext, OperationPolicy};
//! use gate_llm::OpenAIProvider;
//! use gate_runtime::Agent;
//! use gate_tools::office::{office_registry, OfficeLedger};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = OpenAIProvider::new("api-key", "deepseek-ai/DeepSeek-V3.1")?
//!         .with_base_url(gate_llm::openai::BASETEN_API_BASE);
//!
//!     let gate = GateContext::builder()
//!         .operation("purchase_basic_item", OperationPolicy::always_require())
//!         .channel(ConsoleChannel::new())
//!         .build()?;
//!
//!     let agent = Agent::builder()
//!         .provider(provider)
//!         .tools(office_registry(&OfficeLedger::demo())?)
//!         .gate(gate)
//!         .build()?;
//!
//!     let reply = agent.run("Order 50 paper clips for the team").await?;
//!     println!("{}", reply.content);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod error;
pub mod operation;
pub mod parser;

// Re-exports
pub use agent::{Agent, AgentBuilder, AgentConfig, AgentReply, CallOutcome, ToolCallRecord};
pub use error::{AgentRuntimeError, Result};
pub use operation::ToolOperation;
pub use parser::ToolCall;
