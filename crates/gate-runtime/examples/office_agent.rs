//! Office agent with console approvals
//!
//! Purchases wait for a y/n answer on the terminal.
//!
//! Run with:
//! ```bash
//! export BASETEN_API_KEY=your-key
//! cargo run -p gate-runtime --example office_agent -- "Order 50 paper clips for the team"
//! ```

use gate_approval::{ConsoleChannel, GateContext, OperationPolicy};
use gate_core::{config::LoggingConfig, init_logging, InferenceConfig};
use gate_runtime::Agent;
use gate_tools::office::{office_registry, OfficeLedger, SPENDING_TOOLS};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&LoggingConfig {
        level: "info".to_string(),
        json: false,
    });

    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Check our current budget status".to_string());

    let provider = gate_llm::create_provider(&InferenceConfig::default())?;

    let mut gate = GateContext::builder().channel(ConsoleChannel::new());
    for tool in SPENDING_TOOLS {
        gate = gate.operation(tool, OperationPolicy::always_require());
    }

    let ledger = OfficeLedger::demo();
    let agent = Agent::builder()
        .provider_arc(Arc::from(provider))
        .tools(office_registry(&ledger)?)
        .gate(gate.build()?)
        .build()?;

    println!("👤 Request: {}", prompt);
    let reply = agent.run(&prompt).await?;
    println!("🤖 Result: {}", reply.content);
    println!("💰 Remaining budget: ${:.2}", ledger.budget().remaining);

    Ok(())
}
