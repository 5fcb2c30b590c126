//! The office-supply demos

use anyhow::{bail, Context};
use gate_approval::{
    CancellationToken, Clearance, DecisionOutcome, DenialReason, Gate, GateContext, GateError,
};
use gate_runtime::{Agent, AgentConfig, AgentReply, AgentRuntimeError, ToolOperation};
use gate_tools::office::{
    office_registry, title_case, usd, usd_grouped, MakeCompanyPurchaseTool, OfficeLedger,
    MAKE_COMPANY_PURCHASE,
};
use gate_tools::Tool;
use serde_json::json;
use std::sync::Arc;

use crate::cli::ScenarioKind;
use crate::settings::GatekeepConfig;

/// The reel's escalating purchases: item, cost, justification
const REEL_PURCHASES: [(&str, f64, &str); 5] = [
    ("Office chairs", 150.0, "Basic seating upgrade"),
    ("Coffee machine", 800.0, "Team productivity boost"),
    ("Gaming setup", 3500.0, "Enhanced developer experience"),
    ("Tesla Model S", 89000.0, "Company vehicle for client meetings"),
    ("Private jet", 2_000_000.0, "Faster travel to meetings"),
];

fn rule() -> String {
    "=".repeat(60)
}

pub fn gate_context(config: &GatekeepConfig) -> anyhow::Result<GateContext> {
    config
        .approval
        .0
        .build_context()
        .context("Invalid [approval] configuration")
}

fn build_agent(config: &GatekeepConfig, ledger: &OfficeLedger) -> anyhow::Result<Agent> {
    let inference = &config.app.inference;
    let provider = gate_llm::create_provider(inference).with_context(|| {
        format!(
            "Cannot reach the {} backend; is {} set?",
            inference.provider, inference.api_key_env
        )
    })?;

    let agent = Agent::builder()
        .provider_arc(Arc::from(provider))
        .tools(office_registry(ledger)?)
        .gate(gate_context(config)?)
        .config(AgentConfig::from(&config.app.agent))
        .build()?;

    tracing::info!(
        "{} ready: {} via {} ({} gated tools)",
        config.app.agent.name,
        inference.model,
        inference.base_url,
        agent.gate().policy().gated_operations().len()
    );
    Ok(agent)
}

fn print_reply(reply: &AgentReply) {
    println!("🤖 Result: {}", reply.content);
    for call in reply.denied_calls() {
        println!("   🛑 {} was not approved", call.name);
    }
}

/// One request to the agent
pub async fn run_prompt(
    config: &GatekeepConfig,
    prompt: &str,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let ledger = OfficeLedger::demo();
    let agent = build_agent(config, &ledger)?;

    println!("👤 Request: {}", prompt);
    let reply = agent.run_with_cancel(prompt, cancel).await?;
    print_reply(&reply);
    println!("💰 Remaining budget: {}", usd(ledger.budget().remaining));
    Ok(())
}

/// The three canned prompts of one scenario against a single ledger
pub async fn run_scenario(
    config: &GatekeepConfig,
    kind: ScenarioKind,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let ledger = OfficeLedger::demo();
    let agent = build_agent(config, &ledger)?;

    println!("\n{}\n{}\n{}", rule(), kind.title(), rule());
    println!("💰 Starting budget: {}", usd(ledger.budget().remaining));

    for prompt in kind.prompts() {
        println!("\n👤 Request: {}", prompt);
        match agent.run_with_cancel(prompt, cancel).await {
            Ok(reply) => print_reply(&reply),
            Err(AgentRuntimeError::Cancelled) => {
                println!("⏹️  Cancelled");
                break;
            }
            Err(e @ AgentRuntimeError::ChannelUnavailable { .. }) => return Err(e.into()),
            Err(e) => println!("❌ Error: {}", e),
        }
    }

    println!("\n💰 Remaining budget: {}", usd(ledger.budget().remaining));
    Ok(())
}

/// Scripted purchases of rising cost straight through the gate
pub async fn run_reel(config: &GatekeepConfig, cancel: &CancellationToken) -> anyhow::Result<()> {
    let context = gate_context(config)?;
    if !context.is_gated(MAKE_COMPANY_PURCHASE) {
        bail!("{} is not gated in this configuration", MAKE_COMPANY_PURCHASE);
    }

    let tool: Arc<dyn Tool> = Arc::new(MakeCompanyPurchaseTool::new(OfficeLedger::demo()));
    let gate = Gate::new(ToolOperation::new(tool), context.clone());

    println!("\n{}\n📱 AI Agent vs Human Oversight\n{}", rule(), rule());
    println!("🤖 AI Assistant: Starting office supply run...\n");

    for (item, cost, justification) in REEL_PURCHASES {
        println!("🛒 Attempting to buy: {} ({})", item, usd_grouped(cost));

        let input = json!({"item": item, "cost": cost, "justification": justification});
        match gate.invoke_with_clearance(input, cancel).await {
            Ok((result, Clearance::AutoApproved)) => {
                println!("   ✅ Approved automatically - {}", result.to_content());
            }
            Ok((result, Clearance::Approved { comment, .. })) => {
                println!("   ✅ APPROVED by a human - {}", result.to_content());
                if let Some(comment) = comment {
                    println!("   💬 {}", comment);
                }
            }
            Err(GateError::ApprovalDenied {
                reason: DenialReason::Rejected,
                comment,
                ..
            }) => {
                println!("   🚨 BLOCKED - Human intervention saved the day!");
                if let Some(comment) = comment {
                    println!("   💬 {}", comment);
                }
            }
            Err(GateError::ApprovalDenied {
                reason: DenialReason::TimedOut,
                ..
            }) => println!("   ⏰ No decision in time - purchase blocked"),
            Err(GateError::Cancelled(_)) => {
                println!("   ⏹️  Cancelled");
                break;
            }
            Err(e @ GateError::NotificationChannelUnavailable { .. }) => return Err(e.into()),
            Err(e) => println!("   ❌ {}", e),
        }
        println!();
    }

    let audit = context.audit();
    println!(
        "📋 Reviewed {} purchases: {} approved, {} rejected, {} timed out",
        audit.count(),
        audit.count_outcome(DecisionOutcome::Approved),
        audit.count_outcome(DecisionOutcome::Rejected),
        audit.count_outcome(DecisionOutcome::TimedOut)
    );
    println!("💡 AI agents need human oversight for high-stakes decisions");
    Ok(())
}

/// Print the gated tools with their channel, timeout and rules
pub fn show_policy(config: &GatekeepConfig) -> anyhow::Result<()> {
    let context = gate_context(config)?;
    let policy = context.policy();

    println!("Default channel: {}", context.default_channel());
    println!("Default timeout: {}s\n", context.default_timeout().as_secs());

    for name in policy.gated_operations() {
        println!(
            "🔒 {} (channel: {}, timeout: {}s)",
            title_case(&name.replace('_', " ")),
            context.channel_for(name),
            context.timeout_for(name).as_secs()
        );
        let rules = policy
            .operation(name)
            .map(|op| op.rules.as_slice())
            .unwrap_or_default();
        if rules.is_empty() {
            println!("   every call requires approval");
        }
        for policy_rule in rules {
            println!(
                "   {} -> {}",
                serde_json::to_string(&policy_rule.when)?,
                serde_json::to_string(&policy_rule.then)?
            );
        }
    }
    Ok(())
}
