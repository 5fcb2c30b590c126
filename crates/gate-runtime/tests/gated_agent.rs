//! Agent runs against a scripted model and mock approval channels

use async_trait::async_trait;
use gate_approval::{
    CancellationToken, Clearance, DenialReason, GateContext, MockChannel, OperationPolicy,
};
use gate_llm::{LLMError, LLMProvider, Message, MessageRole, Response};
use gate_runtime::{Agent, AgentRuntimeError, CallOutcome};
use gate_tools::office::{office_registry, OfficeLedger};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replays canned chat-completion responses and records every request
#[derive(Clone, Default)]
struct ScriptedProvider {
    responses: Arc<Mutex<VecDeque<Value>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
    repeat_last: bool,
}

impl ScriptedProvider {
    fn new(responses: Vec<Value>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Default::default()
        }
    }

    /// Keeps answering with the final response forever
    fn repeating(response: Value) -> Self {
        Self {
            repeat_last: true,
            ..Self::new(vec![response])
        }
    }

    fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    /// Last message of the most recent request
    fn last_sent(&self) -> Message {
        self.requests().last().unwrap().last().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn send_message(&self, _messages: Vec<Message>) -> gate_llm::Result<Response> {
        Err(LLMError::api_error("plain completions are not scripted"))
    }

    async fn send_message_with_tools(
        &self,
        messages: Vec<Message>,
        _tools: Vec<Value>,
    ) -> gate_llm::Result<Value> {
        self.requests.lock().unwrap().push(messages);
        let mut responses = self.responses.lock().unwrap();
        let next = if self.repeat_last && responses.len() == 1 {
            responses.front().cloned()
        } else {
            responses.pop_front()
        };
        next.ok_or_else(|| LLMError::api_error("script exhausted"))
    }

    fn model(&self) -> &str {
        "scripted"
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn tool_call(id: &str, name: &str, arguments: Value) -> Value {
    json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": id,
                    "type": "function",
                    "function": {"name": name, "arguments": arguments.to_string()}
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": {"prompt_tokens": 100, "completion_tokens": 20, "total_tokens": 120}
    })
}

fn answer(text: &str) -> Value {
    json!({
        "choices": [{
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 150, "completion_tokens": 30, "total_tokens": 180}
    })
}

fn office_gate(channel: MockChannel) -> GateContext {
    GateContext::builder()
        .channel(channel)
        .default_timeout(Duration::from_secs(60))
        .operation("purchase_basic_item", OperationPolicy::always_require())
        .operation("purchase_luxury_item", OperationPolicy::always_require())
        .operation("make_company_purchase", OperationPolicy::threshold("cost", 500.0))
        .build()
        .unwrap()
}

fn agent(provider: &ScriptedProvider, ledger: &OfficeLedger, channel: MockChannel) -> Agent {
    Agent::builder()
        .provider(provider.clone())
        .tools(office_registry(ledger).unwrap())
        .gate(office_gate(channel))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_ungated_tool_runs_without_review() {
    let provider = ScriptedProvider::new(vec![
        tool_call("call_1", "get_budget", json!({})),
        answer("You have $5000.00 left this month."),
    ]);
    let channel = MockChannel::always_reject("should not be asked");
    let agent = agent(&provider, &OfficeLedger::demo(), channel.clone());

    let reply = agent.run("Check our current budget status").await.unwrap();

    assert_eq!(reply.content, "You have $5000.00 left this month.");
    assert_eq!(reply.iterations, 2);
    assert_eq!(reply.usage.total_tokens, 300);
    assert_eq!(channel.call_count(), 0);
    assert!(matches!(
        reply.tool_calls[0].outcome,
        CallOutcome::Completed { clearance: None, .. }
    ));

    let requests = provider.requests();
    assert_eq!(requests[0][0].role, MessageRole::System);
    let second = &requests[1];
    let assistant = &second[second.len() - 2];
    assert_eq!(assistant.tool_calls.as_ref().unwrap()[0]["function"]["name"], "get_budget");
    let tool_message = provider.last_sent();
    assert_eq!(tool_message.role, MessageRole::Tool);
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
    assert!(tool_message.content.starts_with("💰 Budget Status: $5000.00"));
}

#[tokio::test]
async fn test_approved_purchase_runs() {
    let provider = ScriptedProvider::new(vec![
        tool_call("call_1", "purchase_basic_item", json!({"item": "paper clips", "quantity": 50})),
        answer("Ordered 50 paper clips."),
    ]);
    let ledger = OfficeLedger::demo();
    let channel = MockChannel::always_approve();
    let agent = agent(&provider, &ledger, channel.clone());

    let reply = agent.run("Order 50 paper clips for the team").await.unwrap();

    assert_eq!(channel.call_count(), 1);
    let request = channel.last_request().unwrap();
    assert_eq!(request.operation(), "purchase_basic_item");
    assert_eq!(request.argument("quantity"), Some(&json!(50)));

    assert!(reply.tool_calls[0].was_reviewed());
    assert_eq!(ledger.lookup("paper clips").unwrap().1.stock, 450);
    assert!(provider.last_sent().content.starts_with("✅ Successfully purchased 50x Paper Clips"));
}

#[tokio::test]
async fn test_rejection_is_reported_to_the_model() {
    let provider = ScriptedProvider::new(vec![
        tool_call(
            "call_1",
            "purchase_luxury_item",
            json!({
                "item": "massage chairs",
                "price": 4800.0,
                "vendor": "LuxSeats",
                "justification": "The team deserves luxury"
            }),
        ),
        answer("The purchase was rejected by a human reviewer."),
    ]);
    let ledger = OfficeLedger::demo();
    let agent = agent(&provider, &ledger, MockChannel::always_reject("Way over budget"));

    let reply = agent
        .run("The team deserves luxury. Get us the most premium office equipment money can buy.")
        .await
        .unwrap();

    assert_eq!(reply.denied_calls().count(), 1);
    match &reply.tool_calls[0].outcome {
        CallOutcome::Denied { reason, comment, .. } => {
            assert_eq!(*reason, DenialReason::Rejected);
            assert_eq!(comment.as_deref(), Some("Way over budget"));
        }
        other => panic!("expected denial, got {:?}", other),
    }
    assert_eq!(ledger.budget().remaining, 5000.0);

    let feedback = provider.last_sent();
    assert_eq!(feedback.role, MessageRole::Tool);
    assert!(feedback.content.contains("rejected purchase_luxury_item: Way over budget"));
}

#[tokio::test]
async fn test_threshold_purchases() {
    let provider = ScriptedProvider::new(vec![
        tool_call(
            "call_1",
            "make_company_purchase",
            json!({"item": "Office chairs", "cost": 150, "justification": "Basic seating upgrade"}),
        ),
        tool_call(
            "call_2",
            "make_company_purchase",
            json!({"item": "Tesla Model S", "cost": 89000, "justification": "Company vehicle"}),
        ),
        answer("Chairs bought; the car was blocked."),
    ]);
    let channel = MockChannel::always_reject("No cars");
    let agent = agent(&provider, &OfficeLedger::demo(), channel.clone());

    let reply = agent.run("Upgrade the office").await.unwrap();

    assert_eq!(reply.tool_calls.len(), 2);
    assert!(matches!(
        reply.tool_calls[0].outcome,
        CallOutcome::Completed {
            clearance: Some(Clearance::AutoApproved),
            ..
        }
    ));
    assert!(reply.tool_calls[1].is_denied());
    assert_eq!(channel.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_silence_times_out() {
    let provider = ScriptedProvider::new(vec![
        tool_call("call_1", "purchase_basic_item", json!({"item": "pens", "quantity": 10})),
        answer("Nobody answered the approval request."),
    ]);
    let ledger = OfficeLedger::demo();
    let agent = agent(&provider, &ledger, MockChannel::silent());

    let reply = agent.run("Order pens").await.unwrap();

    match &reply.tool_calls[0].outcome {
        CallOutcome::Denied { reason, .. } => assert_eq!(*reason, DenialReason::TimedOut),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(ledger.lookup("pens").unwrap().1.stock, 200);
    assert!(provider.last_sent().content.starts_with("⏰ Approval for purchase_basic_item timed out"));
}

#[tokio::test]
async fn test_unavailable_channel_aborts_the_run() {
    let provider = ScriptedProvider::new(vec![
        tool_call("call_1", "purchase_basic_item", json!({"item": "pens", "quantity": 10})),
        answer("unreachable"),
    ]);
    let ledger = OfficeLedger::demo();
    let agent = agent(&provider, &ledger, MockChannel::unavailable("webhook returned 503"));

    let err = agent.run("Order pens").await.unwrap_err();

    match err {
        AgentRuntimeError::ChannelUnavailable { tool, reason, .. } => {
            assert_eq!(tool, "purchase_basic_item");
            assert!(reason.contains("503"));
        }
        other => panic!("expected channel failure, got {:?}", other),
    }
    assert_eq!(ledger.lookup("pens").unwrap().1.stock, 200);
    assert_eq!(agent.gate().broker().pending_count(), 0);
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_while_waiting_abandons_request() {
    let provider = ScriptedProvider::new(vec![
        tool_call("call_1", "purchase_basic_item", json!({"item": "pens", "quantity": 10})),
        answer("unreachable"),
    ]);
    let agent = agent(&provider, &OfficeLedger::demo(), MockChannel::silent());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        trigger.cancel();
    });

    let err = agent.run_with_cancel("Order pens", &cancel).await.unwrap_err();
    assert!(matches!(err, AgentRuntimeError::Cancelled));
    assert_eq!(agent.gate().broker().pending_count(), 0);
}

#[tokio::test]
async fn test_unknown_tool_is_reported_not_fatal() {
    let provider = ScriptedProvider::new(vec![
        tool_call("call_1", "purchase_yacht", json!({"length_ft": 80})),
        answer("I can't buy yachts."),
    ]);
    let agent = agent(&provider, &OfficeLedger::demo(), MockChannel::always_approve());

    let reply = agent.run("Spare no expense!").await.unwrap();

    assert!(matches!(reply.tool_calls[0].outcome, CallOutcome::Failed { .. }));
    assert_eq!(
        provider.last_sent().content,
        "Tool 'purchase_yacht' failed: Tool not found: purchase_yacht"
    );
}

#[tokio::test]
async fn test_iteration_limit() {
    let provider = ScriptedProvider::repeating(tool_call("call_1", "get_budget", json!({})));
    let agent = Agent::builder()
        .provider(provider.clone())
        .tools(office_registry(&OfficeLedger::demo()).unwrap())
        .gate(office_gate(MockChannel::always_approve()))
        .max_iterations(3)
        .build()
        .unwrap();

    let err = agent.run("Check the budget forever").await.unwrap_err();
    assert!(matches!(err, AgentRuntimeError::MaxIterationsExceeded(3)));
    assert_eq!(provider.requests().len(), 3);
}
