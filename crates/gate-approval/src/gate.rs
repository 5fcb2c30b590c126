//! The approval gate
//!
//! [`Gate`] wraps an [`Operation`]. On every invocation it serialises the
//! input into an argument map and asks the [`Policy`] for a verdict.
//! Auto-approved calls run immediately and never create a request.
//! Otherwise an [`ApprovalRequest`] goes out through the operation's
//! notification channel and the call suspends until a decision arrives,
//! the timeout elapses or the caller cancels. The operation runs iff the
//! decision is Approved.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::audit::ApprovalAudit;
use crate::broker::{DecisionBroker, WaitOutcome};
use crate::channel::{ChannelRegistry, NotificationChannel};
use crate::error::{ApprovalError, ApprovalFailure, DenialReason, GateError, GateResult, Result};
use crate::policy::{OperationPolicy, Policy, Verdict};
use crate::request::{ApprovalDecision, ApprovalRequest, Arguments, DecisionOutcome};

/// Timeout used when neither the operation nor the context sets one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A callable that can be placed behind a [`Gate`]
#[async_trait]
pub trait Operation: Send + Sync {
    /// Call input; serialised into the request's argument map
    type Input: Serialize + Send + Sync + 'static;
    /// Call output
    type Output: Send + 'static;
    /// The operation's own error, propagated unchanged
    type Error: std::error::Error + Send + Sync + 'static;

    /// Operation name (the policy key)
    fn name(&self) -> &str;

    /// Human-readable summary for reviewers
    fn summarize(&self, arguments: &Arguments) -> String {
        default_summary(self.name(), arguments)
    }

    /// Run the operation
    async fn call(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error>;
}

/// `name(key=value, ...)`
pub fn default_summary(name: &str, arguments: &Arguments) -> String {
    let args: Vec<String> = arguments
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{}={}", key, s),
            other => format!("{}={}", key, other),
        })
        .collect();
    format!("{}({})", name, args.join(", "))
}

type BoxedFn<I, O, E> = Box<dyn Fn(I) -> BoxFuture<'static, std::result::Result<O, E>> + Send + Sync>;
type SummaryFn = Box<dyn Fn(&Arguments) -> String + Send + Sync>;

/// [`Operation`] built from an async closure
pub struct FnOperation<I, O, E> {
    name: String,
    f: BoxedFn<I, O, E>,
    summary: Option<SummaryFn>,
}

impl<I, O, E> FnOperation<I, O, E> {
    /// Wrap an async closure under an operation name
    pub fn new<N, F, Fut>(name: N, f: F) -> Self
    where
        N: Into<String>,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<O, E>> + Send + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(move |input| -> BoxFuture<'static, std::result::Result<O, E>> {
                Box::pin(f(input))
            }),
            summary: None,
        }
    }

    /// Custom reviewer summary
    pub fn with_summary<S>(mut self, summary: S) -> Self
    where
        S: Fn(&Arguments) -> String + Send + Sync + 'static,
    {
        self.summary = Some(Box::new(summary));
        self
    }
}

#[async_trait]
impl<I, O, E> Operation for FnOperation<I, O, E>
where
    I: Serialize + Send + Sync + 'static,
    O: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Input = I;
    type Output = O;
    type Error = E;

    fn name(&self) -> &str {
        &self.name
    }

    fn summarize(&self, arguments: &Arguments) -> String {
        match &self.summary {
            Some(summary) => summary(arguments),
            None => default_summary(&self.name, arguments),
        }
    }

    async fn call(&self, input: I) -> std::result::Result<O, E> {
        (self.f)(input).await
    }
}

/// How a call was cleared to run
#[derive(Debug, Clone, PartialEq)]
pub enum Clearance {
    /// Policy let the call through without a request
    AutoApproved,
    /// A reviewer approved the request
    Approved {
        /// Request id
        request_id: Uuid,
        /// Reviewer comment, if any
        comment: Option<String>,
    },
}

/// Shared approval machinery, built once at startup and injected into gates
#[derive(Clone)]
pub struct GateContext {
    policy: Arc<Policy>,
    channels: Arc<ChannelRegistry>,
    broker: DecisionBroker,
    audit: ApprovalAudit,
    default_channel: String,
    default_timeout: Duration,
}

impl GateContext {
    /// Start building a context
    pub fn builder() -> GateContextBuilder {
        GateContextBuilder::default()
    }

    /// Gating policy
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Notification channels
    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// Broker holding pending requests
    pub fn broker(&self) -> &DecisionBroker {
        &self.broker
    }

    /// Audit trail of decided requests
    pub fn audit(&self) -> &ApprovalAudit {
        &self.audit
    }

    /// Channel used when an operation has no override
    pub fn default_channel(&self) -> &str {
        &self.default_channel
    }

    /// Timeout used when an operation has no override
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Whether an operation is designated as gated
    pub fn is_gated(&self, operation: &str) -> bool {
        self.policy.is_gated(operation)
    }

    /// Policy verdict for a call
    pub fn evaluate(&self, operation: &str, arguments: &Arguments) -> Verdict {
        self.policy.evaluate(operation, arguments)
    }

    /// Effective channel name for an operation
    pub fn channel_for(&self, operation: &str) -> &str {
        self.policy
            .operation(operation)
            .and_then(|p| p.channel.as_deref())
            .unwrap_or(&self.default_channel)
    }

    /// Effective timeout for an operation
    pub fn timeout_for(&self, operation: &str) -> Duration {
        self.policy
            .operation(operation)
            .and_then(|p| p.timeout)
            .unwrap_or(self.default_timeout)
    }

    /// Submit a request and suspend until it is decided
    pub(crate) async fn await_approval(
        &self,
        operation: &str,
        arguments: Arguments,
        summary: String,
        cancel: &CancellationToken,
    ) -> std::result::Result<(Uuid, ApprovalDecision), ApprovalFailure> {
        let channel_name = self.channel_for(operation).to_string();
        let timeout = self.timeout_for(operation);
        let request = ApprovalRequest::new(operation, arguments, summary, timeout);
        let request_id = request.id();

        let channel: Arc<dyn NotificationChannel> =
            self.channels
                .get(&channel_name)
                .map_err(|e| ApprovalFailure::Unavailable {
                    channel: channel_name.clone(),
                    reason: e.to_string(),
                })?;

        tracing::info!(
            "Approval required for {}: {} (request_id: {}, channel: {}, timeout: {:?})",
            operation,
            request.summary(),
            request_id,
            channel_name,
            timeout
        );

        let handle = channel
            .submit(&request, &self.broker)
            .await
            .map_err(|e| {
                tracing::error!("Failed to submit approval request {}: {}", request_id, e);
                let reason = match e {
                    ApprovalError::ChannelUnavailable { reason, .. } => reason,
                    other => other.to_string(),
                };
                ApprovalFailure::Unavailable {
                    channel: channel_name.clone(),
                    reason,
                }
            })?;

        let started = tokio::time::Instant::now();
        let decision = match handle.wait(timeout, cancel).await {
            WaitOutcome::Decided(decision) => decision,
            WaitOutcome::Cancelled => {
                tracing::info!("Approval request {} abandoned by caller", request_id);
                return Err(ApprovalFailure::Cancelled(request_id));
            }
        };
        let waited_ms = started.elapsed().as_millis() as u64;

        self.audit
            .record(request, decision.clone(), &channel_name, waited_ms);

        let reason = match decision.outcome {
            DecisionOutcome::Approved => {
                tracing::info!("Human approved {} (request_id: {})", operation, request_id);
                return Ok((request_id, decision));
            }
            DecisionOutcome::Rejected => DenialReason::Rejected,
            DecisionOutcome::TimedOut => DenialReason::TimedOut,
        };

        tracing::warn!(
            "Approval denied for {} (request_id: {}, reason: {})",
            operation,
            request_id,
            reason
        );

        Err(ApprovalFailure::Denied {
            request_id,
            operation: operation.to_string(),
            reason,
            comment: decision.comment,
        })
    }
}

impl std::fmt::Debug for GateContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateContext")
            .field("gated", &self.policy.gated_operations())
            .field("channels", &self.channels.names())
            .field("default_channel", &self.default_channel)
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

/// Builder for [`GateContext`]
#[derive(Default)]
pub struct GateContextBuilder {
    policy: Policy,
    channels: ChannelRegistry,
    broker: Option<DecisionBroker>,
    audit: Option<ApprovalAudit>,
    default_channel: Option<String>,
    default_timeout: Option<Duration>,
}

impl GateContextBuilder {
    /// Replace the whole policy
    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Gate one operation
    pub fn operation<S: Into<String>>(mut self, name: S, policy: OperationPolicy) -> Self {
        self.policy = self.policy.with_operation(name, policy);
        self
    }

    /// Register a notification channel
    pub fn channel<C: NotificationChannel + 'static>(mut self, channel: C) -> Self {
        self.channels.register(channel);
        self
    }

    /// Register a shared notification channel
    pub fn channel_arc(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channels.register_arc(channel);
        self
    }

    /// Channel used when an operation has no override
    pub fn default_channel<S: Into<String>>(mut self, name: S) -> Self {
        self.default_channel = Some(name.into());
        self
    }

    /// Timeout used when an operation has no override
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Share an existing broker (e.g. with a webhook handler)
    pub fn broker(mut self, broker: DecisionBroker) -> Self {
        self.broker = Some(broker);
        self
    }

    /// Share an existing audit trail
    pub fn audit(mut self, audit: ApprovalAudit) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Build the context
    ///
    /// # Errors
    /// `InvalidConfig` when no channel is registered, or when the default
    /// channel or an operation's override names an unregistered channel.
    pub fn build(self) -> Result<GateContext> {
        let default_channel = match self.default_channel {
            Some(name) => name,
            None => match self.channels.names().as_slice() {
                [only] => only.clone(),
                [] => return Err(ApprovalError::config("no notification channel registered")),
                _ => {
                    return Err(ApprovalError::config(
                        "default channel must be set when several channels are registered",
                    ))
                }
            },
        };

        if !self.channels.contains(&default_channel) {
            return Err(ApprovalError::config(format!(
                "default channel '{}' is not registered",
                default_channel
            )));
        }

        for name in self.policy.gated_operations() {
            if let Some(channel) = self.policy.operation(name).and_then(|p| p.channel.as_deref()) {
                if !self.channels.contains(channel) {
                    return Err(ApprovalError::config(format!(
                        "operation '{}' routes to unregistered channel '{}'",
                        name, channel
                    )));
                }
            }
        }

        Ok(GateContext {
            policy: Arc::new(self.policy),
            channels: Arc::new(self.channels),
            broker: self.broker.unwrap_or_default(),
            audit: self.audit.unwrap_or_default(),
            default_channel,
            default_timeout: self.default_timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

/// An operation behind human approval
pub struct Gate<Op: Operation> {
    operation: Op,
    context: GateContext,
}

impl<Op: Operation> Gate<Op> {
    /// Wrap an operation
    pub fn new(operation: Op, context: GateContext) -> Self {
        Self { operation, context }
    }

    /// The wrapped operation
    pub fn operation(&self) -> &Op {
        &self.operation
    }

    /// The injected context
    pub fn context(&self) -> &GateContext {
        &self.context
    }

    /// Invoke the operation through the gate
    pub async fn invoke(&self, input: Op::Input) -> GateResult<Op::Output, Op::Error> {
        self.invoke_with_cancel(input, &CancellationToken::new())
            .await
    }

    /// Invoke, abandoning a pending request if `cancel` fires
    pub async fn invoke_with_cancel(
        &self,
        input: Op::Input,
        cancel: &CancellationToken,
    ) -> GateResult<Op::Output, Op::Error> {
        self.invoke_with_clearance(input, cancel)
            .await
            .map(|(output, _)| output)
    }

    /// Invoke and also report how the call was cleared
    pub async fn invoke_with_clearance(
        &self,
        input: Op::Input,
        cancel: &CancellationToken,
    ) -> GateResult<(Op::Output, Clearance), Op::Error> {
        let name = self.operation.name();
        let arguments = to_arguments(&input).map_err(|e| GateError::InvalidArguments {
            operation: name.to_string(),
            message: e.to_string(),
        })?;

        let clearance = match self.context.evaluate(name, &arguments) {
            Verdict::AutoApprove => {
                tracing::info!("Auto-approved {}", name);
                Clearance::AutoApproved
            }
            Verdict::RequireApproval => {
                let summary = self.operation.summarize(&arguments);
                let (request_id, decision) = self
                    .context
                    .await_approval(name, arguments, summary, cancel)
                    .await
                    .map_err(ApprovalFailure::widen)?;
                Clearance::Approved {
                    request_id,
                    comment: decision.comment,
                }
            }
        };

        let output = self
            .operation
            .call(input)
            .await
            .map_err(GateError::Operation)?;
        Ok((output, clearance))
    }
}

fn to_arguments<T: Serialize>(input: &T) -> serde_json::Result<Arguments> {
    Ok(match serde_json::to_value(input)? {
        Value::Object(map) => map,
        Value::Null => Arguments::new(),
        other => {
            let mut map = Arguments::new();
            map.insert("value".to_string(), other);
            map
        }
    })
}
