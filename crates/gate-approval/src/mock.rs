//! Mock notification channel for testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::broker::{DecisionBroker, DecisionHandle};
use crate::channel::{ChannelKind, NotificationChannel};
use crate::error::{ApprovalError, Result};
use crate::request::{ApprovalDecision, ApprovalRequest};

/// Scripted notification channel
///
/// Decides every request according to its [`MockMode`] and remembers what
/// was submitted, so tests can assert on request contents and counts.
/// Clones share state.
#[derive(Clone)]
pub struct MockChannel {
    name: String,
    mode: MockMode,
    call_count: Arc<AtomicUsize>,
    submitted: Arc<Mutex<Vec<ApprovalRequest>>>,
}

/// Mock behavior modes
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Approve immediately
    AlwaysApprove,

    /// Reject immediately with a comment
    AlwaysReject(String),

    /// Never answer (the gate times out)
    Silent,

    /// Fail delivery
    Unavailable(String),

    /// Approve the first N requests, then reject
    ApproveNTimes(usize),

    /// Approve after a delay
    ApproveAfter(Duration),
}

impl MockChannel {
    fn with_mode(mode: MockMode) -> Self {
        Self {
            name: "mock".to_string(),
            mode,
            call_count: Arc::new(AtomicUsize::new(0)),
            submitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Approve every request
    pub fn always_approve() -> Self {
        Self::with_mode(MockMode::AlwaysApprove)
    }

    /// Reject every request
    pub fn always_reject<S: Into<String>>(comment: S) -> Self {
        Self::with_mode(MockMode::AlwaysReject(comment.into()))
    }

    /// Never answer
    pub fn silent() -> Self {
        Self::with_mode(MockMode::Silent)
    }

    /// Fail every delivery
    pub fn unavailable<S: Into<String>>(reason: S) -> Self {
        Self::with_mode(MockMode::Unavailable(reason.into()))
    }

    /// Approve N requests, then reject
    pub fn approve_n_times(n: usize) -> Self {
        Self::with_mode(MockMode::ApproveNTimes(n))
    }

    /// Approve each request after `delay`
    pub fn approve_after(delay: Duration) -> Self {
        Self::with_mode(MockMode::ApproveAfter(delay))
    }

    /// Register under a different name
    pub fn named<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Number of submissions
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Requests submitted so far
    pub fn requests(&self) -> Vec<ApprovalRequest> {
        self.submitted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Most recent request
    pub fn last_request(&self) -> Option<ApprovalRequest> {
        self.requests().pop()
    }

    /// Reset call counter and history
    pub fn reset(&self) {
        self.call_count.store(0, Ordering::SeqCst);
        self.submitted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

#[async_trait]
impl NotificationChannel for MockChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Mock
    }

    async fn submit(
        &self,
        request: &ApprovalRequest,
        broker: &DecisionBroker,
    ) -> Result<DecisionHandle> {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.submitted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        if let MockMode::Unavailable(reason) = &self.mode {
            return Err(ApprovalError::channel_unavailable(&self.name, reason.clone()));
        }

        let handle = broker.register(request);
        let id = request.id();

        match &self.mode {
            MockMode::AlwaysApprove => broker.resolve(id, ApprovalDecision::approved())?,
            MockMode::AlwaysReject(comment) => {
                broker.resolve(id, ApprovalDecision::rejected().with_comment(comment.clone()))?
            }
            MockMode::ApproveNTimes(n) => {
                let decision = if count < *n {
                    ApprovalDecision::approved()
                } else {
                    ApprovalDecision::rejected().with_comment(format!("Exceeded {} approvals", n))
                };
                broker.resolve(id, decision)?
            }
            MockMode::ApproveAfter(delay) => {
                let delay = *delay;
                let broker = broker.clone();
                let task = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = broker.resolve(id, ApprovalDecision::approved());
                });
                return Ok(handle.with_watcher(task));
            }
            MockMode::Silent | MockMode::Unavailable(_) => {}
        }

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::WaitOutcome;
    use crate::request::{Arguments, DecisionOutcome};
    use tokio_util::sync::CancellationToken;

    fn request() -> ApprovalRequest {
        ApprovalRequest::new("op", Arguments::new(), "summary", Duration::from_secs(5))
    }

    async fn decide(channel: &MockChannel, broker: &DecisionBroker) -> DecisionOutcome {
        let handle = channel.submit(&request(), broker).await.unwrap();
        match handle.wait(Duration::from_secs(5), &CancellationToken::new()).await {
            WaitOutcome::Decided(decision) => decision.outcome,
            WaitOutcome::Cancelled => panic!("not cancelled"),
        }
    }

    #[tokio::test]
    async fn test_always_approve() {
        let channel = MockChannel::always_approve();
        let broker = DecisionBroker::new();

        assert_eq!(decide(&channel, &broker).await, DecisionOutcome::Approved);
        assert_eq!(channel.call_count(), 1);
        assert_eq!(channel.last_request().unwrap().operation(), "op");
    }

    #[tokio::test]
    async fn test_always_reject() {
        let channel = MockChannel::always_reject("Not in budget");
        let broker = DecisionBroker::new();
        assert_eq!(decide(&channel, &broker).await, DecisionOutcome::Rejected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_times_out() {
        let channel = MockChannel::silent();
        let broker = DecisionBroker::new();
        assert_eq!(decide(&channel, &broker).await, DecisionOutcome::TimedOut);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let channel = MockChannel::unavailable("connection refused");
        let broker = DecisionBroker::new();

        let result = channel.submit(&request(), &broker).await;
        assert!(matches!(result, Err(ApprovalError::ChannelUnavailable { .. })));
        assert_eq!(broker.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_approve_n_times() {
        let channel = MockChannel::approve_n_times(2);
        let broker = DecisionBroker::new();

        assert_eq!(decide(&channel, &broker).await, DecisionOutcome::Approved);
        assert_eq!(decide(&channel, &broker).await, DecisionOutcome::Approved);
        assert_eq!(decide(&channel, &broker).await, DecisionOutcome::Rejected);
        assert_eq!(channel.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_approve_after_delay() {
        let channel = MockChannel::approve_after(Duration::from_secs(2));
        let broker = DecisionBroker::new();
        assert_eq!(decide(&channel, &broker).await, DecisionOutcome::Approved);
    }

    #[test]
    fn test_reset() {
        let channel = MockChannel::always_approve();
        channel.call_count.store(5, Ordering::SeqCst);
        channel.reset();
        assert_eq!(channel.call_count(), 0);
        assert!(channel.requests().is_empty());
    }
}
