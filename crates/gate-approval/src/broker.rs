//! Decision broker for pending approval requests
//!
//! Channels register a request here before delivering it and hand the
//! returned [`DecisionHandle`] to the gate. Decisions come back through
//! [`DecisionBroker::resolve`]: from a console prompt, a webhook handler or
//! a status poller.
//!
//! Each request id moves from pending to settled exactly once. The timer
//! and `resolve` both try to settle it and whichever gets there first fixes
//! the terminal outcome; the loser is refused with
//! [`ApprovalError::AlreadyDecided`]. Only the most recent
//! [`DEFAULT_SETTLED_HISTORY`] outcomes are remembered; older ids answer
//! [`ApprovalError::UnknownRequest`].

use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{ApprovalError, Result};
use crate::request::{ApprovalDecision, ApprovalRequest, DecisionOutcome, RequestStatus};

enum Slot {
    Pending(oneshot::Sender<ApprovalDecision>),
    Settled(DecisionOutcome),
}

/// Settled outcomes kept for answering late decisions
pub const DEFAULT_SETTLED_HISTORY: usize = 1024;

/// In-process registry of pending approval requests
#[derive(Clone)]
pub struct DecisionBroker {
    requests: Arc<DashMap<Uuid, Slot>>,
    settled: Arc<Mutex<VecDeque<Uuid>>>,
    history: usize,
}

impl Default for DecisionBroker {
    fn default() -> Self {
        Self::with_settled_history(DEFAULT_SETTLED_HISTORY)
    }
}

impl DecisionBroker {
    /// Create an empty broker
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a broker that remembers at most `history` settled outcomes
    pub fn with_settled_history(history: usize) -> Self {
        Self {
            requests: Arc::new(DashMap::new()),
            settled: Arc::new(Mutex::new(VecDeque::new())),
            history,
        }
    }

    /// Register a request and get the handle the gate will wait on
    pub fn register(&self, request: &ApprovalRequest) -> DecisionHandle {
        let (tx, rx) = oneshot::channel();
        self.requests.insert(request.id(), Slot::Pending(tx));

        tracing::debug!("Registered approval request: {}", request.id());

        DecisionHandle {
            id: request.id(),
            receiver: rx,
            broker: self.clone(),
            watcher: None,
        }
    }

    /// Deliver a decision for a pending request
    ///
    /// # Errors
    /// `AlreadyDecided` if a terminal outcome was recorded first,
    /// `UnknownRequest` if the id was never registered or was abandoned.
    pub fn resolve(&self, id: Uuid, decision: ApprovalDecision) -> Result<()> {
        let sender = self.settle(id, decision.outcome)?;

        tracing::info!("Decision received for {}: {}", id, decision.outcome);

        // The waiting side may already be gone (cancelled)
        let _ = sender.send(decision);
        Ok(())
    }

    /// Record a timeout; false if another outcome won the race
    pub(crate) fn expire(&self, id: Uuid) -> bool {
        self.settle(id, DecisionOutcome::TimedOut).is_ok()
    }

    /// Drop a request that is still pending
    pub(crate) fn abandon(&self, id: Uuid) -> bool {
        let removed = self
            .requests
            .remove_if(&id, |_, slot| matches!(slot, Slot::Pending(_)))
            .is_some();
        if removed {
            tracing::debug!("Abandoned approval request: {}", id);
        }
        removed
    }

    fn settle(&self, id: Uuid, outcome: DecisionOutcome) -> Result<oneshot::Sender<ApprovalDecision>> {
        let sender = {
            let mut slot = self
                .requests
                .get_mut(&id)
                .ok_or(ApprovalError::UnknownRequest(id))?;

            match std::mem::replace(&mut *slot, Slot::Settled(outcome)) {
                Slot::Pending(sender) => sender,
                Slot::Settled(previous) => {
                    *slot = Slot::Settled(previous);
                    return Err(ApprovalError::AlreadyDecided {
                        id,
                        outcome: previous,
                    });
                }
            }
        };

        self.remember_settled(id);
        Ok(sender)
    }

    /// Track a settled id, evicting the oldest beyond the history limit
    fn remember_settled(&self, id: Uuid) {
        let mut settled = self.settled.lock().unwrap_or_else(|e| e.into_inner());
        settled.push_back(id);
        while settled.len() > self.history {
            if let Some(oldest) = settled.pop_front() {
                self.requests
                    .remove_if(&oldest, |_, slot| matches!(slot, Slot::Settled(_)));
            }
        }
    }

    /// Current status of a request, if known
    pub fn status(&self, id: Uuid) -> Option<RequestStatus> {
        self.requests.get(&id).map(|slot| match &*slot {
            Slot::Pending(_) => RequestStatus::Pending,
            Slot::Settled(outcome) => RequestStatus::from(*outcome),
        })
    }

    /// Number of requests still waiting for a decision
    pub fn pending_count(&self) -> usize {
        self.requests
            .iter()
            .filter(|entry| matches!(entry.value(), Slot::Pending(_)))
            .count()
    }

    /// Ids of requests still waiting for a decision
    pub fn pending_ids(&self) -> Vec<Uuid> {
        self.requests
            .iter()
            .filter(|entry| matches!(entry.value(), Slot::Pending(_)))
            .map(|entry| *entry.key())
            .collect()
    }
}

/// How a wait on a [`DecisionHandle`] ended
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    /// A terminal decision, including a timeout
    Decided(ApprovalDecision),
    /// The caller's token fired first
    Cancelled,
}

/// The gate's side of one pending request
///
/// Dropping the handle abandons the request if it is still pending and
/// stops any background watcher (such as a status poller).
pub struct DecisionHandle {
    id: Uuid,
    receiver: oneshot::Receiver<ApprovalDecision>,
    broker: DecisionBroker,
    watcher: Option<JoinHandle<()>>,
}

impl DecisionHandle {
    /// Request id this handle waits on
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Attach a background task that lives as long as the handle
    pub fn with_watcher(mut self, task: JoinHandle<()>) -> Self {
        self.watcher = Some(task);
        self
    }

    /// Suspend until a decision arrives, the timeout elapses or `cancel` fires
    pub async fn wait(mut self, timeout: Duration, cancel: &CancellationToken) -> WaitOutcome {
        let sleep = tokio::time::sleep(timeout);
        tokio::pin!(sleep);

        tokio::select! {
            biased;

            received = &mut self.receiver => WaitOutcome::Decided(received_or_closed(received)),

            _ = cancel.cancelled() => {
                self.broker.abandon(self.id);
                WaitOutcome::Cancelled
            }

            _ = &mut sleep => {
                if self.broker.expire(self.id) {
                    tracing::warn!("Approval request {} timed out after {:?}", self.id, timeout);
                    WaitOutcome::Decided(ApprovalDecision::timed_out())
                } else {
                    // A decision settled the request just before the timer fired
                    let received = (&mut self.receiver).await;
                    WaitOutcome::Decided(received_or_closed(received))
                }
            }
        }
    }
}

fn received_or_closed(
    received: std::result::Result<ApprovalDecision, oneshot::error::RecvError>,
) -> ApprovalDecision {
    received.unwrap_or_else(|_| ApprovalDecision::rejected().with_comment("Decision channel closed"))
}

impl Drop for DecisionHandle {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
        self.broker.abandon(self.id);
    }
}

impl std::fmt::Debug for DecisionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionHandle")
            .field("id", &self.id)
            .field("has_watcher", &self.watcher.is_some())
            .finish()
    }
}
