//! Approval request and decision types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Structured key/value arguments of a gated call
pub type Arguments = Map<String, Value>;

/// A pending review of one gated call
///
/// Created by the gate when policy requires sign-off. Fields are read-only
/// once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    id: Uuid,
    operation: String,
    arguments: Arguments,
    summary: String,
    #[serde(rename = "timeout_secs", with = "duration_secs")]
    timeout: Duration,
    created_at: DateTime<Utc>,
}

impl ApprovalRequest {
    /// Create a new approval request with a fresh id
    pub fn new<O, S>(operation: O, arguments: Arguments, summary: S, timeout: Duration) -> Self
    where
        O: Into<String>,
        S: Into<String>,
    {
        Self {
            id: Uuid::new_v4(),
            operation: operation.into(),
            arguments,
            summary: summary.into(),
            timeout,
            created_at: Utc::now(),
        }
    }

    /// Unique request id
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name of the gated operation
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Call arguments
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Look up one argument
    pub fn argument(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }

    /// Human-readable summary shown to the reviewer
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// How long the gate waits for a decision
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// When the request was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Terminal outcome of a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// Proceed with the call
    Approved,
    /// Do not proceed
    Rejected,
    /// Nobody answered in time
    TimedOut,
}

impl fmt::Display for DecisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionOutcome::Approved => write!(f, "approved"),
            DecisionOutcome::Rejected => write!(f, "rejected"),
            DecisionOutcome::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// A reviewer's decision on one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    /// Outcome
    pub outcome: DecisionOutcome,

    /// Optional reviewer comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// When the decision was recorded
    pub decided_at: DateTime<Utc>,
}

impl ApprovalDecision {
    /// Create a decision with the given outcome
    pub fn new(outcome: DecisionOutcome) -> Self {
        Self {
            outcome,
            comment: None,
            decided_at: Utc::now(),
        }
    }

    /// Approved, no comment
    pub fn approved() -> Self {
        Self::new(DecisionOutcome::Approved)
    }

    /// Rejected, no comment
    pub fn rejected() -> Self {
        Self::new(DecisionOutcome::Rejected)
    }

    /// Timed out
    pub fn timed_out() -> Self {
        Self::new(DecisionOutcome::TimedOut).with_comment("No decision before the timeout")
    }

    /// Attach a reviewer comment
    pub fn with_comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Check if the call may proceed
    pub fn is_approved(&self) -> bool {
        self.outcome == DecisionOutcome::Approved
    }
}

/// Lifecycle of a request: `Created → Pending → {Approved, Rejected, TimedOut}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Built but not yet submitted
    Created,
    /// Submitted, waiting for a decision
    Pending,
    /// Approved (terminal)
    Approved,
    /// Rejected (terminal)
    Rejected,
    /// Timed out (terminal)
    TimedOut,
}

impl RequestStatus {
    /// Terminal states are final
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Approved | RequestStatus::Rejected | RequestStatus::TimedOut
        )
    }
}

impl From<DecisionOutcome> for RequestStatus {
    fn from(outcome: DecisionOutcome) -> Self {
        match outcome {
            DecisionOutcome::Approved => RequestStatus::Approved,
            DecisionOutcome::Rejected => RequestStatus::Rejected,
            DecisionOutcome::TimedOut => RequestStatus::TimedOut,
        }
    }
}

/// Durations as fractional seconds
pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Optional durations as fractional seconds
pub(crate) mod opt_duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<f64>::deserialize(deserializer)? {
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn purchase_args(cost: f64) -> Arguments {
        json!({"item": "Coffee machine", "cost": cost})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_request_creation() {
        let req = ApprovalRequest::new(
            "make_company_purchase",
            purchase_args(800.0),
            "Buy a coffee machine for $800.00",
            Duration::from_secs(60),
        );

        assert_eq!(req.operation(), "make_company_purchase");
        assert_eq!(req.argument("cost"), Some(&json!(800.0)));
        assert_eq!(req.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = ApprovalRequest::new("op", Arguments::new(), "a", Duration::from_secs(1));
        let b = ApprovalRequest::new("op", Arguments::new(), "a", Duration::from_secs(1));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_request_json_shape() {
        let req = ApprovalRequest::new(
            "make_company_purchase",
            purchase_args(150.0),
            "summary",
            Duration::from_millis(1500),
        );

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["operation"], "make_company_purchase");
        assert_eq!(value["timeout_secs"], 1.5);
        assert_eq!(value["arguments"]["cost"], 150.0);

        let back: ApprovalRequest = serde_json::from_value(value).unwrap();
        assert_eq!(back.id(), req.id());
        assert_eq!(back.timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_decision_helpers() {
        assert!(ApprovalDecision::approved().is_approved());
        assert!(!ApprovalDecision::rejected().is_approved());

        let timed_out = ApprovalDecision::timed_out();
        assert_eq!(timed_out.outcome, DecisionOutcome::TimedOut);
        assert!(timed_out.comment.is_some());

        let rejected = ApprovalDecision::rejected().with_comment("Not in budget");
        assert_eq!(rejected.comment.as_deref(), Some("Not in budget"));
    }

    #[test]
    fn test_status_transitions() {
        assert!(!RequestStatus::Created.is_terminal());
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::from(DecisionOutcome::Approved).is_terminal());
        assert_eq!(
            RequestStatus::from(DecisionOutcome::TimedOut),
            RequestStatus::TimedOut
        );
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&DecisionOutcome::TimedOut).unwrap();
        assert_eq!(json, "\"timed_out\"");
    }
}
