//! Approval audit trail

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::request::{ApprovalDecision, ApprovalRequest, DecisionOutcome};

/// Audit record for one decided request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// The original request
    pub request: ApprovalRequest,

    /// The terminal decision
    pub decision: ApprovalDecision,

    /// Channel the request went through
    pub channel: String,

    /// When the decision reached the gate
    pub responded_at: DateTime<Utc>,

    /// Time spent waiting for the decision
    pub duration_ms: u64,
}

/// Approval audit trail
///
/// Every terminal decision of a gated call, kept in memory for the CLI
/// summary and for tests. Auto-approved calls never create a request and
/// leave no record.
#[derive(Clone, Default)]
pub struct ApprovalAudit {
    records: Arc<DashMap<Uuid, AuditRecord>>,
}

impl ApprovalAudit {
    /// Create a new approval audit
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a decision
    pub fn record(
        &self,
        request: ApprovalRequest,
        decision: ApprovalDecision,
        channel: &str,
        duration_ms: u64,
    ) {
        let id = request.id();
        let record = AuditRecord {
            request,
            decision,
            channel: channel.to_string(),
            responded_at: Utc::now(),
            duration_ms,
        };

        self.records.insert(id, record);
        tracing::debug!("Recorded approval decision for request: {}", id);
    }

    /// Get an audit record by request id
    pub fn get(&self, request_id: Uuid) -> Option<AuditRecord> {
        self.records.get(&request_id).map(|r| r.clone())
    }

    /// All records, oldest request first
    pub fn get_all(&self) -> Vec<AuditRecord> {
        let mut records: Vec<AuditRecord> = self.records.iter().map(|r| r.clone()).collect();
        records.sort_by_key(|r| r.request.created_at());
        records
    }

    /// Records for one operation
    pub fn for_operation(&self, operation: &str) -> Vec<AuditRecord> {
        self.get_all()
            .into_iter()
            .filter(|r| r.request.operation() == operation)
            .collect()
    }

    /// Get count of records
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Count records with a given outcome
    pub fn count_outcome(&self, outcome: DecisionOutcome) -> usize {
        self.records
            .iter()
            .filter(|r| r.decision.outcome == outcome)
            .count()
    }

    /// Clear all records
    pub fn clear(&self) {
        self.records.clear();
    }
}
