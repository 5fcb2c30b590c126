//! Error types for the approval gate

use gate_core::CoreError;
use std::fmt;
use uuid::Uuid;

use crate::request::DecisionOutcome;

/// Result type for channel, broker and configuration operations
pub type Result<T> = std::result::Result<T, ApprovalError>;

/// Errors raised by channels, the decision broker and configuration
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// The request could not be delivered
    #[error("Notification channel '{channel}' unavailable: {reason}")]
    ChannelUnavailable {
        /// Channel name
        channel: String,
        /// Why delivery failed
        reason: String,
    },

    /// No channel registered under this name
    #[error("Unknown notification channel: {0}")]
    UnknownChannel(String),

    /// No pending or settled request with this id
    #[error("No approval request with ID: {0}")]
    UnknownRequest(Uuid),

    /// A terminal decision was already recorded for this request
    #[error("Approval request {id} already settled as {outcome}")]
    AlreadyDecided {
        /// Request id
        id: Uuid,
        /// The outcome that was recorded first
        outcome: DecisionOutcome,
    },

    /// Invalid approval configuration
    #[error("Invalid approval configuration: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from gate-core
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ApprovalError {
    /// Create a channel-unavailable error
    pub fn channel_unavailable<C: Into<String>, R: Into<String>>(channel: C, reason: R) -> Self {
        Self::ChannelUnavailable {
            channel: channel.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Why a gated call was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// A reviewer rejected the request
    Rejected,
    /// No decision arrived before the timeout
    TimedOut,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::Rejected => write!(f, "rejected"),
            DenialReason::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Result of a gated invocation
pub type GateResult<T, E> = std::result::Result<T, GateError<E>>;

/// Failure of a gated invocation
///
/// `Operation` carries the wrapped callable's own error unchanged; every
/// other variant means the callable never ran.
#[derive(Debug, thiserror::Error)]
pub enum GateError<E>
where
    E: std::error::Error + 'static,
{
    /// The approval request could not be submitted
    #[error("Notification channel '{channel}' unavailable: {reason}")]
    NotificationChannelUnavailable {
        /// Channel name
        channel: String,
        /// Why delivery failed
        reason: String,
    },

    /// The request was rejected or timed out
    #[error("Approval denied for '{operation}' ({reason})")]
    ApprovalDenied {
        /// Request id
        request_id: Uuid,
        /// Gated operation
        operation: String,
        /// Rejected or timed out
        reason: DenialReason,
        /// Reviewer comment, if any
        comment: Option<String>,
    },

    /// The caller cancelled while the request was pending
    #[error("Approval request {0} abandoned by caller")]
    Cancelled(Uuid),

    /// Arguments could not be turned into a key/value map
    #[error("Invalid arguments for '{operation}': {message}")]
    InvalidArguments {
        /// Gated operation
        operation: String,
        /// Serialization error text
        message: String,
    },

    /// The wrapped operation failed after approval
    #[error(transparent)]
    Operation(E),
}

impl<E> GateError<E>
where
    E: std::error::Error + 'static,
{
    /// The denial reason, if the request was denied
    pub fn denial_reason(&self) -> Option<DenialReason> {
        match self {
            GateError::ApprovalDenied { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Whether the request was rejected or timed out
    pub fn is_denied(&self) -> bool {
        self.denial_reason().is_some()
    }

    /// Whether submission to the channel failed
    pub fn is_channel_unavailable(&self) -> bool {
        matches!(self, GateError::NotificationChannelUnavailable { .. })
    }

    /// The operation's own error, if that is what failed
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            GateError::Operation(e) => Some(e),
            _ => None,
        }
    }
}

/// Non-generic approval failure, widened into [`GateError`] by `Gate<Op>`
#[derive(Debug)]
pub(crate) enum ApprovalFailure {
    Unavailable {
        channel: String,
        reason: String,
    },
    Denied {
        request_id: Uuid,
        operation: String,
        reason: DenialReason,
        comment: Option<String>,
    },
    Cancelled(Uuid),
}

impl ApprovalFailure {
    pub(crate) fn widen<E>(self) -> GateError<E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            ApprovalFailure::Unavailable { channel, reason } => {
                GateError::NotificationChannelUnavailable { channel, reason }
            }
            ApprovalFailure::Denied {
                request_id,
                operation,
                reason,
                comment,
            } => GateError::ApprovalDenied {
                request_id,
                operation,
                reason,
                comment,
            },
            ApprovalFailure::Cancelled(id) => GateError::Cancelled(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_unavailable() {
        let err = ApprovalError::channel_unavailable("slack", "connection refused");
        assert!(matches!(err, ApprovalError::ChannelUnavailable { .. }));
        assert!(err.to_string().contains("slack"));
    }

    #[test]
    fn test_gate_error_denial() {
        let err: GateError<std::io::Error> = ApprovalFailure::Denied {
            request_id: Uuid::new_v4(),
            operation: "make_company_purchase".to_string(),
            reason: DenialReason::TimedOut,
            comment: None,
        }
        .widen();

        assert!(err.is_denied());
        assert_eq!(err.denial_reason(), Some(DenialReason::TimedOut));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_operation_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "out of stock");
        let err = GateError::Operation(io);
        assert_eq!(err.to_string(), "out of stock");
        assert!(!err.is_denied());
        assert!(err.into_operation_error().is_some());
    }
}
