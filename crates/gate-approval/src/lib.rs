//! Human approval gate
//!
//! Places designated operations behind human sign-off. A [`Gate`] evaluates
//! the operation's [`Policy`]; calls that need review are sent to a
//! [`NotificationChannel`] and suspend until a reviewer decides, the
//! timeout elapses or the caller cancels.
//!
//! # Example
//!
//! ```
//! use gate_approval::{FnOperation, Gate, GateContext, MockChannel, OperationPolicy};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("purchase failed")]
//! struct PurchaseError;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let context = GateContext::builder()
//!         .channel(MockChannel::always_approve())
//!         .operation("make_company_purchase", OperationPolicy::threshold("cost", 500.0))
//!         .build()?;
//!
//!     let purchase = FnOperation::new("make_company_purchase", |args: serde_json::Value| async move {
//!         Ok::<_, PurchaseError>(format!("Purchased {}", args["item"]))
//!     });
//!
//!     let gate = Gate::new(purchase, context);
//!     let receipt = gate
//!         .invoke(serde_json::json!({"item": "Coffee machine", "cost": 800}))
//!         .await?;
//!     println!("{}", receipt);
//!
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod broker;
pub mod channel;
pub mod config;
pub mod error;
pub mod gate;
pub mod policy;
pub mod request;

// Built-in channels
pub mod console;
pub mod http;
pub mod mock;

// Re-exports
pub use audit::{ApprovalAudit, AuditRecord};
pub use broker::{DecisionBroker, DecisionHandle, WaitOutcome};
pub use channel::{ChannelKind, ChannelRegistry, NotificationChannel};
pub use config::{ApprovalConfig, ChannelConfig};
pub use error::{ApprovalError, DenialReason, GateError, GateResult, Result};
pub use gate::{Clearance, FnOperation, Gate, GateContext, GateContextBuilder, Operation};
pub use policy::{Condition, OperationPolicy, Policy, PolicyRule, Verdict};
pub use request::{ApprovalDecision, ApprovalRequest, Arguments, DecisionOutcome, RequestStatus};

pub use console::{ConsoleChannel, ConsoleInput};
pub use http::{HttpChannel, HttpTarget};
pub use mock::{MockChannel, MockMode};

pub use tokio_util::sync::CancellationToken;
