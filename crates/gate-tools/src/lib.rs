//! Tools the model can call
//!
//! A [`Tool`] describes itself with a JSON [`ToolSchema`] and runs on a JSON
//! parameters object. The [`ToolRegistry`] turns registered tools into
//! OpenAI function descriptors and dispatches calls by name. The
//! [`office`] module holds the office-supply tools over a shared ledger.
//!
//! # Example
//!
//! ```
//! use gate_tools::office::{office_registry, OfficeLedger};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ledger = OfficeLedger::demo();
//!     let registry = office_registry(&ledger)?;
//!
//!     let result = registry.execute("check_inventory", json!({"item": "pens"})).await?;
//!     assert!(result.success);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod office;
pub mod registry;
pub mod schema;
pub mod tool;

// Re-exports
pub use error::{Result, ToolError};
pub use registry::ToolRegistry;
pub use schema::ToolSchema;
pub use tool::{parse_params, Tool, ToolResult};
