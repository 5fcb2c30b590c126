//! Approval configuration
//!
//! ```toml
//! [approval]
//! default_timeout_secs = 60
//! default_channel = "console"
//!
//! [approval.channels.slack]
//! kind = "chat"
//! url = "https://hooks.slack.com/services/..."
//! channel = "#approvals"
//!
//! [approval.operations.make_company_purchase]
//! timeout_secs = 120
//! rules = [
//!     { when = { argument_at_most = { argument = "cost", threshold = 500.0 } }, then = "auto_approve" },
//!     { when = "always", then = "require_approval" },
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::channel::{ChannelKind, NotificationChannel};
use crate::console::ConsoleChannel;
use crate::error::{ApprovalError, Result};
use crate::gate::{GateContext, GateContextBuilder};
use crate::http::HttpChannel;
use crate::policy::{OperationPolicy, Policy};

/// Approval section of the application config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// Timeout for operations without an override
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    /// Channel for operations without an override
    #[serde(default = "default_channel")]
    pub default_channel: String,

    /// Named notification channels
    #[serde(default)]
    pub channels: HashMap<String, ChannelConfig>,

    /// Gated operations and their policies
    #[serde(default)]
    pub operations: HashMap<String, OperationPolicy>,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_channel() -> String {
    "console".to_string()
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: default_timeout_secs(),
            default_channel: default_channel(),
            channels: HashMap::new(),
            operations: HashMap::new(),
        }
    }
}

/// One notification channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Surface kind
    pub kind: ChannelKind,

    /// Delivery URL (dashboard endpoint, chat webhook or push gateway)
    #[serde(default)]
    pub url: Option<String>,

    /// Base URL polled for decisions (`GET {status_url}/{id}`)
    #[serde(default)]
    pub status_url: Option<String>,

    /// Poll interval in milliseconds
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    /// Chat channel override
    #[serde(default)]
    pub channel: Option<String>,

    /// Push target device
    #[serde(default)]
    pub device: Option<String>,

    /// Environment variable holding a bearer token
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl ChannelConfig {
    fn require_url(&self, name: &str) -> Result<String> {
        self.url.clone().ok_or_else(|| {
            ApprovalError::config(format!("channel '{}' ({}) needs a url", name, self.kind))
        })
    }

    /// Build the channel this entry describes
    pub fn build(&self, name: &str) -> Result<Arc<dyn NotificationChannel>> {
        let channel = match self.kind {
            ChannelKind::Console => return Ok(Arc::new(ConsoleChannel::new().named(name))),
            ChannelKind::Mock => {
                return Err(ApprovalError::config(format!(
                    "channel '{}': mock channels cannot be configured from a file",
                    name
                )))
            }
            ChannelKind::Dashboard => HttpChannel::dashboard(name, self.require_url(name)?),
            ChannelKind::Chat => {
                HttpChannel::chat(name, self.require_url(name)?, self.channel.clone())
            }
            ChannelKind::MobilePush => {
                let device = self.device.clone().ok_or_else(|| {
                    ApprovalError::config(format!("channel '{}' (mobile_push) needs a device", name))
                })?;
                HttpChannel::mobile_push(name, self.require_url(name)?, device)
            }
        };

        if self.poll_interval_ms == Some(0) {
            return Err(ApprovalError::config(format!(
                "channel '{}': poll_interval_ms must be greater than zero",
                name
            )));
        }

        let channel = match &self.status_url {
            Some(status_url) => channel.with_status_polling(
                status_url.clone(),
                self.poll_interval_ms.map(Duration::from_millis),
            ),
            None => channel,
        };

        let channel = match self.api_key_env.as_deref() {
            Some(var) => match std::env::var(var) {
                Ok(key) if !key.trim().is_empty() => channel.with_api_key(key),
                _ => {
                    tracing::warn!("Channel '{}': {} is not set, sending without a token", name, var);
                    channel
                }
            },
            None => channel,
        };

        Ok(Arc::new(channel))
    }
}

impl ApprovalConfig {
    /// Default timeout as a duration
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// Gate one operation
    pub fn with_operation<S: Into<String>>(mut self, name: S, policy: OperationPolicy) -> Self {
        self.operations.insert(name.into(), policy);
        self
    }

    /// The gating policy
    pub fn policy(&self) -> Policy {
        self.operations
            .iter()
            .fold(Policy::new(), |policy, (name, op)| {
                policy.with_operation(name.clone(), op.clone())
            })
    }

    /// Builder preloaded with policy, defaults and configured channels
    ///
    /// A console channel is added under the name `console` when something
    /// routes to it and no channel of that name is configured.
    pub fn context_builder(&self) -> Result<GateContextBuilder> {
        let mut builder = GateContext::builder()
            .policy(self.policy())
            .default_channel(self.default_channel.clone())
            .default_timeout(self.default_timeout());

        for (name, channel) in &self.channels {
            builder = builder.channel_arc(channel.build(name)?);
        }

        let wants_console = self.default_channel == "console"
            || self
                .operations
                .values()
                .any(|op| op.channel.as_deref() == Some("console"));
        if wants_console && !self.channels.contains_key("console") {
            builder = builder.channel(ConsoleChannel::new());
        }

        Ok(builder)
    }

    /// Build the gate context
    pub fn build_context(&self) -> Result<GateContext> {
        self.context_builder()?.build()
    }
}
