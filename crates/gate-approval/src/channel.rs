//! Notification channel abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::broker::{DecisionBroker, DecisionHandle};
use crate::error::{ApprovalError, Result};
use crate::request::ApprovalRequest;

/// Kind of human-facing surface a channel delivers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Web dashboard
    Dashboard,
    /// Chat message (Slack-style webhook)
    Chat,
    /// Mobile push notification
    MobilePush,
    /// Local terminal prompt
    Console,
    /// Scripted channel for tests
    Mock,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelKind::Dashboard => "dashboard",
            ChannelKind::Chat => "chat",
            ChannelKind::MobilePush => "mobile_push",
            ChannelKind::Console => "console",
            ChannelKind::Mock => "mock",
        };
        f.write_str(name)
    }
}

/// Where approval requests are delivered
///
/// Implementations register the request with the broker before delivering
/// it, so a decision arriving immediately after delivery is never lost.
/// Delivery failures are reported as [`ApprovalError::ChannelUnavailable`]
/// without waiting for any decision.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Channel name (for configuration and logging)
    fn name(&self) -> &str;

    /// Kind of surface
    fn kind(&self) -> ChannelKind;

    /// Deliver a request; the returned handle yields the decision
    async fn submit(
        &self,
        request: &ApprovalRequest,
        broker: &DecisionBroker,
    ) -> Result<DecisionHandle>;
}

/// Named notification channels
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    channels: HashMap<String, Arc<dyn NotificationChannel>>,
}

impl ChannelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel under its own name
    pub fn register<C: NotificationChannel + 'static>(&mut self, channel: C) {
        self.register_arc(Arc::new(channel));
    }

    /// Register a shared channel under its own name
    pub fn register_arc(&mut self, channel: Arc<dyn NotificationChannel>) {
        let name = channel.name().to_string();
        tracing::debug!("Registered notification channel: {} ({})", name, channel.kind());
        self.channels.insert(name, channel);
    }

    /// Look up a channel
    pub fn get(&self, name: &str) -> Result<Arc<dyn NotificationChannel>> {
        self.channels
            .get(name)
            .cloned()
            .ok_or_else(|| ApprovalError::UnknownChannel(name.to_string()))
    }

    /// Whether a channel exists
    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Registered channel names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("channels", &self.names())
            .finish()
    }
}
