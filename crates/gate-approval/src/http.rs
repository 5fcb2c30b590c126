//! HTTP notification channels: dashboard, chat webhook and mobile push

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

use crate::broker::{DecisionBroker, DecisionHandle};
use crate::channel::{ChannelKind, NotificationChannel};
use crate::error::{ApprovalError, Result};
use crate::request::{ApprovalDecision, ApprovalRequest};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Shortest accepted poll period; `tokio::time::interval` rejects zero
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivery address and payload format
#[derive(Debug, Clone, PartialEq)]
pub enum HttpTarget {
    /// POST the full request JSON to a dashboard endpoint
    Dashboard {
        /// Endpoint URL
        url: String,
    },
    /// POST a Slack-style `{"text": ...}` message to a webhook
    Chat {
        /// Incoming webhook URL
        webhook_url: String,
        /// Channel override, e.g. `#approvals`
        channel: Option<String>,
    },
    /// POST a push notification to a push gateway
    MobilePush {
        /// Push gateway URL
        url: String,
        /// Target device or user token
        device: String,
    },
}

impl HttpTarget {
    fn url(&self) -> &str {
        match self {
            HttpTarget::Dashboard { url } => url,
            HttpTarget::Chat { webhook_url, .. } => webhook_url,
            HttpTarget::MobilePush { url, .. } => url,
        }
    }

    fn kind(&self) -> ChannelKind {
        match self {
            HttpTarget::Dashboard { .. } => ChannelKind::Dashboard,
            HttpTarget::Chat { .. } => ChannelKind::Chat,
            HttpTarget::MobilePush { .. } => ChannelKind::MobilePush,
        }
    }
}

#[derive(Serialize)]
struct ChatMessage {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<String>,
}

#[derive(Debug, Clone)]
struct StatusPoll {
    url: String,
    interval: Duration,
}

/// Notification channel that delivers requests over HTTP
///
/// Decisions come back either through [`DecisionBroker::resolve`] (for
/// example from a webhook handler) or, when a status URL is configured, by
/// polling `GET {status_url}/{request_id}`.
pub struct HttpChannel {
    name: String,
    target: HttpTarget,
    client: reqwest::Client,
    api_key: Option<String>,
    request_timeout: Duration,
    status: Option<StatusPoll>,
}

impl HttpChannel {
    /// Create a channel for a target
    pub fn new<S: Into<String>>(name: S, target: HttpTarget) -> Self {
        Self {
            name: name.into(),
            target,
            client: reqwest::Client::new(),
            api_key: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            status: None,
        }
    }

    /// Dashboard channel
    pub fn dashboard<S: Into<String>, U: Into<String>>(name: S, url: U) -> Self {
        Self::new(name, HttpTarget::Dashboard { url: url.into() })
    }

    /// Chat webhook channel
    pub fn chat<S: Into<String>, U: Into<String>>(
        name: S,
        webhook_url: U,
        channel: Option<String>,
    ) -> Self {
        Self::new(
            name,
            HttpTarget::Chat {
                webhook_url: webhook_url.into(),
                channel,
            },
        )
    }

    /// Mobile push channel
    pub fn mobile_push<S: Into<String>, U: Into<String>, D: Into<String>>(
        name: S,
        url: U,
        device: D,
    ) -> Self {
        Self::new(
            name,
            HttpTarget::MobilePush {
                url: url.into(),
                device: device.into(),
            },
        )
    }

    /// Send `Authorization: Bearer <key>` with every request
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Per-request HTTP timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Poll `GET {status_url}/{id}` for decisions
    ///
    /// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn with_status_polling<S: Into<String>>(mut self, status_url: S, interval: Option<Duration>) -> Self {
        self.status = Some(StatusPoll {
            url: status_url.into(),
            interval: interval
                .unwrap_or(DEFAULT_POLL_INTERVAL)
                .max(MIN_POLL_INTERVAL),
        });
        self
    }

    /// Status poll period, if polling is configured
    pub fn poll_interval(&self) -> Option<Duration> {
        self.status.as_ref().map(|poll| poll.interval)
    }

    /// Delivery target
    pub fn target(&self) -> &HttpTarget {
        &self.target
    }

    /// Body POSTed for a request
    pub fn payload(&self, request: &ApprovalRequest) -> Value {
        match &self.target {
            HttpTarget::Dashboard { .. } => json!({
                "type": "approval_request",
                "request": request,
            }),
            HttpTarget::Chat { channel, .. } => {
                let message = ChatMessage {
                    text: chat_text(request),
                    channel: channel.clone(),
                };
                serde_json::to_value(message).unwrap_or(Value::Null)
            }
            HttpTarget::MobilePush { device, .. } => json!({
                "to": device,
                "title": format!("Approval needed: {}", request.operation()),
                "body": request.summary(),
                "data": {
                    "request_id": request.id(),
                    "operation": request.operation(),
                },
            }),
        }
    }

    async fn deliver(&self, request: &ApprovalRequest) -> Result<()> {
        let mut builder = self
            .client
            .post(self.target.url())
            .timeout(self.request_timeout)
            .json(&self.payload(request));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| ApprovalError::channel_unavailable(&self.name, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApprovalError::channel_unavailable(
                &self.name,
                format!("status={}, body={}", status, body),
            ));
        }

        Ok(())
    }

    fn spawn_poller(&self, poll: StatusPoll, id: Uuid, broker: DecisionBroker) -> tokio::task::JoinHandle<()> {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let request_timeout = self.request_timeout;
        let url = format!("{}/{}", poll.url.trim_end_matches('/'), id);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll.interval);
            loop {
                ticker.tick().await;

                let mut builder = client.get(&url).timeout(request_timeout);
                if let Some(key) = &api_key {
                    builder = builder.bearer_auth(key);
                }

                let body = match builder.send().await {
                    Ok(resp) if resp.status().is_success() => resp.json::<Value>().await,
                    Ok(resp) => {
                        tracing::debug!("Status poll for {} returned {}", id, resp.status());
                        continue;
                    }
                    Err(e) => {
                        tracing::debug!("Status poll for {} failed: {}", id, e);
                        continue;
                    }
                };

                let Ok(body) = body else { continue };
                if let Some(decision) = parse_status_body(&body) {
                    if let Err(e) = broker.resolve(id, decision) {
                        tracing::debug!("Polled decision for {} ignored: {}", id, e);
                    }
                    return;
                }
            }
        })
    }
}

/// Slack-style message text for a request
pub fn chat_text(request: &ApprovalRequest) -> String {
    let arguments = serde_json::to_string_pretty(request.arguments()).unwrap_or_default();
    format!(
        "🚨 *Human Approval Required* 🚨\n\nRequest ID: `{}`\nOperation: `{}`\nSummary: {}\nTimeout: {}s\nArguments:\n```{}```",
        request.id(),
        request.operation(),
        request.summary(),
        request.timeout().as_secs(),
        arguments
    )
}

/// Decision reported by a status endpoint, if it is terminal
///
/// Accepts `{"status": "approved" | "rejected" | "denied", "comment": ...}`;
/// anything else (including `"pending"`) means keep polling.
pub fn parse_status_body(body: &Value) -> Option<ApprovalDecision> {
    let status = body.get("status")?.as_str()?.to_lowercase();
    let decision = match status.as_str() {
        "approved" => ApprovalDecision::approved(),
        "rejected" | "denied" => ApprovalDecision::rejected(),
        _ => return None,
    };

    Some(match body.get("comment").and_then(Value::as_str) {
        Some(comment) => decision.with_comment(comment),
        None => decision,
    })
}

#[async_trait]
impl NotificationChannel for HttpChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ChannelKind {
        self.target.kind()
    }

    async fn submit(
        &self,
        request: &ApprovalRequest,
        broker: &DecisionBroker,
    ) -> Result<DecisionHandle> {
        // Registered before delivery so an instant webhook reply finds it
        let handle = broker.register(request);

        self.deliver(request).await?;

        tracing::info!(
            "Sent {} notification via '{}' for approval {}",
            self.target.kind(),
            self.name,
            request.id()
        );

        Ok(match self.status.clone() {
            Some(poll) => {
                let task = self.spawn_poller(poll, request.id(), broker.clone());
                handle.with_watcher(task)
            }
            None => handle,
        })
    }
}
