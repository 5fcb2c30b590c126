//! Console notification channel

use async_trait::async_trait;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, OnceLock};
use tokio::sync::{mpsc, Mutex};

use crate::broker::{DecisionBroker, DecisionHandle};
use crate::channel::{ChannelKind, NotificationChannel};
use crate::error::{ApprovalError, Result};
use crate::request::{ApprovalDecision, ApprovalRequest};

/// Lines typed at the terminal
///
/// Stdin is read by one dedicated thread for the life of the process, so an
/// abandoned request never leaves a reader behind to swallow the answer to
/// the next one, and runtime shutdown never waits on a blocked read.
/// Pending requests are answered one at a time, in submission order.
#[derive(Clone)]
pub struct ConsoleInput {
    lines: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
}

impl ConsoleInput {
    /// The process-wide stdin reader, started on first use
    pub fn stdin() -> Self {
        static STDIN: OnceLock<ConsoleInput> = OnceLock::new();
        STDIN
            .get_or_init(|| {
                let (tx, rx) = mpsc::unbounded_channel();
                let spawned = std::thread::Builder::new()
                    .name("console-input".to_string())
                    .spawn(move || {
                        for line in io::stdin().lock().lines() {
                            match line {
                                Ok(line) => {
                                    if tx.send(line).is_err() {
                                        break;
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!("Failed to read console input: {}", e);
                                    break;
                                }
                            }
                        }
                    });
                if let Err(e) = spawned {
                    tracing::warn!("Could not start the console reader: {}", e);
                }
                Self::from_receiver(rx)
            })
            .clone()
    }

    /// Input fed from a channel instead of stdin
    pub fn from_receiver(lines: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            lines: Arc::new(Mutex::new(lines)),
        }
    }

    /// Drop lines typed while no request was on screen
    async fn discard_buffered(&self) {
        let mut lines = self.lines.lock().await;
        let mut discarded = 0;
        while lines.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            tracing::debug!("Discarded {} stale console line(s)", discarded);
        }
    }

    /// Next line, or `None` once input is closed
    async fn next_line(&self) -> Option<String> {
        self.lines.lock().await.recv().await
    }
}

/// Console notification channel
///
/// Prints the request to stdout and reads a y/N answer from stdin.
/// Use for CLI applications and local development.
pub struct ConsoleChannel {
    name: String,
    input: Option<ConsoleInput>,
}

impl ConsoleChannel {
    /// Create a console channel named "console"
    pub fn new() -> Self {
        Self {
            name: "console".to_string(),
            input: None,
        }
    }

    /// Register under a different name
    pub fn named<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Read answers from `input` rather than the process stdin
    pub fn with_input(mut self, input: ConsoleInput) -> Self {
        self.input = Some(input);
        self
    }

    fn input(&self) -> ConsoleInput {
        self.input.clone().unwrap_or_else(ConsoleInput::stdin)
    }
}

impl Default for ConsoleChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Text shown to the reviewer
pub fn render_prompt(request: &ApprovalRequest) -> String {
    let mut out = String::new();
    out.push_str("\n🤚 HUMAN APPROVAL REQUIRED\n");
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out.push_str(&format!("Request: {}\n", request.id()));
    out.push_str(&format!("Operation: {}\n", request.operation()));
    out.push_str(&format!("Summary: {}\n", request.summary()));
    for (key, value) in request.arguments() {
        out.push_str(&format!("  {}: {}\n", key, value));
    }
    out.push_str(&format!("Timeout: {}s\n", request.timeout().as_secs()));
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out
}

fn print_prompt(request: &ApprovalRequest) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(render_prompt(request).as_bytes())?;
    stdout.write_all(b"\nApprove this action? [y/N]: ")?;
    stdout.flush()
}

/// Interpret a console answer
///
/// `y`/`yes` approves. An empty answer or `n`/`no` rejects. Anything else
/// rejects and is kept as the reviewer's comment.
pub fn parse_console_answer(input: &str) -> ApprovalDecision {
    let trimmed = input.trim();
    match trimmed.to_lowercase().as_str() {
        "y" | "yes" => ApprovalDecision::approved(),
        "" | "n" | "no" => ApprovalDecision::rejected().with_comment("Rejected via console"),
        _ => ApprovalDecision::rejected().with_comment(trimmed),
    }
}

#[async_trait]
impl NotificationChannel for ConsoleChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Console
    }

    async fn submit(
        &self,
        request: &ApprovalRequest,
        broker: &DecisionBroker,
    ) -> Result<DecisionHandle> {
        let input = self.input();
        input.discard_buffered().await;

        print_prompt(request)
            .map_err(|e| ApprovalError::channel_unavailable(&self.name, e.to_string()))?;

        let handle = broker.register(request);
        let id = request.id();
        let broker = broker.clone();

        let watcher = tokio::spawn(async move {
            let Some(answer) = input.next_line().await else {
                tracing::warn!("Console input closed before {} was answered", id);
                return;
            };

            if let Err(e) = broker.resolve(id, parse_console_answer(&answer)) {
                tracing::debug!("Console answer for {} ignored: {}", id, e);
            }
        });

        Ok(handle.with_watcher(watcher))
    }
}
