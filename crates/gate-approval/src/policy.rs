//! Policy evaluation
//!
//! Maps an operation name and its arguments to a [`Verdict`]. Rules are
//! evaluated in order and the first match wins. When nothing matches, or the
//! operation has no policy at all, the verdict is
//! [`Verdict::RequireApproval`]: evaluation never fails open.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::request::{opt_duration_secs, Arguments};

/// Outcome of policy evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Run the call without asking anyone
    AutoApprove,
    /// Ask a human first
    RequireApproval,
}

/// Predicate over a call's arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Matches every call
    Always,

    /// Numeric argument strictly greater than `threshold`
    ArgumentAbove {
        /// Argument name
        argument: String,
        /// Threshold
        threshold: f64,
    },

    /// Numeric argument less than or equal to `threshold`
    ArgumentAtMost {
        /// Argument name
        argument: String,
        /// Threshold
        threshold: f64,
    },

    /// Argument equal to a JSON value (strings compare case-insensitively)
    ArgumentEquals {
        /// Argument name
        argument: String,
        /// Expected value
        value: Value,
    },
}

impl Condition {
    /// Check the condition against call arguments
    ///
    /// Numeric conditions never match a missing or non-numeric argument.
    pub fn matches(&self, arguments: &Arguments) -> bool {
        match self {
            Condition::Always => true,
            Condition::ArgumentAbove {
                argument,
                threshold,
            } => numeric_argument(arguments, argument).is_some_and(|v| v > *threshold),
            Condition::ArgumentAtMost {
                argument,
                threshold,
            } => numeric_argument(arguments, argument).is_some_and(|v| v <= *threshold),
            Condition::ArgumentEquals { argument, value } => match (arguments.get(argument), value)
            {
                (Some(Value::String(actual)), Value::String(expected)) => {
                    actual.trim().eq_ignore_ascii_case(expected.trim())
                }
                (Some(actual), expected) => actual == expected,
                (None, _) => false,
            },
        }
    }
}

/// Read an argument as a number
///
/// Accepts JSON numbers and strings such as `"$89,000"` or `"800.50"`.
fn numeric_argument(arguments: &Arguments, name: &str) -> Option<f64> {
    match arguments.get(name)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// One ordered policy rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// When the rule applies
    pub when: Condition,
    /// Verdict if it applies
    pub then: Verdict,
}

impl PolicyRule {
    /// Create a rule
    pub fn new(when: Condition, then: Verdict) -> Self {
        Self { when, then }
    }

    /// Auto-approve when the condition holds
    pub fn auto_approve_when(when: Condition) -> Self {
        Self::new(when, Verdict::AutoApprove)
    }

    /// Require approval when the condition holds
    pub fn require_approval_when(when: Condition) -> Self {
        Self::new(when, Verdict::RequireApproval)
    }
}

/// Policy of a single gated operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationPolicy {
    /// Ordered rules, first match wins
    #[serde(default)]
    pub rules: Vec<PolicyRule>,

    /// Per-operation timeout override
    #[serde(
        default,
        rename = "timeout_secs",
        with = "opt_duration_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,

    /// Per-operation channel override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl OperationPolicy {
    /// Policy with no rules (every call requires approval)
    pub fn new() -> Self {
        Self::default()
    }

    /// Auto-approve while `argument <= limit`, require approval above it
    pub fn threshold<S: Into<String>>(argument: S, limit: f64) -> Self {
        let argument = argument.into();
        Self::new()
            .with_rule(PolicyRule::auto_approve_when(Condition::ArgumentAtMost {
                argument: argument.clone(),
                threshold: limit,
            }))
            .with_rule(PolicyRule::require_approval_when(Condition::ArgumentAbove {
                argument,
                threshold: limit,
            }))
    }

    /// Every call requires approval
    pub fn always_require() -> Self {
        Self::new().with_rule(PolicyRule::require_approval_when(Condition::Always))
    }

    /// Append a rule
    pub fn with_rule(mut self, rule: PolicyRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Set the timeout override
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the channel override
    pub fn with_channel<S: Into<String>>(mut self, channel: S) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Evaluate the rules against call arguments
    pub fn evaluate(&self, arguments: &Arguments) -> Verdict {
        self.rules
            .iter()
            .find(|rule| rule.when.matches(arguments))
            .map(|rule| rule.then)
            .unwrap_or(Verdict::RequireApproval)
    }
}

/// Policies of all gated operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Policy {
    operations: HashMap<String, OperationPolicy>,
}

impl Policy {
    /// Create an empty policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one operation's policy
    pub fn with_operation<S: Into<String>>(mut self, name: S, policy: OperationPolicy) -> Self {
        self.operations.insert(name.into(), policy);
        self
    }

    /// Look up an operation's policy
    pub fn operation(&self, name: &str) -> Option<&OperationPolicy> {
        self.operations.get(name)
    }

    /// Whether the operation is designated as gated
    pub fn is_gated(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// Names of all gated operations
    pub fn gated_operations(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Evaluate a call
    pub fn evaluate(&self, name: &str, arguments: &Arguments) -> Verdict {
        let verdict = match self.operations.get(name) {
            Some(policy) => policy.evaluate(arguments),
            None => Verdict::RequireApproval,
        };
        tracing::debug!("Policy verdict for {}: {:?}", name, verdict);
        verdict
    }
}
