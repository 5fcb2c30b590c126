//! Parser for tool calls in chat-completion responses

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{error::AgentRuntimeError, Result};

/// A tool call extracted from an LLM response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call id; tool results answer it
    pub id: String,

    /// Name of the tool to call
    pub name: String,

    /// Parameters for the tool
    pub parameters: Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, parameters: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parameters,
        }
    }

    /// The call in OpenAI wire format, for echoing in the assistant turn
    pub fn to_wire(&self) -> Value {
        json!({
            "id": self.id,
            "type": "function",
            "function": {
                "name": self.name,
                "arguments": self.parameters.to_string(),
            }
        })
    }
}

/// The first choice's message of a chat-completion response
pub fn response_message(raw: &Value) -> Result<&Value> {
    raw.get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| AgentRuntimeError::parse("No choices[0].message in response"))
}

/// Text content of a response message, empty when absent
pub fn message_content(message: &Value) -> &str {
    message.get("content").and_then(Value::as_str).unwrap_or("")
}

/// Parse OpenAI tool calls from a response message
///
/// OpenAI returns tool calls in this format:
/// ```json
/// {
///   "tool_calls": [{
///     "id": "call_abc",
///     "type": "function",
///     "function": {
///       "name": "check_inventory",
///       "arguments": "{\"item\": \"pens\"}"
///     }
///   }]
/// }
/// ```
///
/// A message without `tool_calls` yields no calls. Some backends send the
/// arguments as an object rather than a string; both are accepted. Calls
/// without an id get `call_<index>`.
pub fn parse_openai_tool_calls(message: &Value) -> Result<Vec<ToolCall>> {
    let tool_calls = match message.get("tool_calls") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(calls)) => calls,
        Some(_) => return Err(AgentRuntimeError::parse("tool_calls is not an array")),
    };

    let mut parsed_calls = Vec::with_capacity(tool_calls.len());

    for (index, call) in tool_calls.iter().enumerate() {
        let id = call
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("call_{}", index));

        let function = call
            .get("function")
            .ok_or_else(|| AgentRuntimeError::parse("Missing function field"))?;

        let name = function
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentRuntimeError::parse("Missing function name"))?;

        let parameters = match function.get("arguments") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(Value::String(text)) if text.trim().is_empty() => Value::Object(Map::new()),
            Some(Value::String(text)) => serde_json::from_str(text).map_err(|e| {
                AgentRuntimeError::parse(format!("Invalid JSON arguments for {}: {}", name, e))
            })?,
            Some(other) => other.clone(),
        };

        parsed_calls.push(ToolCall::new(id, name, parameters));
    }

    Ok(parsed_calls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_openai_tool_call() {
        let message = json!({
            "tool_calls": [{
                "id": "call_123",
                "type": "function",
                "function": {
                    "name": "purchase_basic_item",
                    "arguments": "{\"item\": \"paper clips\", \"quantity\": 50}"
                }
            }]
        });

        let calls = parse_openai_tool_calls(&message).unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_123");
        assert_eq!(calls[0].name, "purchase_basic_item");
        assert_eq!(calls[0].parameters["quantity"], 50);
    }

    #[test]
    fn test_parse_multiple_and_lenient_arguments() {
        let message = json!({
            "tool_calls": [
                {"function": {"name": "get_budget", "arguments": ""}},
                {"id": "call_b", "function": {"name": "check_inventory", "arguments": {"item": "pens"}}}
            ]
        });

        let calls = parse_openai_tool_calls(&message).unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "call_0");
        assert_eq!(calls[0].parameters, json!({}));
        assert_eq!(calls[1].parameters["item"], "pens");
    }

    #[test]
    fn test_no_tool_calls() {
        let message = json!({"role": "assistant", "content": "Budget is fine."});
        assert!(parse_openai_tool_calls(&message).unwrap().is_empty());

        let message = json!({"content": "Done", "tool_calls": null});
        assert!(parse_openai_tool_calls(&message).unwrap().is_empty());
    }

    #[test]
    fn test_parse_invalid_arguments() {
        let message = json!({
            "tool_calls": [{
                "id": "call_123",
                "function": {"name": "get_budget", "arguments": "invalid json {"}
            }]
        });

        let err = parse_openai_tool_calls(&message).unwrap_err();
        assert!(matches!(err, AgentRuntimeError::ToolCallParse(_)));
    }

    #[test]
    fn test_response_message() {
        let raw = json!({"choices": [{"message": {"content": "Hello"}}]});
        let message = response_message(&raw).unwrap();
        assert_eq!(message_content(message), "Hello");

        assert!(response_message(&json!({"choices": []})).is_err());
        assert_eq!(message_content(&json!({"content": null})), "");
    }

    #[test]
    fn test_wire_round() {
        let call = ToolCall::new("call_9", "get_budget", json!({}));
        let wire = call.to_wire();
        let parsed = parse_openai_tool_calls(&json!({"tool_calls": [wire]})).unwrap();
        assert_eq!(parsed, vec![call]);
    }
}
