//! JSON Schema for tool parameters

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// JSON Schema for tool parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Always "object" for tool parameters
    #[serde(rename = "type")]
    pub schema_type: String,

    /// Properties of the object
    pub properties: Value,

    /// Required properties
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Description of the schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ToolSchema {
    /// Schema for a tool that takes no parameters
    pub fn new() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: Value::Object(Map::new()),
            required: Vec::new(),
            description: None,
        }
    }

    /// Derive the schema from a parameters struct
    ///
    /// Field doc comments become property descriptions; non-`Option` fields
    /// are required.
    pub fn from_type<T: JsonSchema>() -> Self {
        let root = serde_json::to_value(schema_for!(T)).unwrap_or(Value::Null);

        let properties = root
            .get("properties")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        let required = root
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let description = root
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            schema_type: "object".to_string(),
            properties,
            required,
            description,
        }
    }

    /// Set description
    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Names of the declared properties
    pub fn property_names(&self) -> Vec<&str> {
        self.properties
            .as_object()
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Convert to an OpenAI function descriptor
    pub fn to_openai_function(&self, name: &str, description: &str) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": name,
                "description": description,
                "parameters": self,
            }
        })
    }
}

impl Default for ToolSchema {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Purchase parameters
    #[derive(JsonSchema)]
    #[allow(dead_code)]
    struct PurchaseParams {
        /// Item to buy
        item: String,
        /// Units to buy
        quantity: u32,
        /// Optional note for the approver
        note: Option<String>,
    }

    #[test]
    fn test_empty_schema() {
        let schema = ToolSchema::new();
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value, json!({"type": "object", "properties": {}}));
    }

    #[test]
    fn test_from_type() {
        let schema = ToolSchema::from_type::<PurchaseParams>();

        assert_eq!(schema.schema_type, "object");
        assert_eq!(schema.required, vec!["item".to_string(), "quantity".to_string()]);
        assert_eq!(schema.properties["item"]["type"], "string");
        assert_eq!(schema.properties["item"]["description"], "Item to buy");
        assert_eq!(schema.properties["quantity"]["type"], "integer");
        assert_eq!(schema.description.as_deref(), Some("Purchase parameters"));

        let mut names = schema.property_names();
        names.sort_unstable();
        assert_eq!(names, vec!["item", "note", "quantity"]);
    }

    #[test]
    fn test_openai_format() {
        let schema = ToolSchema::from_type::<PurchaseParams>();
        let function = schema.to_openai_function("purchase_basic_item", "Purchase basic office supplies");

        assert_eq!(function["type"], "function");
        assert_eq!(function["function"]["name"], "purchase_basic_item");
        assert_eq!(function["function"]["parameters"]["type"], "object");
        assert_eq!(function["function"]["parameters"]["required"][0], "item");
    }
}
