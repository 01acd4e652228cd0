// Function-calling types shared by every provider.
//
// A `ToolDescriptor` serializes to the JSON-schema shape used by
// OpenAI-compatible chat APIs (name, description, parameters). Providers wrap
// it in whatever envelope their API expects.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A custom function that the model can call.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    /// The model uses this to decide when to call the function.
    pub description: String,
    pub parameters: ToolParameters,
}

/// JSON Schema for function parameters.
#[derive(Debug, Clone, Serialize)]
pub struct ToolParameters {
    /// Always "object" for function parameters.
    #[serde(rename = "type")]
    pub param_type: String,
    pub properties: BTreeMap<String, PropertySchema>,
    pub required: Vec<String>,
}

/// Schema for a single parameter.
#[derive(Debug, Clone, Serialize)]
pub struct PropertySchema {
    /// JSON Schema type: "string", "integer", "boolean", ...
    #[serde(rename = "type")]
    pub prop_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl PropertySchema {
    pub fn new(prop_type: &str, description: impl Into<String>) -> Self {
        Self {
            prop_type: prop_type.to_string(),
            description: Some(description.into()),
            default: None,
        }
    }

    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }
}

impl ToolDescriptor {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters: ToolParameters {
                param_type: "object".to_string(),
                properties: BTreeMap::new(),
                required: Vec::new(),
            },
        }
    }

    /// Adds a parameter. Required parameters are listed in the order added.
    pub fn property(mut self, name: &str, schema: PropertySchema, required: bool) -> Self {
        self.parameters.properties.insert(name.to_string(), schema);
        if required {
            self.parameters.required.push(name.to_string());
        }
        self
    }
}

/// A function call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON arguments exactly as the model produced them.
    pub arguments: String,
}
