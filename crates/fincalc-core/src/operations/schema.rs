//! Minimal JSON Schema builder for operation parameters.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// An object schema: named properties plus the required subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: BTreeMap<String, PropertySchema>,
    pub required: Vec<String>,
}

impl InputSchema {
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    pub fn property(mut self, name: &str, schema: PropertySchema, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, PropertySchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl PropertySchema {
    fn typed(schema_type: &str, description: &str) -> Self {
        Self {
            schema_type: schema_type.to_string(),
            description: description.to_string(),
            ..Self::default()
        }
    }

    /// Decimal quantity. Accepted as a JSON number or a numeric string.
    pub fn number(description: &str) -> Self {
        Self::typed("number", description)
    }

    pub fn integer(description: &str) -> Self {
        Self::typed("integer", description)
    }

    pub fn boolean(description: &str) -> Self {
        Self::typed("boolean", description)
    }

    pub fn string(description: &str) -> Self {
        Self::typed("string", description)
    }

    pub fn enum_type(description: &str, values: &[&str]) -> Self {
        Self {
            enum_values: Some(values.iter().map(|v| v.to_string()).collect()),
            ..Self::typed("string", description)
        }
    }

    pub fn array(description: &str, items: PropertySchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::typed("array", description)
        }
    }

    /// Nested object built from another [`InputSchema`].
    pub fn object(description: &str, schema: InputSchema) -> Self {
        Self {
            properties: Some(schema.properties),
            required: Some(schema.required),
            ..Self::typed("object", description)
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.minimum = Some(min);
        self.maximum = Some(max);
        self
    }

    pub fn with_minimum(mut self, min: f64) -> Self {
        self.minimum = Some(min);
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}
