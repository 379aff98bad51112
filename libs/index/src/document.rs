//! Indexed event documents

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// One indexed event: an id plus its stored fields.
///
/// Multi-valued fields are stored as JSON arrays. Scalars are read back as
/// single-element value lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, JsonValue>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.fields.get(field)
    }

    /// All values of a field as strings, in stored order. Arrays are
    /// flattened one level, nulls skipped, numbers and booleans stringified.
    pub fn values(&self, field: &str) -> Vec<String> {
        match self.fields.get(field) {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(JsonValue::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
            Some(other) => scalar_to_string(other).into_iter().collect(),
        }
    }

    /// Copy of the document restricted to the given fields. An empty field
    /// list keeps everything.
    pub fn projection(&self, fields: &[String]) -> Document {
        if fields.is_empty() {
            return self.clone();
        }
        let mut projected = Map::new();
        for field in fields {
            if let Some(value) = self.fields.get(field) {
                projected.insert(field.clone(), value.clone());
            }
        }
        Document {
            id: self.id.clone(),
            fields: projected,
        }
    }
}

fn scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}
