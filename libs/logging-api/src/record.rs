use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// Wire/store name of the identifier field.
pub const IDENTIFIER_FIELD: &str = "uuid";
/// Wire/store name of the aggregated payload.
pub const MESSAGE_FIELD: &str = "message";

/// A single log submission.
///
/// `identifier` is the store key. `message` is what aggregation reads.
/// Everything else the client sent is kept verbatim in `fields` and stored
/// alongside, so the stored value is the full submitted record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "uuid", alias = "identifier", default)]
    pub identifier: String,
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LogRecord {
    pub fn new(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            message: message.into(),
            fields: Map::new(),
        }
    }

    /// Attach an extra field. `uuid` and `message` are reserved and ignored here.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        if name != IDENTIFIER_FIELD && name != MESSAGE_FIELD {
            self.fields.insert(name, value.into());
        }
        self
    }

    /// Flatten into the value stored under `identifier`.
    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert(IDENTIFIER_FIELD.to_string(), Value::String(self.identifier.clone()));
        map.insert(MESSAGE_FIELD.to_string(), Value::String(self.message.clone()));
        Value::Object(map)
    }

    /// Rebuild a record from a stored value.
    pub fn from_value(value: Value) -> Result<Self, StoreError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// The `message` of a stored value, if it has a string one.
pub fn message_of(value: &Value) -> Option<&str> {
    value.get(MESSAGE_FIELD).and_then(Value::as_str)
}
