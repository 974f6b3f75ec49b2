use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::ExitStatus;

/// Field holding the globally unique item identifier.
pub const UID_FIELD: &str = "item_uid";

/// Field appended exactly once when an item reaches a terminal state.
pub const EXIT_STATUS_FIELD: &str = "exit_status";

#[derive(Debug, Error)]
pub enum ItemError {
    #[error("item must be a json object, got {0}")]
    NotAnObject(&'static str),

    #[error("item field '{UID_FIELD}' must be a string")]
    UidNotAString,

    #[error("item record has no '{UID_FIELD}' field")]
    MissingUid,

    #[error("malformed item record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A unit of work carried through queue, running slot and history.
///
/// Items are open-ended ordered key/value records: every field except
/// [`UID_FIELD`] and [`EXIT_STATUS_FIELD`] is opaque to the queue engine.
/// Field order is preserved across a parse/serialize round trip, so a record
/// read back from the store re-serializes to the exact bytes that were
/// written. The store matches list elements byte-for-byte; that stability is
/// what makes targeted removal and relative insertion correct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(Map<String, Value>);

impl Item {
    /// Create an empty item (no UID yet).
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Validate an arbitrary JSON value as an item record.
    pub fn from_value(value: Value) -> Result<Self, ItemError> {
        match value {
            Value::Object(map) => {
                if let Some(uid) = map.get(UID_FIELD)
                    && !uid.is_string()
                {
                    return Err(ItemError::UidNotAString);
                }
                Ok(Self(map))
            }
            Value::Null => Err(ItemError::NotAnObject("null")),
            Value::Bool(_) => Err(ItemError::NotAnObject("bool")),
            Value::Number(_) => Err(ItemError::NotAnObject("number")),
            Value::String(_) => Err(ItemError::NotAnObject("string")),
            Value::Array(_) => Err(ItemError::NotAnObject("array")),
        }
    }

    /// Parse a serialized store record.
    pub fn from_json(text: &str) -> Result<Self, ItemError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Serialize for storage.
    pub fn to_json(&self) -> String {
        // A string-keyed map of json values cannot fail to serialize.
        serde_json::to_string(&self.0).expect("json object serialization is infallible")
    }

    pub fn uid(&self) -> Option<&str> {
        self.0.get(UID_FIELD).and_then(Value::as_str)
    }

    pub fn has_uid(&self) -> bool {
        self.uid().is_some()
    }

    pub fn set_uid(&mut self, uid: impl Into<String>) {
        self.0.insert(UID_FIELD.to_string(), Value::String(uid.into()));
    }

    pub fn exit_status(&self) -> Option<&str> {
        self.0.get(EXIT_STATUS_FIELD).and_then(Value::as_str)
    }

    pub fn set_exit_status(&mut self, status: ExitStatus) {
        self.0
            .insert(EXIT_STATUS_FIELD.to_string(), Value::String(status.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Builder-style field assignment, mostly for tests and demos.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }
}

impl Default for Item {
    fn default() -> Self {
        Self::new()
    }
}
