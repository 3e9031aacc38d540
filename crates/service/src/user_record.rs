//! Request payload model for user records.
//!
//! A record is a flat JSON object. Values are restricted to strings,
//! numbers, booleans and null because the store only holds string
//! field/value pairs; nested objects and arrays are rejected rather than
//! stringified.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::errors::ServiceError;

/// Prefix every user key is stored under.
pub const KEY_PREFIX: &str = "user:";

pub const ID_FIELD: &str = "id";

/// Storage key for a user id: `KEY_PREFIX` followed by the id verbatim.
pub fn storage_key(id: &str) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// A scalar JSON value accepted as a hash field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Number(Number),
    Bool(bool),
    Null,
}

impl FieldValue {
    /// Text written to the store.
    ///
    /// Strings are kept as-is. Numbers are re-serialized by serde_json, so
    /// integers stay integers (`42`) and floats are rendered in shortest
    /// decimal form (`3.5`, `1e3` becomes `1000.0`). Booleans become
    /// `true`/`false` and null becomes the empty string.
    pub fn to_field_string(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Null => String::new(),
        }
    }

    fn from_json(field: &str, value: Value) -> Result<Self, ServiceError> {
        match value {
            Value::String(s) => Ok(Self::String(s)),
            Value::Number(n) => Ok(Self::Number(n)),
            Value::Bool(b) => Ok(Self::Bool(b)),
            Value::Null => Ok(Self::Null),
            Value::Array(_) | Value::Object(_) => Err(ServiceError::validation(format!(
                "field `{field}` must be a string, number, boolean or null"
            ))),
        }
    }
}

/// Validated create-request payload.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    id: String,
    fields: BTreeMap<String, FieldValue>,
}

impl UserRecord {
    /// Parse a request body. Fails with `ServiceError::Validation` when the
    /// body is not JSON, not an object, lacks a non-empty string `id`, or
    /// holds a nested value.
    pub fn from_json_slice(body: &[u8]) -> Result<Self, ServiceError> {
        let value: Value = serde_json::from_slice(body).map_err(|e| ServiceError::validation(e.to_string()))?;
        match value {
            Value::Object(map) => Self::from_object(map),
            _ => Err(ServiceError::validation("request body must be a JSON object")),
        }
    }

    fn from_object(map: Map<String, Value>) -> Result<Self, ServiceError> {
        let id = match map.get(ID_FIELD) {
            None => return Err(ServiceError::validation("missing required field `id`")),
            Some(Value::String(s)) if s.is_empty() => {
                return Err(ServiceError::validation("field `id` must not be empty"))
            }
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(ServiceError::validation("field `id` must be a string")),
        };

        let fields = map
            .into_iter()
            .map(|(name, value)| {
                let v = FieldValue::from_json(&name, value)?;
                Ok((name, v))
            })
            .collect::<Result<BTreeMap<_, _>, ServiceError>>()?;

        Ok(Self { id, fields })
    }

    pub fn id(&self) -> &str { &self.id }

    pub fn storage_key(&self) -> String { storage_key(&self.id) }

    /// Field/value pairs as written to the store. `id` is included.
    pub fn to_store_fields(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_field_string()))
            .collect()
    }
}
