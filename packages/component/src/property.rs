//! The property model for exported web components.
//!
//! Property values cross the client/server boundary, so the set of types is
//! a closed whitelist: boolean, string, 32-bit integer, 64-bit float and an
//! opaque JSON value. Everything else is unrepresentable by construction;
//! the checks that remain at runtime are value/declaration agreement.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WebComponentError};

/// The declared type of an exported property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Boolean,
    String,
    Integer,
    Double,
    Json,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyType::Boolean => "boolean",
            PropertyType::String => "string",
            PropertyType::Integer => "integer",
            PropertyType::Double => "double",
            PropertyType::Json => "json",
        };
        write!(f, "{}", name)
    }
}

/// A property value of one of the whitelisted types.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    String(String),
    Integer(i32),
    Double(f64),
    Json(serde_json::Value),
}

impl PropertyValue {
    /// The type tag of this value.
    pub fn kind(&self) -> PropertyType {
        match self {
            PropertyValue::Boolean(_) => PropertyType::Boolean,
            PropertyValue::String(_) => PropertyType::String,
            PropertyValue::Integer(_) => PropertyType::Integer,
            PropertyValue::Double(_) => PropertyType::Double,
            PropertyValue::Json(_) => PropertyType::Json,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Boolean(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Integer(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Double(v)
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(v: serde_json::Value) -> Self {
        PropertyValue::Json(v)
    }
}

/// Descriptor of one exported property: name, declared type, default value
/// and the read-only flag.
///
/// Immutable once constructed, except that read-only may be escalated once
/// via [`PropertyData::make_read_only`] and never lowered again.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyData {
    name: String,
    kind: PropertyType,
    default: Option<PropertyValue>,
    read_only: bool,
}

impl PropertyData {
    /// Create a descriptor, rejecting a default value whose type does not
    /// match the declared one. `None` models a null default.
    pub fn new(
        name: impl Into<String>,
        kind: PropertyType,
        default: Option<PropertyValue>,
    ) -> Result<Self> {
        let name = name.into();
        if let Some(default_value) = &default {
            if default_value.kind() != kind {
                return Err(WebComponentError::DefaultTypeMismatch {
                    name,
                    expected: kind,
                    actual: default_value.kind(),
                });
            }
        }
        Ok(PropertyData {
            name,
            kind,
            default,
            read_only: false,
        })
    }

    /// The property name, unique within a configuration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type.
    pub fn kind(&self) -> PropertyType {
        self.kind
    }

    /// The default value delivered at binding creation.
    pub fn default_value(&self) -> Option<&PropertyValue> {
        self.default.as_ref()
    }

    /// Whether external writes are rejected.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Escalate to read-only. One-way: there is no way back.
    pub fn make_read_only(&mut self) {
        self.read_only = true;
    }
}
