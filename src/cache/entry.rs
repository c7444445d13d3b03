//! Cache Entry Module
//!
//! Defines a single cached value together with its optional declared kind.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

// == Value Kind ==
/// Runtime type tag recorded for typed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Integer,
    Float,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// Returns the kind of a JSON value, or None for `null`.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(Self::Bool),
            Value::Number(n) if n.is_f64() => Some(Self::Float),
            Value::Number(_) => Some(Self::Integer),
            Value::String(_) => Some(Self::String),
            Value::Array(_) => Some(Self::Array),
            Value::Object(_) => Some(Self::Object),
        }
    }
}

// == Entry ==
/// A stored value plus the kind it was declared with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// The stored value
    pub value: Value,
    /// Declared kind, None = no type constraint
    #[serde(default)]
    pub declared_kind: Option<ValueKind>,
}

impl Entry {
    // == Constructors ==
    /// Wraps a value, recording its runtime kind.
    pub fn new(value: Value) -> Self {
        let declared_kind = ValueKind::of(&value);
        Self {
            value,
            declared_kind,
        }
    }

    /// Wraps a value without any type constraint.
    pub fn untyped(value: Value) -> Self {
        Self {
            value,
            declared_kind: None,
        }
    }

    /// Converts any serializable value into a typed entry.
    pub fn from_serialize<V: Serialize>(value: V) -> Result<Self> {
        Ok(Self::new(serde_json::to_value(value)?))
    }

    // == Is Valid ==
    /// True when no kind is declared or the value still matches it.
    pub fn is_valid(&self) -> bool {
        match self.declared_kind {
            Some(kind) => ValueKind::of(&self.value) == Some(kind),
            None => true,
        }
    }
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}
