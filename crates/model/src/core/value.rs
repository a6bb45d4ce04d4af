use serde_json::{Map as JsonMap, Number, Value as JsonValue};
use std::{collections::BTreeMap, fmt};

/// Canonical, decoded representation of one field value.
///
/// Integers and floats are kept distinct: a source number with zero
/// fractional part decodes to `Int`, everything else to `Float`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Boolean(bool),
    StringArray(Vec<String>),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Null,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Plain JSON rendering, used for the upsert payload.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::String(v) => JsonValue::String(v.clone()),
            Value::Int(v) => JsonValue::Number(Number::from(*v)),
            Value::Float(v) => Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Boolean(v) => JsonValue::Bool(*v),
            Value::StringArray(items) => JsonValue::Array(
                items.iter().cloned().map(JsonValue::String).collect(),
            ),
            Value::Array(items) => {
                JsonValue::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) => {
                let mut map = JsonMap::with_capacity(entries.len());
                for (name, value) in entries {
                    map.insert(name.clone(), value.to_json());
                }
                JsonValue::Object(map)
            }
            Value::Null => JsonValue::Null,
        }
    }
}

impl From<&Value> for JsonValue {
    fn from(value: &Value) -> Self {
        value.to_json()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
