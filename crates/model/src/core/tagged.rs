use crate::core::value::Value;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use thiserror::Error;

/// One raw record as produced by the source system: attribute name to raw
/// JSON value. Classification into the tagged union happens per field at
/// decode time, so a malformed tag payload fails that record alone and
/// never the page it arrived on.
pub type RawRecord = serde_json::Map<String, JsonValue>;

/// Wire representation of one field: a single-member tagged union.
///
/// The tag set is closed; numbers travel as their exact decimal string.
/// Serialization produces the source wire shape, e.g. `{"N": "42"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TaggedValue {
    #[serde(rename = "S")]
    String(String),
    #[serde(rename = "N")]
    Number(String),
    #[serde(rename = "B")]
    Binary(String),
    #[serde(rename = "BOOL")]
    Boolean(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "SS")]
    StringSet(Vec<String>),
    #[serde(rename = "NS")]
    NumberSet(Vec<String>),
    #[serde(rename = "BS")]
    BinarySet(Vec<String>),
    #[serde(rename = "M")]
    Map(BTreeMap<String, TaggedValue>),
    #[serde(rename = "L")]
    List(Vec<TaggedValue>),
}

/// A JSON value that claims a known tag but carries the wrong payload shape.
#[derive(Debug, Error, PartialEq)]
#[error("tag '{tag}' expects {expected}, got {found}")]
pub struct TagShapeError {
    pub tag: &'static str,
    pub expected: &'static str,
    pub found: String,
}

const TAGS: [&str; 10] = ["S", "N", "B", "BOOL", "NULL", "SS", "NS", "BS", "M", "L"];

impl TaggedValue {
    /// Classifies raw JSON into the tagged union.
    ///
    /// Upstream client layers sometimes partially pre-decode nested
    /// structures, so anything that is not a single-key object with a known
    /// tag is normalized by its runtime shape: plain maps and lists recurse,
    /// scalars map onto their obvious tag.
    pub fn from_json(raw: &JsonValue) -> Result<TaggedValue, TagShapeError> {
        if let JsonValue::Object(map) = raw
            && map.len() == 1
        {
            let (key, payload) = map.iter().next().expect("single-entry object");
            if TAGS.contains(&key.as_str()) {
                return Self::from_tagged(key, payload);
            }
        }

        match raw {
            JsonValue::String(s) => Ok(TaggedValue::String(s.clone())),
            JsonValue::Number(n) => Ok(TaggedValue::Number(n.to_string())),
            JsonValue::Bool(b) => Ok(TaggedValue::Boolean(*b)),
            JsonValue::Null => Ok(TaggedValue::Null(true)),
            JsonValue::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(TaggedValue::List),
            JsonValue::Object(map) => map
                .iter()
                .map(|(name, value)| Self::from_json(value).map(|v| (name.clone(), v)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(TaggedValue::Map),
        }
    }

    fn from_tagged(tag: &str, payload: &JsonValue) -> Result<TaggedValue, TagShapeError> {
        let shape_err = |expected: &'static str| TagShapeError {
            tag: TAGS.iter().find(|t| **t == tag).expect("known tag"),
            expected,
            found: short_shape(payload),
        };

        match tag {
            "S" => payload
                .as_str()
                .map(|s| TaggedValue::String(s.to_string()))
                .ok_or_else(|| shape_err("a string")),
            // Numbers normally travel as strings; a bare JSON number shows
            // up when an upstream layer already unwrapped the decimal.
            "N" => match payload {
                JsonValue::String(s) => Ok(TaggedValue::Number(s.clone())),
                JsonValue::Number(n) => Ok(TaggedValue::Number(n.to_string())),
                _ => Err(shape_err("a decimal string")),
            },
            "B" => payload
                .as_str()
                .map(|s| TaggedValue::Binary(s.to_string()))
                .ok_or_else(|| shape_err("a base64 string")),
            "BOOL" => payload
                .as_bool()
                .map(TaggedValue::Boolean)
                .ok_or_else(|| shape_err("a boolean")),
            "NULL" => payload
                .as_bool()
                .map(TaggedValue::Null)
                .ok_or_else(|| shape_err("a boolean")),
            "SS" => string_items(payload)
                .map(TaggedValue::StringSet)
                .ok_or_else(|| shape_err("an array of strings")),
            "NS" => number_items(payload)
                .map(TaggedValue::NumberSet)
                .ok_or_else(|| shape_err("an array of decimal strings")),
            "BS" => string_items(payload)
                .map(TaggedValue::BinarySet)
                .ok_or_else(|| shape_err("an array of base64 strings")),
            "M" => match payload {
                JsonValue::Object(map) => map
                    .iter()
                    .map(|(name, value)| Self::from_json(value).map(|v| (name.clone(), v)))
                    .collect::<Result<BTreeMap<_, _>, _>>()
                    .map(TaggedValue::Map),
                _ => Err(shape_err("an object")),
            },
            "L" => match payload {
                JsonValue::Array(items) => items
                    .iter()
                    .map(Self::from_json)
                    .collect::<Result<Vec<_>, _>>()
                    .map(TaggedValue::List),
                _ => Err(shape_err("an array")),
            },
            _ => unreachable!("caller checked tag membership"),
        }
    }
}

fn string_items(payload: &JsonValue) -> Option<Vec<String>> {
    payload.as_array().and_then(|items| {
        items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect()
    })
}

fn number_items(payload: &JsonValue) -> Option<Vec<String>> {
    payload.as_array().and_then(|items| {
        items
            .iter()
            .map(|item| match item {
                JsonValue::String(s) => Some(s.clone()),
                JsonValue::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect()
    })
}

fn short_shape(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "null".into(),
        JsonValue::Bool(_) => "a boolean".into(),
        JsonValue::Number(_) => "a number".into(),
        JsonValue::String(_) => "a string".into(),
        JsonValue::Array(_) => "an array".into(),
        JsonValue::Object(_) => "an object".into(),
    }
}

/// Wraps a canonical value back into its tagged form. Used to check the
/// decode round trip; floats with zero fractional part intentionally wrap
/// to the same decimal string an integer would.
impl From<&Value> for TaggedValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => TaggedValue::String(s.clone()),
            Value::Int(i) => TaggedValue::Number(i.to_string()),
            Value::Float(f) => TaggedValue::Number(format!("{f:?}")),
            Value::Boolean(b) => TaggedValue::Boolean(*b),
            Value::StringArray(items) => TaggedValue::StringSet(items.clone()),
            Value::Array(items) => TaggedValue::List(items.iter().map(Self::from).collect()),
            Value::Map(entries) => TaggedValue::Map(
                entries
                    .iter()
                    .map(|(name, v)| (name.clone(), Self::from(v)))
                    .collect(),
            ),
            Value::Null => TaggedValue::Null(true),
        }
    }
}
