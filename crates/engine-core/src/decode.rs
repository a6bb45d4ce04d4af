use crate::error::DecodeError;
use bigdecimal::{BigDecimal, ToPrimitive};
use model::{
    core::{
        tagged::{RawRecord, TaggedValue},
        value::Value,
    },
    records::record::Record,
};
use std::{collections::BTreeMap, str::FromStr};

/// Decodes one raw item into a record, field by field: each field is
/// classified into the tagged union and then canonicalized. Either step
/// failing fails this record only.
pub fn decode_record(item: &RawRecord) -> Result<Record, DecodeError> {
    let mut fields = BTreeMap::new();
    for (name, value) in item {
        let tagged = TaggedValue::from_json(value)?;
        fields.insert(name.clone(), decode(&tagged)?);
    }
    Ok(Record::from_fields(fields))
}

/// Converts one tagged value into its single canonical form.
///
/// Deterministic, and total for well-formed input: the only failure mode is
/// a number payload that does not parse as a decimal.
pub fn decode(value: &TaggedValue) -> Result<Value, DecodeError> {
    match value {
        TaggedValue::String(s) => Ok(Value::String(s.clone())),
        TaggedValue::Number(n) => decode_number(n),
        // Binary payloads stay in their transport encoding.
        TaggedValue::Binary(b) => Ok(Value::String(b.clone())),
        TaggedValue::Boolean(b) => Ok(Value::Boolean(*b)),
        TaggedValue::Null(_) => Ok(Value::Null),
        TaggedValue::StringSet(items) => Ok(Value::StringArray(items.clone())),
        TaggedValue::BinarySet(items) => Ok(Value::StringArray(items.clone())),
        // Number sets are treated as numeric arrays; the integer/float
        // distinction is not kept for set members.
        TaggedValue::NumberSet(items) => items
            .iter()
            .map(|n| decode_set_number(n))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        TaggedValue::Map(entries) => entries
            .iter()
            .map(|(name, v)| decode(v).map(|v| (name.clone(), v)))
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Value::Map),
        TaggedValue::List(items) => items
            .iter()
            .map(decode)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
    }
}

/// Exact decimal rule: zero fractional part decodes to an integer, anything
/// else to a float. Exact integers outside the i64 range degrade to float.
fn decode_number(raw: &str) -> Result<Value, DecodeError> {
    let decimal =
        BigDecimal::from_str(raw.trim()).map_err(|_| DecodeError::Number(raw.to_string()))?;

    if decimal.is_integer()
        && let Some(int) = decimal.to_i64()
    {
        return Ok(Value::Int(int));
    }

    decimal
        .to_f64()
        .map(Value::Float)
        .ok_or_else(|| DecodeError::Number(raw.to_string()))
}

fn decode_set_number(raw: &str) -> Result<Value, DecodeError> {
    BigDecimal::from_str(raw.trim())
        .ok()
        .and_then(|d| d.to_f64())
        .map(Value::Float)
        .ok_or_else(|| DecodeError::Number(raw.to_string()))
}
