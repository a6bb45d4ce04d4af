use crate::core::value::Value;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::BTreeMap;

/// One decoded row, ready for upsert. Immutable once it enters a batch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    pub fn from_fields(fields: BTreeMap<String, Value>) -> Self {
        Record { fields }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Best-effort identity for diagnostics; upserts are keyed by the
    /// destination, not by this.
    pub fn id(&self) -> String {
        match self.fields.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Int(i)) => i.to_string(),
            _ => "unknown".to_string(),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        let mut map = JsonMap::with_capacity(self.fields.len());
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.to_json());
        }
        JsonValue::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_falls_back_to_unknown() {
        let record = Record::new();
        assert_eq!(record.id(), "unknown");

        let mut record = Record::new();
        record.insert("id", Value::Int(12));
        assert_eq!(record.id(), "12");
    }

    #[test]
    fn renders_plain_json() {
        let mut record = Record::new();
        record.insert("visits", Value::Int(3));
        record.insert("rate", Value::Float(0.25));
        let json = record.to_json();
        assert_eq!(json["visits"], 3);
        assert_eq!(json["rate"], 0.25);
    }
}
