//! Flat records mapping column names to values.
//!
//! A `Record` serves both as a row being written and as match criteria
//! for reads, updates and deletes. Iteration order is sorted column
//! order, so identical records always generate identical SQL.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::value::Value;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn as_integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(Value::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(Value::Real(f)) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_blob(&self, name: &str) -> Option<&[u8]> {
        match self.values.get(name) {
            Some(Value::Blob(b)) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// The SQLite rowid, present on every record returned by a read
    pub fn rowid(&self) -> Option<i64> {
        self.as_integer("rowid")
    }

    /// Build a record from a flat JSON object
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let object = json.as_object().ok_or_else(|| {
            Error::UnsupportedValue(format!("expected a JSON object, got {json}"))
        })?;
        let mut record = Record::new();
        for (name, value) in object {
            record.set(name.as_str(), Value::from_json(value)?);
        }
        Ok(record)
    }

    /// Flat JSON object form of the record
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut object = serde_json::Map::new();
        for (name, value) in self.iter() {
            object.insert(name.to_string(), value.to_json()?);
        }
        Ok(serde_json::Value::Object(object))
    }

    /// Build a record from any serializable struct with flat fields
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self> {
        let json = serde_json::to_value(value)?;
        Self::from_json(&json)
    }

    /// Deserialize the record into a typed struct
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_json()?)?)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Terse record construction: `record! { "name" => "bob", "age" => 42 }`
#[macro_export]
macro_rules! record {
    () => { $crate::Record::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $( record.set($name, $value); )+
        record
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_and_readers() {
        let r = Record::new()
            .with("name", "bob")
            .with("age", 42)
            .with("score", 3.5)
            .with("photo", vec![1u8, 2, 3])
            .with("note", None::<&str>);
        assert_eq!(r.as_text("name"), Some("bob"));
        assert_eq!(r.as_integer("age"), Some(42));
        assert_eq!(r.as_real("score"), Some(3.5));
        assert_eq!(r.as_blob("photo"), Some(&[1u8, 2, 3][..]));
        assert_eq!(r.get("note"), Some(&Value::Null));
        assert_eq!(r.as_text("age"), None);
        assert!(r.rowid().is_none());
    }

    #[test]
    fn iteration_is_sorted() {
        let r = record! { "b" => 2, "a" => 1, "c" => 3 };
        let columns: Vec<&str> = r.columns().collect();
        assert_eq!(columns, vec!["a", "b", "c"]);
    }

    #[test]
    fn json_object_round_trip() {
        let json = serde_json::json!({"name": "alice", "age": 30, "note": null});
        let record = Record::from_json(&json).unwrap();
        assert_eq!(record.as_text("name"), Some("alice"));
        assert_eq!(record.as_integer("age"), Some(30));
        assert_eq!(record.to_json().unwrap(), json);

        assert!(Record::from_json(&serde_json::json!([1])).is_err());
        assert!(Record::from_json(&serde_json::json!({"nested": {"a": 1}})).is_err());
    }
}
