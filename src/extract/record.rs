use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extracted fields of one page, in schema order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value, replacing any previous one
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Get a field value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Get a field as a string slice, if it holds a string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Whether a field holds something other than `null`, `""` or `[]`
    pub fn is_present(&self, name: &str) -> bool {
        match self.get(name) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(_) => true,
        }
    }

    /// Number of fields that are present
    pub fn count_present(&self) -> usize {
        self.fields.keys().filter(|name| self.is_present(name)).count()
    }

    /// Iterate over fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert into a JSON object value
    pub fn into_value(self) -> Value {
        Value::Object(self.fields.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_presence() {
        let mut record = Record::new();
        record.insert("name", json!("OpenAI"));
        record.insert("stage", Value::Null);
        record.insert("email", json!(""));
        record.insert("tags", json!([]));
        record.insert("founders", json!(["Sam"]));
        record.insert("year", json!(2015));

        assert!(record.is_present("name"));
        assert!(!record.is_present("stage"));
        assert!(!record.is_present("email"));
        assert!(!record.is_present("tags"));
        assert!(record.is_present("founders"));
        assert!(record.is_present("year"));
        assert!(!record.is_present("undefined"));
        assert_eq!(record.count_present(), 3);
    }

    #[test]
    fn test_serializes_in_insertion_order() {
        let mut record = Record::new();
        record.insert("zeta", json!("z"));
        record.insert("alpha", Value::Null);

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"zeta":"z","alpha":null}"#);
    }
}
