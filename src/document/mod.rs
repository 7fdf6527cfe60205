//! Documents and their stored form
//!
//! A document is a field-name to value mapping with a store-assigned
//! identity. Values are dynamically typed (`serde_json::Value`): number,
//! string, boolean, null, nested mapping, or sequence.
//!
//! # Field name rules
//!
//! - Names are non-empty
//! - Names do not start with `$`
//! - Names do not contain `.`
//!
//! The rules apply at every nesting level, including mappings held inside
//! sequences.

mod checksum;
mod record;

pub(crate) use record::StoredRecord;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{StoreError, StoreResult};

/// Store-assigned document identity
///
/// Identities are strictly increasing in insertion order and never reused
/// by the collection that assigned them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(u64);

impl DocumentId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    id: DocumentId,
    fields: Map<String, Value>,
}

impl Document {
    pub(crate) fn new(id: DocumentId, fields: Map<String, Value>) -> Self {
        Self { id, fields }
    }

    /// Returns the store-assigned identity
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Returns a top-level field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns all top-level fields
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Number of top-level fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Checks that `value` is a well-formed document and returns its fields.
pub(crate) fn check_document(value: &Value, max_depth: usize) -> StoreResult<&Map<String, Value>> {
    let fields = value.as_object().ok_or_else(|| {
        StoreError::invalid_document(format!(
            "expected a mapping, got {}",
            value_kind(value)
        ))
    })?;

    check_mapping(fields, 1, max_depth)?;

    Ok(fields)
}

fn check_mapping(fields: &Map<String, Value>, depth: usize, max_depth: usize) -> StoreResult<()> {
    if depth > max_depth {
        return Err(StoreError::invalid_document(format!(
            "nesting depth exceeds {}",
            max_depth
        )));
    }

    for (name, value) in fields {
        check_field_name(name)?;
        check_value(value, depth, max_depth)?;
    }

    Ok(())
}

fn check_value(value: &Value, depth: usize, max_depth: usize) -> StoreResult<()> {
    match value {
        Value::Object(nested) => check_mapping(nested, depth + 1, max_depth),
        Value::Array(items) => {
            if depth + 1 > max_depth {
                return Err(StoreError::invalid_document(format!(
                    "nesting depth exceeds {}",
                    max_depth
                )));
            }
            items
                .iter()
                .try_for_each(|item| check_value(item, depth + 1, max_depth))
        }
        _ => Ok(()),
    }
}

fn check_field_name(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::invalid_document("field name is empty"));
    }
    if name.starts_with('$') {
        return Err(StoreError::invalid_document(format!(
            "field name '{}' starts with '$'",
            name
        )));
    }
    if name.contains('.') {
        return Err(StoreError::invalid_document(format!(
            "field name '{}' contains '.'",
            name
        )));
    }
    Ok(())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_plain_mapping() {
        let value = json!({"a": 1, "b": "x", "c": null, "d": [1, {"e": true}]});
        let fields = check_document(&value, 100).unwrap();
        assert_eq!(fields.len(), 4);
    }

    #[test]
    fn test_accepts_empty_mapping() {
        assert!(check_document(&json!({}), 100).is_ok());
    }

    #[test]
    fn test_rejects_non_mapping() {
        for value in [json!(1), json!("a"), json!([{"a": 1}]), json!(null), json!(true)] {
            let err = check_document(&value, 100).unwrap_err();
            assert_eq!(err.code(), "DOCSTORE_INVALID_DOCUMENT");
        }
    }

    #[test]
    fn test_rejects_bad_field_names() {
        for value in [
            json!({"": 1}),
            json!({"$set": 1}),
            json!({"a.b": 1}),
            json!({"outer": {"$inner": 1}}),
            json!({"list": [{"x.y": 1}]}),
        ] {
            assert!(check_document(&value, 100).is_err(), "{}", value);
        }
    }

    #[test]
    fn test_dollar_allowed_inside_name() {
        assert!(check_document(&json!({"price$": 1}), 100).is_ok());
    }

    #[test]
    fn test_depth_limit() {
        let value = json!({"a": {"b": {"c": 1}}});
        assert!(check_document(&value, 3).is_ok());
        assert!(check_document(&value, 2).is_err());

        let value = json!({"a": [[1]]});
        assert!(check_document(&value, 3).is_ok());
        assert!(check_document(&value, 2).is_err());
    }

    #[test]
    fn test_document_accessors() {
        let mut fields = Map::new();
        fields.insert("a".into(), json!(1));
        let doc = Document::new(DocumentId::new(5), fields);

        assert_eq!(doc.id(), DocumentId::new(5));
        assert_eq!(doc.get("a"), Some(&json!(1)));
        assert_eq!(doc.get("b"), None);
        assert_eq!(doc.len(), 1);
        assert!(!doc.is_empty());
    }

    #[test]
    fn test_document_id_ordering() {
        assert!(DocumentId::new(1) < DocumentId::new(2));
        assert_eq!(DocumentId::new(9).to_string(), "9");
    }
}
