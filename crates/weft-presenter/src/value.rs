//! Tagged data values
//!
//! Data crosses the binding boundary exactly once, where it becomes a
//! [`Value`] with an explicit shape tag. Binding code branches on the tag,
//! never on runtime shape inspection.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A value bound to a prop or scope
///
/// Untagged on the wire: a JSON array of objects is a `List`, a JSON object
/// is an `Object` (named parts or a nested record), anything else is a
/// `Scalar`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Plural binding: one object per instance
    List(Vec<DataObject>),
    /// Structured binding: named parts or a nested record
    Object(DataObject),
    /// Single renderable value
    Scalar(serde_json::Value),
}

impl Value {
    /// Scalar from anything JSON-representable
    #[inline]
    #[must_use]
    pub fn scalar(value: impl Into<serde_json::Value>) -> Self {
        Self::Scalar(value.into())
    }

    /// Literal string form of a scalar
    ///
    /// Nil renders empty, false renders `"false"`: falsy values are not
    /// suppressed.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Scalar(serde_json::Value::Null) => String::new(),
            Self::Scalar(serde_json::Value::String(s)) => s.clone(),
            Self::Scalar(other) => other.to_string(),
            Self::Object(_) | Self::List(_) => String::new(),
        }
    }
}

/// An ordered mapping from binding names (or dotted prop-paths) to values
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataObject {
    fields: IndexMap<String, Value>,
}

impl DataObject {
    /// Create an empty object
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Builder-style scalar field insertion
    #[must_use]
    pub fn with_scalar(self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.with(name, Value::scalar(value))
    }

    /// Insert a field
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Field value by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Field names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the object has no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Primary-key-like id, rendered to its literal string form
    #[must_use]
    pub fn id(&self) -> Option<String> {
        match self.fields.get("id") {
            Some(value @ Value::Scalar(_)) => Some(value.display()),
            _ => None,
        }
    }
}

impl FromIterator<(String, Value)> for DataObject {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_display_forms() {
        assert_eq!(Value::scalar("hi").display(), "hi");
        assert_eq!(Value::scalar(3).display(), "3");
        assert_eq!(Value::scalar(false).display(), "false");
        assert_eq!(Value::Scalar(serde_json::Value::Null).display(), "");
    }

    #[test]
    fn object_id_is_literal_string() {
        let object = DataObject::new().with_scalar("id", 5);
        assert_eq!(object.id().as_deref(), Some("5"));
    }

    #[test]
    fn object_preserves_field_order() {
        let object = DataObject::new()
            .with_scalar("title", "a")
            .with_scalar("body", "b")
            .with_scalar("id", 1);
        let keys: Vec<&str> = object.keys().collect();
        assert_eq!(keys, vec!["title", "body", "id"]);
    }

    #[test]
    fn value_deserializes_by_shape() {
        let list: Value = serde_json::from_str(r#"[{"id": 1}]"#).unwrap();
        assert!(matches!(list, Value::List(_)));

        let object: Value = serde_json::from_str(r#"{"content": "x"}"#).unwrap();
        assert!(matches!(object, Value::Object(_)));

        let scalar: Value = serde_json::from_str("3").unwrap();
        assert!(matches!(scalar, Value::Scalar(_)));
    }
}
