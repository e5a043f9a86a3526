//! Operator attributes.

use crate::error::OpError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single attribute value.
///
/// Untagged in JSON: `true`, `3`, `0.5`, `[2, -1]`, `"name"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribute {
    Bool(bool),
    Int(i64),
    Float(f64),
    Ints(Vec<i64>),
    Str(String),
}

impl Attribute {
    /// Human-readable type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Attribute::Bool(_) => "bool",
            Attribute::Int(_) => "int",
            Attribute::Float(_) => "float",
            Attribute::Ints(_) => "ints",
            Attribute::Str(_) => "string",
        }
    }
}

impl From<bool> for Attribute {
    fn from(v: bool) -> Self {
        Attribute::Bool(v)
    }
}

impl From<i64> for Attribute {
    fn from(v: i64) -> Self {
        Attribute::Int(v)
    }
}

impl From<f64> for Attribute {
    fn from(v: f64) -> Self {
        Attribute::Float(v)
    }
}

impl From<Vec<i64>> for Attribute {
    fn from(v: Vec<i64>) -> Self {
        Attribute::Ints(v)
    }
}

impl From<&[i64]> for Attribute {
    fn from(v: &[i64]) -> Self {
        Attribute::Ints(v.to_vec())
    }
}

impl From<&str> for Attribute {
    fn from(v: &str) -> Self {
        Attribute::Str(v.to_string())
    }
}

/// Named attributes of one operator.
///
/// Typed getters return `Ok(None)` when the attribute is absent and
/// [`OpError::AttributeType`] when it holds another type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap(BTreeMap<String, Attribute>);

impl AttributeMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<Attribute>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace an attribute.
    pub fn insert(&mut self, name: &str, value: impl Into<Attribute>) {
        self.0.insert(name.to_string(), value.into());
    }

    /// Raw attribute lookup.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.0.get(name)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no attribute is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ints(&self, name: &str) -> Result<Option<&[i64]>, OpError> {
        match self.0.get(name) {
            None => Ok(None),
            Some(Attribute::Ints(v)) => Ok(Some(v)),
            Some(other) => Err(type_error(name, "ints", other)),
        }
    }

    pub fn int(&self, name: &str) -> Result<Option<i64>, OpError> {
        match self.0.get(name) {
            None => Ok(None),
            Some(Attribute::Int(v)) => Ok(Some(*v)),
            Some(other) => Err(type_error(name, "int", other)),
        }
    }

    pub fn bool(&self, name: &str) -> Result<Option<bool>, OpError> {
        match self.0.get(name) {
            None => Ok(None),
            Some(Attribute::Bool(v)) => Ok(Some(*v)),
            Some(other) => Err(type_error(name, "bool", other)),
        }
    }
}

fn type_error(name: &str, expected: &'static str, actual: &Attribute) -> OpError {
    OpError::AttributeType {
        name: name.to_string(),
        expected,
        actual: actual.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let attrs = AttributeMap::new()
            .with("shape", vec![2i64, -1])
            .with("inplace", true)
            .with("upscale_factor", 3i64);

        assert_eq!(attrs.ints("shape").unwrap(), Some(&[2, -1][..]));
        assert_eq!(attrs.bool("inplace").unwrap(), Some(true));
        assert_eq!(attrs.int("upscale_factor").unwrap(), Some(3));
        assert_eq!(attrs.int("missing").unwrap(), None);
        assert_eq!(attrs.len(), 3);
    }

    #[test]
    fn test_wrong_type() {
        let attrs = AttributeMap::new().with("inplace", 1i64);
        let err = attrs.bool("inplace").unwrap_err();
        assert!(matches!(
            err,
            OpError::AttributeType {
                expected: "bool",
                actual: "int",
                ..
            }
        ));
    }

    #[test]
    fn test_json_untagged() {
        let attrs: AttributeMap =
            serde_json::from_str(r#"{"shape": [-1, 0, 3], "inplace": false, "scale": 0.5}"#)
                .unwrap();
        assert_eq!(attrs.get("shape"), Some(&Attribute::Ints(vec![-1, 0, 3])));
        assert_eq!(attrs.get("inplace"), Some(&Attribute::Bool(false)));
        assert_eq!(attrs.get("scale"), Some(&Attribute::Float(0.5)));
    }
}
