//! Defensive access to raw ClinicalTrials.gov study records.
//!
//! Study records arrive as schema-less JSON. Every lookup goes through a
//! [`Node`], which resolves an absent (or `null`) key to an empty default and
//! reports a [`FlattenError`] only when a key is present with the wrong shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Structural problem found while reading one record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlattenError {
    #[error("record is {found}, expected an object")]
    NotAnObject { found: &'static str },

    #[error("expected {expected} at `{path}`, found {found}")]
    UnexpectedShape {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// One study record as returned by the ClinicalTrials.gov v2 API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTrialRecord(Value);

impl RawTrialRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Root node of the record. Fails only if the record itself is not an object.
    pub fn root(&self) -> Result<Node<'_>, FlattenError> {
        match &self.0 {
            Value::Object(map) => Ok(Node {
                map: Some(map),
                path: String::new(),
            }),
            Value::Null => Ok(Node::empty(String::new())),
            other => Err(FlattenError::NotAnObject {
                found: kind(other),
            }),
        }
    }

    /// The NCT identifier, if present as a non-empty string.
    pub fn nct_id(&self) -> Option<&str> {
        self.0
            .pointer("/protocolSection/identificationModule/nctId")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// The overall recruitment status, if present.
    pub fn overall_status(&self) -> Option<&str> {
        self.0
            .pointer("/protocolSection/statusModule/overallStatus")
            .and_then(Value::as_str)
    }

    /// The first listed phase, if any.
    pub fn first_phase(&self) -> Option<&str> {
        self.0
            .pointer("/protocolSection/designModule/phases/0")
            .and_then(Value::as_str)
    }
}

impl From<Value> for RawTrialRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// A view of one JSON object inside a record, possibly absent.
///
/// Absent nodes behave like empty objects: every child is absent, every text
/// field is `""`, every list is empty.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    map: Option<&'a Map<String, Value>>,
    path: String,
}

impl<'a> Node<'a> {
    fn empty(path: String) -> Self {
        Self { map: None, path }
    }

    fn child_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    /// Present, non-null value under `key`.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map?.get(key).filter(|v| !v.is_null())
    }

    /// Whether `key` exists at all (presence only, `null` included).
    pub fn contains(&self, key: &str) -> bool {
        self.map.is_some_and(|m| m.contains_key(key))
    }

    /// Nested object under `key`.
    pub fn child(&self, key: &str) -> Result<Node<'a>, FlattenError> {
        let path = self.child_path(key);
        match self.get(key) {
            None => Ok(Node::empty(path)),
            Some(Value::Object(map)) => Ok(Node {
                map: Some(map),
                path,
            }),
            Some(other) => Err(shape_error(path, "an object", other)),
        }
    }

    /// Text under `key`; numbers and booleans are rendered, absent is `""`.
    pub fn text(&self, key: &str) -> Result<String, FlattenError> {
        match self.get(key) {
            None => Ok(String::new()),
            Some(v) => scalar_text(v).ok_or_else(|| shape_error(self.child_path(key), "text", v)),
        }
    }

    /// Scalar under `key` rendered as text, `None` when absent.
    pub fn scalar(&self, key: &str) -> Result<Option<String>, FlattenError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => scalar_text(v)
                .map(Some)
                .ok_or_else(|| shape_error(self.child_path(key), "a scalar", v)),
        }
    }

    /// List of scalars under `key`, rendered as text.
    pub fn strings(&self, key: &str) -> Result<Vec<String>, FlattenError> {
        let path = self.child_path(key);
        let items = self.array(key, &path)?;
        items
            .iter()
            .enumerate()
            .map(|(i, v)| {
                scalar_text(v).ok_or_else(|| shape_error(format!("{path}[{i}]"), "text", v))
            })
            .collect()
    }

    /// List of objects under `key`.
    pub fn objects(&self, key: &str) -> Result<Vec<Node<'a>>, FlattenError> {
        let path = self.child_path(key);
        let items = self.array(key, &path)?;
        items
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let item_path = format!("{path}[{i}]");
                match v {
                    Value::Object(map) => Ok(Node {
                        map: Some(map),
                        path: item_path,
                    }),
                    Value::Null => Ok(Node::empty(item_path)),
                    other => Err(shape_error(item_path, "an object", other)),
                }
            })
            .collect()
    }

    fn array(&self, key: &str, path: &str) -> Result<&'a [Value], FlattenError> {
        match self.get(key) {
            None => Ok(&[]),
            Some(Value::Array(items)) => Ok(items.as_slice()),
            Some(other) => Err(shape_error(path.to_string(), "a list", other)),
        }
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn shape_error(path: String, expected: &'static str, found: &Value) -> FlattenError {
    FlattenError::UnexpectedShape {
        path,
        expected,
        found: kind(found),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_sections_resolve_to_defaults() {
        let record = RawTrialRecord::new(json!({}));
        let root = record.root().unwrap();
        let design = root.child("protocolSection").unwrap().child("designModule").unwrap();
        assert_eq!(design.text("studyType").unwrap(), "");
        assert!(design.strings("phases").unwrap().is_empty());
        assert!(design.objects("interventions").unwrap().is_empty());
    }

    #[test]
    fn null_is_treated_as_absent() {
        let record = RawTrialRecord::new(json!({"protocolSection": null}));
        let root = record.root().unwrap();
        let proto = root.child("protocolSection").unwrap();
        assert_eq!(proto.text("anything").unwrap(), "");
    }

    #[test]
    fn wrong_shape_reports_path() {
        let record = RawTrialRecord::new(json!({"protocolSection": {"statusModule": "oops"}}));
        let root = record.root().unwrap();
        let err = root
            .child("protocolSection")
            .unwrap()
            .child("statusModule")
            .unwrap_err();
        assert_eq!(
            err,
            FlattenError::UnexpectedShape {
                path: "protocolSection.statusModule".into(),
                expected: "an object",
                found: "a string",
            }
        );
    }

    #[test]
    fn numbers_render_as_text() {
        let record = RawTrialRecord::new(json!({"count": 42, "flag": true}));
        let root = record.root().unwrap();
        assert_eq!(root.text("count").unwrap(), "42");
        assert_eq!(root.text("flag").unwrap(), "true");
        assert_eq!(root.scalar("missing").unwrap(), None);
    }

    #[test]
    fn non_object_record_is_rejected() {
        let record = RawTrialRecord::new(json!([1, 2, 3]));
        assert!(matches!(
            record.root(),
            Err(FlattenError::NotAnObject { found: "a list" })
        ));
    }

    #[test]
    fn pointer_helpers() {
        let record = RawTrialRecord::new(json!({
            "protocolSection": {
                "identificationModule": {"nctId": "NCT00000001"},
                "statusModule": {"overallStatus": "COMPLETED"},
                "designModule": {"phases": ["PHASE2", "PHASE3"]}
            }
        }));
        assert_eq!(record.nct_id(), Some("NCT00000001"));
        assert_eq!(record.overall_status(), Some("COMPLETED"));
        assert_eq!(record.first_phase(), Some("PHASE2"));

        let empty = RawTrialRecord::new(json!({}));
        assert_eq!(empty.nct_id(), None);
        assert_eq!(empty.first_phase(), None);
    }
}
