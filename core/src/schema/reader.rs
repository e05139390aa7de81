//! Structural reading and canonical writing of document sections.
//!
//! A [`Section`] wraps one JSON object. Getters consult the field tables,
//! record every problem they find in a shared issue list, and keep going so
//! that one parse reports all violations at once. Required getters return a
//! placeholder after recording an issue; callers must discard their output
//! whenever the issue list is non-empty.

use super::fields::{Field, Need};
use super::ModelType;
use crate::value::{json_kind, Value, ValueError};
use serde::Serialize;
use serde_json::{Map, Value as Json};
use std::fmt;
use thiserror::Error;

/// Category of a structural problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Missing,
    Unknown,
    WrongType,
    /// Expression text that does not parse
    Syntax,
    /// Malformed table, blend or experiment
    Validation,
}

/// One structural problem, located by its `/`-joined key path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaIssue {
    pub path: String,
    pub kind: IssueKind,
    pub message: String,
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// All structural problems found in a document, in document order.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Schema error ({} issue(s)): {}", .issues.len(), join_issues(.issues))]
pub struct SchemaError {
    pub issues: Vec<SchemaIssue>,
}

impl SchemaError {
    /// True if some issue sits exactly at `path`.
    pub fn has_path(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path == path)
    }
}

fn join_issues(issues: &[SchemaIssue]) -> String {
    issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; ")
}

pub(crate) fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", parent, key)
    }
}

/// Issue sink shared by every section of one parse.
#[derive(Debug, Default)]
pub(crate) struct Issues {
    list: Vec<SchemaIssue>,
}

impl Issues {
    pub fn push(&mut self, path: String, kind: IssueKind, message: impl Into<String>) {
        self.list.push(SchemaIssue {
            path,
            kind,
            message: message.into(),
        });
    }

    pub fn value_error(&mut self, path: String, err: ValueError) {
        let kind = match err {
            ValueError::Syntax(_) => IssueKind::Syntax,
            ValueError::Table(_) => IssueKind::Validation,
            ValueError::Shape(_) => IssueKind::WrongType,
        };
        self.push(path, kind, err.to_string());
    }

    pub fn into_result<T>(self, value: T) -> Result<T, SchemaError> {
        if self.list.is_empty() {
            Ok(value)
        } else {
            Err(self.into_error())
        }
    }

    pub fn into_error(self) -> SchemaError {
        SchemaError { issues: self.list }
    }
}

/// Reader over one JSON object.
pub(crate) struct Section<'a> {
    path: String,
    map: Option<&'a Map<String, Json>>,
    model: ModelType,
    issues: &'a mut Issues,
}

impl<'a> Section<'a> {
    /// Open `json` as a section whose keys must all appear in `tables`.
    pub fn open(
        json: &'a Json,
        path: String,
        tables: &[&[Field]],
        model: ModelType,
        issues: &'a mut Issues,
    ) -> Self {
        let map = json.as_object();
        match map {
            None => issues.push(
                path.clone(),
                IssueKind::WrongType,
                format!("expected an object, found {}", json_kind(json)),
            ),
            Some(map) => {
                for key in map.keys() {
                    if !tables.iter().any(|t| t.iter().any(|f| f.key == key)) {
                        issues.push(join_path(&path, key), IssueKind::Unknown, "unknown field");
                    }
                }
            }
        }
        Self {
            path,
            map,
            model,
            issues,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn issues(&mut self) -> &mut Issues {
        &mut *self.issues
    }

    /// Open the object stored under `field` as a nested section.
    pub fn child(&mut self, field: &Field, tables: &[&[Field]]) -> Option<Section<'_>> {
        let json = self.raw(field)?;
        let path = self.child_path(field);
        Some(Section::open(json, path, tables, self.model, &mut *self.issues))
    }

    /// Open an arbitrary JSON object (e.g. a mapping entry) below this section.
    pub fn nested(&mut self, json: &'a Json, key: &str, tables: &[&[Field]]) -> Section<'_> {
        let path = join_path(&self.path, key);
        Section::open(json, path, tables, self.model, &mut *self.issues)
    }

    pub fn child_path(&self, field: &Field) -> String {
        join_path(&self.path, field.key)
    }

    /// Raw JSON for `field`, reporting it if required and absent.
    pub fn raw(&mut self, field: &Field) -> Option<&'a Json> {
        let map = self.map?;
        let found = map.get(field.key);
        if found.is_none() && field.need.is_required(self.model) {
            let message = match field.need {
                Need::From(min) => format!("field required for {} models", min),
                _ => "field required".to_string(),
            };
            let path = self.child_path(field);
            self.issues.push(path, IssueKind::Missing, message);
        }
        found
    }

    fn wrong_type(&mut self, field: &Field, expected: &str, found: &Json) {
        let path = self.child_path(field);
        self.issues.push(
            path,
            IssueKind::WrongType,
            format!("expected {}, found {}", expected, json_kind(found)),
        );
    }

    pub fn opt_number(&mut self, field: &Field) -> Option<f64> {
        let json = self.raw(field)?;
        match json.as_f64().filter(|v| v.is_finite()) {
            Some(v) => Some(v),
            None => {
                self.wrong_type(field, "a number", json);
                None
            }
        }
    }

    pub fn number(&mut self, field: &Field) -> f64 {
        self.opt_number(field).unwrap_or(f64::NAN)
    }

    /// Positive integer; integral floats such as `1.0` are accepted.
    pub fn count(&mut self, field: &Field) -> u32 {
        let Some(json) = self.raw(field) else {
            return 0;
        };
        let count = json
            .as_u64()
            .or_else(|| json.as_f64().filter(|v| v.fract() == 0.0 && *v >= 0.0).map(|v| v as u64))
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0);
        match count {
            Some(v) => v,
            None => {
                self.wrong_type(field, "a positive integer", json);
                0
            }
        }
    }

    pub fn opt_text(&mut self, field: &Field) -> Option<String> {
        let json = self.raw(field)?;
        match json.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                self.wrong_type(field, "a string", json);
                None
            }
        }
    }

    pub fn opt_value(&mut self, field: &Field) -> Option<Value> {
        let json = self.raw(field)?;
        match Value::from_json(json) {
            Ok(value) => Some(value),
            Err(err) => {
                let path = self.child_path(field);
                self.issues.value_error(path, err);
                None
            }
        }
    }

    pub fn value(&mut self, field: &Field) -> Value {
        self.opt_value(field).unwrap_or(Value::Constant(f64::NAN))
    }

    pub fn opt_number_list(&mut self, field: &Field) -> Option<Vec<f64>> {
        let json = self.raw(field)?;
        let list = json
            .as_array()
            .and_then(|items| items.iter().map(|i| i.as_f64().filter(|v| v.is_finite())).collect::<Option<Vec<_>>>());
        if list.is_none() {
            self.wrong_type(field, "a list of numbers", json);
        }
        list
    }
}

/// Builder for one canonical JSON object.
#[derive(Debug, Default)]
pub(crate) struct SectionWriter {
    map: Map<String, Json>,
}

impl SectionWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(&mut self, field: &Field, json: Json) -> &mut Self {
        self.map.insert(field.key.to_string(), json);
        self
    }

    pub fn number(&mut self, field: &Field, value: f64) -> &mut Self {
        self.json(field, Json::from(value))
    }

    pub fn opt_number(&mut self, field: &Field, value: Option<f64>) -> &mut Self {
        if let Some(v) = value {
            self.number(field, v);
        }
        self
    }

    pub fn opt_text(&mut self, field: &Field, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            self.json(field, Json::String(v.to_string()));
        }
        self
    }

    pub fn value(&mut self, field: &Field, value: &Value) -> &mut Self {
        self.json(field, value.to_json())
    }

    pub fn opt_value(&mut self, field: &Field, value: Option<&Value>) -> &mut Self {
        if let Some(v) = value {
            self.value(field, v);
        }
        self
    }

    pub fn number_list(&mut self, field: &Field, values: &[f64]) -> &mut Self {
        self.json(field, Json::from(values.to_vec()))
    }

    /// Insert under a free-form key, for open mappings.
    pub fn entry(&mut self, key: &str, json: Json) -> &mut Self {
        self.map.insert(key.to_string(), json);
        self
    }

    pub fn finish(self) -> Json {
        Json::Object(self.map)
    }
}
