//! The `User-defined` escape hatch: named values outside the standard.

use super::reader::{join_path, IssueKind, Issues};
use crate::value::{json_kind, Value};
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;

/// Reserved key whose value is free text rather than a [`Value`].
pub const DESCRIPTION_KEY: &str = "description";

#[derive(Debug, Clone, PartialEq)]
pub enum UserEntry {
    Value(Value),
    Text(String),
    Group(UserDefined),
}

/// Open mapping of names to values, text, or nested groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDefined {
    entries: BTreeMap<String, UserEntry>,
}

impl UserDefined {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: UserEntry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&UserEntry> {
        self.entries.get(name)
    }

    pub fn entries(&self) -> &BTreeMap<String, UserEntry> {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn read(json: &Json, path: String, issues: &mut Issues) -> Self {
        let mut group = Self::new();
        let Some(map) = json.as_object() else {
            issues.push(
                path,
                IssueKind::WrongType,
                format!("expected an object, found {}", json_kind(json)),
            );
            return group;
        };

        for (key, item) in map {
            let item_path = join_path(&path, key);
            if key == DESCRIPTION_KEY {
                match item.as_str() {
                    Some(text) => group.insert(key.clone(), UserEntry::Text(text.to_string())),
                    None => issues.push(
                        item_path,
                        IssueKind::WrongType,
                        format!("expected a string, found {}", json_kind(item)),
                    ),
                }
                continue;
            }

            match item {
                Json::Object(inner) if !is_table(inner) => {
                    let nested = Self::read(item, item_path, issues);
                    group.insert(key.clone(), UserEntry::Group(nested));
                }
                _ => match Value::from_json(item) {
                    Ok(value) => group.insert(key.clone(), UserEntry::Value(value)),
                    Err(err) => issues.value_error(item_path, err),
                },
            }
        }
        group
    }

    pub(crate) fn to_json(&self) -> Json {
        let map: Map<String, Json> = self
            .entries
            .iter()
            .map(|(key, entry)| {
                let json = match entry {
                    UserEntry::Value(value) => value.to_json(),
                    UserEntry::Text(text) => Json::String(text.clone()),
                    UserEntry::Group(group) => group.to_json(),
                };
                (key.clone(), json)
            })
            .collect();
        Json::Object(map)
    }

    /// Every value leaf with its `/`-joined path below `prefix`.
    pub(crate) fn values(&self, prefix: &str) -> Vec<(String, &Value)> {
        let mut out = Vec::new();
        for (key, entry) in &self.entries {
            let path = join_path(prefix, key);
            match entry {
                UserEntry::Value(value) => out.push((path, value)),
                UserEntry::Group(group) => out.extend(group.values(&path)),
                UserEntry::Text(_) => {}
            }
        }
        out
    }
}

fn is_table(map: &Map<String, Json>) -> bool {
    map.contains_key("x") || map.contains_key("y")
}

#[cfg(test)]
mod user_defined_tests {
    use super::*;
    use serde_json::json;

    fn read(json: Json) -> (UserDefined, Issues) {
        let mut issues = Issues::default();
        let group = UserDefined::read(&json, "User-defined".to_string(), &mut issues);
        (group, issues)
    }

    #[test]
    fn test_leaves_and_groups() {
        let (group, issues) = read(json!({
            "a": 1.0,
            "b": "2 * x",
            "c": {"x": [0, 1], "y": [1, 2]},
            "Thermal": {"description": "lumped thermal extras", "h [W.m-2.K-1]": 10}
        }));
        assert!(issues.into_result(()).is_ok());
        assert!(matches!(group.get("a"), Some(UserEntry::Value(Value::Constant(_)))));
        assert!(matches!(group.get("c"), Some(UserEntry::Value(Value::Table(_)))));
        let Some(UserEntry::Group(thermal)) = group.get("Thermal") else {
            panic!("expected a nested group");
        };
        assert_eq!(
            thermal.get("description"),
            Some(&UserEntry::Text("lumped thermal extras".to_string()))
        );

        let paths: Vec<String> = group.values("User-defined").into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            paths,
            vec![
                "User-defined/Thermal/h [W.m-2.K-1]",
                "User-defined/a",
                "User-defined/b",
                "User-defined/c"
            ]
        );
    }

    #[test]
    fn test_bad_entries_reported_with_paths() {
        let (_, issues) = read(json!({
            "bad": "this is not a function",
            "flag": true,
            "description": 3
        }));
        let err = issues.into_error();
        assert!(err.has_path("User-defined/bad"));
        assert!(err.has_path("User-defined/flag"));
        assert!(err.has_path("User-defined/description"));
        assert_eq!(err.issues[0].kind, IssueKind::Syntax);
    }

    #[test]
    fn test_to_json_round_trip() {
        let raw = json!({"a": 0.5, "g": {"description": "text", "k": "x + 1"}});
        let (group, _) = read(raw.clone());
        assert_eq!(group.to_json(), raw);
    }
}
