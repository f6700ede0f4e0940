//! Weakly-typed mapping from a generic JSON tree onto the typed model.
//!
//! Accepted coercions, and nothing else:
//!
//! | target | accepted JSON |
//! |--------|---------------|
//! | string | string; number (plain decimal: integral floats without `.0`, no exponent form); bool (`"1"` / `"0"`); null (empty) |
//! | list   | array; a single scalar or object (one-element list); null (empty) |
//! | map    | object; empty array (empty map); array of objects (merged, later keys win); null (empty) |
//!
//! Struct keys match exactly first, then case-insensitively. Unknown keys are ignored.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::error::{CodebaseError, Result};
use crate::model::StringMap;

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

pub(crate) fn index(path: &str, idx: usize) -> String {
    format!("{path}[{idx}]")
}

/// Object fields of a struct-like value with loose key matching
pub(crate) struct Fields<'a> {
    map: Option<&'a Map<String, Value>>,
    path: &'a str,
}

impl<'a> Fields<'a> {
    pub(crate) fn of(value: &'a Value, path: &'a str) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                map: Some(map),
                path,
            }),
            Value::Null => Ok(Self { map: None, path }),
            other => Err(CodebaseError::schema(path, "object", type_name(other))),
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<&'a Value> {
        let map = self.map?;
        map.get(key).or_else(|| {
            map.iter()
                .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
                .map(|(_, value)| value)
        })
    }

    pub(crate) fn string(&self, key: &str) -> Result<String> {
        self.get(key)
            .map_or(Ok(String::new()), |value| string(value, &join(self.path, key)))
    }

    pub(crate) fn string_list(&self, key: &str) -> Result<Vec<String>> {
        self.get(key)
            .map_or(Ok(Vec::new()), |value| string_list(value, &join(self.path, key)))
    }

    pub(crate) fn string_map(&self, key: &str) -> Result<StringMap> {
        self.get(key)
            .map_or(Ok(StringMap::new()), |value| string_map(value, &join(self.path, key)))
    }

    pub(crate) fn nested_string_map(&self, key: &str) -> Result<BTreeMap<String, StringMap>> {
        self.get(key).map_or(Ok(BTreeMap::new()), |value| {
            nested_string_map(value, &join(self.path, key))
        })
    }

    pub(crate) fn list_map(&self, key: &str) -> Result<BTreeMap<String, Vec<String>>> {
        self.get(key)
            .map_or(Ok(BTreeMap::new()), |value| list_map(value, &join(self.path, key)))
    }

    pub(crate) fn path(&self) -> &'a str {
        self.path
    }
}

pub(crate) fn string(value: &Value, path: &str) -> Result<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Bool(true) => Ok("1".to_string()),
        Value::Bool(false) => Ok("0".to_string()),
        Value::Number(n) => Ok(number_to_string(n)),
        other => Err(CodebaseError::schema(path, "string", type_name(other))),
    }
}

/// Integers verbatim; floats in shortest plain decimal, never exponent form
fn number_to_string(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => format!("{f}"),
        _ => n.to_string(),
    }
}

/// Elements of a list-typed field, wrapping a lone value
pub(crate) fn list<'a>(value: &'a Value, path: &str) -> Result<Vec<&'a Value>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.iter().collect()),
        Value::Object(_) => Ok(vec![value]),
        other => Err(CodebaseError::schema(path, "array", type_name(other))),
    }
}

pub(crate) fn string_list(value: &Value, path: &str) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| string(item, &index(path, idx)))
            .collect(),
        Value::Object(_) => Err(CodebaseError::schema(path, "array", "object")),
        scalar => Ok(vec![string(scalar, path)?]),
    }
}

/// Key/value pairs of a map-typed field
pub(crate) fn entries<'a>(value: &'a Value, path: &str) -> Result<BTreeMap<&'a str, &'a Value>> {
    let mut out = BTreeMap::new();
    match value {
        Value::Null => {}
        Value::Object(map) => {
            out.extend(map.iter().map(|(k, v)| (k.as_str(), v)));
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                match item {
                    Value::Object(map) => out.extend(map.iter().map(|(k, v)| (k.as_str(), v))),
                    other => {
                        return Err(CodebaseError::schema(
                            &index(path, idx),
                            "object",
                            type_name(other),
                        ));
                    }
                }
            }
        }
        other => return Err(CodebaseError::schema(path, "object", type_name(other))),
    }
    Ok(out)
}

pub(crate) fn string_map(value: &Value, path: &str) -> Result<StringMap> {
    entries(value, path)?
        .into_iter()
        .map(|(key, item)| Ok((key.to_string(), string(item, &join(path, key))?)))
        .collect()
}

pub(crate) fn nested_string_map(value: &Value, path: &str) -> Result<BTreeMap<String, StringMap>> {
    entries(value, path)?
        .into_iter()
        .map(|(key, item)| Ok((key.to_string(), string_map(item, &join(path, key))?)))
        .collect()
}

pub(crate) fn list_map(value: &Value, path: &str) -> Result<BTreeMap<String, Vec<String>>> {
    entries(value, path)?
        .into_iter()
        .map(|(key, item)| Ok((key.to_string(), string_list(item, &join(path, key))?)))
        .collect()
}
