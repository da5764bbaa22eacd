use std::collections::HashSet;
use std::fmt;

use serde_json::Value;

pub const LOCAL_SCHEMA_PREFIX: &str = "#/components/schemas/";

/// A `$ref` into `#/components/schemas/` whose target name is not registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRef {
    pub path: String,
    pub reference: String,
}

impl fmt::Display for InvalidRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reference)
    }
}

/// Names declared under `components.schemas`, or nothing if that is not a mapping.
pub fn schema_registry(document: &Value) -> HashSet<String> {
    document
        .get("components")
        .and_then(|components| components.get("schemas"))
        .and_then(Value::as_object)
        .map(|schemas| schemas.keys().cloned().collect())
        .unwrap_or_default()
}

/// Walks `node` depth-first and reports every local schema `$ref` missing
/// from `registry`, formatted as `"<path>: <ref>"`.
pub fn find_invalid_refs(node: &Value, registry: &HashSet<String>, path: &str) -> Vec<String> {
    find_invalid_ref_entries(node, registry, path)
        .iter()
        .map(ToString::to_string)
        .collect()
}

pub fn find_invalid_ref_entries(
    node: &Value,
    registry: &HashSet<String>,
    path: &str,
) -> Vec<InvalidRef> {
    let mut found = vec![];
    walk(node, registry, path.to_owned(), &mut found);
    found
}

fn walk(node: &Value, registry: &HashSet<String>, path: String, found: &mut Vec<InvalidRef>) {
    match node {
        Value::Object(map) => {
            if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                if is_unregistered(reference, registry) {
                    found.push(InvalidRef {
                        path: path.clone(),
                        reference: reference.to_owned(),
                    });
                }
            }
            for (key, value) in map.iter() {
                walk(value, registry, child_path(&path, key), found);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                walk(item, registry, format!("{}[{}]", path, index), found);
            }
        }
        _ => {}
    }
}

fn is_unregistered(reference: &str, registry: &HashSet<String>) -> bool {
    if !reference.starts_with(LOCAL_SCHEMA_PREFIX) {
        return false;
    }
    // last segment, so "#/components/schemas/A/properties/b" checks "b"
    let name = reference.rsplit('/').next().unwrap_or_default();
    !registry.contains(name)
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{}.{}", path, key)
    }
}
