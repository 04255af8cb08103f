//! Conversion between nested document metadata and Pinecone's flat metadata.
//!
//! Pinecone only stores strings, numbers, booleans, and lists of strings. Nested objects are
//! flattened to dotted keys (`loc.pageNumber`), nulls are dropped, and list items that are not
//! strings are stored in their JSON text form.

use serde_json::{Map, Value};

/// Flatten nested objects into dotted keys.
pub fn flatten_metadata(metadata: &Map<String, Value>) -> Map<String, Value> {
    let mut flat = Map::new();
    flatten_into(&mut flat, None, metadata);
    flat
}

fn flatten_into(flat: &mut Map<String, Value>, prefix: Option<&str>, object: &Map<String, Value>) {
    for (key, value) in object {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Null => {}
            Value::Object(inner) => flatten_into(flat, Some(&path), inner),
            Value::Array(items) => {
                let items = items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| match item {
                        Value::String(text) => Value::String(text.clone()),
                        other => Value::String(other.to_string()),
                    })
                    .collect();
                flat.insert(path, Value::Array(items));
            }
            scalar => {
                flat.insert(path, scalar.clone());
            }
        }
    }
}

/// Rebuild nested objects from dotted keys.
pub fn nest_metadata(flat: Map<String, Value>) -> Map<String, Value> {
    let mut nested = Map::new();
    for (key, value) in flat {
        let segments: Vec<&str> = key.split('.').collect();
        insert_path(&mut nested, &segments, value);
    }
    nested
}

fn insert_path(target: &mut Map<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            target.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let entry = target
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(inner) = entry {
                insert_path(inner, rest, value);
            }
        }
    }
}
