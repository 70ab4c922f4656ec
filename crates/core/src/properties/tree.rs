use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::errors::PropertyError;
use crate::properties::join_key;

/// Rebuild a nested tree from flat dot-keyed entries
///
/// Fails with [`PropertyError::KeyConflict`] when one path segment would have
/// to be both a leaf and an object.
pub fn to_nested_tree(entries: &BTreeMap<String, Value>) -> Result<Value, PropertyError> {
    let mut root = Map::new();
    for (key, value) in entries {
        insert_path(&mut root, key, value.clone())?;
    }
    Ok(Value::Object(root))
}

fn insert_path(root: &mut Map<String, Value>, key: &str, value: Value) -> Result<(), PropertyError> {
    let mut node = root;
    let mut parts = key.split('.').peekable();

    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            if let Some(Value::Object(_)) = node.get(part) {
                return Err(PropertyError::key_conflict(
                    key,
                    format!(
                        "Part '{}' for key '{}' is already an object and cannot be a value.",
                        part, key
                    ),
                ));
            }
            node.insert(part.to_string(), value);
            return Ok(());
        }

        let next = node
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match next {
            Value::Object(children) => node = children,
            _ => {
                return Err(PropertyError::key_conflict(
                    key,
                    format!(
                        "Part '{}' for key '{}' is already a value and cannot be an object.",
                        part, key
                    ),
                ))
            }
        }
    }

    Ok(())
}

/// Flatten a nested tree back into dot-keyed entries under `prefix`
///
/// Objects are walked, every other value (sequences included) is a leaf.
/// Empty objects and nulls produce no entries.
pub fn flatten_tree(value: &Value, prefix: &str) -> BTreeMap<String, Value> {
    let mut entries = BTreeMap::new();
    collect_leaves(value, prefix.to_string(), &mut entries);
    entries
}

fn collect_leaves(value: &Value, path: String, entries: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(children) => {
            for (key, child) in children {
                collect_leaves(child, join_key(&path, key), entries);
            }
        }
        Value::Null => {}
        leaf => {
            entries.insert(path, leaf.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_nested_tree_from_flat_keys() {
        let entries = flat(&[
            ("server.host", json!("localhost")),
            ("server.port", json!(8080)),
            ("debug", json!(true)),
        ]);

        let tree = to_nested_tree(&entries).unwrap();
        assert_eq!(
            tree,
            json!({"server": {"host": "localhost", "port": 8080}, "debug": true})
        );
    }

    #[test]
    fn test_value_then_object_conflicts() {
        let entries = flat(&[("a", json!(1)), ("a.b", json!(2))]);
        let error = to_nested_tree(&entries).unwrap_err();
        assert!(error.is_key_conflict());
        assert!(error
            .to_string()
            .contains("Part 'a' for key 'a.b' is already a value and cannot be an object."));
    }

    #[test]
    fn test_object_then_value_conflicts() {
        let mut root = Map::new();
        insert_path(&mut root, "a.b", json!(1)).unwrap();
        let error = insert_path(&mut root, "a", json!(2)).unwrap_err();
        assert!(error
            .to_string()
            .contains("is already an object and cannot be a value."));
    }

    #[test]
    fn test_round_trip_law() {
        let samples = vec![
            flat(&[("a", json!(1))]),
            flat(&[
                ("a.b.c", json!("x")),
                ("a.b.d", json!(2.5)),
                ("a.e", json!([1, 2, 3])),
                ("f", json!(false)),
            ]),
            flat(&[
                ("ktor.client.retry.attempts", json!(2)),
                ("ktor.client.request.headers.X-Trace", json!("on")),
                ("app.logger.level", json!("DEBUG")),
            ]),
        ];

        for entries in samples {
            let tree = to_nested_tree(&entries).unwrap();
            assert_eq!(flatten_tree(&tree, ""), entries);
        }
    }

    #[test]
    fn test_flatten_tree_with_prefix() {
        let entries = flatten_tree(&json!({"retry": {"attempts": 2}, "empty": {}}), "client");
        assert_eq!(entries, flat(&[("client.retry.attempts", json!(2))]));
    }
}
