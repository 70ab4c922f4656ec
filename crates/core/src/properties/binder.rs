//! Typed binding between flat property entries and [`PropertyRecord`] values.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::errors::PropertyError;
use crate::properties::schema::{PropertyRecord, PropertySchema};
use crate::properties::{join_key, tree};

/// Options for [`flatten_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Emit leaves that are equal to the record's default
    pub include_defaults: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            include_defaults: true,
        }
    }
}

/// Select the entries under `prefix`, keyed by their residual path
///
/// Matching is segment-aware: `db` selects `db` and `db.url` but not `dbx`.
/// The entry equal to `prefix` itself gets an empty residual key.
pub fn select(entries: &BTreeMap<String, Value>, prefix: &str) -> BTreeMap<String, Value> {
    if prefix.is_empty() {
        return entries.clone();
    }

    entries
        .range(prefix.to_string()..)
        .take_while(|(key, _)| key.starts_with(prefix))
        .filter_map(|(key, value)| {
            let rest = &key[prefix.len()..];
            if rest.is_empty() {
                Some((String::new(), value.clone()))
            } else {
                rest.strip_prefix('.')
                    .map(|residual| (residual.to_string(), value.clone()))
            }
        })
        .collect()
}

/// Bind a record from the entries under `prefix` (or the record's own prefix)
///
/// Returns `Ok(None)` when nothing is stored under the prefix. A single entry
/// stored exactly at the prefix is the whole payload (scalar or sequence
/// records); otherwise the residual keys are decoded as an object.
pub fn bind<T: PropertyRecord>(
    entries: &BTreeMap<String, Value>,
    prefix: Option<&str>,
) -> Result<Option<T>, PropertyError> {
    let schema = T::schema();
    let prefix = prefix.unwrap_or_else(|| schema.prefix());

    match payload(entries, prefix, &schema)? {
        None => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| PropertyError::Decode {
                type_name: std::any::type_name::<T>(),
                prefix: prefix.to_string(),
                source,
            }),
    }
}

fn payload(
    entries: &BTreeMap<String, Value>,
    prefix: &str,
    schema: &PropertySchema,
) -> Result<Option<Value>, PropertyError> {
    let selected = select(entries, prefix);
    if selected.len() == 1 && selected.contains_key("") {
        return Ok(selected.into_values().next());
    }

    let mut value = if selected.is_empty() {
        None
    } else {
        Some(tree::to_nested_tree(&selected)?)
    };

    // Nested records may live under a prefix of their own.
    for nested in schema.nested_fields() {
        let child_schema = nested.schema();
        let canonical = join_key(prefix, nested.field);
        let child_prefix = if child_schema.prefix().is_empty() {
            canonical.as_str()
        } else {
            child_schema.prefix()
        };

        if let Some(child) = payload(entries, child_prefix, &child_schema)? {
            let node = value.get_or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(fields) = node {
                fields.insert(nested.field.to_string(), child);
            }
        }
    }

    Ok(value)
}

/// Flatten a record into dot-keyed entries, defaults included
pub fn flatten<T: PropertyRecord>(record: &T) -> Result<BTreeMap<String, Value>, PropertyError> {
    flatten_with(record, FlattenOptions::default())
}

/// Flatten a record into dot-keyed entries
///
/// Nested records are written under their declared prefix, or under the
/// parent path when they declare none. Sequences are single leaves and
/// `None` fields are omitted.
pub fn flatten_with<T: PropertyRecord>(
    record: &T,
    options: FlattenOptions,
) -> Result<BTreeMap<String, Value>, PropertyError> {
    let schema = T::schema();
    let value = serde_json::to_value(record).map_err(|error| {
        PropertyError::unsupported_type(
            schema.prefix(),
            format!("{}: {}", std::any::type_name::<T>(), error),
        )
    })?;

    let mut entries = BTreeMap::new();
    walk(&value, Some(&schema), schema.prefix().to_string(), &mut entries)?;

    if !options.include_defaults {
        let defaults = flatten(&T::default())?;
        entries.retain(|key, value| defaults.get(key) != Some(value));
    }

    Ok(entries)
}

fn walk(
    value: &Value,
    schema: Option<&PropertySchema>,
    path: String,
    entries: &mut BTreeMap<String, Value>,
) -> Result<(), PropertyError> {
    match value {
        Value::Object(fields) => {
            let base = match schema {
                Some(schema) if !schema.prefix().is_empty() => schema.prefix().to_string(),
                _ => path,
            };
            for (field, child) in fields {
                let child_schema = schema
                    .and_then(|schema| schema.nested_field(field))
                    .map(|nested| nested.schema());
                walk(child, child_schema.as_ref(), join_key(&base, field), entries)?;
            }
            Ok(())
        }
        Value::Null => Ok(()),
        leaf if path.is_empty() => Err(PropertyError::unsupported_type(
            "",
            format!("top-level {} without a binding prefix", kind(leaf)),
        )),
        leaf => {
            entries.insert(path, leaf.clone());
            Ok(())
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "object",
    }
}
