//! # Properties
//!
//! Dot-keyed property namespace, typed record binding and structured sources.
//!
//! Keys are case-sensitive and `.` is the only separator. Values are
//! [`serde_json::Value`] leaves; typed records describe their layout through
//! [`PropertySchema`] and are decoded/encoded with serde.

pub mod binder;
pub mod schema;
pub mod sources;
pub mod store;
pub mod tree;

pub use binder::{bind, flatten, flatten_with, select, FlattenOptions};
pub use schema::{NestedField, PropertyRecord, PropertySchema};
pub use sources::PropertySource;
pub use store::PropertyStore;
pub use tree::{flatten_tree, to_nested_tree};

pub use bootkit_derive::PropertyRecord;

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Read access to a property namespace, used as a lookup fallback
pub trait PropertyResolver: Send + Sync {
    /// Resolve a single leaf by its full dot-path
    fn resolve_property(&self, key: &str) -> Option<Value>;
}

impl PropertyResolver for BTreeMap<String, Value> {
    fn resolve_property(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

impl PropertyResolver for HashMap<String, Value> {
    fn resolve_property(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

impl<R: PropertyResolver + ?Sized> PropertyResolver for Arc<R> {
    fn resolve_property(&self, key: &str) -> Option<Value> {
        (**self).resolve_property(key)
    }
}

/// Join two key fragments with `.`, skipping empty sides
pub fn join_key(prefix: &str, key: &str) -> String {
    match (prefix.is_empty(), key.is_empty()) {
        (true, _) => key.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{}.{}", prefix, key),
    }
}

/// String form used for loose property comparison
///
/// Strings compare by their raw contents, everything else by its JSON text,
/// so `"true"` and `true` are equal.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
