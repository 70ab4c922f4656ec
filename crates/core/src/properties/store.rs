use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::errors::PropertyError;
use crate::properties::schema::PropertyRecord;
use crate::properties::sources::{self, PropertySource};
use crate::properties::{binder, join_key, tree, PropertyResolver};

/// Flat dot-keyed property namespace with scoped declaration
///
/// A key is either a leaf or the parent of other keys, never both. Lookups
/// that miss locally fall through to an optional fallback resolver.
#[derive(Default)]
pub struct PropertyStore {
    entries: BTreeMap<String, Value>,
    sources: HashMap<String, PropertySource>,
    scopes: Vec<String>,
    fallback: Option<Arc<dyn PropertyResolver>>,
}

impl PropertyStore {
    /// Create an empty store without fallback
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `fallback` for keys missing from this store
    pub fn with_fallback(mut self, fallback: Arc<dyn PropertyResolver>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn set_fallback(&mut self, fallback: Arc<dyn PropertyResolver>) {
        self.fallback = Some(fallback);
    }

    /// Prefix applied to writes in the current scope
    pub fn current_prefix(&self) -> String {
        self.scopes.join(".")
    }

    /// Write a leaf under the current scope
    ///
    /// Fails if the path already holds a value, already has children, or
    /// runs through an existing leaf.
    pub fn set<V: Serialize>(&mut self, path: &str, value: V) -> Result<(), PropertyError> {
        let key = join_key(&self.current_prefix(), path);
        let value = encode_leaf(&key, &value)?;
        self.check_conflicts(&key, false)?;
        self.insert(key, value, PropertySource::Programmatic);
        Ok(())
    }

    /// Run `body` with writes prefixed by `name`
    ///
    /// The prefix is popped when `body` returns, whether it succeeded or not.
    /// An empty name or one with an empty segment fails before `body` runs.
    pub fn scope<R, F>(&mut self, name: &str, body: F) -> Result<R, PropertyError>
    where
        F: FnOnce(&mut Self) -> Result<R, PropertyError>,
    {
        if name.split('.').any(str::is_empty) {
            return Err(PropertyError::key_conflict(
                join_key(&self.current_prefix(), name),
                format!("Scope name '{}' has an empty segment.", name),
            ));
        }
        self.scopes.push(name.to_string());
        let result = body(self);
        self.scopes.pop();
        result
    }

    /// Leaf lookup, local entries first then the fallback
    pub fn get(&self, path: &str) -> Option<Value> {
        self.entries.get(path).cloned().or_else(|| {
            self.fallback
                .as_ref()
                .and_then(|fallback| fallback.resolve_property(path))
        })
    }

    /// Typed leaf lookup
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, PropertyError> {
        match self.get(path) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| PropertyError::Decode {
                    type_name: std::any::type_name::<T>(),
                    prefix: path.to_string(),
                    source,
                }),
        }
    }

    /// Write every leaf of `record`, replacing identical paths
    pub fn merge<T: PropertyRecord>(&mut self, record: &T) -> Result<(), PropertyError> {
        let entries = binder::flatten(record)?;
        self.merge_entries(entries, PropertySource::Record(std::any::type_name::<T>()))
    }

    /// Bulk-merge a flat map of absolute keys, replacing identical paths
    pub fn extend<I, K, V>(&mut self, entries: I) -> Result<(), PropertyError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize,
    {
        let mut encoded = BTreeMap::new();
        for (key, value) in entries {
            let key = key.into();
            let value = encode_leaf(&key, &value)?;
            encoded.insert(key, value);
        }
        self.merge_entries(encoded, PropertySource::Programmatic)
    }

    /// Merge a YAML document
    pub fn extend_yaml(&mut self, document: &str) -> Result<(), PropertyError> {
        let entries = sources::yaml_entries(document)?;
        self.merge_entries(entries, PropertySource::File("<inline>".to_string()))
    }

    /// Merge a YAML file
    pub fn extend_yaml_file(&mut self, path: impl AsRef<Path>) -> Result<(), PropertyError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path)?;
        let entries = sources::yaml_entries(&document)?;
        self.merge_entries(entries, PropertySource::File(path.display().to_string()))
    }

    /// Merge process environment variables named `{prefix}__...`
    pub fn extend_env(&mut self, prefix: &str) -> Result<(), PropertyError> {
        self.extend_env_from(prefix, std::env::vars())
    }

    /// Merge `{prefix}__...` variables from an explicit list
    pub fn extend_env_from<I>(&mut self, prefix: &str, vars: I) -> Result<(), PropertyError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let batch = sources::env_entries(prefix, vars)
            .into_iter()
            .map(|(key, (var, value))| (key, (value, PropertySource::EnvVar(var))))
            .collect();
        self.commit(batch)
    }

    fn merge_entries(
        &mut self,
        entries: BTreeMap<String, Value>,
        source: PropertySource,
    ) -> Result<(), PropertyError> {
        let batch = entries
            .into_iter()
            .map(|(key, value)| (key, (value, source.clone())))
            .collect();
        self.commit(batch)
    }

    /// Insert a batch, or nothing at all if any key conflicts
    ///
    /// Keys are checked against the stored entries and against each other
    /// before the first insert.
    fn commit(&mut self, batch: BTreeMap<String, (Value, PropertySource)>) -> Result<(), PropertyError> {
        for key in batch.keys() {
            self.check_conflicts(key, true)?;
            check_tree_shape(&batch, key, true)?;
        }
        for (key, (value, source)) in batch {
            self.insert(key, value, source);
        }
        Ok(())
    }

    fn insert(&mut self, key: String, value: Value, source: PropertySource) {
        self.sources.insert(key.clone(), source);
        self.entries.insert(key, value);
    }

    fn check_conflicts(&self, key: &str, overwrite: bool) -> Result<(), PropertyError> {
        check_tree_shape(&self.entries, key, overwrite)
    }

    /// Remove a leaf
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.sources.remove(key);
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> &BTreeMap<String, Value> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Where `key` was declared
    pub fn source_of(&self, key: &str) -> Option<&PropertySource> {
        self.sources.get(key)
    }

    /// Rebuild the nested tree of all local entries
    pub fn to_nested_tree(&self) -> Result<Value, PropertyError> {
        tree::to_nested_tree(&self.entries)
    }

    /// Bind `T` from its canonical prefix
    pub fn bind<T: PropertyRecord>(&self) -> Result<Option<T>, PropertyError> {
        binder::bind(&self.entries, None)
    }

    /// Bind `T` from an explicit prefix
    pub fn bind_at<T: PropertyRecord>(&self, prefix: &str) -> Result<Option<T>, PropertyError> {
        binder::bind(&self.entries, Some(prefix))
    }
}

impl PropertyResolver for PropertyStore {
    fn resolve_property(&self, key: &str) -> Option<Value> {
        self.get(key)
    }
}

impl std::fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyStore")
            .field("entries", &self.entries)
            .field("scopes", &self.scopes)
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Whether `key` fits among `entries` as a leaf
///
/// With `overwrite` an existing leaf at `key` itself is allowed.
fn check_tree_shape<V>(entries: &BTreeMap<String, V>, key: &str, overwrite: bool) -> Result<(), PropertyError> {
    if key.is_empty() {
        return Err(PropertyError::key_conflict(key, "Property key cannot be empty."));
    }

    if key.split('.').any(str::is_empty) {
        return Err(PropertyError::key_conflict(
            key,
            format!("Key '{}' has an empty segment.", key),
        ));
    }

    if !overwrite && entries.contains_key(key) {
        return Err(PropertyError::key_conflict(
            key,
            format!("Key '{}' already holds a value.", key),
        ));
    }

    for (index, _) in key.match_indices('.') {
        let ancestor = &key[..index];
        if entries.contains_key(ancestor) {
            return Err(PropertyError::key_conflict(
                key,
                format!(
                    "Part '{}' for key '{}' is already a value and cannot be an object.",
                    ancestor, key
                ),
            ));
        }
    }

    let children = format!("{}.", key);
    let has_children = entries
        .range(children.clone()..)
        .next()
        .is_some_and(|(existing, _)| existing.starts_with(&children));
    if has_children {
        return Err(PropertyError::key_conflict(
            key,
            format!(
                "Part '{}' for key '{}' is already an object and cannot be a value.",
                key, key
            ),
        ));
    }

    Ok(())
}

fn encode_leaf<V: Serialize + ?Sized>(key: &str, value: &V) -> Result<Value, PropertyError> {
    match serde_json::to_value(value) {
        Ok(Value::Null) => Err(PropertyError::unsupported_type(key, "null")),
        Ok(value) => Ok(value),
        Err(_) => Err(PropertyError::unsupported_type(
            key,
            std::any::type_name::<V>(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    enum Mode {
        Fast,
    }

    #[test]
    fn test_set_and_get() {
        let mut store = PropertyStore::new();
        store.set("server.host", "localhost").unwrap();
        store.set("server.port", 8080).unwrap();
        store.set("server.mode", Mode::Fast).unwrap();

        assert_eq!(store.get("server.host"), Some(json!("localhost")));
        assert_eq!(store.get_as::<u16>("server.port").unwrap(), Some(8080));
        assert_eq!(store.get("server.mode"), Some(json!("Fast")));
        assert_eq!(store.get_as::<Mode>("server.mode").unwrap(), Some(Mode::Fast));
        assert_eq!(store.source_of("server.port"), Some(&PropertySource::Programmatic));
    }

    #[test]
    fn test_set_same_key_twice_conflicts() {
        let mut store = PropertyStore::new();
        store.set("a", 1).unwrap();
        assert!(store.set("a", 2).unwrap_err().is_key_conflict());
        assert_eq!(store.get("a"), Some(json!(1)));
    }

    #[test]
    fn test_cross_level_conflicts_in_both_orders() {
        let mut store = PropertyStore::new();
        store.set("a.b", 1).unwrap();
        assert!(store.set("a", 2).unwrap_err().is_key_conflict());

        let mut store = PropertyStore::new();
        store.set("a", 1).unwrap();
        assert!(store.set("a.b", 2).unwrap_err().is_key_conflict());

        let mut store = PropertyStore::new();
        store.set("a.b.c", 1).unwrap();
        assert!(store.set("a", 2).unwrap_err().is_key_conflict());
        store.set("ab", 3).unwrap();
    }

    #[test]
    fn test_unsupported_values() {
        let mut store = PropertyStore::new();
        assert!(store.set("nothing", Option::<u8>::None).unwrap_err().is_unsupported_type());

        let mut bad = HashMap::new();
        bad.insert(vec![1u8], "x");
        assert!(store.set("bad", bad).unwrap_err().is_unsupported_type());
        assert!(store.is_empty());
    }

    #[test]
    fn test_nested_scopes() {
        let mut store = PropertyStore::new();
        store
            .scope("ktor", |store| {
                store.scope("client", |store| {
                    store.set("request.url", "https://example.com")?;
                    store.scope("retry", |store| store.set("attempts", 2))
                })?;
                store.set("enabled", true)
            })
            .unwrap();

        assert_eq!(store.get("ktor.client.request.url"), Some(json!("https://example.com")));
        assert_eq!(store.get("ktor.client.retry.attempts"), Some(json!(2)));
        assert_eq!(store.get("ktor.enabled"), Some(json!(true)));
        assert_eq!(store.current_prefix(), "");
    }

    #[test]
    fn test_scope_is_restored_after_error() {
        let mut store = PropertyStore::new();
        store.set("a", 1).unwrap();

        let result = store.scope("outer", |store| {
            store.scope("inner", |store| {
                store.set("ok", true)?;
                store.set("ok", false)
            })
        });

        assert!(result.unwrap_err().is_key_conflict());
        assert_eq!(store.current_prefix(), "");
        store.set("b", 2).unwrap();
        assert!(store.contains_key("b"));
        assert!(store.contains_key("outer.inner.ok"));
    }

    #[test]
    fn test_fallback_lookup() {
        let mut fallback = BTreeMap::new();
        fallback.insert("remote.key".to_string(), json!("remote"));
        fallback.insert("shared".to_string(), json!("remote"));

        let mut store = PropertyStore::new().with_fallback(Arc::new(fallback));
        store.set("shared", "local").unwrap();

        assert_eq!(store.get("shared"), Some(json!("local")));
        assert_eq!(store.get("remote.key"), Some(json!("remote")));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_extend_overwrites_but_still_detects_conflicts() {
        let mut store = PropertyStore::new();
        store.set("a.b", 1).unwrap();
        store.extend([("a.b", 2)]).unwrap();
        assert_eq!(store.get("a.b"), Some(json!(2)));

        let error = store.extend([("a", 3)]).unwrap_err();
        assert!(error.is_key_conflict());
    }

    #[test]
    fn test_failed_extend_leaves_store_untouched() {
        let mut store = PropertyStore::new();
        store.set("b.c", 1).unwrap();

        let error = store.extend([("a", 1), ("b", 2)]).unwrap_err();
        assert!(error.is_key_conflict());
        assert_eq!(store.get("a"), None);
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["b.c"]);
    }

    #[test]
    fn test_conflicts_inside_one_batch() {
        let mut store = PropertyStore::new();
        let error = store.extend([("x", 1), ("x.y", 2), ("z", 3)]).unwrap_err();
        assert!(error.is_key_conflict());
        assert!(store.is_empty());

        store.extend_yaml("a: 1\nb:\n  c: 2\n").unwrap();
        assert!(store.extend_yaml("q: 1\nb: 3\n").unwrap_err().is_key_conflict());
        assert_eq!(store.get("q"), None);
    }

    #[test]
    fn test_failed_env_merge_leaves_store_untouched() {
        let mut store = PropertyStore::new();
        store.set("server", "shared").unwrap();

        let vars = vec![
            ("APP__NAME".to_string(), "demo".to_string()),
            ("APP__SERVER__PORT".to_string(), "9090".to_string()),
        ];
        assert!(store.extend_env_from("APP", vars).unwrap_err().is_key_conflict());
        assert_eq!(store.get("name"), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_non_finite_env_values_stay_text() {
        let mut store = PropertyStore::new();
        let vars = vec![
            ("APP__X".to_string(), ".nan".to_string()),
            ("APP__Y".to_string(), ".inf".to_string()),
            ("APP__Z".to_string(), "-.inf".to_string()),
        ];
        store.extend_env_from("APP", vars).unwrap();

        assert_eq!(store.get("x"), Some(json!(".nan")));
        assert_eq!(store.get("y"), Some(json!(".inf")));
        assert_eq!(store.get("z"), Some(json!("-.inf")));
    }

    #[test]
    fn test_empty_segments_are_rejected() {
        let mut store = PropertyStore::new();

        let error = store
            .scope("a", |store| store.scope("", |store| store.set("x", 1)))
            .unwrap_err();
        assert!(error.is_key_conflict());
        assert!(store.scope("a..b", |_| Ok(())).unwrap_err().is_key_conflict());
        assert!(store.set("a..x", 1).unwrap_err().is_key_conflict());
        assert!(store.set("a.", 1).unwrap_err().is_key_conflict());
        assert!(store.extend([(".a", 1)]).unwrap_err().is_key_conflict());

        assert!(store.is_empty());
        assert_eq!(store.current_prefix(), "");
    }

    #[test]
    fn test_merge_of_unserializable_record_is_unsupported() {
        #[derive(Debug, Default, Serialize, Deserialize)]
        struct Lookup {
            table: HashMap<Vec<u8>, String>,
        }

        impl PropertyRecord for Lookup {
            fn schema() -> crate::properties::PropertySchema {
                crate::properties::PropertySchema::new("lookup")
            }
        }

        let mut table = HashMap::new();
        table.insert(vec![1u8], "one".to_string());

        let mut store = PropertyStore::new();
        let error = store.merge(&Lookup { table }).unwrap_err();
        assert!(error.is_unsupported_type());
        assert!(store.is_empty());
    }

    #[test]
    fn test_extend_env_from_records_variable() {
        let mut store = PropertyStore::new();
        store
            .extend_env_from(
                "APP",
                vec![("APP__SERVER__PORT".to_string(), "9090".to_string())],
            )
            .unwrap();

        assert_eq!(store.get("server.port"), Some(json!(9090)));
        assert!(store.source_of("server.port").unwrap().is_env_var());
    }

    #[test]
    fn test_nested_tree_of_store() {
        let mut store = PropertyStore::new();
        store.set("a.b", 1).unwrap();
        store.set("a.c", "x").unwrap();
        assert_eq!(store.to_nested_tree().unwrap(), json!({"a": {"b": 1, "c": "x"}}));
    }

    #[test]
    fn test_remove() {
        let mut store = PropertyStore::new();
        store.set("a", 1).unwrap();
        assert_eq!(store.remove("a"), Some(json!(1)));
        assert!(store.source_of("a").is_none());
        store.set("a.b", 2).unwrap();
    }
}
