//! # Settings stores
//!
//! A [`Settings`] is a flat key-value store holding strings, integers,
//! booleans and floats. [`MemorySettings`] lives for the process,
//! [`FileSettings`] persists every write to a JSON document.

use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::SettingsError;

pub trait Settings: Send + Sync {
    /// Name the store was created under
    fn name(&self) -> &str;

    fn value(&self, key: &str) -> Option<Value>;

    fn put_value(&self, key: &str, value: Value) -> Result<(), SettingsError>;

    /// Remove `key`, returning whether it was present
    fn remove(&self, key: &str) -> Result<bool, SettingsError>;

    fn keys(&self) -> Vec<String>;

    fn clear(&self) -> Result<(), SettingsError>;

    fn has_key(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    fn size(&self) -> usize {
        self.keys().len()
    }

    fn string(&self, key: &str) -> Option<String> {
        match self.value(key)? {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.string(key).unwrap_or_else(|| default.to_string())
    }

    fn put_string(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.put_value(key, Value::String(value.to_string()))
    }

    fn int(&self, key: &str) -> Option<i64> {
        self.value(key)?.as_i64()
    }

    fn int_or(&self, key: &str, default: i64) -> i64 {
        self.int(key).unwrap_or(default)
    }

    fn put_int(&self, key: &str, value: i64) -> Result<(), SettingsError> {
        self.put_value(key, Value::from(value))
    }

    fn bool(&self, key: &str) -> Option<bool> {
        self.value(key)?.as_bool()
    }

    fn bool_or(&self, key: &str, default: bool) -> bool {
        self.bool(key).unwrap_or(default)
    }

    fn put_bool(&self, key: &str, value: bool) -> Result<(), SettingsError> {
        self.put_value(key, Value::Bool(value))
    }

    fn float(&self, key: &str) -> Option<f64> {
        self.value(key)?.as_f64()
    }

    fn float_or(&self, key: &str, default: f64) -> f64 {
        self.float(key).unwrap_or(default)
    }

    /// Non-finite values cannot be stored in JSON and are rejected
    fn put_float(&self, key: &str, value: f64) -> Result<(), SettingsError> {
        let number = Number::from_f64(value).ok_or_else(|| SettingsError::Encode {
            key: key.to_string(),
            source: serde::ser::Error::custom(format!("{} is not a finite number", value)),
        })?;
        self.put_value(key, Value::Number(number))
    }
}

impl std::fmt::Debug for dyn Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("name", &self.name())
            .field("size", &self.size())
            .finish()
    }
}

/// In-process settings
#[derive(Debug, Default)]
pub struct MemorySettings {
    name: String,
    values: RwLock<BTreeMap<String, Value>>,
}

impl MemorySettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: RwLock::new(BTreeMap::new()),
        }
    }

    fn lock_error(&self) -> SettingsError {
        SettingsError::LockError {
            name: self.name.clone(),
        }
    }
}

impl Settings for MemorySettings {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self, key: &str) -> Option<Value> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn put_value(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut values = self.values.write().map_err(|_| self.lock_error())?;
        values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, SettingsError> {
        let mut values = self.values.write().map_err(|_| self.lock_error())?;
        Ok(values.remove(key).is_some())
    }

    fn keys(&self) -> Vec<String> {
        self.values
            .read()
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn clear(&self) -> Result<(), SettingsError> {
        self.values.write().map_err(|_| self.lock_error())?.clear();
        Ok(())
    }
}

/// Settings persisted as a single JSON object
///
/// The document is read once when opened and rewritten after every change.
#[derive(Debug)]
pub struct FileSettings {
    name: String,
    path: PathBuf,
    values: RwLock<BTreeMap<String, Value>>,
}

impl FileSettings {
    /// Open the document at `path`; a missing file starts empty
    pub fn open(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => {
                let document: Map<String, Value> =
                    serde_json::from_str(&text).map_err(|source| SettingsError::Corrupt {
                        path: path.clone(),
                        source,
                    })?;
                document.into_iter().collect()
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => return Err(SettingsError::io(path, error)),
        };

        Ok(Self {
            name: name.into(),
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_error(&self) -> SettingsError {
        SettingsError::LockError {
            name: self.name.clone(),
        }
    }

    fn update<R>(&self, change: impl FnOnce(&mut BTreeMap<String, Value>) -> R) -> Result<R, SettingsError> {
        let mut values = self.values.write().map_err(|_| self.lock_error())?;
        let result = change(&mut values);
        self.persist(&values)?;
        Ok(result)
    }

    fn persist(&self, values: &BTreeMap<String, Value>) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| SettingsError::io(parent, error))?;
        }
        let text = serde_json::to_string_pretty(values).map_err(|source| SettingsError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, text).map_err(|error| SettingsError::io(&self.path, error))?;
        tracing::trace!("Settings '{}' written to {}", self.name, self.path.display());
        Ok(())
    }
}

impl Settings for FileSettings {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self, key: &str) -> Option<Value> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn put_value(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.update(|values| {
            values.insert(key.to_string(), value);
        })
    }

    fn remove(&self, key: &str) -> Result<bool, SettingsError> {
        self.update(|values| values.remove(key).is_some())
    }

    fn keys(&self) -> Vec<String> {
        self.values
            .read()
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn clear(&self) -> Result<(), SettingsError> {
        self.update(|values| values.clear())
    }
}
