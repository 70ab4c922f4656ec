use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::PropertyError;
use crate::properties::tree;

/// Where a property entry came from, for debugging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertySource {
    /// Declared in code through the property store
    Programmatic,
    /// Flattened from a typed record
    Record(&'static str),
    /// Loaded from a YAML document or file
    File(String),
    /// Loaded from an environment variable
    EnvVar(String),
}

impl PropertySource {
    pub fn is_env_var(&self) -> bool {
        matches!(self, PropertySource::EnvVar(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, PropertySource::File(_))
    }

    /// Get source description
    pub fn description(&self) -> String {
        match self {
            PropertySource::Programmatic => "Programmatically set".to_string(),
            PropertySource::Record(type_name) => format!("Typed record: {}", type_name),
            PropertySource::File(origin) => format!("Configuration file: {}", origin),
            PropertySource::EnvVar(var) => format!("Environment variable: {}", var),
        }
    }
}

impl std::fmt::Display for PropertySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Parse a YAML document into flat dot-keyed entries
pub fn yaml_entries(document: &str) -> Result<BTreeMap<String, Value>, PropertyError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(document)?;
    let value = serde_json::to_value(yaml)
        .map_err(|error| PropertyError::unsupported_type("", error.to_string()))?;

    match value {
        Value::Null => Ok(BTreeMap::new()),
        Value::Object(_) => Ok(tree::flatten_tree(&value, "")),
        other => Err(PropertyError::unsupported_type(
            "",
            format!("YAML document root must be a mapping, found {}", other),
        )),
    }
}

/// Collect environment variables named `{PREFIX}__A__B_C` as `a.bC` entries
///
/// Segments are separated by `__`; a single `_` inside a segment starts a
/// camel-case word. Raw text is read as a YAML scalar, so `2` and `true`
/// keep their types. Anything else, including `.nan` and `.inf`, stays a string.
pub fn env_entries<I>(prefix: &str, vars: I) -> BTreeMap<String, (String, Value)>
where
    I: IntoIterator<Item = (String, String)>,
{
    let marker = format!("{}__", prefix);
    vars.into_iter()
        .filter_map(|(name, raw)| {
            let rest = name.strip_prefix(&marker)?;
            let key = rest
                .split("__")
                .map(camel_segment)
                .collect::<Vec<_>>()
                .join(".");
            if key.is_empty() {
                return None;
            }
            Some((key, (name.clone(), scalar_value(&raw))))
        })
        .collect()
}

fn camel_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for (index, word) in segment.split('_').filter(|w| !w.is_empty()).enumerate() {
        let lower = word.to_lowercase();
        if index == 0 {
            out.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}

fn scalar_value(raw: &str) -> Value {
    match serde_yaml::from_str::<serde_yaml::Value>(raw) {
        Ok(serde_yaml::Value::Bool(flag)) => Value::Bool(flag),
        Ok(serde_yaml::Value::Number(number)) if !number.is_nan() && !number.is_infinite() => {
            serde_json::to_value(number).unwrap_or_else(|_| Value::String(raw.to_string()))
        }
        _ => Value::String(raw.to_string()),
    }
}
