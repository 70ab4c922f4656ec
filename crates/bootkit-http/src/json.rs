use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::HttpError;
use crate::properties::JsonProperties;

/// JSON encoding rules shared by the HTTP client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonOptions {
    /// Accept fields the target type does not declare
    pub ignore_unknown_keys: bool,
    /// Accept relaxed syntax such as unquoted keys and single quotes
    pub is_lenient: bool,
    /// Keep fields equal to the type's default when encoding records
    pub encode_defaults: bool,
    pub pretty_print: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self::from_properties(&JsonProperties::default())
    }
}

impl JsonOptions {
    pub fn from_properties(properties: &JsonProperties) -> Self {
        Self {
            ignore_unknown_keys: properties.ignore_unknown_keys,
            is_lenient: properties.is_lenient,
            encode_defaults: properties.encode_defaults,
            pretty_print: properties.pretty_print,
        }
    }

    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, HttpError> {
        let encoded = if self.pretty_print {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        encoded.map_err(HttpError::Json)
    }

    /// Encode a record, dropping top-level fields equal to its default
    /// unless `encode_defaults` is set
    pub fn encode_record<T: Serialize + Default>(&self, value: &T) -> Result<String, HttpError> {
        if self.encode_defaults {
            return self.encode(value);
        }
        let mut encoded = serde_json::to_value(value)?;
        let defaults = serde_json::to_value(T::default())?;
        if let (Value::Object(fields), Value::Object(defaults)) = (&mut encoded, &defaults) {
            fields.retain(|key, field| defaults.get(key) != Some(field));
        }
        self.encode(&encoded)
    }

    pub fn decode<T: Serialize + DeserializeOwned>(&self, text: &str) -> Result<T, HttpError> {
        let value: Value = if self.is_lenient {
            serde_yaml::from_str(text).map_err(|error| HttpError::Decode(error.to_string()))?
        } else {
            serde_json::from_str(text)?
        };

        let decoded: T = serde_json::from_value(value.clone())?;

        if !self.ignore_unknown_keys {
            if let (Value::Object(received), Value::Object(known)) =
                (&value, &serde_json::to_value(&decoded)?)
            {
                if let Some(unknown) = received.keys().find(|key| !known.contains_key(*key)) {
                    return Err(HttpError::Decode(format!("unknown key '{}'", unknown)));
                }
            }
        }

        Ok(decoded)
    }
}
