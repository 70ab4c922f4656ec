use thiserror::Error;

/// Error raised while declaring, reading or binding properties
#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("Key conflict for '{key}': {message}")]
    KeyConflict { key: String, message: String },

    #[error("Unsupported property type for '{key}': {type_name}")]
    UnsupportedType { key: String, type_name: String },

    #[error("Failed to bind '{type_name}' from prefix '{prefix}': {source}")]
    Decode {
        type_name: &'static str,
        prefix: String,
        source: serde_json::Error,
    },

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PropertyError {
    /// Create a new key conflict error
    pub fn key_conflict(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::KeyConflict {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a new unsupported type error
    pub fn unsupported_type(key: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            key: key.into(),
            type_name: type_name.into(),
        }
    }

    pub fn is_key_conflict(&self) -> bool {
        matches!(self, Self::KeyConflict { .. })
    }

    pub fn is_unsupported_type(&self) -> bool {
        matches!(self, Self::UnsupportedType { .. })
    }
}
