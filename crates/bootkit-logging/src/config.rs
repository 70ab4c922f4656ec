//! Logging properties bound from `logging.*`

use bootkit::properties::{PropertyRecord, PropertyStore};
use bootkit::PropertyError;
use serde::{Deserialize, Serialize};

pub const LOGGING_LEVEL: &str = "logging.level";
pub const LOGGING_FORMAT: &str = "logging.format";
pub const LOGGING_FILTER: &str = "logging.filter";

/// Minimum severity written by the subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Verbose,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
    Assert,
}

impl Severity {
    /// Directive understood by `EnvFilter`
    pub fn directive(&self) -> &'static str {
        match self {
            Severity::Verbose => "trace",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error | Severity::Assert => "error",
        }
    }
}

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, PropertyRecord)]
#[serde(default, rename_all = "camelCase")]
#[property(prefix = "logging")]
pub struct LoggingProperties {
    pub level: Severity,
    pub format: LogFormat,
    /// Full `EnvFilter` directive, overrides `level`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    pub include_location: bool,
}

impl LoggingProperties {
    /// The directive handed to `EnvFilter`
    pub fn filter_directive(&self) -> &str {
        self.filter.as_deref().unwrap_or(self.level.directive())
    }
}

/// Typed setters for the `logging.*` keys
pub trait LoggingPropertiesExt {
    fn logging_level(&mut self, level: Severity) -> Result<&mut Self, PropertyError>;
    fn logging_format(&mut self, format: LogFormat) -> Result<&mut Self, PropertyError>;
    fn logging_filter(&mut self, filter: &str) -> Result<&mut Self, PropertyError>;
}

impl LoggingPropertiesExt for PropertyStore {
    fn logging_level(&mut self, level: Severity) -> Result<&mut Self, PropertyError> {
        self.set(LOGGING_LEVEL, level)?;
        Ok(self)
    }

    fn logging_format(&mut self, format: LogFormat) -> Result<&mut Self, PropertyError> {
        self.set(LOGGING_FORMAT, format)?;
        Ok(self)
    }

    fn logging_filter(&mut self, filter: &str) -> Result<&mut Self, PropertyError> {
        self.set(LOGGING_FILTER, filter)?;
        Ok(self)
    }
}
