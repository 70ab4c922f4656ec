//! Application-wide properties read by the boot itself

use serde::{Deserialize, Serialize};

use crate::errors::PropertyError;
use crate::properties::{PropertyRecord, PropertyStore};

/// Key holding the container log verbosity
pub const APP_LOGGER_LEVEL: &str = "app.logger.level";

/// Verbosity of the container's own logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    #[default]
    Debug,
    Info,
    Warning,
    Error,
    None,
}

impl LogLevel {
    /// Whether a message at `level` passes this threshold
    pub fn allows(&self, level: LogLevel) -> bool {
        *self != LogLevel::None && level != LogLevel::None && level >= *self
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::None => "NONE",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, PropertyRecord)]
#[serde(default, rename_all = "camelCase")]
#[property(prefix = "app.logger")]
pub struct LoggerProperties {
    pub level: LogLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, PropertyRecord)]
#[serde(default, rename_all = "camelCase")]
#[property(prefix = "app")]
pub struct AppProperties {
    #[property(nested)]
    pub logger: LoggerProperties,
}

/// Typed access to the `app.*` keys of a [`PropertyStore`]
pub trait AppPropertiesExt {
    fn app_logger_level(&mut self, level: LogLevel) -> Result<&mut Self, PropertyError>;
    fn app_properties(&self) -> Result<AppProperties, PropertyError>;
}

impl AppPropertiesExt for PropertyStore {
    fn app_logger_level(&mut self, level: LogLevel) -> Result<&mut Self, PropertyError> {
        self.set(APP_LOGGER_LEVEL, level)?;
        Ok(self)
    }

    fn app_properties(&self) -> Result<AppProperties, PropertyError> {
        Ok(self.bind::<AppProperties>()?.unwrap_or_default())
    }
}
