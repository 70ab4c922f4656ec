//! # bootkit-settings
//!
//! Named key-value settings stores. The auto-configuration binds a
//! [`SettingsRegistry`] backed by JSON files under `settings.desktop.path`,
//! or by memory when no path is configured.

pub mod auto_config;
pub mod error;
pub mod factory;
pub mod properties;
pub mod settings;

pub use auto_config::{settings_initializer, ContainerSettingsExt, SettingsAutoConfiguration, SharedSettingsFactory};
pub use error::SettingsError;
pub use factory::{FileSettingsFactory, MemorySettingsFactory, SettingsFactory, SettingsRegistry};
pub use properties::{DesktopProperties, SettingsProperties, SettingsPropertiesExt, SETTINGS_DESKTOP_PATH};
pub use settings::{FileSettings, MemorySettings, Settings};
