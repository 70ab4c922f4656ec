use bootkit::properties::{PropertyRecord, PropertyStore};
use bootkit::PropertyError;
use serde::{Deserialize, Serialize};

pub const SETTINGS_DESKTOP_PATH: &str = "settings.desktop.path";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, PropertyRecord)]
#[serde(default, rename_all = "camelCase")]
#[property(prefix = "settings")]
pub struct SettingsProperties {
    #[property(nested)]
    pub desktop: DesktopProperties,
}

/// File-backed storage location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, PropertyRecord)]
#[serde(default, rename_all = "camelCase")]
#[property(prefix = "settings.desktop")]
pub struct DesktopProperties {
    /// Directory holding one JSON document per settings name
    pub path: Option<String>,
}

pub trait SettingsPropertiesExt {
    fn settings_desktop_path(&mut self, path: &str) -> Result<&mut Self, PropertyError>;
}

impl SettingsPropertiesExt for PropertyStore {
    fn settings_desktop_path(&mut self, path: &str) -> Result<&mut Self, PropertyError> {
        self.set(SETTINGS_DESKTOP_PATH, path)?;
        Ok(self)
    }
}
