use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::SettingsError;
use crate::settings::{FileSettings, MemorySettings, Settings};

/// Creates the store behind a settings name
pub trait SettingsFactory: Send + Sync {
    fn create(&self, name: &str) -> Result<Arc<dyn Settings>, SettingsError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MemorySettingsFactory;

impl SettingsFactory for MemorySettingsFactory {
    fn create(&self, name: &str) -> Result<Arc<dyn Settings>, SettingsError> {
        Ok(Arc::new(MemorySettings::new(name)))
    }
}

/// Stores each name as `<directory>/<name>.json`
#[derive(Debug, Clone)]
pub struct FileSettingsFactory {
    directory: PathBuf,
}

impl FileSettingsFactory {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Location of the document for `name`
    pub fn path_for(&self, name: &str) -> Result<PathBuf, SettingsError> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\'])
            && !name.contains('\0');
        if !valid {
            return Err(SettingsError::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(self.directory.join(format!("{}.json", name)))
    }
}

impl SettingsFactory for FileSettingsFactory {
    fn create(&self, name: &str) -> Result<Arc<dyn Settings>, SettingsError> {
        Ok(Arc::new(FileSettings::open(name, self.path_for(name)?)?))
    }
}

/// Hands out one shared store per settings name
pub struct SettingsRegistry {
    factory: Arc<dyn SettingsFactory>,
    cache: Mutex<HashMap<String, Arc<dyn Settings>>>,
}

impl SettingsRegistry {
    pub fn new(factory: Arc<dyn SettingsFactory>) -> Self {
        Self {
            factory,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySettingsFactory))
    }

    pub fn factory(&self) -> &Arc<dyn SettingsFactory> {
        &self.factory
    }

    /// Store for `name`, created on first use
    pub fn settings(&self, name: &str) -> Result<Arc<dyn Settings>, SettingsError> {
        let mut cache = self.cache.lock().map_err(|_| SettingsError::LockError {
            name: name.to_string(),
        })?;
        if let Some(settings) = cache.get(name) {
            return Ok(settings.clone());
        }

        let settings = self.factory.create(name)?;
        tracing::debug!("Created settings '{}'", name);
        cache.insert(name.to_string(), settings.clone());
        Ok(settings)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .cache
            .lock()
            .map(|cache| cache.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl fmt::Debug for SettingsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsRegistry")
            .field("names", &self.names())
            .finish_non_exhaustive()
    }
}
