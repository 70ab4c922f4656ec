use bootkit::autoconfig::{AutoConfiguration, AutoConfigurationScope};
use bootkit::{BootDeclaration, BootError, Container, CoreError, HookError};
use std::sync::Arc;

use crate::factory::{FileSettingsFactory, MemorySettingsFactory, SettingsFactory, SettingsRegistry};
use crate::properties::SettingsProperties;
use crate::settings::Settings;

/// Shared handle under which the settings factory is bound
pub type SharedSettingsFactory = Arc<dyn SettingsFactory>;

/// Binds a settings factory and a [`SettingsRegistry`] when the user has not
///
/// The default factory writes JSON files under `settings.desktop.path` when
/// it is set and keeps settings in memory otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct SettingsAutoConfiguration;

impl AutoConfiguration for SettingsAutoConfiguration {
    fn name(&self) -> &str {
        "settings"
    }

    fn configure(&self, scope: &mut AutoConfigurationScope<'_>) -> Result<(), HookError> {
        let properties: SettingsProperties = scope.property_record_or_default()?;

        scope.on_missing::<SharedSettingsFactory>(|scope| {
            let factory: SharedSettingsFactory = match properties.desktop.path {
                Some(path) => {
                    tracing::debug!("Settings stored under {}", path);
                    Arc::new(FileSettingsFactory::new(path))
                }
                None => Arc::new(MemorySettingsFactory),
            };
            scope.instance(factory);
        });

        scope.on_missing::<SettingsRegistry>(|scope| {
            scope.single(|container| {
                let factory = container.resolve::<SharedSettingsFactory>()?;
                Ok(SettingsRegistry::new(factory.as_ref().clone()))
            });
        });

        Ok(())
    }
}

/// Initializer registering [`SettingsAutoConfiguration`]
pub fn settings_initializer(declaration: &mut BootDeclaration) -> Result<(), BootError> {
    declaration.auto_configuration(SettingsAutoConfiguration);
    Ok(())
}

/// Named settings lookup on the container
pub trait ContainerSettingsExt {
    fn settings(&self, name: &str) -> Result<Arc<dyn Settings>, CoreError>;
}

impl ContainerSettingsExt for Container {
    fn settings(&self, name: &str) -> Result<Arc<dyn Settings>, CoreError> {
        self.resolve::<SettingsRegistry>()?
            .settings(name)
            .map_err(CoreError::initialization::<SettingsRegistry>)
    }
}
