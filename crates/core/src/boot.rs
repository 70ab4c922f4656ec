//! Declarative boot entry point
//!
//! ```ignore
//! let container = run_boot(|boot| {
//!     boot.with(logging_initializer)?
//!         .properties(|props| props.set("app.logger.level", "INFO"))?
//!         .module(|m| {
//!             m.single(|_| Ok(Clock::system()));
//!         });
//!     Ok(())
//! })?;
//! ```

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::autoconfig::AutoConfiguration;
use crate::container::{Container, Module};
use crate::errors::{BootError, PropertyError};
use crate::lifecycle::{Boot, BootContext, LifecycleExtender};
use crate::properties::{PropertyRecord, PropertyStore};

/// Everything a boot is made of, collected before it runs
#[derive(Debug, Default)]
pub struct BootDeclaration {
    context: BootContext,
}

impl BootDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply another initializer, typically one exported by an adapter crate
    pub fn with<F>(&mut self, initializer: F) -> Result<&mut Self, BootError>
    where
        F: FnOnce(&mut BootDeclaration) -> Result<(), BootError>,
    {
        initializer(self)?;
        Ok(self)
    }

    pub fn extender<E: LifecycleExtender + 'static>(&mut self, extender: E) -> &mut Self {
        self.context.add_extender(Arc::new(extender));
        self
    }

    pub fn extenders(
        &mut self,
        extenders: impl IntoIterator<Item = Arc<dyn LifecycleExtender>>,
    ) -> &mut Self {
        for extender in extenders {
            self.context.add_extender(extender);
        }
        self
    }

    pub fn auto_configuration<A: AutoConfiguration + 'static>(&mut self, unit: A) -> &mut Self {
        self.context.add_auto_configuration(unit);
        self
    }

    pub fn auto_configurations(
        &mut self,
        units: impl IntoIterator<Item = Arc<dyn AutoConfiguration>>,
    ) -> &mut Self {
        for unit in units {
            self.context.add_auto_configuration_arc(unit);
        }
        self
    }

    /// Declare a module in place
    pub fn module(&mut self, body: impl FnOnce(&mut Module)) -> &mut Self {
        self.context.add_module(Module::build(body));
        self
    }

    pub fn modules(&mut self, modules: impl IntoIterator<Item = Module>) -> &mut Self {
        for module in modules {
            self.context.add_module(module);
        }
        self
    }

    /// Write properties through the store API
    pub fn properties<F>(&mut self, body: F) -> Result<&mut Self, PropertyError>
    where
        F: FnOnce(&mut PropertyStore) -> Result<(), PropertyError>,
    {
        body(self.context.properties_mut())?;
        Ok(self)
    }

    /// Merge a flat map of absolute keys
    pub fn properties_map<I, K, V>(&mut self, entries: I) -> Result<&mut Self, PropertyError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize,
    {
        self.context.properties_mut().extend(entries)?;
        Ok(self)
    }

    /// Merge every leaf of a typed record under its prefix
    pub fn properties_record<T: PropertyRecord>(&mut self, record: &T) -> Result<&mut Self, PropertyError> {
        self.context.properties_mut().merge(record)?;
        Ok(self)
    }

    /// Merge an inline YAML document
    pub fn properties_yaml(&mut self, document: &str) -> Result<&mut Self, PropertyError> {
        self.context.properties_mut().extend_yaml(document)?;
        Ok(self)
    }

    pub fn properties_yaml_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, PropertyError> {
        self.context.properties_mut().extend_yaml_file(path)?;
        Ok(self)
    }

    /// Overlay `{prefix}__...` environment variables
    pub fn properties_env(&mut self, prefix: &str) -> Result<&mut Self, PropertyError> {
        self.context.properties_mut().extend_env(prefix)?;
        Ok(self)
    }

    pub fn context(&self) -> &BootContext {
        &self.context
    }

    pub fn build(self) -> Boot {
        Boot::from_context(self.context)
    }
}

/// Declare and run a boot in one call
pub fn run_boot<F>(initializer: F) -> Result<Arc<Container>, BootError>
where
    F: FnOnce(&mut BootDeclaration) -> Result<(), BootError>,
{
    Boot::new(initializer)?.run()
}
