use std::sync::Arc;

use crate::app::AppPropertiesExt;
use crate::autoconfig::{AutoConfiguration, AutoConfigurationRegistry};
use crate::container::{Container, Module};
use crate::errors::BootError;
use crate::lifecycle::{BootPhase, LifecycleExtender};
use crate::properties::{PropertyResolver, PropertyStore};

type ExtenderList = Arc<[Arc<dyn LifecycleExtender>]>;

/// State shared by every phase of a boot
pub struct BootContext {
    phase: Option<BootPhase>,
    extenders: Vec<Arc<dyn LifecycleExtender>>,
    frozen: Option<ExtenderList>,
    auto_configurations: AutoConfigurationRegistry,
    modules: Vec<Module>,
    properties: PropertyStore,
    container: Arc<Container>,
}

impl BootContext {
    pub fn new() -> Self {
        let container = Arc::new(Container::new());
        let fallback: Arc<dyn PropertyResolver> = container.clone();
        Self {
            phase: None,
            extenders: Vec::new(),
            frozen: None,
            auto_configurations: AutoConfigurationRegistry::new(),
            modules: Vec::new(),
            properties: PropertyStore::new().with_fallback(fallback),
            container,
        }
    }

    /// Current phase, `None` before the boot runs
    pub fn phase(&self) -> Option<BootPhase> {
        self.phase
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyStore {
        &mut self.properties
    }

    pub fn auto_configurations(&self) -> &AutoConfigurationRegistry {
        &self.auto_configurations
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn extender_names(&self) -> Vec<String> {
        self.extenders
            .iter()
            .map(|extender| extender.name().to_string())
            .collect()
    }

    /// Register an extender
    ///
    /// Extenders added once the boot is running do not observe it.
    pub fn add_extender(&mut self, extender: Arc<dyn LifecycleExtender>) {
        if self.frozen.is_some() {
            tracing::warn!(
                extender = extender.name(),
                "Lifecycle extender registered after the boot started; it will not be notified"
            );
        }
        self.extenders.push(extender);
    }

    /// Remove every extender called `name`, returning whether one was found
    pub fn remove_extender(&mut self, name: &str) -> bool {
        let before = self.extenders.len();
        self.extenders.retain(|extender| extender.name() != name);
        before != self.extenders.len()
    }

    pub fn add_auto_configuration<A: AutoConfiguration + 'static>(&mut self, unit: A) {
        self.auto_configurations.register(unit);
    }

    pub fn add_auto_configuration_arc(&mut self, unit: Arc<dyn AutoConfiguration>) {
        self.auto_configurations.register_arc(unit);
    }

    pub fn add_module(&mut self, module: Module) {
        self.modules.push(module);
    }

    /// Fix the set of extenders notified for the rest of the boot
    pub(crate) fn freeze_extenders(&mut self) {
        let snapshot: ExtenderList = self.extenders.clone().into();
        self.frozen = Some(snapshot);
    }

    fn listeners(&self) -> ExtenderList {
        match &self.frozen {
            Some(frozen) => frozen.clone(),
            None => self.extenders.clone().into(),
        }
    }

    /// Enter `phase` and notify every extender
    pub fn change_phase(&mut self, phase: BootPhase) -> Result<(), BootError> {
        let allowed = match self.phase {
            Some(current) => current.can_transition_to(phase),
            None => phase == BootPhase::Starting,
        };
        if !allowed {
            return Err(BootError::InvalidTransition {
                from: self
                    .phase
                    .map_or_else(|| "created".to_string(), |current| current.to_string()),
                to: phase,
            });
        }

        self.phase = Some(phase);
        tracing::info!("Boot phase: {}", phase);

        for extender in self.listeners().iter() {
            extender.on_phase(phase, self).map_err(|source| {
                tracing::error!(
                    phase = %phase,
                    extender = extender.name(),
                    error = %source,
                    "Lifecycle extender failed"
                );
                BootError::PhaseHookFailure {
                    phase,
                    extender: extender.name().to_string(),
                    source,
                }
            })?;
        }
        Ok(())
    }

    /// Enter `phase`, notify extenders, then run the phase's own action
    pub fn execute_phase<F>(&mut self, phase: BootPhase, action: F) -> Result<(), BootError>
    where
        F: FnOnce(&mut BootContext) -> Result<(), BootError>,
    {
        self.change_phase(phase)?;
        action(self).map_err(|cause| BootError::phase_failure(phase, cause))
    }

    /// Apply `app.logger.level` to the container
    pub fn apply_logger_level(&mut self) -> Result<(), BootError> {
        let level = self.properties.app_properties()?.logger.level;
        self.container.set_log_level(level);
        tracing::debug!(level = %level, "Container log level applied");
        Ok(())
    }

    /// Publish the declared properties as the container's global properties
    pub fn load_properties(&mut self) -> Result<(), BootError> {
        let mut entries = self.container.property_entries();
        entries.extend(
            self.properties
                .entries()
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        self.container.set_properties(entries)?;
        Ok(())
    }

    /// Load user modules, then evaluate auto-configuration into one staging module
    pub fn load_modules(&mut self) -> Result<(), BootError> {
        let modules = std::mem::take(&mut self.modules);
        let module_count = modules.len();
        self.container.load_modules(modules)?;

        let outcome = self
            .auto_configurations
            .evaluate_all(&self.container, &self.properties)?;
        tracing::info!(
            modules = module_count,
            applied = outcome.applied.len(),
            skipped = outcome.skipped.len(),
            "Modules loaded"
        );
        self.container.load_module(outcome.module)?;
        Ok(())
    }
}

impl Default for BootContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BootContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootContext")
            .field("phase", &self.phase)
            .field("extenders", &self.extender_names())
            .field("auto_configurations", &self.auto_configurations)
            .field("modules", &self.modules.len())
            .field("properties", &self.properties)
            .field("container", &self.container)
            .finish()
    }
}
