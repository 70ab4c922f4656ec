use crate::errors::HookError;
use crate::lifecycle::{BootContext, BootPhase};

pub type HookResult = Result<(), HookError>;

/// Observer of boot phase transitions
///
/// Every hook defaults to a no-op. Hooks run in registration order after the
/// context has entered the phase; an error aborts startup.
pub trait LifecycleExtender: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn on_starting(&self, context: &mut BootContext) -> HookResult {
        let _ = context;
        Ok(())
    }

    fn on_configuring(&self, context: &mut BootContext) -> HookResult {
        let _ = context;
        Ok(())
    }

    fn on_properties_loading(&self, context: &mut BootContext) -> HookResult {
        let _ = context;
        Ok(())
    }

    fn on_modules_loading(&self, context: &mut BootContext) -> HookResult {
        let _ = context;
        Ok(())
    }

    fn on_ready(&self, context: &mut BootContext) -> HookResult {
        let _ = context;
        Ok(())
    }

    fn on_running(&self, context: &mut BootContext) -> HookResult {
        let _ = context;
        Ok(())
    }

    fn on_stopping(&self, context: &mut BootContext) -> HookResult {
        let _ = context;
        Ok(())
    }

    fn on_stopped(&self, context: &mut BootContext) -> HookResult {
        let _ = context;
        Ok(())
    }

    /// Dispatch to the hook for `phase`
    fn on_phase(&self, phase: BootPhase, context: &mut BootContext) -> HookResult {
        match phase {
            BootPhase::Starting => self.on_starting(context),
            BootPhase::Configuring => self.on_configuring(context),
            BootPhase::PropertiesLoading => self.on_properties_loading(context),
            BootPhase::ModulesLoading => self.on_modules_loading(context),
            BootPhase::Ready => self.on_ready(context),
            BootPhase::Running => self.on_running(context),
            BootPhase::Stopping => self.on_stopping(context),
            BootPhase::Stopped => self.on_stopped(context),
        }
    }
}

type PhaseHookFn = Box<dyn Fn(&mut BootContext) -> HookResult + Send + Sync>;

/// Extender made of closures, one per phase it cares about
pub struct PhaseHooks {
    name: String,
    hooks: Vec<(BootPhase, PhaseHookFn)>,
}

impl PhaseHooks {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hooks: Vec::new(),
        }
    }

    pub fn on<F>(mut self, phase: BootPhase, hook: F) -> Self
    where
        F: Fn(&mut BootContext) -> HookResult + Send + Sync + 'static,
    {
        self.hooks.push((phase, Box::new(hook)));
        self
    }
}

impl LifecycleExtender for PhaseHooks {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_phase(&self, phase: BootPhase, context: &mut BootContext) -> HookResult {
        for (hook_phase, hook) in &self.hooks {
            if *hook_phase == phase {
                hook(context)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for PhaseHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseHooks")
            .field("name", &self.name)
            .field(
                "phases",
                &self.hooks.iter().map(|(phase, _)| *phase).collect::<Vec<_>>(),
            )
            .finish()
    }
}
