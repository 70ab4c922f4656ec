/// Phases of a boot, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BootPhase {
    Starting,
    Configuring,
    PropertiesLoading,
    ModulesLoading,
    Ready,
    Running,
    Stopping,
    Stopped,
}

impl BootPhase {
    pub const STARTUP: [BootPhase; 6] = [
        BootPhase::Starting,
        BootPhase::Configuring,
        BootPhase::PropertiesLoading,
        BootPhase::ModulesLoading,
        BootPhase::Ready,
        BootPhase::Running,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BootPhase::Starting => "starting",
            BootPhase::Configuring => "configuring",
            BootPhase::PropertiesLoading => "properties-loading",
            BootPhase::ModulesLoading => "modules-loading",
            BootPhase::Ready => "ready",
            BootPhase::Running => "running",
            BootPhase::Stopping => "stopping",
            BootPhase::Stopped => "stopped",
        }
    }

    /// The phase that follows on the normal path
    pub fn next(&self) -> Option<BootPhase> {
        match self {
            BootPhase::Starting => Some(BootPhase::Configuring),
            BootPhase::Configuring => Some(BootPhase::PropertiesLoading),
            BootPhase::PropertiesLoading => Some(BootPhase::ModulesLoading),
            BootPhase::ModulesLoading => Some(BootPhase::Ready),
            BootPhase::Ready => Some(BootPhase::Running),
            BootPhase::Running => Some(BootPhase::Stopping),
            BootPhase::Stopping => Some(BootPhase::Stopped),
            BootPhase::Stopped => None,
        }
    }

    pub fn is_startup(&self) -> bool {
        *self <= BootPhase::Running
    }

    pub fn is_shutdown(&self) -> bool {
        !self.is_startup()
    }

    /// Legal transitions: the startup path in order, any startup phase
    /// to `Stopping`, and `Stopping` to `Stopped`
    pub fn can_transition_to(&self, to: BootPhase) -> bool {
        if to == BootPhase::Stopping {
            return self.is_startup();
        }
        self.next() == Some(to)
    }
}

impl std::fmt::Display for BootPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
