extern crate self as bootkit;

pub mod app;
pub mod autoconfig;
pub mod boot;
pub mod container;
pub mod errors;
pub mod introspection;
pub mod lifecycle;
pub mod properties;

// Re-export key types for convenience
pub use app::{AppProperties, AppPropertiesExt, LogLevel, LoggerProperties, APP_LOGGER_LEVEL};
pub use autoconfig::{
    auto_configuration, AutoConfiguration, AutoConfigurationRegistry, AutoConfigurationScope,
};
pub use boot::{run_boot, BootDeclaration};
pub use container::{Container, Module, Qualifier, ScopeId, ServiceId, ServiceScope};
pub use errors::{BootError, CoreError, HookError, PropertyError};
pub use lifecycle::{Boot, BootContext, BootPhase, HookResult, LifecycleExtender, PhaseHooks};
pub use properties::{PropertyRecord, PropertySchema, PropertySource, PropertyStore};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get framework version
pub fn version() -> &'static str {
    VERSION
}
