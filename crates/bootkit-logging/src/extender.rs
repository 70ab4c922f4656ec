use bootkit::{BootContext, BootDeclaration, BootError, HookResult, LifecycleExtender};

use crate::config::LoggingProperties;
use crate::subscriber::init_logging;

/// Installs the tracing subscriber while the boot is configuring
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingExtender;

impl LifecycleExtender for LoggingExtender {
    fn name(&self) -> &str {
        "logging"
    }

    fn on_configuring(&self, context: &mut BootContext) -> HookResult {
        let properties = context
            .properties()
            .bind::<LoggingProperties>()?
            .unwrap_or_default();
        init_logging(&properties)?;
        Ok(())
    }
}

/// Initializer registering [`LoggingExtender`]
pub fn logging_initializer(declaration: &mut BootDeclaration) -> Result<(), BootError> {
    declaration.extender(LoggingExtender);
    Ok(())
}
