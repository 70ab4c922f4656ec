use std::sync::Arc;

use crate::boot::BootDeclaration;
use crate::container::Container;
use crate::errors::BootError;
use crate::lifecycle::{BootContext, BootPhase};

/// A single boot run: startup phases in order, teardown on failure or stop
///
/// A `Boot` runs at most once. A second [`run`](Boot::run) fails with
/// [`BootError::AlreadyStarted`] without notifying any extender.
#[derive(Debug)]
pub struct Boot {
    context: BootContext,
    started: bool,
    attempted: bool,
}

impl Boot {
    /// Declare a boot with `initializer`
    pub fn new<F>(initializer: F) -> Result<Self, BootError>
    where
        F: FnOnce(&mut BootDeclaration) -> Result<(), BootError>,
    {
        let mut declaration = BootDeclaration::new();
        initializer(&mut declaration)?;
        Ok(declaration.build())
    }

    /// Start an empty declaration
    pub fn builder() -> BootDeclaration {
        BootDeclaration::new()
    }

    pub(crate) fn from_context(context: BootContext) -> Self {
        Self {
            context,
            started: false,
            attempted: false,
        }
    }

    pub fn context(&self) -> &BootContext {
        &self.context
    }

    pub fn container(&self) -> &Arc<Container> {
        self.context.container()
    }

    pub fn phase(&self) -> Option<BootPhase> {
        self.context.phase()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_running(&self) -> bool {
        self.started && self.context.phase() == Some(BootPhase::Running)
    }

    /// Run every startup phase and return the populated container
    ///
    /// Once `Starting` has completed, any failure stops the boot before the
    /// error is returned as [`BootError::StartupFailure`].
    pub fn run(&mut self) -> Result<Arc<Container>, BootError> {
        if self.attempted {
            return Err(BootError::AlreadyStarted);
        }
        self.attempted = true;
        self.context.freeze_extenders();

        match self.start() {
            Ok(()) => {
                tracing::info!(
                    services = self.container().service_count(),
                    "Boot running"
                );
                Ok(self.container().clone())
            }
            Err(cause) => {
                tracing::error!(error = %cause, "Boot failed to start");
                self.stop();
                Err(BootError::startup_failure(cause))
            }
        }
    }

    fn start(&mut self) -> Result<(), BootError> {
        self.context.execute_phase(BootPhase::Starting, |_| Ok(()))?;
        self.started = true;

        self.context
            .execute_phase(BootPhase::Configuring, BootContext::apply_logger_level)?;
        self.context
            .execute_phase(BootPhase::PropertiesLoading, BootContext::load_properties)?;
        self.context
            .execute_phase(BootPhase::ModulesLoading, BootContext::load_modules)?;
        self.context.execute_phase(BootPhase::Ready, |_| Ok(()))?;
        self.context.execute_phase(BootPhase::Running, |_| Ok(()))
    }

    /// Stop a started boot and close its container
    ///
    /// Does nothing unless the boot is started. Failures are logged.
    pub fn stop(&mut self) {
        if !self.started {
            return;
        }
        self.started = false;

        let stopping = self.context.execute_phase(BootPhase::Stopping, |context| {
            context.container().close();
            Ok(())
        });
        if let Err(error) = stopping {
            tracing::error!(error = %error, "Error while stopping boot");
            self.context.container().close();
        }

        if let Err(error) = self.context.change_phase(BootPhase::Stopped) {
            tracing::error!(error = %error, "Error while finishing boot shutdown");
        }
    }
}
