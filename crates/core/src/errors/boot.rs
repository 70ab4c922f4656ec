use thiserror::Error;

use crate::errors::{CoreError, PropertyError};
use crate::lifecycle::BootPhase;

/// Error type returned by lifecycle hooks and auto-configuration units
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Error raised while declaring, starting or stopping a boot
#[derive(Debug, Error)]
pub enum BootError {
    #[error("Boot has already been started")]
    AlreadyStarted,

    #[error("Lifecycle extender '{extender}' failed during {phase}: {source}")]
    PhaseHookFailure {
        phase: BootPhase,
        extender: String,
        source: HookError,
    },

    #[error("Phase {phase} failed: {source}")]
    PhaseFailure {
        phase: BootPhase,
        source: Box<BootError>,
    },

    #[error("Failed to start boot: {source}")]
    StartupFailure { source: Box<BootError> },

    #[error("Invalid phase transition from {from} to {to}")]
    InvalidTransition { from: String, to: BootPhase },

    #[error("Auto-configuration '{unit}' failed: {source}")]
    AutoConfiguration { unit: String, source: HookError },

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error(transparent)]
    Container(#[from] CoreError),
}

impl BootError {
    /// Wrap a failure that aborted startup
    pub fn startup_failure(cause: BootError) -> Self {
        Self::StartupFailure {
            source: Box::new(cause),
        }
    }

    pub fn is_already_started(&self) -> bool {
        matches!(self, Self::AlreadyStarted)
    }

    pub fn is_startup_failure(&self) -> bool {
        matches!(self, Self::StartupFailure { .. })
    }

    /// The error that aborted startup, if this is a startup failure
    pub fn startup_cause(&self) -> Option<&BootError> {
        match self {
            Self::StartupFailure { source } => Some(source),
            _ => None,
        }
    }

    /// Wrap an error raised by the built-in action of `phase`
    pub fn phase_failure(phase: BootPhase, cause: BootError) -> Self {
        Self::PhaseFailure {
            phase,
            source: Box::new(cause),
        }
    }

    /// Innermost error behind startup and phase wrappers
    pub fn root_cause(&self) -> &BootError {
        match self {
            Self::StartupFailure { source } | Self::PhaseFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// The phase a failing hook or action ran in
    pub fn failed_phase(&self) -> Option<BootPhase> {
        match self {
            Self::PhaseHookFailure { phase, .. } | Self::PhaseFailure { phase, .. } => Some(*phase),
            Self::StartupFailure { source } => source.failed_phase(),
            _ => None,
        }
    }
}
