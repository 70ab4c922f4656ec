use thiserror::Error;

use crate::errors::PropertyError;

/// Error raised by the service container
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Service not found: {service_type}")]
    ServiceNotFound { service_type: String },

    #[error("Invalid service scope: {scope}")]
    InvalidServiceScope { scope: String },

    #[error("Scope not found: {scope_id}")]
    ScopeNotFound { scope_id: String },

    #[error("Lock error on resource: {resource}")]
    LockError { resource: String },

    #[error("Circular dependency detected: {path} (cycle at: {cycle_service})")]
    CircularDependency { path: String, cycle_service: String },

    #[error("Service initialization failed for '{service_type}': {source}")]
    ServiceInitializationFailed {
        service_type: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Container has been closed")]
    ContainerClosed,

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error(transparent)]
    Property(#[from] PropertyError),
}

impl CoreError {
    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new service not found error
    pub fn service_not_found(service_type: impl Into<String>) -> Self {
        Self::ServiceNotFound {
            service_type: service_type.into(),
        }
    }

    /// Wrap a factory failure for service `T`
    pub fn initialization<T: ?Sized + 'static>(
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ServiceInitializationFailed {
            service_type: std::any::type_name::<T>().to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn lock(resource: &str) -> Self {
        Self::LockError {
            resource: resource.to_string(),
        }
    }

    /// Check if the error is a missing service
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ServiceNotFound { .. })
    }
}
