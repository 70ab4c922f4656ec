use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::container::scope::ServiceScope;
use crate::container::Container;
use crate::errors::CoreError;

/// Service identifier combining type and optional name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceId {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub name: Option<String>,
}

impl ServiceId {
    /// Create a new service ID for a type
    pub fn of<T: 'static + ?Sized>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name: None,
        }
    }

    /// Create a named service ID for a type
    pub fn named<T: 'static + ?Sized>(name: impl Into<String>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name: Some(name.into()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Human readable form: `Type` or `Type(name)`
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{}({})", self.type_name, name),
            None => self.type_name.to_string(),
        }
    }
}

/// Selector used to ask whether a binding exists
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Qualifier {
    /// Matches bindings of exactly this type, named or not
    Type {
        type_id: TypeId,
        type_name: &'static str,
    },
    /// Matches bindings registered under this name
    Named(String),
}

impl Qualifier {
    pub fn of<T: 'static + ?Sized>() -> Self {
        Qualifier::Type {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Qualifier::Named(name.into())
    }

    pub fn matches(&self, service_id: &ServiceId) -> bool {
        match self {
            Qualifier::Type { type_id, .. } => service_id.type_id == *type_id,
            Qualifier::Named(name) => service_id.name.as_deref() == Some(name.as_str()),
        }
    }
}

impl std::fmt::Display for Qualifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Qualifier::Type { type_name, .. } => write!(f, "type:{}", type_name),
            Qualifier::Named(name) => write!(f, "name:{}", name),
        }
    }
}

/// Factory function for creating service instances
pub type ServiceFactory =
    Arc<dyn Fn(&Container) -> Result<Arc<dyn Any + Send + Sync>, CoreError> + Send + Sync>;

/// Service descriptor containing all metadata for a binding
#[derive(Clone)]
pub struct ServiceDescriptor {
    /// Service identifier (type + optional name)
    pub service_id: ServiceId,
    /// Service lifetime/scope
    pub lifetime: ServiceScope,
    /// Creates the instance on resolution
    pub factory: ServiceFactory,
}

impl ServiceDescriptor {
    /// Describe a binding whose factory produces `T`
    pub fn new<T, F>(service_id: ServiceId, lifetime: ServiceScope, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        Self {
            service_id,
            lifetime,
            factory: Arc::new(move |container| {
                factory(container).map(|instance| Arc::new(instance) as Arc<dyn Any + Send + Sync>)
            }),
        }
    }

    /// Describe a singleton backed by an existing value
    pub fn instance<T: Send + Sync + 'static>(service_id: ServiceId, value: T) -> Self {
        let shared: Arc<dyn Any + Send + Sync> = Arc::new(value);
        Self {
            service_id,
            lifetime: ServiceScope::Singleton,
            factory: Arc::new(move |_| Ok(shared.clone())),
        }
    }
}

impl std::fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("service_id", &self.service_id)
            .field("lifetime", &self.lifetime)
            .field("factory", &"<factory_fn>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Engine;

    #[test]
    fn test_type_qualifier_matches_named_and_unnamed() {
        let qualifier = Qualifier::of::<Engine>();
        assert!(qualifier.matches(&ServiceId::of::<Engine>()));
        assert!(qualifier.matches(&ServiceId::named::<Engine>("fast")));
        assert!(!qualifier.matches(&ServiceId::of::<String>()));
    }

    #[test]
    fn test_named_qualifier_compares_names() {
        let qualifier = Qualifier::named("fast");
        assert!(qualifier.matches(&ServiceId::named::<Engine>("fast")));
        assert!(qualifier.matches(&ServiceId::named::<String>("fast")));
        assert!(!qualifier.matches(&ServiceId::of::<Engine>()));
    }

    #[test]
    fn test_label() {
        assert_eq!(ServiceId::named::<u8>("x").label(), "u8(x)");
        assert_eq!(ServiceId::of::<u8>().label(), "u8");
    }
}
