use serde::Serialize;
use serde_json::Value;

use crate::container::{Container, Module, Qualifier, ServiceId};
use crate::errors::{CoreError, PropertyError};
use crate::introspection::{self, BindingView};
use crate::properties::{self, PropertyRecord, PropertyStore};

/// What an auto-configuration unit sees while it runs
///
/// Queries cover the committed container and the staging module, so a unit
/// observes what earlier units staged. Registrations go to the staging module.
pub struct AutoConfigurationScope<'a> {
    container: &'a Container,
    properties: &'a PropertyStore,
    staging: &'a mut Module,
}

impl<'a> AutoConfigurationScope<'a> {
    pub fn new(container: &'a Container, properties: &'a PropertyStore, staging: &'a mut Module) -> Self {
        Self {
            container,
            properties,
            staging,
        }
    }

    pub fn container(&self) -> &Container {
        self.container
    }

    pub fn properties(&self) -> &PropertyStore {
        self.properties
    }

    pub fn staging(&self) -> &Module {
        self.staging
    }

    // Properties

    /// Bind `T` from the declared properties, falling back to the container's
    pub fn property_record<T: PropertyRecord>(&self) -> Result<Option<T>, PropertyError> {
        match self.properties.bind::<T>()? {
            Some(record) => Ok(Some(record)),
            None => properties::bind(&self.container.property_entries(), None),
        }
    }

    pub fn property_record_or_default<T: PropertyRecord>(&self) -> Result<T, PropertyError> {
        Ok(self.property_record::<T>()?.unwrap_or_default())
    }

    pub fn property(&self, key: &str) -> Option<Value> {
        self.properties
            .get(key)
            .or_else(|| self.container.property(key))
    }

    pub fn has_property(&self, keys: &[&str]) -> bool {
        keys.iter().all(|key| self.property(key).is_some())
    }

    pub fn missing_properties(&self, keys: &[&str]) -> bool {
        !self.has_property(keys)
    }

    pub fn property_equals<V: Serialize + ?Sized>(&self, key: &str, expected: &V) -> bool {
        introspection::property_equals(self.properties, key, expected)
            || (self.properties.get(key).is_none()
                && introspection::property_equals(self.container, key, expected))
    }

    pub fn on_properties(&mut self, keys: &[&str], body: impl FnOnce(&mut Self)) -> &mut Self {
        if self.has_property(keys) {
            body(self);
        }
        self
    }

    pub fn on_missing_properties(&mut self, keys: &[&str], body: impl FnOnce(&mut Self)) -> &mut Self {
        if self.missing_properties(keys) {
            body(self);
        }
        self
    }

    pub fn on_property_equals<V: Serialize + ?Sized>(
        &mut self,
        key: &str,
        expected: &V,
        body: impl FnOnce(&mut Self),
    ) -> &mut Self {
        if self.property_equals(key, expected) {
            body(self);
        }
        self
    }

    // Bindings

    pub fn has_binding(&self, qualifiers: &[Qualifier]) -> bool {
        let views: [&dyn BindingView; 2] = [self.container, &*self.staging];
        introspection::has_binding(&views, qualifiers)
    }

    pub fn exists<T: 'static>(&self) -> bool {
        self.has_binding(&[Qualifier::of::<T>()])
    }

    /// Whether `T` is bound under `name`, in the container or the staging module
    pub fn exists_named<T: 'static>(&self, name: &str) -> bool {
        let views: [&dyn BindingView; 2] = [self.container, &*self.staging];
        introspection::has_service(&views, &ServiceId::named::<T>(name))
    }

    pub fn missing<T: 'static>(&self) -> bool {
        !self.exists::<T>()
    }

    pub fn on_exists<T: 'static>(&mut self, body: impl FnOnce(&mut Self)) -> &mut Self {
        if self.exists::<T>() {
            body(self);
        }
        self
    }

    pub fn on_missing<T: 'static>(&mut self, body: impl FnOnce(&mut Self)) -> &mut Self {
        if self.missing::<T>() {
            body(self);
        }
        self
    }

    // Registration

    pub fn single<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        self.staging.single(factory);
        self
    }

    pub fn single_named<T, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        self.staging.single_named(name, factory);
        self
    }

    pub fn factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        self.staging.factory(factory);
        self
    }

    pub fn scoped<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        self.staging.scoped(factory);
        self
    }

    pub fn instance<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.staging.instance(value);
        self
    }

    pub fn instance_named<T: Send + Sync + 'static>(&mut self, name: impl Into<String>, value: T) -> &mut Self {
        self.staging.instance_named(name, value);
        self
    }

    /// Edit the staging module directly
    pub fn module(&mut self, body: impl FnOnce(&mut Module)) -> &mut Self {
        body(self.staging);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Clock;

    #[test]
    fn test_staged_bindings_are_visible() {
        let container = Container::new();
        let store = PropertyStore::new();
        let mut staging = Module::new();
        let mut scope = AutoConfigurationScope::new(&container, &store, &mut staging);

        assert!(scope.missing::<Clock>());
        scope.on_missing::<Clock>(|scope| {
            scope.single(|_| Ok(Clock));
        });
        assert!(scope.exists::<Clock>());

        let mut calls = 0;
        scope.on_missing::<Clock>(|_| calls += 1);
        assert_eq!(calls, 0);
        assert_eq!(staging.len(), 1);
    }

    #[test]
    fn test_committed_bindings_are_visible() {
        let container = Container::new();
        container.declare_named("utc", Clock).unwrap();
        let store = PropertyStore::new();
        let mut staging = Module::new();
        let scope = AutoConfigurationScope::new(&container, &store, &mut staging);

        assert!(scope.exists::<Clock>());
        assert!(scope.exists_named::<Clock>("utc"));
        assert!(!scope.exists_named::<Clock>("local"));
    }

    #[test]
    fn test_named_lookup_needs_type_and_name_on_one_binding() {
        let container = Container::new();
        container.declare(Clock).unwrap();
        container.declare_named("utc", 1u8).unwrap();
        let store = PropertyStore::new();
        let mut staging = Module::new();
        let mut scope = AutoConfigurationScope::new(&container, &store, &mut staging);

        assert!(scope.exists::<Clock>());
        assert!(!scope.exists_named::<Clock>("utc"));
        assert!(scope.exists_named::<u8>("utc"));

        scope.instance_named("utc", Clock);
        assert!(scope.exists_named::<Clock>("utc"));
    }

    #[test]
    fn test_property_conditions() {
        let container = Container::new();
        container.set_property("cache.backend", json!("redis")).unwrap();

        let mut store = PropertyStore::new();
        store.set("cache.enabled", true).unwrap();
        let mut staging = Module::new();
        let mut scope = AutoConfigurationScope::new(&container, &store, &mut staging);

        assert!(scope.has_property(&["cache.enabled", "cache.backend"]));
        assert!(scope.missing_properties(&["cache.ttl"]));
        assert!(scope.property_equals("cache.backend", "redis"));
        assert!(scope.property_equals("cache.enabled", "true"));

        scope
            .on_property_equals("cache.enabled", &true, |scope| {
                scope.instance(1u8);
            })
            .on_missing_properties(&["cache.ttl"], |scope| {
                scope.instance_named("ttl", 60u64);
            })
            .on_properties(&["cache.ttl"], |scope| {
                scope.instance(2u16);
            });

        assert_eq!(staging.len(), 2);
    }
}
