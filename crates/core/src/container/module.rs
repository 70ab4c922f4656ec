use crate::container::descriptor::{ServiceDescriptor, ServiceId};
use crate::container::scope::ServiceScope;
use crate::container::Container;
use crate::errors::CoreError;
use crate::introspection::BindingView;

/// A group of bindings loaded into a [`Container`] together
///
/// Registering the same [`ServiceId`] twice keeps the last definition.
#[derive(Debug, Clone, Default)]
pub struct Module {
    name: Option<String>,
    descriptors: Vec<ServiceDescriptor>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            descriptors: Vec::new(),
        }
    }

    /// Build a module in place
    pub fn build(configure: impl FnOnce(&mut Module)) -> Self {
        let mut module = Self::new();
        configure(&mut module);
        module
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Register a lazily created singleton
    pub fn single<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::new(
            ServiceId::of::<T>(),
            ServiceScope::Singleton,
            factory,
        ))
    }

    /// Register a lazily created singleton under `name`
    pub fn single_named<T, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::new(
            ServiceId::named::<T>(name),
            ServiceScope::Singleton,
            factory,
        ))
    }

    /// Register a binding that builds a new instance on every resolution
    pub fn factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::new(
            ServiceId::of::<T>(),
            ServiceScope::Transient,
            factory,
        ))
    }

    /// Register a binding cached per container scope
    pub fn scoped<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::new(
            ServiceId::of::<T>(),
            ServiceScope::Scoped,
            factory,
        ))
    }

    /// Register an already constructed singleton
    pub fn instance<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.add(ServiceDescriptor::instance(ServiceId::of::<T>(), value))
    }

    pub fn instance_named<T: Send + Sync + 'static>(
        &mut self,
        name: impl Into<String>,
        value: T,
    ) -> &mut Self {
        self.add(ServiceDescriptor::instance(ServiceId::named::<T>(name), value))
    }

    /// Add a descriptor, replacing any previous one with the same id
    pub fn add(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        self.descriptors
            .retain(|existing| existing.service_id != descriptor.service_id);
        self.descriptors.push(descriptor);
        self
    }

    /// Move every binding of `other` into this module
    pub fn include(&mut self, other: Module) -> &mut Self {
        for descriptor in other.descriptors {
            self.add(descriptor);
        }
        self
    }

    pub fn contains(&self, service_id: &ServiceId) -> bool {
        self.descriptors
            .iter()
            .any(|descriptor| &descriptor.service_id == service_id)
    }

    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }

    pub fn into_descriptors(self) -> Vec<ServiceDescriptor> {
        self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl BindingView for Module {
    fn bindings(&self) -> Vec<(ServiceId, ServiceScope)> {
        self.descriptors
            .iter()
            .map(|descriptor| (descriptor.service_id.clone(), descriptor.lifetime))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Clock(u64);

    #[test]
    fn test_registration_kinds() {
        let module = Module::build(|m| {
            m.single(|_| Ok(Clock(1)))
                .factory(|_| Ok(String::from("fresh")))
                .scoped(|_| Ok(7u32))
                .instance_named("answer", 42i64);
        });

        let kinds: Vec<_> = module.descriptors().iter().map(|d| d.lifetime).collect();
        assert_eq!(
            kinds,
            vec![
                ServiceScope::Singleton,
                ServiceScope::Transient,
                ServiceScope::Scoped,
                ServiceScope::Singleton
            ]
        );
        assert!(module.contains(&ServiceId::named::<i64>("answer")));
    }

    #[test]
    fn test_last_definition_wins() {
        let mut module = Module::named("clocks");
        module.instance(Clock(1)).instance(Clock(2));
        assert_eq!(module.len(), 1);
        assert_eq!(module.name(), Some("clocks"));
    }

    #[test]
    fn test_include_merges_modules() {
        let mut base = Module::build(|m| {
            m.instance(Clock(1));
        });
        base.include(Module::build(|m| {
            m.instance(Clock(2)).instance(5u8);
        }));
        assert_eq!(base.len(), 2);
    }
}
