use serde_json::Value;
use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::app::LogLevel;
use crate::container::descriptor::{Qualifier, ServiceDescriptor, ServiceFactory, ServiceId};
use crate::container::module::Module;
use crate::container::scope::{ScopeId, ServiceScope};
use crate::errors::CoreError;
use crate::introspection::{self, BindingView};
use crate::properties::{self, PropertyRecord, PropertyResolver};

type Instance = Arc<dyn Any + Send + Sync>;

thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<ServiceId>> = const { RefCell::new(Vec::new()) };
}

/// Dependency injection container with global properties
///
/// Bindings come from [`Module`]s; a later definition with the same
/// [`ServiceId`] replaces the earlier one. The container is shared as
/// `Arc<Container>` once a boot has started.
pub struct Container {
    bindings: RwLock<HashMap<ServiceId, ServiceDescriptor>>,
    instances: RwLock<HashMap<ServiceId, Instance>>,
    scopes: RwLock<HashMap<ScopeId, HashMap<ServiceId, Instance>>>,
    properties: RwLock<BTreeMap<String, Value>>,
    log_level: RwLock<LogLevel>,
    closed: AtomicBool,
}

impl Container {
    pub fn new() -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
            scopes: RwLock::new(HashMap::new()),
            properties: RwLock::new(BTreeMap::new()),
            log_level: RwLock::new(LogLevel::default()),
            closed: AtomicBool::new(false),
        }
    }

    /// Load the bindings of `module`
    pub fn load_module(&self, module: Module) -> Result<(), CoreError> {
        self.ensure_open()?;
        let module_name = module.name().unwrap_or("anonymous").to_string();
        let descriptors = module.into_descriptors();
        let count = descriptors.len();

        let mut bindings = self
            .bindings
            .write()
            .map_err(|_| CoreError::lock("service_bindings"))?;
        for descriptor in descriptors {
            let service_id = descriptor.service_id.clone();
            if bindings.insert(service_id.clone(), descriptor).is_some() {
                if self.log_enabled(LogLevel::Info) {
                    tracing::info!(service = %service_id.label(), "Overriding service definition");
                }
                if let Ok(mut instances) = self.instances.write() {
                    instances.remove(&service_id);
                }
            }
        }

        if self.log_enabled(LogLevel::Debug) {
            tracing::debug!(module = %module_name, definitions = count, "Loaded module");
        }
        Ok(())
    }

    pub fn load_modules(&self, modules: impl IntoIterator<Item = Module>) -> Result<(), CoreError> {
        for module in modules {
            self.load_module(module)?;
        }
        Ok(())
    }

    /// Register an instance after the container has been built
    pub fn declare<T: Send + Sync + 'static>(&self, value: T) -> Result<(), CoreError> {
        self.load_module(Module::build(|m| {
            m.instance(value);
        }))
    }

    pub fn declare_named<T: Send + Sync + 'static>(
        &self,
        name: impl Into<String>,
        value: T,
    ) -> Result<(), CoreError> {
        let name = name.into();
        self.load_module(Module::build(|m| {
            m.instance_named(name, value);
        }))
    }

    /// Resolve a service by type
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, CoreError> {
        self.resolve_by_id(&ServiceId::of::<T>(), None)
    }

    /// Resolve a named service by type
    pub fn resolve_named<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, CoreError> {
        self.resolve_by_id(&ServiceId::named::<T>(name), None)
    }

    /// Resolve a service inside a container scope
    pub fn resolve_scoped<T: Send + Sync + 'static>(
        &self,
        scope_id: &ScopeId,
    ) -> Result<Arc<T>, CoreError> {
        self.resolve_by_id(&ServiceId::of::<T>(), Some(scope_id))
    }

    /// Resolve a service, `None` if it is not bound or fails to build
    pub fn try_resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.resolve::<T>().ok()
    }

    pub fn try_resolve_named<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.resolve_named::<T>(name).ok()
    }

    fn resolve_by_id<T: Send + Sync + 'static>(
        &self,
        service_id: &ServiceId,
        scope_id: Option<&ScopeId>,
    ) -> Result<Arc<T>, CoreError> {
        self.ensure_open()?;

        let (lifetime, factory) = {
            let bindings = self
                .bindings
                .read()
                .map_err(|_| CoreError::lock("service_bindings"))?;
            let descriptor = bindings
                .get(service_id)
                .ok_or_else(|| CoreError::service_not_found(service_id.label()))?;
            (descriptor.lifetime, descriptor.factory.clone())
        };

        let instance = match lifetime {
            ServiceScope::Singleton => {
                let cached = self
                    .instances
                    .read()
                    .map_err(|_| CoreError::lock("service_instances"))?
                    .get(service_id)
                    .cloned();
                match cached {
                    Some(instance) => instance,
                    None => {
                        let created = self.construct(service_id, &factory)?;
                        let mut instances = self
                            .instances
                            .write()
                            .map_err(|_| CoreError::lock("service_instances"))?;
                        instances.entry(service_id.clone()).or_insert(created).clone()
                    }
                }
            }
            ServiceScope::Transient => self.construct(service_id, &factory)?,
            ServiceScope::Scoped => {
                let scope_id = scope_id.ok_or_else(|| CoreError::InvalidServiceScope {
                    scope: format!("{} is scoped and needs a scope to resolve", service_id.label()),
                })?;
                self.resolve_in_scope(service_id, scope_id, &factory)?
            }
        };

        if self.log_enabled(LogLevel::Debug) {
            tracing::debug!(service = %service_id.label(), lifetime = %lifetime, "Resolved service");
        }

        instance
            .downcast::<T>()
            .map_err(|_| CoreError::service_not_found(service_id.label()))
    }

    fn resolve_in_scope(
        &self,
        service_id: &ServiceId,
        scope_id: &ScopeId,
        factory: &ServiceFactory,
    ) -> Result<Instance, CoreError> {
        {
            let scopes = self.scopes.read().map_err(|_| CoreError::lock("scopes"))?;
            let scope = scopes.get(scope_id).ok_or_else(|| CoreError::ScopeNotFound {
                scope_id: scope_id.to_string(),
            })?;
            if let Some(instance) = scope.get(service_id) {
                return Ok(instance.clone());
            }
        }

        let created = self.construct(service_id, factory)?;
        let mut scopes = self.scopes.write().map_err(|_| CoreError::lock("scopes"))?;
        let scope = scopes.get_mut(scope_id).ok_or_else(|| CoreError::ScopeNotFound {
            scope_id: scope_id.to_string(),
        })?;
        Ok(scope.entry(service_id.clone()).or_insert(created).clone())
    }

    fn construct(&self, service_id: &ServiceId, factory: &ServiceFactory) -> Result<Instance, CoreError> {
        let cycle = RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(service_id) {
                let path = stack
                    .iter()
                    .map(ServiceId::label)
                    .chain(std::iter::once(service_id.label()))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                Some(path)
            } else {
                stack.push(service_id.clone());
                None
            }
        });

        if let Some(path) = cycle {
            return Err(CoreError::CircularDependency {
                path,
                cycle_service: service_id.label(),
            });
        }

        let result = factory(self);
        RESOLUTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
        result
    }

    /// Open a scope for scoped bindings
    pub fn create_scope(&self) -> Result<ScopeId, CoreError> {
        self.ensure_open()?;
        let scope_id = ScopeId::new();
        self.scopes
            .write()
            .map_err(|_| CoreError::lock("scopes"))?
            .insert(scope_id, HashMap::new());
        Ok(scope_id)
    }

    /// Drop a scope and the instances it holds
    pub fn dispose_scope(&self, scope_id: &ScopeId) -> Result<(), CoreError> {
        self.scopes
            .write()
            .map_err(|_| CoreError::lock("scopes"))?
            .remove(scope_id)
            .map(|_| ())
            .ok_or_else(|| CoreError::ScopeNotFound {
                scope_id: scope_id.to_string(),
            })
    }

    /// Whether any binding of type `T` exists, named or not
    pub fn contains<T: 'static>(&self) -> bool {
        let qualifier = Qualifier::of::<T>();
        self.bindings()
            .iter()
            .any(|(service_id, _)| qualifier.matches(service_id))
    }

    pub fn contains_named<T: 'static>(&self, name: &str) -> bool {
        let service_id = ServiceId::named::<T>(name);
        self.bindings
            .read()
            .map(|bindings| bindings.contains_key(&service_id))
            .unwrap_or(false)
    }

    /// Whether every qualifier matches a non-scoped binding
    pub fn has_binding(&self, qualifiers: &[Qualifier]) -> bool {
        introspection::has_binding(&[self], qualifiers)
    }

    pub fn service_count(&self) -> usize {
        self.bindings.read().map(|bindings| bindings.len()).unwrap_or(0)
    }

    /// Replace the global properties
    pub fn set_properties(&self, properties: BTreeMap<String, Value>) -> Result<(), CoreError> {
        let count = properties.len();
        *self
            .properties
            .write()
            .map_err(|_| CoreError::lock("properties"))? = properties;
        if self.log_enabled(LogLevel::Debug) {
            tracing::debug!(count, "Loaded container properties");
        }
        Ok(())
    }

    pub fn set_property(&self, key: impl Into<String>, value: Value) -> Result<(), CoreError> {
        self.properties
            .write()
            .map_err(|_| CoreError::lock("properties"))?
            .insert(key.into(), value);
        Ok(())
    }

    /// Snapshot of every global property
    pub fn property_entries(&self) -> BTreeMap<String, Value> {
        self.properties
            .read()
            .map(|properties| properties.clone())
            .unwrap_or_default()
    }

    pub fn property(&self, key: &str) -> Option<Value> {
        self.properties
            .read()
            .ok()
            .and_then(|properties| properties.get(key).cloned())
    }

    /// Bind a typed record from the global properties
    pub fn property_record<T: PropertyRecord>(&self) -> Result<Option<T>, CoreError> {
        let entries = self
            .properties
            .read()
            .map_err(|_| CoreError::lock("properties"))?;
        properties::bind(&entries, None).map_err(CoreError::from)
    }

    /// Bind a typed record from an explicit prefix
    pub fn property_record_at<T: PropertyRecord>(&self, prefix: &str) -> Result<Option<T>, CoreError> {
        let entries = self
            .properties
            .read()
            .map_err(|_| CoreError::lock("properties"))?;
        properties::bind(&entries, Some(prefix)).map_err(CoreError::from)
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .read()
            .map(|level| *level)
            .unwrap_or_default()
    }

    pub fn set_log_level(&self, level: LogLevel) {
        if let Ok(mut current) = self.log_level.write() {
            *current = level;
        }
    }

    fn log_enabled(&self, level: LogLevel) -> bool {
        self.log_level().allows(level)
    }

    /// Drop every binding, instance, scope and property
    ///
    /// Closing twice is harmless; resolving afterwards fails with
    /// [`CoreError::ContainerClosed`].
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Ok(mut scopes) = self.scopes.write() {
            scopes.clear();
        }
        if let Ok(mut instances) = self.instances.write() {
            instances.clear();
        }
        if let Ok(mut bindings) = self.bindings.write() {
            bindings.clear();
        }
        if let Ok(mut properties) = self.properties.write() {
            properties.clear();
        }
        tracing::info!("Container closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), CoreError> {
        if self.is_closed() {
            Err(CoreError::ContainerClosed)
        } else {
            Ok(())
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("service_count", &self.service_count())
            .field("log_level", &self.log_level())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl BindingView for Container {
    fn bindings(&self) -> Vec<(ServiceId, ServiceScope)> {
        let bindings = match self.bindings.read() {
            Ok(bindings) => bindings,
            Err(poisoned) => poisoned.into_inner(),
        };
        bindings
            .values()
            .map(|descriptor| (descriptor.service_id.clone(), descriptor.lifetime))
            .collect()
    }
}

impl PropertyResolver for Container {
    fn resolve_property(&self, key: &str) -> Option<Value> {
        self.property(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug, PartialEq)]
    struct Repository {
        url: String,
    }

    struct Service {
        repository: Arc<Repository>,
    }

    #[test]
    fn test_singleton_is_cached() {
        let container = Container::new();
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        container
            .load_module(Module::build(move |m| {
                m.single(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Repository {
                        url: "memory://".to_string(),
                    })
                });
            }))
            .unwrap();

        let first = container.resolve::<Repository>().unwrap();
        let second = container.resolve::<Repository>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transient_builds_every_time() {
        let container = Container::new();
        container
            .load_module(Module::build(|m| {
                m.factory(|_| Ok(String::from("fresh")));
            }))
            .unwrap();

        let first = container.resolve::<String>().unwrap();
        let second = container.resolve::<String>().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_factories_resolve_dependencies() {
        let container = Container::new();
        container
            .load_module(Module::build(|m| {
                m.instance(Repository {
                    url: "sqlite://app.db".to_string(),
                })
                .single(|c| {
                    Ok(Service {
                        repository: c.resolve::<Repository>()?,
                    })
                });
            }))
            .unwrap();

        let service = container.resolve::<Service>().unwrap();
        assert_eq!(service.repository.url, "sqlite://app.db");
    }

    #[test]
    fn test_named_bindings_are_distinct() {
        let container = Container::new();
        container.declare_named("primary", 1u32).unwrap();
        container.declare_named("replica", 2u32).unwrap();

        assert_eq!(*container.resolve_named::<u32>("primary").unwrap(), 1);
        assert_eq!(*container.resolve_named::<u32>("replica").unwrap(), 2);
        assert!(container.resolve::<u32>().unwrap_err().is_not_found());
        assert!(container.contains_named::<u32>("primary"));
    }

    #[test]
    fn test_override_replaces_cached_instance() {
        let container = Container::new();
        container.declare(1u8).unwrap();
        assert_eq!(*container.resolve::<u8>().unwrap(), 1);
        container.declare(2u8).unwrap();
        assert_eq!(*container.resolve::<u8>().unwrap(), 2);
        assert_eq!(container.service_count(), 1);
    }

    #[test]
    fn test_circular_dependency_detected() {
        struct A;
        struct B;

        let container = Container::new();
        container
            .load_module(Module::build(|m| {
                m.single(|c| c.resolve::<B>().map(|_| A))
                    .single(|c| c.resolve::<A>().map(|_| B));
            }))
            .unwrap();

        let error = container.resolve::<A>().err().unwrap();
        assert!(matches!(error, CoreError::CircularDependency { .. }));
    }

    #[test]
    fn test_scoped_resolution() {
        let container = Container::new();
        container
            .load_module(Module::build(|m| {
                m.scoped(|_| Ok(Vec::<u8>::new()));
            }))
            .unwrap();

        assert!(container.resolve::<Vec<u8>>().is_err());

        let scope = container.create_scope().unwrap();
        let first = container.resolve_scoped::<Vec<u8>>(&scope).unwrap();
        let second = container.resolve_scoped::<Vec<u8>>(&scope).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let other = container.create_scope().unwrap();
        let third = container.resolve_scoped::<Vec<u8>>(&other).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));

        container.dispose_scope(&scope).unwrap();
        assert!(container.resolve_scoped::<Vec<u8>>(&scope).is_err());
    }

    #[test]
    fn test_properties_and_records() {
        #[derive(Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        struct Pool {
            size: u32,
        }

        impl PropertyRecord for Pool {
            fn schema() -> crate::properties::PropertySchema {
                crate::properties::PropertySchema::new("db.pool")
            }
        }

        let container = Container::new();
        let mut properties = BTreeMap::new();
        properties.insert("db.pool.size".to_string(), json!(8));
        container.set_properties(properties).unwrap();

        assert_eq!(container.property("db.pool.size"), Some(json!(8)));
        assert_eq!(container.property_record::<Pool>().unwrap(), Some(Pool { size: 8 }));
        assert_eq!(container.property_record_at::<Pool>("missing").unwrap(), None);
    }

    #[test]
    fn test_close_releases_everything() {
        let container = Container::new();
        container.declare(5i32).unwrap();
        container.set_property("a", json!(1)).unwrap();
        container.close();
        container.close();

        assert!(container.is_closed());
        assert!(matches!(container.resolve::<i32>(), Err(CoreError::ContainerClosed)));
        assert_eq!(container.service_count(), 0);
        assert_eq!(container.property("a"), None);
    }
}
