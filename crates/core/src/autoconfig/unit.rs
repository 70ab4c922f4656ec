use crate::autoconfig::AutoConfigurationScope;
use crate::errors::HookError;

type Predicate = Box<dyn Fn(&AutoConfigurationScope<'_>) -> bool + Send + Sync>;
type Configure = Box<dyn Fn(&mut AutoConfigurationScope<'_>) -> Result<(), HookError> + Send + Sync>;

/// A conditional, ordered contribution of bindings
pub trait AutoConfiguration: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Evaluation priority, lower runs first
    fn order(&self) -> i32 {
        i32::MAX
    }

    /// Whether this unit should run at all
    fn matches(&self, scope: &AutoConfigurationScope<'_>) -> bool {
        let _ = scope;
        true
    }

    /// Contribute bindings to the staging module
    fn configure(&self, scope: &mut AutoConfigurationScope<'_>) -> Result<(), HookError>;
}

/// Closure-backed [`AutoConfiguration`], see [`auto_configuration`]
pub struct FnAutoConfiguration {
    name: String,
    order: i32,
    predicate: Option<Predicate>,
    configure: Configure,
}

/// Build an auto-configuration unit from a closure
///
/// ```ignore
/// let unit = auto_configuration("clock", |scope| {
///     scope.on_missing::<SystemClock>(|scope| {
///         scope.single(|_| Ok(SystemClock));
///     });
///     Ok(())
/// })
/// .order(10);
/// ```
pub fn auto_configuration<F>(name: impl Into<String>, configure: F) -> FnAutoConfiguration
where
    F: Fn(&mut AutoConfigurationScope<'_>) -> Result<(), HookError> + Send + Sync + 'static,
{
    FnAutoConfiguration {
        name: name.into(),
        order: i32::MAX,
        predicate: None,
        configure: Box::new(configure),
    }
}

impl FnAutoConfiguration {
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Only run when `predicate` holds
    pub fn when<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&AutoConfigurationScope<'_>) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Box::new(predicate));
        self
    }
}

impl AutoConfiguration for FnAutoConfiguration {
    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn matches(&self, scope: &AutoConfigurationScope<'_>) -> bool {
        self.predicate.as_ref().map_or(true, |predicate| predicate(scope))
    }

    fn configure(&self, scope: &mut AutoConfigurationScope<'_>) -> Result<(), HookError> {
        (self.configure)(scope)
    }
}

impl std::fmt::Debug for FnAutoConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAutoConfiguration")
            .field("name", &self.name)
            .field("order", &self.order)
            .field("conditional", &self.predicate.is_some())
            .finish()
    }
}
