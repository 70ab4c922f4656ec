use std::sync::Arc;

use crate::autoconfig::{AutoConfiguration, AutoConfigurationScope};
use crate::container::{Container, Module};
use crate::errors::BootError;
use crate::properties::PropertyStore;

/// Registered auto-configuration units, evaluated by priority
#[derive(Default, Clone)]
pub struct AutoConfigurationRegistry {
    units: Vec<Arc<dyn AutoConfiguration>>,
}

/// Result of evaluating every unit
#[derive(Debug)]
pub struct AutoConfigurationOutcome {
    /// Bindings staged by the units that ran
    pub module: Module,
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

impl AutoConfigurationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<A: AutoConfiguration + 'static>(&mut self, unit: A) {
        self.units.push(Arc::new(unit));
    }

    pub fn register_arc(&mut self, unit: Arc<dyn AutoConfiguration>) {
        self.units.push(unit);
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units in evaluation order; equal priorities keep registration order
    pub fn sorted(&self) -> Vec<Arc<dyn AutoConfiguration>> {
        let mut units = self.units.clone();
        units.sort_by_key(|unit| unit.order());
        units
    }

    /// Evaluate every unit into a fresh staging module
    ///
    /// The staging module is returned rather than loaded so the caller can
    /// install it into the container in one step.
    pub fn evaluate_all(
        &self,
        container: &Container,
        properties: &PropertyStore,
    ) -> Result<AutoConfigurationOutcome, BootError> {
        let mut staging = Module::named("auto-configuration");
        let mut applied = Vec::new();
        let mut skipped = Vec::new();

        for unit in self.sorted() {
            let mut scope = AutoConfigurationScope::new(container, properties, &mut staging);
            if !unit.matches(&scope) {
                tracing::debug!(unit = unit.name(), order = unit.order(), "Skipping auto-configuration");
                skipped.push(unit.name().to_string());
                continue;
            }

            tracing::debug!(unit = unit.name(), order = unit.order(), "Applying auto-configuration");
            unit.configure(&mut scope)
                .map_err(|source| BootError::AutoConfiguration {
                    unit: unit.name().to_string(),
                    source,
                })?;
            applied.push(unit.name().to_string());
        }

        tracing::info!(
            "Auto-configuration staged {} bindings from {} units",
            staging.len(),
            applied.len()
        );

        Ok(AutoConfigurationOutcome {
            module: staging,
            applied,
            skipped,
        })
    }
}

impl std::fmt::Debug for AutoConfigurationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.units.iter().map(|unit| (unit.name(), unit.order())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoconfig::auto_configuration;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct Client(&'static str);

    #[test]
    fn test_priority_order_is_stable() {
        let mut registry = AutoConfigurationRegistry::new();
        registry.register(auto_configuration("a", |_| Ok(())).order(5));
        registry.register(auto_configuration("b", |_| Ok(())).order(1));
        registry.register(auto_configuration("c", |_| Ok(())).order(5));

        let names: Vec<String> = registry.sorted().iter().map(|u| u.name().to_string()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_later_units_see_earlier_staging() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut registry = AutoConfigurationRegistry::new();
        for (name, order) in [("first", 5), ("early", 1), ("second", 5)] {
            let seen = seen.clone();
            registry.register(
                auto_configuration(name, move |scope| {
                    let missing = scope.missing::<Client>();
                    seen.lock().unwrap().push((name, missing));
                    scope.on_missing::<Client>(|scope| {
                        scope.instance(Client(name));
                    });
                    Ok(())
                })
                .order(order),
            );
        }

        let container = Container::new();
        let outcome = registry.evaluate_all(&container, &PropertyStore::new()).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![("early", true), ("first", false), ("second", false)]
        );
        assert_eq!(outcome.module.len(), 1);
        assert_eq!(outcome.applied, vec!["early", "first", "second"]);

        container.load_module(outcome.module).unwrap();
        assert_eq!(container.resolve::<Client>().unwrap().0, "early");
    }

    #[test]
    fn test_predicate_skips_unit() {
        let mut registry = AutoConfigurationRegistry::new();
        registry.register(
            auto_configuration("never", |scope| {
                scope.instance(1u8);
                Ok(())
            })
            .when(|_| false),
        );

        let outcome = registry
            .evaluate_all(&Container::new(), &PropertyStore::new())
            .unwrap();
        assert!(outcome.module.is_empty());
        assert_eq!(outcome.skipped, vec!["never"]);
    }

    #[test]
    fn test_configure_failure_names_unit() {
        let mut registry = AutoConfigurationRegistry::new();
        registry.register(auto_configuration("broken", |_| Err("no backend".into())));

        let error = registry
            .evaluate_all(&Container::new(), &PropertyStore::new())
            .unwrap_err();
        match error {
            BootError::AutoConfiguration { unit, source } => {
                assert_eq!(unit, "broken");
                assert_eq!(source.to_string(), "no backend");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
