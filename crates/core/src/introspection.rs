//! Read-only queries over bindings and properties
//!
//! Used by auto-configuration units to decide whether to contribute.

use serde::Serialize;

use crate::container::{Qualifier, ServiceId, ServiceScope};
use crate::properties::{value_text, PropertyResolver};

/// Anything that can list the bindings it holds
pub trait BindingView {
    fn bindings(&self) -> Vec<(ServiceId, ServiceScope)>;
}

/// Whether every qualifier matches at least one non-scoped binding
///
/// Scoped bindings are not visible. With no qualifiers this asks whether any
/// non-scoped binding exists at all.
pub fn has_binding(views: &[&dyn BindingView], qualifiers: &[Qualifier]) -> bool {
    let visible: Vec<ServiceId> = views
        .iter()
        .flat_map(|view| view.bindings())
        .filter(|(_, lifetime)| !lifetime.is_scoped())
        .map(|(service_id, _)| service_id)
        .collect();

    if qualifiers.is_empty() {
        return !visible.is_empty();
    }

    qualifiers
        .iter()
        .all(|qualifier| visible.iter().any(|service_id| qualifier.matches(service_id)))
}

/// Whether this exact service id has a non-scoped binding in any view
pub fn has_service(views: &[&dyn BindingView], service_id: &ServiceId) -> bool {
    views.iter().any(|view| {
        view.bindings()
            .iter()
            .any(|(id, lifetime)| !lifetime.is_scoped() && id == service_id)
    })
}

/// Whether every key resolves to a value
pub fn has_property(resolver: &dyn PropertyResolver, keys: &[&str]) -> bool {
    keys.iter()
        .all(|key| resolver.resolve_property(key).is_some())
}

/// Whether `key` is set and equal to `expected` after string normalization
pub fn property_equals<V: Serialize + ?Sized>(
    resolver: &dyn PropertyResolver,
    key: &str,
    expected: &V,
) -> bool {
    let Some(actual) = resolver.resolve_property(key) else {
        return false;
    };
    match serde_json::to_value(expected) {
        Ok(expected) => value_text(&actual) == value_text(&expected),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Module;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    struct Engine;

    #[test]
    fn test_empty_qualifiers_ignore_scoped_bindings() {
        let empty = Module::new();
        assert!(!has_binding(&[&empty], &[]));

        let scoped_only = Module::build(|m| {
            m.scoped(|_| Ok(Engine));
        });
        assert!(!has_binding(&[&scoped_only], &[]));
        assert!(!has_binding(&[&scoped_only], &[Qualifier::of::<Engine>()]));

        let single = Module::build(|m| {
            m.single(|_| Ok(Engine));
        });
        assert!(has_binding(&[&scoped_only, &single], &[]));
    }

    #[test]
    fn test_every_qualifier_must_match() {
        let module = Module::build(|m| {
            m.instance_named("fast", Engine).instance(1u8);
        });

        assert!(has_binding(&[&module], &[Qualifier::of::<Engine>()]));
        assert!(has_binding(
            &[&module],
            &[Qualifier::of::<Engine>(), Qualifier::named("fast")]
        ));
        assert!(!has_binding(
            &[&module],
            &[Qualifier::of::<Engine>(), Qualifier::named("slow")]
        ));
    }

    #[test]
    fn test_service_id_matches_type_and_name_together() {
        let module = Module::build(|m| {
            m.instance(Engine).instance_named("fast", 1u8);
            m.scoped(|_| Ok(2u16));
        });

        assert!(has_service(&[&module], &ServiceId::of::<Engine>()));
        assert!(!has_service(&[&module], &ServiceId::named::<Engine>("fast")));
        assert!(has_service(&[&module], &ServiceId::named::<u8>("fast")));
        assert!(!has_service(&[&module], &ServiceId::of::<u16>()));
    }

    #[test]
    fn test_views_are_combined() {
        let committed = Module::build(|m| {
            m.instance(Engine);
        });
        let staging = Module::build(|m| {
            m.instance(1u8);
        });
        assert!(has_binding(
            &[&committed, &staging],
            &[Qualifier::of::<Engine>(), Qualifier::of::<u8>()]
        ));
    }

    #[test]
    fn test_property_queries() {
        let mut properties: BTreeMap<String, Value> = BTreeMap::new();
        properties.insert("feature.enabled".to_string(), json!(true));
        properties.insert("feature.name".to_string(), json!("beta"));

        assert!(has_property(&properties, &["feature.enabled", "feature.name"]));
        assert!(!has_property(&properties, &["feature.enabled", "x.y"]));
        assert!(has_property(&properties, &[]));

        assert!(property_equals(&properties, "feature.enabled", "true"));
        assert!(property_equals(&properties, "feature.enabled", &true));
        assert!(property_equals(&properties, "feature.name", "beta"));
        assert!(!property_equals(&properties, "feature.name", "alpha"));
        assert!(!property_equals(&properties, "missing", "beta"));
    }
}
