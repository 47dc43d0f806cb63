//! Folding service documents into the unified document.
//!
//! Services are merged one at a time, in the order given. For each service
//! the paths, then the components, then the tags are folded in:
//!
//! - **Paths** are re-keyed under `/<service><path>`. An entry whose key is
//!   already taken is skipped with a warning, never overwritten.
//! - **Components** keep their bare name for the first definition seen.
//!   A later identical definition is dropped; a later different definition
//!   is stored as `<service>_<name>`. References are not rewritten.
//! - **Tags** are appended unless a structurally identical tag exists.
//!
//! # Example
//!
//! ```
//! use openapi_merge_core::*;
//! use serde_yaml::Value;
//!
//! let users: Value = serde_yaml::from_str("paths:\n  /items: {get: {}}\n").unwrap();
//! let orders: Value = serde_yaml::from_str("paths:\n  /items: {get: {}}\n").unwrap();
//! let services = vec![
//!     ServiceDocument::new("users", users),
//!     ServiceDocument::new("orders", orders),
//! ];
//!
//! let unified = merge_services(&services, &mut NoopObserver);
//! assert!(unified.contains_path("/users/items"));
//! assert!(unified.contains_path("/orders/items"));
//! ```

use serde_yaml::Value;

use crate::document::{ComponentCategory, ServiceDocument, UnifiedDocument};
use crate::observer::{MergeEvent, MergeObserver, PathSkipReason};

/// Merges every service, in slice order, into a fresh unified document.
pub fn merge_services(
    services: &[ServiceDocument],
    observer: &mut dyn MergeObserver,
) -> UnifiedDocument {
    let mut unified = UnifiedDocument::new();
    for service in services {
        merge_service(&mut unified, service, observer);
    }
    unified
}

/// Merges one service's paths, components, and tags.
pub fn merge_service(
    unified: &mut UnifiedDocument,
    service: &ServiceDocument,
    observer: &mut dyn MergeObserver,
) {
    observer.on_event(&MergeEvent::ServiceStarted {
        service: service.service.clone(),
    });
    merge_paths(unified, service, observer);
    merge_components(unified, service, observer);
    merge_tags(unified, service, observer);
    unified.stats_mut().services += 1;
}

/// Builds the namespaced route key for a service.
///
/// ```
/// assert_eq!(openapi_merge_core::prefixed_path("users", "/items"), "/users/items");
/// ```
pub fn prefixed_path(service: &str, path: &str) -> String {
    format!("/{service}{path}")
}

/// Builds the namespaced alias for a conflicting component.
///
/// ```
/// assert_eq!(openapi_merge_core::component_alias("billing", "Widget"), "billing_Widget");
/// ```
pub fn component_alias(service: &str, name: &str) -> String {
    format!("{service}_{name}")
}

/// Adds the service's routes under its prefix.
pub fn merge_paths(
    unified: &mut UnifiedDocument,
    service: &ServiceDocument,
    observer: &mut dyn MergeObserver,
) {
    let Some(paths) = service.paths() else {
        return;
    };

    for (key, operations) in paths {
        let Some(path) = key.as_str() else {
            unified.stats_mut().paths_skipped += 1;
            ignore_key(service, "paths", key, observer);
            continue;
        };

        // Only prefixed keys are ever inserted, so this matches solely when a
        // prefixed key happens to equal a raw route string.
        if unified.contains_path(path) {
            skip_path(unified, service, path, PathSkipReason::UnprefixedDuplicate, observer);
            continue;
        }

        let prefixed = prefixed_path(&service.service, path);
        if unified.insert_path(prefixed.clone(), operations.clone()) {
            unified.stats_mut().paths_added += 1;
            observer.on_event(&MergeEvent::PathAdded {
                service: service.service.clone(),
                path: prefixed,
            });
        } else {
            skip_path(unified, service, &prefixed, PathSkipReason::PrefixedDuplicate, observer);
        }
    }
}

fn skip_path(
    unified: &mut UnifiedDocument,
    service: &ServiceDocument,
    path: &str,
    reason: PathSkipReason,
    observer: &mut dyn MergeObserver,
) {
    unified.stats_mut().paths_skipped += 1;
    observer.on_event(&MergeEvent::PathSkipped {
        service: service.service.clone(),
        path: path.to_string(),
        reason,
    });
}

/// Adds the service's components, aliasing conflicting definitions.
pub fn merge_components(
    unified: &mut UnifiedDocument,
    service: &ServiceDocument,
    observer: &mut dyn MergeObserver,
) {
    let Some(components) = service.components() else {
        return;
    };

    for key in components.keys() {
        let known = key.as_str().and_then(ComponentCategory::from_name);
        if known.is_none() {
            observer.on_event(&MergeEvent::CategoryIgnored {
                service: service.service.clone(),
                category: render_key(key),
            });
        }
    }

    for category in ComponentCategory::ALL {
        let Some(entries) = service.component_category(category) else {
            continue;
        };
        for (key, component) in entries {
            let Some(name) = key.as_str() else {
                unified.stats_mut().components_skipped += 1;
                let section = format!("components.{category}");
                ignore_key(service, &section, key, observer);
                continue;
            };
            merge_component(unified, service, category, name, component, observer);
        }
    }
}

fn ignore_key(
    service: &ServiceDocument,
    section: &str,
    key: &Value,
    observer: &mut dyn MergeObserver,
) {
    observer.on_event(&MergeEvent::KeyIgnored {
        service: service.service.clone(),
        section: section.to_string(),
        key: render_key(key),
    });
}

fn render_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        _ => serde_yaml::to_string(key)
            .map(|rendered| rendered.trim_end().to_string())
            .unwrap_or_else(|_| format!("{key:?}")),
    }
}

fn merge_component(
    unified: &mut UnifiedDocument,
    service: &ServiceDocument,
    category: ComponentCategory,
    name: &str,
    component: &Value,
    observer: &mut dyn MergeObserver,
) {
    let existing = unified.component(category, name);

    if existing.is_none() {
        unified.insert_component(category, name.to_string(), component.clone());
        unified.stats_mut().components_added += 1;
        observer.on_event(&MergeEvent::ComponentAdded {
            service: service.service.clone(),
            category,
            name: name.to_string(),
        });
        return;
    }

    if existing == Some(component) {
        unified.stats_mut().components_identical += 1;
        observer.on_event(&MergeEvent::ComponentIdentical {
            service: service.service.clone(),
            category,
            name: name.to_string(),
        });
        return;
    }

    let alias = component_alias(&service.service, name);
    match unified.component(category, &alias) {
        None => {
            unified.insert_component(category, alias.clone(), component.clone());
            unified.stats_mut().components_aliased += 1;
            observer.on_event(&MergeEvent::ComponentAliased {
                service: service.service.clone(),
                category,
                name: name.to_string(),
                alias,
            });
        }
        Some(taken) if taken == component => {
            unified.stats_mut().components_identical += 1;
            observer.on_event(&MergeEvent::ComponentIdentical {
                service: service.service.clone(),
                category,
                name: alias,
            });
        }
        Some(_) => {
            unified.stats_mut().components_skipped += 1;
            observer.on_event(&MergeEvent::ComponentSkipped {
                service: service.service.clone(),
                category,
                name: name.to_string(),
                alias,
            });
        }
    }
}

/// Appends the service's tags that are not already present verbatim.
pub fn merge_tags(
    unified: &mut UnifiedDocument,
    service: &ServiceDocument,
    observer: &mut dyn MergeObserver,
) {
    for tag in service.tags() {
        if unified.push_tag(tag.clone()) {
            unified.stats_mut().tags_added += 1;
            observer.on_event(&MergeEvent::TagAdded {
                service: service.service.clone(),
                name: tag.get("name").and_then(Value::as_str).map(str::to_string),
            });
        }
    }
}
