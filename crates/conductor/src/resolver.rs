//! Dependency lookups against the registry.

use std::cell::RefCell;
use std::collections::HashMap;

use conductor_graph::ComponentId;

use crate::registry::ComponentRegistry;

/// Answers "what does this component depend on?" for one operation.
///
/// Declared dependencies are treated as immutable for the duration of an
/// operation, so a memoising resolver asks the registry at most once per
/// component. Resolvers are cheap and meant to be dropped when the operation
/// ends.
#[derive(Debug)]
pub struct DependencyResolver<'r, R: ?Sized> {
    registry: &'r R,
    cache: Option<RefCell<HashMap<ComponentId, Vec<ComponentId>>>>,
}

impl<'r, R> DependencyResolver<'r, R>
where
    R: ComponentRegistry + ?Sized,
{
    /// Creates a resolver that forwards every lookup to the registry.
    #[must_use]
    pub const fn new(registry: &'r R) -> Self {
        Self {
            registry,
            cache: None,
        }
    }

    /// Creates a resolver that caches each component's dependencies.
    #[must_use]
    pub fn memoized(registry: &'r R) -> Self {
        Self {
            registry,
            cache: Some(RefCell::new(HashMap::new())),
        }
    }

    /// Returns the registry the resolver queries.
    #[must_use]
    pub const fn registry(&self) -> &'r R {
        self.registry
    }

    /// Returns the direct dependencies declared by `component`.
    ///
    /// Never fails: components unknown to the registry have no dependencies.
    #[must_use]
    pub fn dependencies(&self, component: &ComponentId) -> Vec<ComponentId> {
        let Some(cache) = &self.cache else {
            return self.registry.declared_dependencies(component);
        };
        if let Some(cached) = cache.borrow().get(component) {
            return cached.clone();
        }
        let resolved = self.registry.declared_dependencies(component);
        cache
            .borrow_mut()
            .insert(component.clone(), resolved.clone());
        resolved
    }
}
