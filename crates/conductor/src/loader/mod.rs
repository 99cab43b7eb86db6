//! Loading of transitive dependency closures.
//!
//! [`load_all`] walks the dependency relation breadth first from the
//! requested components with an explicit work queue and seen set, asking the
//! registry to load each component at most once per call. Components the
//! registry already reports as loaded are walked but never loaded again.

use std::collections::{HashSet, VecDeque};

use conductor_graph::ComponentId;
use tracing::{debug, trace};

use crate::error::{LoadError, RegistryErrorKind};
use crate::registry::ComponentRegistry;
use crate::resolver::DependencyResolver;

/// Loads `requested` and every transitive dependency.
///
/// Components already loaded count as loaded and `load` is not invoked for
/// them; their dependencies are still walked. Dependencies are enqueued even
/// when they were seen before and are filtered when popped. Returns every
/// component of the closure in discovery order.
///
/// # Errors
///
/// Returns [`LoadError`] for the first component whose load fails with
/// anything other than `AlreadyLoaded`. Nothing loaded before the failure is
/// undone.
pub fn load_all<'a, R, I>(
    resolver: &DependencyResolver<'_, R>,
    requested: I,
) -> Result<Vec<ComponentId>, LoadError>
where
    R: ComponentRegistry + ?Sized,
    I: IntoIterator<Item = &'a ComponentId>,
{
    let mut queue: VecDeque<ComponentId> = requested.into_iter().cloned().collect();
    let mut seen: HashSet<ComponentId> = HashSet::new();
    let mut discovered = Vec::new();
    let already_loaded: HashSet<ComponentId> = resolver
        .registry()
        .loaded()
        .into_iter()
        .map(|(component, _)| component)
        .collect();

    while let Some(component) = queue.pop_front() {
        if seen.contains(&component) {
            continue;
        }

        if already_loaded.contains(&component) {
            trace!(
                target: "conductor::loader",
                component = %component,
                "component already loaded"
            );
        } else {
            load_one(resolver.registry(), &component)?;
        }

        queue.extend(resolver.dependencies(&component));
        seen.insert(component.clone());
        discovered.push(component);
    }

    Ok(discovered)
}

fn load_one<R>(registry: &R, component: &ComponentId) -> Result<(), LoadError>
where
    R: ComponentRegistry + ?Sized,
{
    match registry.load(component) {
        Ok(()) => {
            debug!(target: "conductor::loader", component = %component, "component loaded");
            Ok(())
        }
        Err(error) if error.kind() == RegistryErrorKind::AlreadyLoaded => {
            trace!(target: "conductor::loader", component = %component, "component already loaded");
            Ok(())
        }
        Err(source) => Err(LoadError {
            component: component.clone(),
            source,
        }),
    }
}
