//! Dependency edge representation and orientation conventions.

use crate::component::ComponentId;

/// Orientation applied to dependency edges when a graph is built.
///
/// A single dependency relation ("`dependent` needs `dependency`") can be
/// drawn in either direction. Start/stop ordering wants dependencies to sort
/// before their dependents, while isolation analysis wants the out-edges of a
/// component to enumerate what it depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeDirection {
    /// Edges point from a dependency to its dependent.
    DependencyOrder,
    /// Edges point from a dependent to its dependency.
    Isolation,
}

impl EdgeDirection {
    /// Orients a `(dependent, dependency)` pair as a `(from, to)` edge.
    #[must_use]
    pub fn orient<T>(self, dependent: T, dependency: T) -> (T, T) {
        match self {
            Self::DependencyOrder => (dependency, dependent),
            Self::Isolation => (dependent, dependency),
        }
    }
}

impl std::fmt::Display for EdgeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::DependencyOrder => "dependency-order",
            Self::Isolation => "isolation",
        };
        f.write_str(label)
    }
}

/// Whether the builder may accept edges that close a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildMode {
    /// Reject any edge that would close a cycle.
    #[default]
    Acyclic,
    /// Accept every edge.
    Permissive,
}

/// A declared dependency of one component on another.
///
/// The relation is direction-neutral; [`EdgeDirection`] decides how it is
/// drawn in a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    dependent: ComponentId,
    dependency: ComponentId,
}

impl Dependency {
    /// Records that `dependent` requires `dependency`.
    #[must_use]
    pub const fn new(dependent: ComponentId, dependency: ComponentId) -> Self {
        Self {
            dependent,
            dependency,
        }
    }

    /// Returns the component that declares the dependency.
    #[must_use]
    pub const fn dependent(&self) -> &ComponentId {
        &self.dependent
    }

    /// Returns the component being depended upon.
    #[must_use]
    pub const fn dependency(&self) -> &ComponentId {
        &self.dependency
    }
}
