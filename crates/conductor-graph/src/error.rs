//! Error types for dependency graph operations.

use thiserror::Error;

use crate::component::ComponentId;

/// Errors returned by dependency graph operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The dependency relation contains a cycle, so no ordering exists.
    #[error("dependency cycle detected involving {}", join(.vertices))]
    Cycle {
        /// Vertices participating in the cycle, when they could be identified.
        vertices: Vec<ComponentId>,
    },
}

impl GraphError {
    /// Creates a new `Cycle` error.
    #[must_use]
    pub fn cycle(vertices: impl IntoIterator<Item = ComponentId>) -> Self {
        Self::Cycle {
            vertices: vertices.into_iter().collect(),
        }
    }

    /// Returns the vertices named by the error.
    #[must_use]
    pub fn vertices(&self) -> &[ComponentId] {
        match self {
            Self::Cycle { vertices } => vertices,
        }
    }
}

fn join(vertices: &[ComponentId]) -> String {
    if vertices.is_empty() {
        return String::from("unknown vertices");
    }
    vertices
        .iter()
        .map(ComponentId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
