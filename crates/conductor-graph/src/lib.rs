//! Dependency graph algorithms for the Conductor orchestrator.
//!
//! This crate owns the graph half of component orchestration: building a
//! directed graph from declared dependencies, ordering it so dependencies
//! come before their dependents, and working out which dependencies a
//! component owns outright.
//!
//! # Core Types
//!
//! - [`ComponentId`] - Opaque name of a component
//! - [`Dependency`] - A declared "dependent needs dependency" relation
//! - [`EdgeDirection`] - How a dependency is drawn as an edge
//! - [`DependencyGraph`] - The graph value built per operation
//!
//! Two edge conventions are supported by one builder.
//! [`EdgeDirection::DependencyOrder`] draws `dependency -> dependent`, so a
//! topological order starts with the leaves. [`EdgeDirection::Isolation`]
//! draws `dependent -> dependency`, so the out-edges of a component are its
//! dependencies.
//!
//! # Example
//!
//! ```
//! use conductor_graph::{build, BuildMode, ComponentId, Dependency, EdgeDirection};
//!
//! let app = ComponentId::from("app");
//! let log = ComponentId::from("log");
//! let graph = build(
//!     EdgeDirection::DependencyOrder,
//!     BuildMode::Acyclic,
//!     [app.clone(), log.clone()],
//!     [Dependency::new(app.clone(), log.clone())],
//! )
//! .expect("acyclic");
//!
//! let order = graph.order([&app], false).expect("ordered");
//! assert_eq!(order, vec![log, app]);
//! ```

mod component;
mod edge;
mod error;
mod graph;
mod isolation;
mod order;

pub use component::ComponentId;
pub use edge::{BuildMode, Dependency, EdgeDirection};
pub use error::GraphError;
pub use graph::{DependencyGraph, GraphBuilder, build, build_permissive};

#[cfg(test)]
mod tests;
