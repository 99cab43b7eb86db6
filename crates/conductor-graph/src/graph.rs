//! Dependency graph storage and construction.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::component::ComponentId;
use crate::edge::{BuildMode, Dependency, EdgeDirection};
use crate::error::GraphError;

/// A directed graph over components.
///
/// Graphs are built per operation from the currently loaded components and
/// owned by that operation; dropping the value releases it. Vertex indices
/// follow insertion order, which ordering queries use to break ties.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// The underlying petgraph graph.
    pub(crate) graph: DiGraph<ComponentId, ()>,
    /// Map from component to vertex index for fast lookup.
    pub(crate) index: HashMap<ComponentId, NodeIndex>,
    /// Convention used to draw dependency edges.
    direction: EdgeDirection,
}

impl DependencyGraph {
    /// Creates an empty graph using the given edge convention.
    #[must_use]
    pub fn new(direction: EdgeDirection) -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            direction,
        }
    }

    /// Returns the edge convention of this graph.
    #[must_use]
    pub const fn direction(&self) -> EdgeDirection {
        self.direction
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns whether the graph has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns whether the component is a vertex of the graph.
    #[must_use]
    pub fn contains(&self, id: &ComponentId) -> bool {
        self.index.contains_key(id)
    }

    /// Returns an iterator over all vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = &ComponentId> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph.node_weight(idx))
    }

    /// Returns whether an edge `from -> to` exists.
    #[must_use]
    pub fn has_edge(&self, from: &ComponentId, to: &ComponentId) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Returns the vertices at the end of the out-edges of `id`.
    ///
    /// Unknown components have no successors.
    #[must_use]
    pub fn successors(&self, id: &ComponentId) -> Vec<&ComponentId> {
        self.neighbours(id, Direction::Outgoing)
    }

    /// Returns the vertices at the start of the in-edges of `id`.
    ///
    /// Unknown components have no predecessors.
    #[must_use]
    pub fn predecessors(&self, id: &ComponentId) -> Vec<&ComponentId> {
        self.neighbours(id, Direction::Incoming)
    }

    fn neighbours(&self, id: &ComponentId, direction: Direction) -> Vec<&ComponentId> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut indices: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
        indices.sort_unstable();
        indices
            .into_iter()
            .filter_map(|n| self.graph.node_weight(n))
            .collect()
    }

    pub(crate) fn index_of(&self, id: &ComponentId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub(crate) fn weight(&self, idx: NodeIndex) -> Option<&ComponentId> {
        self.graph.node_weight(idx)
    }

    /// Registers a vertex, returning its index. Existing vertices are reused.
    fn ensure_vertex(&mut self, id: &ComponentId) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.clone());
        self.index.insert(id.clone(), idx);
        idx
    }

    /// Finds the shortest path `start ->* goal` following out-edges.
    fn path_between(&self, start: NodeIndex, goal: NodeIndex) -> Option<Vec<NodeIndex>> {
        let mut parents: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        let mut queue: VecDeque<NodeIndex> = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if current == goal {
                let mut path = vec![current];
                let mut cursor = current;
                while let Some(&parent) = parents.get(&cursor) {
                    path.push(parent);
                    cursor = parent;
                }
                path.reverse();
                return Some(path);
            }
            for next in self.graph.neighbors_directed(current, Direction::Outgoing) {
                if visited.insert(next) {
                    parents.insert(next, current);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Builds a new graph holding only the vertices in `keep`.
    ///
    /// Edges incident to a dropped vertex are dropped with it. Surviving
    /// vertices keep their relative insertion order.
    #[must_use]
    pub fn restricted_to(&self, keep: &HashSet<ComponentId>) -> Self {
        let graph = self.graph.filter_map(
            |_, id| keep.contains(id).then(|| id.clone()),
            |_, edge| Some(*edge),
        );
        let index = graph
            .node_indices()
            .filter_map(|idx| graph.node_weight(idx).map(|id| (id.clone(), idx)))
            .collect();
        Self {
            graph,
            index,
            direction: self.direction,
        }
    }
}

/// Incremental builder for a [`DependencyGraph`].
///
/// # Example
///
/// ```
/// use conductor_graph::{BuildMode, ComponentId, EdgeDirection, GraphBuilder};
///
/// let mut builder = GraphBuilder::new(EdgeDirection::DependencyOrder, BuildMode::Acyclic);
/// let web = ComponentId::from("web");
/// let db = ComponentId::from("db");
/// builder.add_dependency(&web, &db).expect("acyclic edge");
/// let graph = builder.finish();
/// assert!(graph.has_edge(&db, &web));
/// ```
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    graph: DependencyGraph,
    mode: BuildMode,
}

impl GraphBuilder {
    /// Starts an empty graph with the given edge convention and mode.
    #[must_use]
    pub fn new(direction: EdgeDirection, mode: BuildMode) -> Self {
        Self {
            graph: DependencyGraph::new(direction),
            mode,
        }
    }

    /// Registers a vertex even if it takes part in no dependency.
    pub fn add_vertex(&mut self, id: &ComponentId) -> &mut Self {
        self.graph.ensure_vertex(id);
        self
    }

    /// Records that `dependent` requires `dependency`.
    ///
    /// Both endpoints are registered as vertices. Repeated dependencies are
    /// collapsed into a single edge.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Cycle`] in [`BuildMode::Acyclic`] when the edge
    /// would close a cycle. The error lists the vertices on that cycle and
    /// the graph is left unchanged.
    pub fn add_dependency(
        &mut self,
        dependent: &ComponentId,
        dependency: &ComponentId,
    ) -> Result<&mut Self, GraphError> {
        let dependent_idx = self.graph.ensure_vertex(dependent);
        let dependency_idx = self.graph.ensure_vertex(dependency);
        let (from, to) = self.graph.direction.orient(dependent_idx, dependency_idx);

        if self.graph.graph.contains_edge(from, to) {
            return Ok(self);
        }

        if self.mode == BuildMode::Acyclic {
            // The new edge closes a cycle exactly when `to` already reaches `from`.
            if let Some(path) = self.graph.path_between(to, from) {
                let vertices = path
                    .into_iter()
                    .filter_map(|idx| self.graph.weight(idx).cloned());
                return Err(GraphError::cycle(vertices));
            }
        }

        self.graph.graph.add_edge(from, to, ());
        Ok(self)
    }

    /// Returns the finished graph.
    #[must_use]
    pub fn finish(self) -> DependencyGraph {
        self.graph
    }
}

/// Builds a graph from a vertex set and a dependency relation.
///
/// Every vertex is registered first, in iteration order, so that components
/// without dependencies still appear in the graph.
///
/// # Errors
///
/// Returns [`GraphError::Cycle`] in [`BuildMode::Acyclic`] when the
/// dependencies contain a cycle.
pub fn build<V, E>(
    direction: EdgeDirection,
    mode: BuildMode,
    vertices: V,
    dependencies: E,
) -> Result<DependencyGraph, GraphError>
where
    V: IntoIterator<Item = ComponentId>,
    E: IntoIterator<Item = Dependency>,
{
    let mut builder = GraphBuilder::new(direction, mode);
    for vertex in vertices {
        builder.add_vertex(&vertex);
    }
    for dependency in dependencies {
        builder.add_dependency(dependency.dependent(), dependency.dependency())?;
    }
    Ok(builder.finish())
}

/// Builds a graph that keeps every dependency, cycles included.
///
/// Equivalent to [`build`] in [`BuildMode::Permissive`], which cannot fail.
pub fn build_permissive<V, E>(
    direction: EdgeDirection,
    vertices: V,
    dependencies: E,
) -> DependencyGraph
where
    V: IntoIterator<Item = ComponentId>,
    E: IntoIterator<Item = Dependency>,
{
    let mut graph = DependencyGraph::new(direction);
    for vertex in vertices {
        graph.ensure_vertex(&vertex);
    }
    for dependency in dependencies {
        let dependent_idx = graph.ensure_vertex(dependency.dependent());
        let dependency_idx = graph.ensure_vertex(dependency.dependency());
        let (from, to) = direction.orient(dependent_idx, dependency_idx);
        graph.graph.update_edge(from, to, ());
    }
    graph
}
