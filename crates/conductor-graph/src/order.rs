//! Reachability and topological ordering.
//!
//! Ordering uses Kahn's algorithm. When several vertices are ready at once
//! the one inserted first is emitted first, so a given graph always yields
//! the same order.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::visit::{Dfs, EdgeRef};

use crate::component::ComponentId;
use crate::error::GraphError;
use crate::graph::DependencyGraph;

impl DependencyGraph {
    /// Returns every vertex reachable from `roots` by following out-edges.
    ///
    /// Roots present in the graph are reachable from themselves. Roots that
    /// are not vertices contribute nothing.
    #[must_use]
    pub fn reachable_from<'a, I>(&self, roots: I) -> HashSet<ComponentId>
    where
        I: IntoIterator<Item = &'a ComponentId>,
    {
        let mut reachable = HashSet::new();
        let mut dfs = Dfs::empty(&self.graph);
        for root in roots {
            let Some(start) = self.index_of(root) else {
                continue;
            };
            dfs.move_to(start);
            while let Some(idx) = dfs.next(&self.graph) {
                if let Some(id) = self.weight(idx) {
                    reachable.insert(id.clone());
                }
            }
        }
        reachable
    }

    /// Returns a total order in which every edge `u -> v` has `u` first.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Cycle`] naming every vertex left unordered when
    /// the graph contains a cycle.
    pub fn topological_order(&self) -> Result<Vec<ComponentId>, GraphError> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| (idx, 0))
            .collect();
        for edge in self.graph.edge_references() {
            *in_degree.entry(edge.target()).or_insert(0) += 1;
        }

        let mut ready: BTreeSet<NodeIndex> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&idx, _)| idx)
            .collect();
        let mut order = Vec::with_capacity(self.graph.node_count());

        while let Some(idx) = ready.pop_first() {
            if let Some(id) = self.weight(idx) {
                order.push(id.clone());
            }
            for next in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&next) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        ready.insert(next);
                    }
                }
            }
        }

        if order.len() != self.graph.node_count() {
            let stuck: BTreeSet<NodeIndex> = in_degree
                .into_iter()
                .filter(|&(_, degree)| degree > 0)
                .map(|(idx, _)| idx)
                .collect();
            let vertices = stuck
                .into_iter()
                .filter_map(|idx| self.weight(idx).cloned());
            return Err(GraphError::cycle(vertices));
        }

        Ok(order)
    }

    /// Orders the graph, optionally restricted to what `roots` can reach.
    ///
    /// With `strip_unreachable` unset the order covers every vertex and
    /// `roots` is ignored. With it set, vertices not reachable from `roots`
    /// are removed together with their edges before ordering.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Cycle`] when the (restricted) graph is cyclic.
    pub fn order<'a, I>(
        &self,
        roots: I,
        strip_unreachable: bool,
    ) -> Result<Vec<ComponentId>, GraphError>
    where
        I: IntoIterator<Item = &'a ComponentId>,
    {
        if strip_unreachable {
            let keep = self.reachable_from(roots);
            self.restricted_to(&keep).topological_order()
        } else {
            self.topological_order()
        }
    }
}
