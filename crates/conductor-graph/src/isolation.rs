//! Ownership analysis over isolation-convention graphs.
//!
//! In an [`EdgeDirection::Isolation`](crate::EdgeDirection::Isolation) graph
//! the out-edges of a component enumerate its dependencies, so walking
//! in-edges from a dependency finds everything that needs it.

use std::collections::{BTreeSet, HashSet, VecDeque};

use petgraph::Direction;
use petgraph::graph::NodeIndex;

use crate::component::ComponentId;
use crate::graph::DependencyGraph;

impl DependencyGraph {
    /// Returns the direct dependencies of `root` that only `root` uses.
    ///
    /// A direct dependency `D` is owned when no vertex has a path to `D`
    /// that avoids `root`. The root itself is never part of the result, and
    /// an unknown root owns nothing.
    #[must_use]
    pub fn isolated_dependencies(&self, root: &ComponentId) -> BTreeSet<ComponentId> {
        let Some(root_idx) = self.index_of(root) else {
            return BTreeSet::new();
        };
        self.graph
            .neighbors_directed(root_idx, Direction::Outgoing)
            .filter(|&dependency| dependency != root_idx)
            .filter(|&dependency| self.reaching_avoiding(dependency, root_idx).is_empty())
            .filter_map(|dependency| self.weight(dependency).cloned())
            .collect()
    }

    /// Returns every direct or transitive dependency owned by `root`.
    ///
    /// Ownership spreads downwards: a vertex is owned when each of its
    /// dependents is either `root` or already owned. Unlike
    /// [`isolated_dependencies`](Self::isolated_dependencies), a direct
    /// dependency that is also reached through another owned dependency is
    /// still owned.
    #[must_use]
    pub fn isolated_closure(&self, root: &ComponentId) -> BTreeSet<ComponentId> {
        let Some(root_idx) = self.index_of(root) else {
            return BTreeSet::new();
        };
        let mut owned: HashSet<NodeIndex> = HashSet::from([root_idx]);
        let mut frontier: VecDeque<NodeIndex> = self
            .graph
            .neighbors_directed(root_idx, Direction::Outgoing)
            .collect();

        while let Some(candidate) = frontier.pop_front() {
            if owned.contains(&candidate) {
                continue;
            }
            let exclusively_needed = self
                .graph
                .neighbors_directed(candidate, Direction::Incoming)
                .all(|dependent| owned.contains(&dependent));
            if exclusively_needed {
                owned.insert(candidate);
                frontier.extend(self.graph.neighbors_directed(candidate, Direction::Outgoing));
            }
        }

        owned.remove(&root_idx);
        owned
            .into_iter()
            .filter_map(|idx| self.weight(idx).cloned())
            .collect()
    }

    /// Collects the vertices with a path to `target` that never visits
    /// `avoid`.
    fn reaching_avoiding(&self, target: NodeIndex, avoid: NodeIndex) -> HashSet<NodeIndex> {
        let mut reaching: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::from([target]);

        while let Some(current) = queue.pop_front() {
            for dependent in self.graph.neighbors_directed(current, Direction::Incoming) {
                if dependent != avoid && reaching.insert(dependent) {
                    queue.push_back(dependent);
                }
            }
        }
        reaching
    }
}
