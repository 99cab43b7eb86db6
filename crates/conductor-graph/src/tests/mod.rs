//! Unit tests for the conductor-graph crate.

use crate::{BuildMode, ComponentId, Dependency, DependencyGraph, EdgeDirection, GraphError, build};

fn id(name: &str) -> ComponentId {
    ComponentId::from(name)
}

/// Builds a graph from `(component, dependencies)` declarations.
fn graph_of(
    direction: EdgeDirection,
    mode: BuildMode,
    declarations: &[(&str, &[&str])],
) -> Result<DependencyGraph, GraphError> {
    let vertices = declarations.iter().map(|(name, _)| id(name));
    let dependencies = declarations.iter().flat_map(|(name, deps)| {
        deps.iter()
            .map(move |dep| Dependency::new(id(name), id(dep)))
    });
    build(direction, mode, vertices, dependencies)
}

fn position(order: &[ComponentId], name: &str) -> usize {
    order
        .iter()
        .position(|c| c.as_str() == name)
        .unwrap_or_else(|| panic!("{name} missing from order {order:?}"))
}

/// Asserts every declared dependency appears before its dependent.
fn assert_respects(order: &[ComponentId], declarations: &[(&str, &[&str])]) {
    for (name, deps) in declarations {
        if !order.iter().any(|c| c.as_str() == *name) {
            continue;
        }
        for dep in *deps {
            assert!(
                position(order, dep) < position(order, name),
                "{dep} should precede {name} in {order:?}"
            );
        }
    }
}

mod graph_tests {
    use super::*;
    use crate::GraphBuilder;

    #[test]
    fn empty_graph_has_no_vertices() {
        let graph = DependencyGraph::new(EdgeDirection::DependencyOrder);
        assert!(graph.is_empty());
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn vertices_without_dependencies_are_registered() {
        let graph = graph_of(
            EdgeDirection::DependencyOrder,
            BuildMode::Acyclic,
            &[("a", &[]), ("b", &[])],
        )
        .expect("acyclic");
        assert_eq!(graph.node_count(), 2);
        assert!(graph.contains(&id("a")));
        assert!(graph.contains(&id("b")));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn dependency_order_points_at_dependent() {
        let graph = graph_of(
            EdgeDirection::DependencyOrder,
            BuildMode::Acyclic,
            &[("web", &["db"]), ("db", &[])],
        )
        .expect("acyclic");
        assert!(graph.has_edge(&id("db"), &id("web")));
        assert!(!graph.has_edge(&id("web"), &id("db")));
        assert_eq!(graph.successors(&id("db")), vec![&id("web")]);
    }

    #[test]
    fn isolation_points_at_dependency() {
        let graph = graph_of(
            EdgeDirection::Isolation,
            BuildMode::Permissive,
            &[("web", &["db"]), ("db", &[])],
        )
        .expect("permissive");
        assert!(graph.has_edge(&id("web"), &id("db")));
        assert_eq!(graph.predecessors(&id("db")), vec![&id("web")]);
    }

    #[test]
    fn undeclared_dependencies_become_vertices() {
        let graph = graph_of(
            EdgeDirection::DependencyOrder,
            BuildMode::Acyclic,
            &[("web", &["kernel"])],
        )
        .expect("acyclic");
        assert!(graph.contains(&id("kernel")));
    }

    #[test]
    fn duplicate_dependencies_collapse() {
        let graph = graph_of(
            EdgeDirection::DependencyOrder,
            BuildMode::Acyclic,
            &[("web", &["db", "db"]), ("db", &[])],
        )
        .expect("acyclic");
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn permissive_build_keeps_cycles_and_collapses_duplicates() {
        let graph = crate::build_permissive(
            EdgeDirection::Isolation,
            [id("a"), id("b"), id("c")],
            [
                Dependency::new(id("a"), id("b")),
                Dependency::new(id("b"), id("a")),
                Dependency::new(id("a"), id("b")),
            ],
        );
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.has_edge(&id("a"), &id("b")));
        assert!(graph.has_edge(&id("b"), &id("a")));
        assert!(graph.contains(&id("c")));
    }

    #[test]
    fn acyclic_builder_rejects_closing_edge() {
        let mut builder = GraphBuilder::new(EdgeDirection::DependencyOrder, BuildMode::Acyclic);
        builder
            .add_dependency(&id("a"), &id("b"))
            .expect("a -> b");
        builder
            .add_dependency(&id("b"), &id("c"))
            .expect("b -> c");
        let err = builder
            .add_dependency(&id("c"), &id("a"))
            .expect_err("c -> a closes a cycle");

        let mut vertices = err.vertices().to_vec();
        vertices.sort();
        assert_eq!(vertices, vec![id("a"), id("b"), id("c")]);

        let graph = builder.finish();
        assert_eq!(graph.edge_count(), 2, "rejected edge must not be added");
    }

    #[test]
    fn acyclic_builder_rejects_self_dependency() {
        let err = graph_of(
            EdgeDirection::DependencyOrder,
            BuildMode::Acyclic,
            &[("a", &["a"])],
        )
        .expect_err("self dependency is a cycle");
        assert_eq!(err.vertices(), &[id("a")]);
    }

    #[test]
    fn permissive_builder_accepts_cycles() {
        let graph = graph_of(
            EdgeDirection::Isolation,
            BuildMode::Permissive,
            &[("a", &["b"]), ("b", &["a"])],
        )
        .expect("permissive accepts cycles");
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn restriction_drops_incident_edges() {
        let graph = graph_of(
            EdgeDirection::DependencyOrder,
            BuildMode::Acyclic,
            &[("a", &["b"]), ("b", &["c"]), ("c", &[])],
        )
        .expect("acyclic");
        let keep = [id("a"), id("b")].into_iter().collect();
        let restricted = graph.restricted_to(&keep);
        assert_eq!(restricted.node_count(), 2);
        assert_eq!(restricted.edge_count(), 1);
        assert!(!restricted.contains(&id("c")));
        assert_eq!(graph.node_count(), 3, "source graph is untouched");
    }
}

mod order_tests {
    use rstest::rstest;

    use super::*;

    const DIAMOND: &[(&str, &[&str])] = &[
        ("app", &["http", "db"]),
        ("http", &["log"]),
        ("db", &["log"]),
        ("log", &[]),
        ("metrics", &[]),
    ];

    fn diamond() -> DependencyGraph {
        graph_of(EdgeDirection::DependencyOrder, BuildMode::Acyclic, DIAMOND).expect("acyclic")
    }

    #[test]
    fn full_order_covers_every_vertex() {
        let order = diamond().order([&id("db")], false).expect("ordered");
        assert_eq!(order.len(), 5);
        assert_respects(&order, DIAMOND);
    }

    #[test]
    fn ties_follow_insertion_order() {
        let graph = graph_of(
            EdgeDirection::DependencyOrder,
            BuildMode::Acyclic,
            &[("c", &[]), ("a", &[]), ("b", &[])],
        )
        .expect("acyclic");
        let order = graph.topological_order().expect("ordered");
        assert_eq!(order, vec![id("c"), id("a"), id("b")]);
    }

    #[rstest]
    #[case::leaf_reaches_all_dependents("log", &["log", "http", "db", "app"])]
    #[case::middle_reaches_its_dependent("db", &["db", "app"])]
    #[case::top_reaches_only_itself("app", &["app"])]
    #[case::isolated_vertex("metrics", &["metrics"])]
    fn stripped_order_keeps_reachable_vertices(#[case] root: &str, #[case] expected: &[&str]) {
        let order = diamond().order([&id(root)], true).expect("ordered");
        let mut names: Vec<&str> = order.iter().map(ComponentId::as_str).collect();
        names.sort_unstable();
        let mut wanted = expected.to_vec();
        wanted.sort_unstable();
        assert_eq!(names, wanted);
        assert_respects(&order, DIAMOND);
    }

    #[test]
    fn stripped_order_with_unknown_root_is_empty() {
        let order = diamond().order([&id("ghost")], true).expect("ordered");
        assert!(order.is_empty());
    }

    #[test]
    fn stripped_order_unions_multiple_roots() {
        let roots = [id("http"), id("metrics")];
        let order = diamond().order(roots.iter(), true).expect("ordered");
        assert_eq!(order.len(), 3);
        assert_respects(&order, DIAMOND);
    }

    #[test]
    fn cyclic_permissive_graph_fails_to_order() {
        let graph = graph_of(
            EdgeDirection::DependencyOrder,
            BuildMode::Permissive,
            &[("a", &["b"]), ("b", &["a"]), ("c", &[])],
        )
        .expect("permissive");
        let err = graph.order([&id("a")], false).expect_err("cycle");
        assert!(matches!(err, GraphError::Cycle { .. }));
        let mut vertices = err.vertices().to_vec();
        vertices.sort();
        assert_eq!(vertices, vec![id("a"), id("b")]);
    }

    #[test]
    fn cycle_outside_reachable_set_is_stripped() {
        let graph = graph_of(
            EdgeDirection::DependencyOrder,
            BuildMode::Permissive,
            &[("a", &["b"]), ("b", &["a"]), ("c", &[])],
        )
        .expect("permissive");
        let order = graph.order([&id("c")], true).expect("cycle is unreachable");
        assert_eq!(order, vec![id("c")]);
    }
}

mod isolation_tests {
    use std::collections::BTreeSet;

    use super::*;

    fn isolation_graph(declarations: &[(&str, &[&str])]) -> DependencyGraph {
        graph_of(EdgeDirection::Isolation, BuildMode::Permissive, declarations)
            .expect("permissive")
    }

    fn names(set: &BTreeSet<ComponentId>) -> Vec<&str> {
        set.iter().map(ComponentId::as_str).collect()
    }

    #[test]
    fn exclusive_dependency_is_owned_and_shared_one_is_not() {
        let graph = isolation_graph(&[
            ("root", &["exclusive", "shared"]),
            ("sibling", &["shared"]),
            ("exclusive", &[]),
            ("shared", &[]),
        ]);
        let owned = graph.isolated_dependencies(&id("root"));
        assert_eq!(names(&owned), vec!["exclusive"]);
    }

    #[test]
    fn root_is_not_part_of_the_result() {
        let graph = isolation_graph(&[("root", &["dep"]), ("dep", &[])]);
        let owned = graph.isolated_dependencies(&id("root"));
        assert!(!owned.contains(&id("root")));
    }

    #[test]
    fn dependency_shared_transitively_is_not_owned() {
        let graph = isolation_graph(&[
            ("root", &["log"]),
            ("other", &["http"]),
            ("http", &["log"]),
            ("log", &[]),
        ]);
        assert!(graph.isolated_dependencies(&id("root")).is_empty());
    }

    #[test]
    fn dependents_of_root_do_not_share_ownership() {
        let graph = isolation_graph(&[("top", &["root"]), ("root", &["dep"]), ("dep", &[])]);
        let owned = graph.isolated_dependencies(&id("root"));
        assert_eq!(names(&owned), vec!["dep"]);
    }

    #[test]
    fn unknown_root_owns_nothing() {
        let graph = isolation_graph(&[("a", &[])]);
        assert!(graph.isolated_dependencies(&id("ghost")).is_empty());
        assert!(graph.isolated_closure(&id("ghost")).is_empty());
    }

    #[test]
    fn closure_follows_exclusive_chains() {
        let graph = isolation_graph(&[
            ("root", &["http", "shared"]),
            ("http", &["codec"]),
            ("codec", &[]),
            ("sibling", &["shared"]),
            ("shared", &[]),
        ]);
        let owned = graph.isolated_closure(&id("root"));
        assert_eq!(names(&owned), vec!["codec", "http"]);
        let direct = graph.isolated_dependencies(&id("root"));
        assert_eq!(names(&direct), vec!["http"]);
    }

    #[test]
    fn closure_owns_diamond_below_root() {
        let graph = isolation_graph(&[
            ("root", &["a", "b"]),
            ("a", &["c"]),
            ("b", &["d"]),
            ("d", &["c"]),
            ("c", &[]),
        ]);
        let owned = graph.isolated_closure(&id("root"));
        assert_eq!(names(&owned), vec!["a", "b", "c", "d"]);
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn cycle_message_lists_vertices() {
        let err = GraphError::cycle([id("a"), id("b")]);
        let message = err.to_string();
        assert!(message.contains("a, b"), "unexpected message: {message}");
    }

    #[test]
    fn cycle_message_without_vertices() {
        let err = GraphError::cycle(Vec::new());
        assert!(err.to_string().contains("unknown vertices"));
    }
}
