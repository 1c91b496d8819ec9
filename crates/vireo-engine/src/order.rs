use std::collections::{HashMap, HashSet, VecDeque};

use vireo_core::error::{Result, VireoError};
use vireo_core::workflow::{Component, Connection};

/// Resolve the execution order of a workflow with Kahn's algorithm.
///
/// Components with in-degree zero are seeded in definition order and the
/// ready queue is FIFO, so the order is deterministic for a fixed input.
/// Connections naming unknown components are ignored; the validator reports
/// those separately.
///
/// Fails with [`VireoError::CycleDetected`] when any component remains
/// unresolved, naming the components stuck in the cycle. A truncated order
/// is never returned.
pub fn resolve_order(components: &[Component], connections: &[Connection]) -> Result<Vec<String>> {
    let mut in_degree: HashMap<&str, usize> =
        components.iter().map(|c| (c.id.as_str(), 0)).collect();
    let mut adjacency: HashMap<&str, Vec<&str>> =
        components.iter().map(|c| (c.id.as_str(), Vec::new())).collect();

    for conn in connections {
        let (source, target) = (conn.source.as_str(), conn.target.as_str());
        if !adjacency.contains_key(source) || !in_degree.contains_key(target) {
            continue;
        }
        if let Some(targets) = adjacency.get_mut(source) {
            targets.push(target);
        }
        if let Some(degree) = in_degree.get_mut(target) {
            *degree += 1;
        }
    }

    let mut queue: VecDeque<&str> = components
        .iter()
        .map(|c| c.id.as_str())
        .filter(|id| in_degree[id] == 0)
        .collect();

    let mut order = Vec::with_capacity(components.len());

    while let Some(current) = queue.pop_front() {
        order.push(current.to_string());

        if let Some(targets) = adjacency.get(current) {
            for &target in targets {
                if let Some(degree) = in_degree.get_mut(target) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(target);
                    }
                }
            }
        }
    }

    if order.len() != components.len() {
        let ordered: HashSet<&str> = order.iter().map(String::as_str).collect();
        let mut unresolved: Vec<String> = components
            .iter()
            .map(|c| c.id.clone())
            .filter(|id| !ordered.contains(id.as_str()))
            .collect();
        unresolved.sort();
        return Err(VireoError::CycleDetected { unresolved });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vireo_core::workflow::{
        KIND_KNOWLEDGE_BASE, KIND_LLM_ENGINE, KIND_OUTPUT, KIND_USER_QUERY,
    };

    fn component(id: &str) -> Component {
        Component::new(id, KIND_LLM_ENGINE)
    }

    #[test]
    fn test_linear_chain() {
        let components = vec![
            Component::new("q", KIND_USER_QUERY),
            Component::new("kb", KIND_KNOWLEDGE_BASE),
            Component::new("llm", KIND_LLM_ENGINE),
            Component::new("out", KIND_OUTPUT),
        ];
        let connections = vec![
            Connection::new("q", "kb"),
            Connection::new("kb", "llm"),
            Connection::new("llm", "out"),
        ];

        let order = resolve_order(&components, &connections).unwrap();
        assert_eq!(order, vec!["q", "kb", "llm", "out"]);
    }

    #[test]
    fn test_every_edge_respected() {
        // Diamond: a → {b, c} → d
        let components = vec![component("a"), component("b"), component("c"), component("d")];
        let connections = vec![
            Connection::new("a", "b"),
            Connection::new("a", "c"),
            Connection::new("b", "d"),
            Connection::new("c", "d"),
        ];

        let order = resolve_order(&components, &connections).unwrap();
        let index = |id: &str| order.iter().position(|o| o == id).unwrap();
        for conn in &connections {
            assert!(index(&conn.source) < index(&conn.target));
        }
    }

    #[test]
    fn test_fifo_tie_break_is_definition_order() {
        // No edges at all: every component is ready at once.
        let components = vec![component("c"), component("a"), component("b")];
        let order = resolve_order(&components, &[]).unwrap();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_two_node_cycle_detected() {
        let components = vec![component("a"), component("b")];
        let connections = vec![Connection::new("a", "b"), Connection::new("b", "a")];

        let err = resolve_order(&components, &connections).unwrap_err();
        match err {
            VireoError::CycleDetected { unresolved } => {
                assert_eq!(unresolved, vec!["a", "b"]);
            }
            other => panic!("expected CycleDetected, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_names_only_stuck_components() {
        // "q" resolves; the b↔c cycle and its downstream "d" do not.
        let components = vec![component("q"), component("b"), component("c"), component("d")];
        let connections = vec![
            Connection::new("b", "c"),
            Connection::new("c", "b"),
            Connection::new("c", "d"),
        ];

        let err = resolve_order(&components, &connections).unwrap_err();
        match err {
            VireoError::CycleDetected { unresolved } => {
                assert_eq!(unresolved, vec!["b", "c", "d"]);
            }
            other => panic!("expected CycleDetected, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_endpoints_ignored() {
        let components = vec![component("a"), component("b")];
        let connections = vec![Connection::new("a", "b"), Connection::new("ghost", "b")];
        let order = resolve_order(&components, &connections).unwrap();
        assert_eq!(order, vec!["a", "b"]);
    }
}
