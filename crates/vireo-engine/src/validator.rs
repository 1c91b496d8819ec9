use std::collections::{HashSet, VecDeque};

use vireo_core::workflow::{
    Component, Connection, KIND_LLM_ENGINE, KIND_OUTPUT, KIND_USER_QUERY,
};

use crate::order::resolve_order;

/// Outcome of structural validation.
///
/// `is_valid` is true iff `errors` is empty. Warnings flag suspicious but
/// executable graphs and never block execution.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Check structural well-formedness of a workflow definition.
///
/// Lenient by design: cycles and unreachable outputs are tolerated here so
/// partially built graphs can still be saved and inspected. The order
/// resolver rejects cycles at execution time; `validate_strict` rejects them
/// up front.
pub fn validate(components: &[Component], connections: &[Connection]) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let has_kind = |kind: &str| components.iter().any(|c| c.kind == kind);

    if !has_kind(KIND_USER_QUERY) {
        errors.push("Workflow must have a User Query component".to_string());
    }
    if !has_kind(KIND_OUTPUT) {
        errors.push("Workflow must have an Output component".to_string());
    }
    if !has_kind(KIND_LLM_ENGINE) {
        warnings.push("Workflow should have an LLM Engine component for processing".to_string());
    }

    let ids: HashSet<&str> = components.iter().map(|c| c.id.as_str()).collect();

    for conn in connections {
        if !ids.contains(conn.source.as_str()) {
            errors.push(format!(
                "Connection source '{}' not found in components",
                conn.source
            ));
        }
        if !ids.contains(conn.target.as_str()) {
            errors.push(format!(
                "Connection target '{}' not found in components",
                conn.target
            ));
        }
    }

    let connected: HashSet<&str> = connections
        .iter()
        .flat_map(|c| [c.source.as_str(), c.target.as_str()])
        .collect();

    let disconnected: Vec<&str> = components
        .iter()
        .map(|c| c.id.as_str())
        .filter(|id| !connected.contains(id))
        .collect();

    if !disconnected.is_empty() {
        warnings.push(format!("Disconnected components: {}", disconnected.join(", ")));
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Stricter validation for graphs meant to execute as-is.
///
/// On top of [`validate`], rejects duplicate component ids, cycles, and
/// graphs where no Output component is reachable from a User Query component.
pub fn validate_strict(components: &[Component], connections: &[Connection]) -> ValidationReport {
    let mut report = validate(components, connections);

    let mut seen: HashSet<&str> = HashSet::new();
    for comp in components {
        if !seen.insert(comp.id.as_str()) {
            report
                .errors
                .push(format!("Duplicate component id: '{}'", comp.id));
        }
    }

    if let Err(e) = resolve_order(components, connections) {
        report.errors.push(e.to_string());
    }

    if !output_reachable(components, connections) {
        report
            .errors
            .push("No path from a User Query component to an Output component".to_string());
    }

    report.is_valid = report.errors.is_empty();
    report
}

/// BFS from every user_query component, looking for any output component.
fn output_reachable(components: &[Component], connections: &[Connection]) -> bool {
    let starts: Vec<&str> = components
        .iter()
        .filter(|c| c.kind == KIND_USER_QUERY)
        .map(|c| c.id.as_str())
        .collect();
    let outputs: HashSet<&str> = components
        .iter()
        .filter(|c| c.kind == KIND_OUTPUT)
        .map(|c| c.id.as_str())
        .collect();

    if starts.is_empty() || outputs.is_empty() {
        return false;
    }

    let mut visited: HashSet<&str> = starts.iter().copied().collect();
    let mut queue: VecDeque<&str> = starts.into_iter().collect();

    while let Some(current) = queue.pop_front() {
        if outputs.contains(current) {
            return true;
        }
        for conn in connections {
            if conn.source == current && visited.insert(conn.target.as_str()) {
                queue.push_back(conn.target.as_str());
            }
        }
    }

    false
}
