//! Kahn's-algorithm topological sort with insertion-order tie-break, so a
//! design with multiple valid orderings always executes the same way.

use std::collections::HashMap;

use crate::error::OrchestraError;

/// Computes a topological order over `nodes` given `edges` (source -> target).
/// Ties among ready nodes are broken by each node's position in `nodes`.
/// Returns `DesignInvalid` if the graph contains a cycle.
pub fn topological_sort(nodes: &[String], edges: &[(String, String)]) -> Result<Vec<String>, OrchestraError> {
    let index_of: HashMap<&str, usize> = nodes.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();

    let mut in_degree: HashMap<&str, usize> = nodes.iter().map(|n| (n.as_str(), 0)).collect();
    let mut adjacency: HashMap<&str, Vec<&str>> = nodes.iter().map(|n| (n.as_str(), Vec::new())).collect();

    for (source, target) in edges {
        let Some(targets) = adjacency.get_mut(source.as_str()) else {
            continue; // unknown ids are rejected by design validation before this runs
        };
        targets.push(target.as_str());
        if let Some(degree) = in_degree.get_mut(target.as_str()) {
            *degree += 1;
        }
    }

    // `ready` is kept sorted by original insertion order so popping the
    // front always yields the lowest-index ready node: the tie-break.
    let mut ready: Vec<&str> = nodes.iter().map(String::as_str).filter(|n| in_degree[n] == 0).collect();
    ready.sort_by_key(|n| index_of[n]);

    let mut order = Vec::with_capacity(nodes.len());
    while !ready.is_empty() {
        let node = ready.remove(0);
        order.push(node.to_string());
        let mut became_ready = Vec::new();
        for &next in &adjacency[node] {
            let degree = in_degree.get_mut(next).unwrap();
            *degree -= 1;
            if *degree == 0 {
                became_ready.push(next);
            }
        }
        ready.extend(became_ready);
        ready.sort_by_key(|n| index_of[n]);
    }

    if order.len() != nodes.len() {
        return Err(OrchestraError::DesignInvalid("design contains a cycle".into()));
    }
    Ok(order)
}
