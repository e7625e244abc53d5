//! Graph queries over a built index: callers, callees, path search.
//!
//! All traversals carry explicit visited/path sets so cycles terminate, and
//! adjacency lists are kept sorted so results are deterministic.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::index::Index;

/// Forward and reverse adjacency derived from an index's unique edge set.
pub struct CallMaps {
    /// callee -> sorted unique callers
    pub callers: BTreeMap<String, Vec<String>>,
    /// caller -> sorted unique callees
    pub callees: BTreeMap<String, Vec<String>>,
}

pub fn build_call_maps(index: &Index) -> CallMaps {
    let unique: BTreeSet<&(String, String)> = index.edges.iter().collect();
    let mut callers: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut callees: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (caller, callee) in unique {
        callers
            .entry(callee.clone())
            .or_default()
            .push(caller.clone());
        callees
            .entry(caller.clone())
            .or_default()
            .push(callee.clone());
    }
    for adjacency in callers.values_mut().chain(callees.values_mut()) {
        adjacency.sort();
        adjacency.dedup();
    }
    CallMaps { callers, callees }
}

/// Enumerate caller chains `[root .. target]` by DFS over the reverse map.
///
/// A chain ends when a node has no callers; candidates already on the chain
/// are skipped so cycles cannot recurse. Enumeration stops once `limit`
/// chains are collected or a branch exceeds `max_depth`.
pub fn caller_chains(
    maps: &CallMaps,
    target: &str,
    max_depth: usize,
    limit: usize,
) -> Vec<Vec<String>> {
    let mut results = Vec::new();
    let seed = vec![target.to_string()];
    walk_callers(maps, target, seed, 0, max_depth, limit, &mut results);
    results
}

fn walk_callers(
    maps: &CallMaps,
    node: &str,
    path: Vec<String>,
    depth: usize,
    max_depth: usize,
    limit: usize,
    results: &mut Vec<Vec<String>>,
) {
    if results.len() >= limit || depth > max_depth {
        return;
    }
    let parents = match maps.callers.get(node) {
        Some(parents) if !parents.is_empty() => parents,
        _ => {
            results.push(path);
            return;
        }
    };
    for caller in parents {
        if path.iter().any(|seen| seen == caller) {
            continue;
        }
        let mut extended = Vec::with_capacity(path.len() + 1);
        extended.push(caller.clone());
        extended.extend_from_slice(&path);
        walk_callers(maps, caller, extended, depth + 1, max_depth, limit, results);
    }
}

/// Sorted unique direct callees of `target`.
pub fn direct_callees(maps: &CallMaps, target: &str) -> Vec<String> {
    maps.callees.get(target).cloned().unwrap_or_default()
}

/// Every node reachable from `target` within `max_depth` hops, sorted,
/// excluding `target` itself.
pub fn transitive_callees(maps: &CallMaps, target: &str, max_depth: usize) -> Vec<String> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut stack: Vec<(String, usize)> = vec![(target.to_string(), 0)];
    while let Some((node, depth)) = stack.pop() {
        if depth > max_depth {
            continue;
        }
        if let Some(neighbors) = maps.callees.get(&node) {
            for neighbor in neighbors {
                if seen.insert(neighbor.clone()) {
                    stack.push((neighbor.clone(), depth + 1));
                }
            }
        }
    }
    seen.remove(target);
    seen.into_iter().collect()
}

/// Enumerate up to `limit` simple paths from `source` to `target` over the
/// forward map, bounded by `max_depth`.
pub fn find_paths(
    maps: &CallMaps,
    source: &str,
    target: &str,
    limit: usize,
    max_depth: usize,
) -> Vec<Vec<String>> {
    let mut results = Vec::new();
    let mut path = Vec::new();
    let mut visited = HashSet::new();
    walk_paths(
        maps,
        source,
        target,
        0,
        max_depth,
        limit,
        &mut path,
        &mut visited,
        &mut results,
    );
    results
}

#[allow(clippy::too_many_arguments)]
fn walk_paths(
    maps: &CallMaps,
    node: &str,
    target: &str,
    depth: usize,
    max_depth: usize,
    limit: usize,
    path: &mut Vec<String>,
    visited: &mut HashSet<String>,
    results: &mut Vec<Vec<String>>,
) {
    if results.len() >= limit || depth > max_depth {
        return;
    }
    visited.insert(node.to_string());
    path.push(node.to_string());
    if node == target {
        results.push(path.clone());
    } else if let Some(neighbors) = maps.callees.get(node) {
        for neighbor in neighbors {
            if !visited.contains(neighbor) {
                walk_paths(
                    maps, neighbor, target, depth + 1, max_depth, limit, path, visited, results,
                );
            }
        }
    }
    path.pop();
    visited.remove(node);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with_edges(edges: &[(&str, &str)]) -> Index {
        let mut functions: Vec<String> = Vec::new();
        for (caller, _) in edges {
            functions.push(caller.to_string());
        }
        functions.sort();
        functions.dedup();
        Index {
            root: "/proj".to_string(),
            generated_at: "2026-01-01T00:00:00Z".to_string(),
            functions,
            edges: edges
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
        }
    }

    #[test]
    fn call_maps_are_sorted_and_deduped() {
        let index = index_with_edges(&[("a", "b"), ("a", "b"), ("a", "c"), ("d", "b")]);
        let maps = build_call_maps(&index);
        assert_eq!(maps.callees["a"], vec!["b".to_string(), "c".to_string()]);
        assert_eq!(maps.callers["b"], vec!["a".to_string(), "d".to_string()]);
    }

    #[test]
    fn caller_chains_walk_to_roots() {
        let index = index_with_edges(&[("a", "b"), ("b", "c")]);
        let maps = build_call_maps(&index);
        let chains = caller_chains(&maps, "c", 64, 200);
        assert_eq!(
            chains,
            vec![vec!["a".to_string(), "b".to_string(), "c".to_string()]]
        );
    }

    #[test]
    fn caller_chains_terminate_on_cycles() {
        let index = index_with_edges(&[("a", "b"), ("b", "a"), ("c", "a")]);
        let maps = build_call_maps(&index);
        let chains = caller_chains(&maps, "b", 64, 200);
        // a -> b with callers of a being b (cycle, skipped) and c (root).
        assert!(chains.contains(&vec![
            "c".to_string(),
            "a".to_string(),
            "b".to_string()
        ]));
        assert!(chains.len() <= 200);
    }

    #[test]
    fn isolated_target_is_its_own_chain() {
        let index = index_with_edges(&[("a", "b")]);
        let maps = build_call_maps(&index);
        let chains = caller_chains(&maps, "z", 64, 200);
        assert_eq!(chains, vec![vec!["z".to_string()]]);
    }

    #[test]
    fn caller_chains_respect_limit() {
        let index = index_with_edges(&[("r1", "t"), ("r2", "t"), ("r3", "t")]);
        let maps = build_call_maps(&index);
        let chains = caller_chains(&maps, "t", 64, 2);
        assert_eq!(chains.len(), 2);
    }

    #[test]
    fn transitive_callees_exclude_target_and_respect_depth() {
        let index = index_with_edges(&[("a", "b"), ("b", "c"), ("c", "a")]);
        let maps = build_call_maps(&index);
        let all = transitive_callees(&maps, "a", 64);
        assert_eq!(all, vec!["b".to_string(), "c".to_string()]);

        let shallow = transitive_callees(&maps, "a", 0);
        assert_eq!(shallow, vec!["b".to_string()]);
    }

    #[test]
    fn find_paths_returns_simple_paths() {
        let index = index_with_edges(&[("a", "b"), ("b", "c"), ("a", "c")]);
        let maps = build_call_maps(&index);
        let paths = find_paths(&maps, "a", "c", 50, 32);
        assert!(paths.contains(&vec![
            "a".to_string(),
            "b".to_string(),
            "c".to_string()
        ]));
        assert!(paths.contains(&vec!["a".to_string(), "c".to_string()]));
        for path in &paths {
            assert_eq!(path.first().map(String::as_str), Some("a"));
            assert_eq!(path.last().map(String::as_str), Some("c"));
            let unique: HashSet<&String> = path.iter().collect();
            assert_eq!(unique.len(), path.len(), "path repeats a node");
        }
    }

    #[test]
    fn find_paths_depth_bound() {
        let index = index_with_edges(&[("a", "b"), ("b", "c")]);
        let maps = build_call_maps(&index);
        assert!(find_paths(&maps, "a", "c", 50, 1).is_empty());
        assert_eq!(find_paths(&maps, "a", "c", 50, 2).len(), 1);
    }
}
