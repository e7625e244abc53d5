//! Structural diff between two event logs.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use super::Event;

/// Differences between an old and a new trace.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct TraceDiff {
    /// Call edges present only in the new trace, sorted.
    pub added_calls: Vec<(String, String)>,
    /// Call edges present only in the old trace, sorted.
    pub removed_calls: Vec<(String, String)>,
    /// Functions in both traces whose return-value sets differ.
    pub changed_returns: BTreeMap<String, ReturnChange>,
    /// Watched targets whose assignment sequences differ; a side missing
    /// from its trace is `None`.
    pub watch_diffs: BTreeMap<String, WatchChange>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ReturnChange {
    pub old: Vec<String>,
    pub new: Vec<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct WatchChange {
    pub old: Option<Vec<String>>,
    pub new: Option<Vec<String>>,
}

/// What one replay of a log induces: the runtime edge set, per-function
/// return values, and per-target assignment values.
struct Replay {
    edges: BTreeSet<(String, String)>,
    returns: BTreeMap<String, Vec<String>>,
    watches: BTreeMap<String, Vec<String>>,
}

/// Replay the call stack of a log. An edge is (stack top, entered function);
/// a return pops only when it matches the top, which keeps the stack sane
/// across truncated or abnormal logs.
fn replay(events: &[Event]) -> Replay {
    let mut edges = BTreeSet::new();
    let mut returns: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut watches: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut stack: Vec<String> = Vec::new();

    for event in events {
        match event {
            Event::Call { func } => {
                if let Some(top) = stack.last() {
                    edges.insert((top.clone(), func.clone()));
                }
                stack.push(func.clone());
            }
            Event::Return { func, value } => {
                if stack.last() == Some(func) {
                    stack.pop();
                }
                returns.entry(func.clone()).or_default().push(value.clone());
            }
            Event::Assign { target, value, .. } => {
                watches.entry(target.clone()).or_default().push(value.clone());
            }
        }
    }

    Replay {
        edges,
        returns,
        watches,
    }
}

pub fn diff_traces(old_events: &[Event], new_events: &[Event]) -> TraceDiff {
    let old = replay(old_events);
    let new = replay(new_events);

    let added_calls: Vec<(String, String)> =
        new.edges.difference(&old.edges).cloned().collect();
    let removed_calls: Vec<(String, String)> =
        old.edges.difference(&new.edges).cloned().collect();

    let mut changed_returns = BTreeMap::new();
    for (func, old_values) in &old.returns {
        if let Some(new_values) = new.returns.get(func) {
            let old_set: HashSet<&String> = old_values.iter().collect();
            let new_set: HashSet<&String> = new_values.iter().collect();
            if old_set != new_set {
                changed_returns.insert(
                    func.clone(),
                    ReturnChange {
                        old: old_values.clone(),
                        new: new_values.clone(),
                    },
                );
            }
        }
    }

    let mut watch_diffs = BTreeMap::new();
    for (target, old_values) in &old.watches {
        match new.watches.get(target) {
            Some(new_values) => {
                if old_values != new_values {
                    watch_diffs.insert(
                        target.clone(),
                        WatchChange {
                            old: Some(old_values.clone()),
                            new: Some(new_values.clone()),
                        },
                    );
                }
            }
            None => {
                watch_diffs.insert(
                    target.clone(),
                    WatchChange {
                        old: Some(old_values.clone()),
                        new: None,
                    },
                );
            }
        }
    }
    for (target, new_values) in &new.watches {
        if !old.watches.contains_key(target) {
            watch_diffs.insert(
                target.clone(),
                WatchChange {
                    old: None,
                    new: Some(new_values.clone()),
                },
            );
        }
    }

    TraceDiff {
        added_calls,
        removed_calls,
        changed_returns,
        watch_diffs,
    }
}
