//! Per-module call tallies from a trace.

use std::collections::BTreeMap;

use serde::Serialize;

/// Top modules never reported: the synthetic entry module and the
/// interpreter's builtin pseudo-module.
const SUPPRESSED_MODULES: [&str; 2] = ["__main__", "builtins"];

/// Prefix of the tool's own runtime modules.
const SELF_PREFIX: &str = "callscope";

use super::Event;

/// A ranked module with its call count.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ModuleCalls {
    pub module: String,
    pub calls: usize,
}

/// Tally `call` events per top dotted component, drop the tool's own modules
/// and the synthetic ones, and rank by count (descending) then name. A
/// positive `top` truncates the ranking.
pub fn coverage_report(events: &[Event], top: usize) -> Vec<ModuleCalls> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for event in events {
        if let Event::Call { func } = event {
            let module = func.split('.').next().unwrap_or("");
            if module.is_empty()
                || module.starts_with(SELF_PREFIX)
                || SUPPRESSED_MODULES.contains(&module)
            {
                continue;
            }
            *counts.entry(module.to_string()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<ModuleCalls> = counts
        .into_iter()
        .map(|(module, calls)| ModuleCalls { module, calls })
        .collect();
    ranked.sort_by(|a, b| b.calls.cmp(&a.calls).then_with(|| a.module.cmp(&b.module)));
    if top > 0 {
        ranked.truncate(top);
    }
    ranked
}
