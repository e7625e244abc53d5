//! Trace session: turns the bootstrap's raw frame facts into the event log.
//!
//! The bootstrap streams one JSON record per hook firing; the session is the
//! single post-hoc reader that applies every policy decision: frame naming,
//! self-exclusion, coverage, watch-target canonicalization.

use std::collections::{BTreeSet, HashSet};

use serde::Deserialize;

use crate::trace::Event;

/// Module-name prefixes the tracer never reports: its own namespace and the
/// bootstrap's marker module.
pub const SELF_EXCLUSION_PREFIXES: [&str; 2] = ["callscope", "_callscope_bootstrap"];

/// Sentinel when an assignment has no observable caller frame.
const UNKNOWN: &str = "<unknown>";

/// Raw frame facts emitted by the bootstrap, one JSON line each.
/// `module`/`func`/`self_class` are exactly what a frame inspector sees.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RawEvent {
    Call {
        module: String,
        func: String,
        self_class: Option<String>,
    },
    Return {
        module: String,
        func: String,
        self_class: Option<String>,
        value: String,
    },
    Assign {
        id: usize,
        module: Option<String>,
        func: Option<String>,
        self_class: Option<String>,
        file: Option<String>,
        line: Option<u64>,
        value: String,
    },
    /// A pending watch spec attached to its class.
    Watched { id: usize },
}

/// What one session produces once the raw stream is drained.
pub struct SessionOutput {
    /// The final event log, in stream order.
    pub events: Vec<Event>,
    /// Top modules observed (coverage), sorted.
    pub modules: Vec<String>,
    /// Indices of watch specs that attached during the run.
    pub attached: Vec<usize>,
}

/// Accumulates the event log and coverage set from raw frame facts.
pub struct TraceSession {
    trace: bool,
    coverage: bool,
    watch_targets: Vec<String>,
    events: Vec<Event>,
    modules: BTreeSet<String>,
    attached: HashSet<usize>,
}

/// Frame name: `module.Class.method` when the frame carries a `self` and is
/// not the module-body frame, else `module.func`.
pub fn frame_fqn(module: &str, func: &str, self_class: Option<&str>) -> String {
    match self_class {
        Some(class) if func != "<module>" => format!("{}.{}.{}", module, class, func),
        _ => format!("{}.{}", module, func),
    }
}

fn is_excluded(module: &str) -> bool {
    SELF_EXCLUSION_PREFIXES
        .iter()
        .any(|prefix| module.starts_with(prefix))
}

impl TraceSession {
    pub fn new(trace: bool, coverage: bool, watch_targets: Vec<String>) -> Self {
        Self {
            trace,
            coverage,
            watch_targets,
            events: Vec::new(),
            modules: BTreeSet::new(),
            attached: HashSet::new(),
        }
    }

    pub fn observe(&mut self, raw: RawEvent) {
        match raw {
            RawEvent::Call {
                module,
                func,
                self_class,
            } => {
                if is_excluded(&module) {
                    return;
                }
                let fqn = frame_fqn(&module, &func, self_class.as_deref());
                if self.coverage {
                    if let Some(top) = fqn.split('.').next() {
                        if !top.is_empty() {
                            self.modules.insert(top.to_string());
                        }
                    }
                }
                if self.trace {
                    self.events.push(Event::Call { func: fqn });
                }
            }
            RawEvent::Return {
                module,
                func,
                self_class,
                value,
            } => {
                if is_excluded(&module) {
                    return;
                }
                if self.trace {
                    let fqn = frame_fqn(&module, &func, self_class.as_deref());
                    self.events.push(Event::Return { func: fqn, value });
                }
            }
            RawEvent::Assign {
                id,
                module,
                func,
                self_class,
                file,
                line,
                value,
            } => {
                let target = match self.watch_targets.get(id) {
                    Some(target) => target.clone(),
                    None => return,
                };
                let caller = match (module.as_deref(), func.as_deref()) {
                    (Some(module), Some(func)) => frame_fqn(module, func, self_class.as_deref()),
                    _ => UNKNOWN.to_string(),
                };
                self.events.push(Event::Assign {
                    target,
                    func: caller,
                    file: file.unwrap_or_else(|| UNKNOWN.to_string()),
                    line: line.unwrap_or(0),
                    value,
                });
            }
            RawEvent::Watched { id } => {
                self.attached.insert(id);
            }
        }
    }

    pub fn finish(self) -> SessionOutput {
        let mut attached: Vec<usize> = self.attached.into_iter().collect();
        attached.sort_unstable();
        SessionOutput {
            events: self.events,
            modules: self.modules.into_iter().collect(),
            attached,
        }
    }
}
