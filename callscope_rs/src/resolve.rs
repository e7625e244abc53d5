//! Short-name resolution against an index.

use crate::index::Index;

/// Outcome of resolving a user-supplied symbol against `functions`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one fully-qualified name matched.
    Resolved(String),
    /// Several candidates matched; sorted for display.
    Ambiguous(Vec<String>),
    /// Nothing matched; the original input is handed back so callers can
    /// proceed with it verbatim.
    Unknown(String),
}

impl Resolution {
    /// The name queries should proceed with, if unambiguous.
    pub fn name(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(name) | Resolution::Unknown(name) => Some(name),
            Resolution::Ambiguous(_) => None,
        }
    }
}

/// Resolve `name` to a fully-qualified function name.
///
/// Exact hits win. A dotted input matches as a suffix (`demo.increment` ->
/// `lab.demo.increment`); a bare input matches by terminal component. One
/// candidate resolves, several are ambiguous, none falls back to the input.
pub fn resolve_symbol(index: &Index, name: &str) -> Resolution {
    if index.functions.iter().any(|f| f == name) {
        return Resolution::Resolved(name.to_string());
    }

    let mut candidates: Vec<String> = if name.contains('.') {
        let suffix = format!(".{}", name);
        index
            .functions
            .iter()
            .filter(|f| f.ends_with(&suffix))
            .cloned()
            .collect()
    } else {
        index
            .functions
            .iter()
            .filter(|f| f.rsplit('.').next() == Some(name))
            .cloned()
            .collect()
    };
    candidates.sort();
    candidates.dedup();

    match candidates.len() {
        0 => Resolution::Unknown(name.to_string()),
        1 => Resolution::Resolved(candidates.remove(0)),
        _ => Resolution::Ambiguous(candidates),
    }
}
