//! Watchpoint specs: `module.Class.attr` strings and their runtime aliases.

use std::path::Path;

/// One parsed watch target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchSpec {
    /// Module alias the user wrote (matched against runtime module names).
    pub module: String,
    pub class_name: String,
    pub attribute: String,
}

impl WatchSpec {
    /// Split on the last two dots. Fewer than three components is malformed
    /// and yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (rest, attribute) = raw.rsplit_once('.')?;
        let (module, class_name) = rest.rsplit_once('.')?;
        Some(Self {
            module: module.to_string(),
            class_name: class_name.to_string(),
            attribute: attribute.to_string(),
        })
    }

    /// Canonical target recorded on `assign` events.
    pub fn target(&self) -> String {
        format!("{}.{}.{}", self.module, self.class_name, self.attribute)
    }
}

/// Parse a watch list, silently dropping malformed entries.
pub fn parse_watch_list(raw: &[String]) -> Vec<WatchSpec> {
    raw.iter().filter_map(|w| WatchSpec::parse(w)).collect()
}

/// The script's file stem, accepted as a module alias for the entry module
/// so users can write `demo.User.age` for `lab/demo.py`.
pub fn script_stem(script: &Path) -> String {
    script
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("__main__")
        .to_string()
}
