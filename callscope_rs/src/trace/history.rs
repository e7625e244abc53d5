//! Assignment history for a watched target.

use std::path::Path;

use serde::Serialize;

use super::Event;

/// One recorded assignment, ready for display.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct HistoryEntry {
    pub file: String,
    pub line: u64,
    pub func: String,
    pub value: String,
}

/// All `assign` events for `target`, in log order. File paths under `cwd`
/// are shown relative to it.
pub fn watch_history(events: &[Event], target: &str, cwd: &Path) -> Vec<HistoryEntry> {
    let mut history = Vec::new();
    for event in events {
        if let Event::Assign {
            target: event_target,
            func,
            file,
            line,
            value,
        } = event
        {
            if event_target != target {
                continue;
            }
            let display = Path::new(file)
                .strip_prefix(cwd)
                .map(|rel| rel.to_string_lossy().to_string())
                .unwrap_or_else(|_| file.clone());
            history.push(HistoryEntry {
                file: display,
                line: *line,
                func: func.clone(),
                value: value.clone(),
            });
        }
    }
    history
}
