//! Event-log model and persistence for dynamic traces.
//!
//! A trace is an ordered JSON array of events emitted by one instrumented
//! execution. Within one thread the order is program order; the log is
//! immutable once written.

mod diffing;
mod history;
mod report;
mod search;

pub use diffing::{diff_traces, ReturnChange, TraceDiff, WatchChange};
pub use history::{watch_history, HistoryEntry};
pub use report::{coverage_report, ModuleCalls};
pub use search::{search_events, SearchMatch};

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One recorded event. `type` is the wire discriminator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    /// A frame was entered.
    Call { func: String },
    /// A frame returned; `value` is a human-readable rendering, not a value
    /// that round-trips.
    Return { func: String, value: String },
    /// A watched attribute was assigned.
    Assign {
        target: String,
        func: String,
        file: String,
        line: u64,
        value: String,
    },
}

impl Event {
    /// Wire name of the event's variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::Call { .. } => "call",
            Event::Return { .. } => "return",
            Event::Assign { .. } => "assign",
        }
    }
}

/// Load an event log, distinguishing a missing file from a broken one.
pub fn load_events(path: &Path) -> Result<Vec<Event>> {
    if !path.is_file() {
        return Err(Error::MissingTrace {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path).map_err(|e| Error::TraceIo {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| Error::TraceFormat {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write an event log as a pretty-printed JSON array.
pub fn save_events(path: &Path, events: &[Event]) -> Result<()> {
    let json = serde_json::to_string_pretty(events).map_err(|e| Error::TraceFormat {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, json).map_err(|e| Error::TraceIo {
        path: path.to_path_buf(),
        source: e,
    })
}
