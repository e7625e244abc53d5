//! Substring search over an event log.

use serde::Serialize;

use super::Event;

/// A matching event plus its position in the input log.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SearchMatch {
    pub index: usize,
    pub event: Event,
}

/// Scan the log once, matching `pattern` case-insensitively against each
/// event's canonical JSON form; `event_type` narrows to one variant.
pub fn search_events(
    events: &[Event],
    pattern: &str,
    event_type: Option<&str>,
) -> Vec<SearchMatch> {
    let needle = pattern.to_lowercase();
    let mut matches = Vec::new();
    for (index, event) in events.iter().enumerate() {
        if let Some(wanted) = event_type {
            if event.type_name() != wanted {
                continue;
            }
        }
        let blob = match serde_json::to_string(event) {
            Ok(blob) => blob,
            Err(_) => continue,
        };
        if blob.to_lowercase().contains(&needle) {
            matches.push(SearchMatch {
                index,
                event: event.clone(),
            });
        }
    }
    matches
}
