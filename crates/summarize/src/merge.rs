//! Merging the two activity logs into one chronological sequence.

use std::path::Path;

use recap_event::{Event, read_events};

/// Read both logs (missing or malformed files read as empty) and return the
/// union sorted ascending by timestamp.  The sort is stable: ties keep
/// arrival order, command events before file events.
pub fn merge_logs(command_log: &Path, changes_log: &Path) -> Vec<Event> {
    let mut events = read_events(command_log);
    events.extend(read_events(changes_log));
    events.sort_by_key(Event::timestamp);
    events
}

// ── Tests ────────────────────────────────────────────────────────────────────
