//! Whole-file JSON log store.
//!
//! Each log is a single JSON array of [`Event`]s.  Appending is a
//! read-modify-rewrite of the full array, not an OS-level append.  Writers
//! and the daily truncation are not coordinated by any lock; last writer
//! wins.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::Event;

/// Read a log file into a list of events.  A missing, empty, or malformed
/// file yields an empty list; malformed content is logged but never fatal.
pub fn read_events(path: &Path) -> Vec<Event> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return vec![],
    };
    if raw.trim().is_empty() {
        return vec![];
    }
    match serde_json::from_str(&raw) {
        Ok(events) => events,
        Err(err) => {
            warn!(path = %path.display(), %err, "malformed event log — treating as empty");
            vec![]
        }
    }
}

/// Append events to a log file, creating it (and parent directories) when
/// absent.  The existing array is read back, extended in memory, and the
/// whole file rewritten.
pub fn append_events(path: &Path, new_events: Vec<Event>) -> Result<()> {
    if new_events.is_empty() {
        return Ok(());
    }

    let mut all_events = read_events(path);
    let appended = new_events.len();
    all_events.extend(new_events);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating log directory {}", parent.display()))?;
        }
    }

    let rendered = serde_json::to_string_pretty(&all_events)?;
    fs::write(path, rendered).with_context(|| format!("writing log {}", path.display()))?;

    debug!(path = %path.display(), appended, total = all_events.len(), "log updated");
    Ok(())
}

/// Empty a log file after its events have been consumed.
pub fn truncate_events(path: &Path) -> Result<()> {
    fs::write(path, "").with_context(|| format!("truncating log {}", path.display()))?;
    debug!(path = %path.display(), "log truncated");
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChangeRecord, ChangeStatus};
    use tempfile::TempDir;

    fn file_event(timestamp: i64) -> Event {
        Event::ChangesDetected {
            timestamp,
            changes: vec![ChangeRecord {
                file: "proj/a.txt".to_string(),
                status: ChangeStatus::New,
                diff: vec!["+hello".to_string()],
                is_binary: false,
            }],
        }
    }

    #[test]
    fn read_missing_file_yields_empty() {
        let dir = TempDir::new().unwrap();
        assert!(read_events(&dir.path().join("nope.json")).is_empty());
    }

    #[test]
    fn read_empty_file_yields_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");
        fs::write(&path, "").unwrap();
        assert!(read_events(&path).is_empty());
    }

    #[test]
    fn read_malformed_file_yields_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");
        fs::write(&path, "{not json").unwrap();
        assert!(read_events(&path).is_empty());
    }

    #[test]
    fn append_creates_file_and_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state/logs/changes.json");

        append_events(&path, vec![file_event(10)]).unwrap();

        let events = read_events(&path);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp(), 10);
    }

    #[test]
    fn append_extends_existing_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");

        append_events(&path, vec![file_event(1)]).unwrap();
        append_events(&path, vec![file_event(2), file_event(3)]).unwrap();

        let events = read_events(&path);
        assert_eq!(events.len(), 3);
        let stamps: Vec<i64> = events.iter().map(Event::timestamp).collect();
        assert_eq!(stamps, vec![1, 2, 3]);
    }

    #[test]
    fn append_nothing_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");
        append_events(&path, vec![]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn truncate_empties_the_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");

        append_events(&path, vec![file_event(1)]).unwrap();
        truncate_events(&path).unwrap();

        assert!(path.exists());
        assert!(read_events(&path).is_empty());
    }

    #[test]
    fn append_after_truncate_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");

        append_events(&path, vec![file_event(1)]).unwrap();
        truncate_events(&path).unwrap();
        append_events(&path, vec![file_event(9)]).unwrap();

        let events = read_events(&path);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp(), 9);
    }
}
