//! Shared event model for the two activity logs, plus the JSON log store
//! both watchers append to and the summarizer consumes.

mod store;

pub use store::{append_events, read_events, truncate_events};

use serde::{Deserialize, Serialize};

/// How a watched file changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    New,
    Modified,
}

/// One file's change within a scan cycle.  `diff` holds unified-diff lines
/// for text files, or a single marker line for binary files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Display path, `<dir-name>/<rel-path>`.
    pub file: String,
    pub status: ChangeStatus,
    pub diff: Vec<String>,
    pub is_binary: bool,
}

/// An entry in either activity log.  The two logs share one tagged shape so
/// the merged stream deserializes without sniffing.
///
/// A missing `timestamp` deserializes as 0 and therefore sorts first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum Event {
    ChangesDetected {
        #[serde(default)]
        timestamp: i64,
        changes: Vec<ChangeRecord>,
    },
    CommandCompleted {
        #[serde(default)]
        timestamp: i64,
        pane: String,
        command: String,
        output: Vec<String>,
    },
}

impl Event {
    pub fn timestamp(&self) -> i64 {
        match self {
            Event::ChangesDetected { timestamp, .. } => *timestamp,
            Event::CommandCompleted { timestamp, .. } => *timestamp,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_event_serializes_with_snake_case_tag() {
        let event = Event::ChangesDetected {
            timestamp: 1700000000,
            changes: vec![ChangeRecord {
                file: "proj/src/main.rs".to_string(),
                status: ChangeStatus::Modified,
                diff: vec!["-old".to_string(), "+new".to_string()],
                is_binary: false,
            }],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "changes_detected");
        assert_eq!(json["timestamp"], 1700000000);
        assert_eq!(json["changes"][0]["status"], "modified");
        assert_eq!(json["changes"][0]["is_binary"], false);
    }

    #[test]
    fn command_event_serializes_with_snake_case_tag() {
        let event = Event::CommandCompleted {
            timestamp: 42,
            pane: "main:0.1".to_string(),
            command: "cargo test".to_string(),
            output: vec!["running 3 tests".to_string()],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "command_completed");
        assert_eq!(json["pane"], "main:0.1");
        assert_eq!(json["output"][0], "running 3 tests");
    }

    #[test]
    fn events_round_trip_through_json() {
        let events = vec![
            Event::CommandCompleted {
                timestamp: 3,
                pane: "a:0.0".to_string(),
                command: "make".to_string(),
                output: vec![],
            },
            Event::ChangesDetected {
                timestamp: 5,
                changes: vec![],
            },
        ];
        let json = serde_json::to_string(&events).unwrap();
        let back: Vec<Event> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].timestamp(), 3);
        assert_eq!(back[1].timestamp(), 5);
    }

    #[test]
    fn missing_timestamp_defaults_to_zero() {
        let raw = r#"{"event_type":"changes_detected","changes":[]}"#;
        let event: Event = serde_json::from_str(raw).unwrap();
        assert_eq!(event.timestamp(), 0);
    }

    #[test]
    fn new_status_round_trips_lowercase() {
        let json = serde_json::to_string(&ChangeStatus::New).unwrap();
        assert_eq!(json, "\"new\"");
        let back: ChangeStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ChangeStatus::New);
    }
}
