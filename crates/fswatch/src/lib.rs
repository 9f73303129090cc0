//! Filesystem change watcher.
//!
//! Polls a set of watched directories, fingerprints every matching file, and
//! appends one `changes_detected` event per cycle that found anything.  Text
//! files get a unified diff against the cached previous content; binary
//! files get a marker line.  An optional classifier drops changes that are
//! not structurally significant.

mod classify;
mod diff;
mod scan;
mod snapshot;

pub use classify::{ChangeClassifier, similarity_ratio};
pub use diff::generate_diff;
pub use scan::{dir_for_file, display_path, scan_files};
pub use snapshot::FileSnapshot;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use recap_config::AppConfig;
use recap_event::{ChangeRecord, ChangeStatus, Event, append_events};

/// Owned state of the file-change detector: configuration plus the
/// path→snapshot map.  One instance lives for the process lifetime; the map
/// is reset on restart.
pub struct FsWatcher {
    dirs: Vec<PathBuf>,
    output_file: PathBuf,
    /// Sibling output paths (command log, summary dir) excluded from scans
    /// alongside our own log so no loop feeds on another loop's writes.
    command_log: PathBuf,
    summary_dir: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
    classifier: ChangeClassifier,
    poll_interval: Duration,
    snapshots: HashMap<PathBuf, FileSnapshot>,
}

impl FsWatcher {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            dirs: config.watch_dirs(),
            output_file: config.changes_log_path(),
            command_log: config.commands_log_path(),
            summary_dir: config.summary_output_dir(),
            include: config.watcher.include_filetypes.clone(),
            exclude: config.watcher.exclude_filetypes.clone(),
            classifier: ChangeClassifier {
                enabled: config.watcher.major_changes_only,
                min_lines_changed: config.watcher.min_lines_changed,
                similarity_threshold: config.watcher.similarity_threshold,
            },
            poll_interval: Duration::from_secs(config.watcher.poll_interval_secs.max(1)),
            snapshots: HashMap::new(),
        }
    }

    /// Files currently eligible for observation.  The watcher's own log, the
    /// command log, and today's summary artifact are always excluded.
    pub fn scan(&self) -> Vec<PathBuf> {
        let today = Local::now().date_naive().format("%Y-%m-%d");
        let reserved = [
            self.output_file.clone(),
            self.command_log.clone(),
            self.summary_dir.join(format!("{today}.md")),
        ];
        scan_files(&self.dirs, &self.include, &self.exclude, &reserved)
    }

    /// Populate the snapshot map without emitting change records, so files
    /// that already exist at startup are not reported as new.
    pub fn seed_snapshots(&mut self) {
        for path in self.scan() {
            let Ok(fingerprint) = snapshot::fingerprint_file(&path) else {
                continue;
            };
            let Ok(binary) = snapshot::is_binary(&path) else {
                continue;
            };
            let lines = if binary {
                vec![]
            } else {
                match snapshot::read_lines(&path) {
                    Some(lines) => lines,
                    None => continue,
                }
            };
            self.snapshots.insert(
                path,
                FileSnapshot {
                    fingerprint,
                    lines,
                    is_binary: binary,
                },
            );
        }
    }

    /// One scan cycle: diff every eligible file against its snapshot and
    /// return at most one record per file.  Per-file I/O errors skip that
    /// file for this cycle only.
    pub fn check_for_changes(&mut self) -> Vec<ChangeRecord> {
        let mut changes = Vec::new();

        for path in self.scan() {
            let Ok(fingerprint) = snapshot::fingerprint_file(&path) else {
                continue;
            };
            let Some(watch_dir) = dir_for_file(&path, &self.dirs) else {
                continue;
            };
            let label = display_path(&path, watch_dir);

            let Ok(binary) = snapshot::is_binary(&path) else {
                continue;
            };
            if binary {
                match self.snapshots.get(&path) {
                    None => {
                        changes.push(ChangeRecord {
                            file: label.clone(),
                            status: ChangeStatus::New,
                            diff: vec![format!("Binary file added: {label}")],
                            is_binary: true,
                        });
                    }
                    Some(snap) if snap.fingerprint != fingerprint => {
                        changes.push(ChangeRecord {
                            file: label.clone(),
                            status: ChangeStatus::Modified,
                            diff: vec![format!("Binary file modified: {label}")],
                            is_binary: true,
                        });
                    }
                    Some(_) => continue,
                }
                self.snapshots.insert(
                    path,
                    FileSnapshot {
                        fingerprint,
                        lines: vec![],
                        is_binary: true,
                    },
                );
                continue;
            }

            let Some(current_lines) = snapshot::read_lines(&path) else {
                continue;
            };

            match self.snapshots.get(&path) {
                None => {
                    if self.classifier.is_major_change(&[], &current_lines, &path) {
                        if let Some(diff) = generate_diff(&[], &current_lines, &label) {
                            changes.push(ChangeRecord {
                                file: label,
                                status: ChangeStatus::New,
                                diff,
                                is_binary: false,
                            });
                        }
                    } else {
                        debug!(file = %label, "minor new file ignored");
                    }
                }
                Some(snap) if snap.fingerprint != fingerprint => {
                    let old_lines = snap.lines.clone();
                    if self.classifier.is_major_change(&old_lines, &current_lines, &path) {
                        if let Some(diff) = generate_diff(&old_lines, &current_lines, &label) {
                            changes.push(ChangeRecord {
                                file: label,
                                status: ChangeStatus::Modified,
                                diff,
                                is_binary: false,
                            });
                        }
                    } else {
                        debug!(file = %label, "minor change ignored");
                    }
                }
                Some(_) => continue,
            }

            self.snapshots.insert(
                path,
                FileSnapshot {
                    fingerprint,
                    lines: current_lines,
                    is_binary: false,
                },
            );
        }

        changes
    }

    pub fn tracked_files(&self) -> usize {
        self.snapshots.len()
    }

    /// Watch loop: seed, then scan/append/sleep until shutdown.  The stop
    /// signal is only observed between cycles, never mid-scan.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            dirs = self.dirs.len(),
            output = %self.output_file.display(),
            "file watcher starting"
        );
        for dir in &self.dirs {
            debug!(dir = %dir.display(), "watching");
        }

        self.seed_snapshots();
        info!(files = self.snapshots.len(), "initial snapshots seeded");

        loop {
            let changes = self.check_for_changes();
            if !changes.is_empty() {
                debug!(count = changes.len(), "changes detected");
                let event = Event::ChangesDetected {
                    timestamp: Utc::now().timestamp(),
                    changes,
                };
                if let Err(err) = append_events(&self.output_file, vec![event]) {
                    warn!(%err, "failed to append to change log");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("file watcher stopped");
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
