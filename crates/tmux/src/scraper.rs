//! Pane polling state machine: tracks per-pane last-command state, emits
//! each completed command exactly once, and discovers panes dynamically
//! when none are configured.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use recap_config::AppConfig;
use recap_event::{Event, append_events};

use crate::capture::PaneCapture;
use crate::prompt;

/// Per-pane scrape state.  Lives for the process lifetime only; a restart
/// forgets what was already emitted.
#[derive(Debug, Default)]
pub struct PaneState {
    pub last_command: String,
    pub waiting_for_completion: bool,
}

/// Owned state of the terminal scraper: configuration plus the pane→state map.
pub struct TmuxScraper {
    panes: Vec<String>,
    /// True when no panes were configured and the active set is discovered
    /// (and re-discovered) at runtime.
    discover: bool,
    capture_full_output: bool,
    output_file: PathBuf,
    poll_interval: Duration,
    pane_states: HashMap<String, PaneState>,
}

impl TmuxScraper {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            panes: config.tmux.panes.clone(),
            discover: config.tmux.panes.is_empty(),
            capture_full_output: config.tmux.capture_full_output,
            output_file: config.commands_log_path(),
            poll_interval: Duration::from_secs(config.tmux.poll_interval_secs.max(1)),
            pane_states: HashMap::new(),
        }
    }

    /// Refresh the tracked pane set from the multiplexer's active listing,
    /// logging additions and removals.
    pub async fn refresh_panes(&mut self, capture: &dyn PaneCapture) {
        let current: HashSet<String> = capture
            .list_panes()
            .await
            .unwrap_or_default()
            .into_iter()
            .collect();
        let previous: HashSet<String> = self.panes.iter().cloned().collect();

        for pane in current.difference(&previous) {
            debug!(%pane, "pane appeared");
        }
        for pane in previous.difference(&current) {
            debug!(%pane, "pane closed");
        }

        self.panes = current.into_iter().collect();
        if self.panes.is_empty() {
            warn!("no active tmux panes detected");
        }
    }

    /// Poll every tracked pane once and return newly completed commands.
    /// A pane whose finished state has not changed since the last emission
    /// produces nothing.
    pub async fn check_for_completed_commands(&mut self, capture: &dyn PaneCapture) -> Vec<Event> {
        let mut completed = Vec::new();

        for pane in self.panes.clone() {
            let Some(content) = capture.capture_pane(&pane).await else {
                continue;
            };

            let state = self.pane_states.entry(pane.clone()).or_default();

            if !prompt::is_command_finished(&content) {
                continue;
            }
            let Some(command) = prompt::extract_command(&content) else {
                continue;
            };
            if command == state.last_command {
                continue;
            }

            let output = if self.capture_full_output {
                content.clone()
            } else {
                prompt::extract_last_command_output(&content)
            };

            if !output.trim().is_empty() {
                completed.push(Event::CommandCompleted {
                    timestamp: Utc::now().timestamp(),
                    pane: pane.clone(),
                    command: command.clone(),
                    output: output.lines().map(str::to_string).collect(),
                });
            }

            state.last_command = command;
            state.waiting_for_completion = false;
        }

        completed
    }

    pub fn tracked_panes(&self) -> &[String] {
        &self.panes
    }

    /// Scrape loop: discover (when unconfigured), poll, append, sleep.  An
    /// empty pane set just sleeps and retries — the backoff path when tmux
    /// is gone or between sessions.
    pub async fn run(mut self, capture: impl PaneCapture, mut shutdown: watch::Receiver<bool>) {
        info!(
            output = %self.output_file.display(),
            full_capture = self.capture_full_output,
            "tmux scraper starting"
        );
        if self.discover {
            debug!("no panes configured — monitoring all active panes");
        } else {
            debug!(panes = ?self.panes, "watching configured panes");
        }

        loop {
            if self.discover {
                self.refresh_panes(&capture).await;
            }

            if !self.panes.is_empty() {
                let completed = self.check_for_completed_commands(&capture).await;
                if !completed.is_empty() {
                    debug!(count = completed.len(), "commands completed");
                    if let Err(err) = append_events(&self.output_file, completed) {
                        warn!(%err, "failed to append to command log");
                    }
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

        info!("tmux scraper stopped");
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
