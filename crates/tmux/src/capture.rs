//! Pane-content acquisition via the external tmux binary.
//!
//! The multiplexer is a black box behind [`PaneCapture`]; a missing tmux
//! binary or a failed invocation surfaces as `None`, which the scraper
//! treats as "no panes available".

use async_trait::async_trait;
use tokio::process::Command;

#[async_trait]
pub trait PaneCapture: Send + Sync {
    /// Last lines of a pane's screen buffer, or `None` when capture fails.
    async fn capture_pane(&self, pane: &str) -> Option<String>;

    /// All active panes as `session:window.pane` ids.
    async fn list_panes(&self) -> Option<Vec<String>>;
}

/// Real capture backend shelling out to tmux.
pub struct TmuxCapture {
    scrollback_lines: u32,
}

impl TmuxCapture {
    pub fn new(scrollback_lines: u32) -> Self {
        Self { scrollback_lines }
    }
}

#[async_trait]
impl PaneCapture for TmuxCapture {
    async fn capture_pane(&self, pane: &str) -> Option<String> {
        let scrollback = Command::new("tmux")
            .args([
                "capture-pane",
                "-t",
                pane,
                "-S",
                &format!("-{}", self.scrollback_lines),
                "-p",
            ])
            .output()
            .await;

        if let Ok(output) = &scrollback {
            if output.status.success() {
                let text = String::from_utf8_lossy(&output.stdout);
                if !text.trim().is_empty() {
                    return Some(text.into_owned());
                }
            }
        }

        // Scrollback form failed or came back empty — fall back to the
        // currently visible viewport.
        let visible = Command::new("tmux")
            .args(["capture-pane", "-t", pane, "-p"])
            .output()
            .await
            .ok()?;
        Some(String::from_utf8_lossy(&visible.stdout).into_owned())
    }

    async fn list_panes(&self) -> Option<Vec<String>> {
        let output = Command::new("tmux")
            .args(["list-panes", "-a", "-F", "#S:#I.#P"])
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        Some(
            String::from_utf8_lossy(&output.stdout)
                .trim()
                .lines()
                .map(str::to_string)
                .collect(),
        )
    }
}
