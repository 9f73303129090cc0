use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

// ── Watcher config ────────────────────────────────────────────────────────────

/// Settings for the filesystem change watcher (`[watcher]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub enable: bool,
    /// Directories to observe, recursively.  `~/` prefixes are expanded.
    pub dirs: Vec<String>,
    /// JSON log the watcher appends change events to.
    pub output_file: String,
    /// Suffix filters, e.g. `[".rs", ".py"]`.  Empty means all files.
    pub include_filetypes: Vec<String>,
    /// Suffix filters removed from the scan set.  Applied after includes.
    pub exclude_filetypes: Vec<String>,
    /// When `true`, only structurally significant changes are recorded.
    /// See the classifier in recap-fswatch for what counts as significant.
    pub major_changes_only: bool,
    /// Minimum distinct changed lines for a change to count as major.
    pub min_lines_changed: usize,
    /// Similarity ratio [0.0–1.0] below which a rewritten line counts as major.
    pub similarity_threshold: f64,
    pub poll_interval_secs: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enable: true,
            dirs: vec![],
            output_file: "~/.local/state/recap/changes.json".to_string(),
            include_filetypes: vec![],
            exclude_filetypes: vec![],
            major_changes_only: false,
            min_lines_changed: 3,
            similarity_threshold: 0.7,
            poll_interval_secs: 1,
        }
    }
}

// ── Tmux config ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmuxConfig {
    pub enable: bool,
    /// Explicit pane ids (`session:window.pane`).  Empty means discover all
    /// active panes at runtime and track additions/removals.
    pub panes: Vec<String>,
    /// JSON log the scraper appends completed commands to.
    pub output_file: String,
    /// Capture the entire pane buffer instead of just the last command's output.
    pub capture_full_output: bool,
    /// How many scrollback lines to request from `tmux capture-pane`.
    pub scrollback_lines: u32,
    pub poll_interval_secs: u64,
}

impl Default for TmuxConfig {
    fn default() -> Self {
        Self {
            enable: true,
            panes: vec![],
            output_file: "~/.local/state/recap/commands.json".to_string(),
            capture_full_output: false,
            scrollback_lines: 1000,
            poll_interval_secs: 1,
        }
    }
}

// ── Summarizer config ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Directory the dated daily reports are written into.
    pub output_dir: String,
    /// Approximate token budget per LLM call (character-count heuristic).
    pub token_limit: usize,
    /// Local time-of-day gate for the daily run, `HH:MM`.
    pub run_at: String,
    pub poll_interval_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            output_dir: "~/.local/state/recap".to_string(),
            token_limit: 1_000_000,
            run_at: "19:00".to_string(),
            poll_interval_secs: 60,
        }
    }
}

impl SummarizerConfig {
    /// Parse `run_at` into a [`NaiveTime`].  A malformed value is a hard
    /// error; the daemon refuses to start with a gate it cannot evaluate.
    pub fn parse_run_at(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.run_at, "%H:%M")
            .with_context(|| format!("invalid [summarizer] run_at value {:?}", self.run_at))
    }
}

// ── LLM config ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// `"ollama"` or `"openrouter"`.
    pub provider: String,
    pub ollama_model: String,
    pub openrouter_model: String,
    /// Base URL for the Ollama API.  Overridden at runtime by the
    /// `OLLAMA_BASE_URL` environment variable when set.
    pub ollama_base_url: String,
    /// OpenRouter API key.  Overridden by `RECAP_API_KEY` (env takes
    /// precedence so the key can stay out of the config file).
    pub api_key: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            ollama_model: "llama3.1:8b".to_string(),
            openrouter_model: "openai/gpt-4o-mini".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// ── AppConfig ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub watcher: WatcherConfig,
    pub tmux: TmuxConfig,
    pub summarizer: SummarizerConfig,
    pub llm: LlmConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        // API key env override (takes precedence over the config file).
        if let Ok(key) = env::var("RECAP_API_KEY") {
            if !key.is_empty() {
                config.llm.api_key = key;
            }
        }

        if let Ok(url) = env::var("OLLAMA_BASE_URL") {
            if !url.is_empty() {
                config.llm.ollama_base_url = url;
            }
        }

        // Fail early on a gate we cannot evaluate.
        config.summarizer.parse_run_at()?;

        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }

    pub fn active_model(&self) -> &str {
        if self.llm.provider.eq_ignore_ascii_case("openrouter") {
            &self.llm.openrouter_model
        } else {
            &self.llm.ollama_model
        }
    }

    /// Expanded path of the file-change log.
    pub fn changes_log_path(&self) -> PathBuf {
        expand_tilde(&self.watcher.output_file)
    }

    /// Expanded path of the completed-command log.
    pub fn commands_log_path(&self) -> PathBuf {
        expand_tilde(&self.tmux.output_file)
    }

    /// Expanded directory the daily reports are written into.
    pub fn summary_output_dir(&self) -> PathBuf {
        expand_tilde(&self.summarizer.output_dir)
    }

    /// Watched directories with `~/` expanded.
    pub fn watch_dirs(&self) -> Vec<PathBuf> {
        self.watcher.dirs.iter().map(|d| expand_tilde(d)).collect()
    }
}

/// Expand a leading `~/` (or bare `~`) against the user's home directory.
/// Paths without the prefix pass through untouched.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

// ── Tests ────────────────────────────────────────────────────────────────────
