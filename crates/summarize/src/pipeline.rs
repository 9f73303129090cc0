//! The daily summarization pipeline: merge → chunk → reduce → artifact.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use recap_config::AppConfig;
use recap_event::truncate_events;
use recap_llm::ChatModel;

use crate::chunk::split_by_token_limit;
use crate::merge::merge_logs;
use crate::prompt;

/// One day's merge/chunk/summarize run.  Holds paths and limits only; the
/// model is passed in so callers (and tests) choose the backend.
pub struct SummaryPipeline {
    command_log: PathBuf,
    changes_log: PathBuf,
    output_dir: PathBuf,
    token_limit: usize,
}

impl SummaryPipeline {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            command_log: config.commands_log_path(),
            changes_log: config.changes_log_path(),
            output_dir: config.summary_output_dir(),
            token_limit: config.summarizer.token_limit,
        }
    }

    pub fn new(
        command_log: impl Into<PathBuf>,
        changes_log: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        token_limit: usize,
    ) -> Self {
        Self {
            command_log: command_log.into(),
            changes_log: changes_log.into(),
            output_dir: output_dir.into(),
            token_limit,
        }
    }

    /// Run the whole pipeline once for `today`.
    ///
    /// Returns the artifact path on success, or `Ok(None)` when there was
    /// nothing to summarize (the logs stay untouched so the next attempt
    /// sees the same data).  Any model failure aborts the run before the
    /// logs are truncated, so no partial report is ever written.
    pub async fn run_once(
        &self,
        model: &dyn ChatModel,
        today: NaiveDate,
    ) -> Result<Option<PathBuf>> {
        debug!(
            commands = %self.command_log.display(),
            changes = %self.changes_log.display(),
            "merging activity logs"
        );
        let events = merge_logs(&self.command_log, &self.changes_log);
        let chunks = split_by_token_limit(&events, self.token_limit)?;

        if chunks.is_empty() {
            warn!("no recorded activity to summarize");
            return Ok(None);
        }

        let summary = self.reduce(model, &chunks).await?;

        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("creating {}", self.output_dir.display()))?;
        let artifact = self
            .output_dir
            .join(format!("{}.md", today.format("%Y-%m-%d")));
        fs::write(&artifact, &summary)
            .with_context(|| format!("writing {}", artifact.display()))?;
        info!(path = %artifact.display(), "daily summary written");

        // Consumed events must not roll into tomorrow's report.
        truncate_events(&self.command_log)?;
        truncate_events(&self.changes_log)?;

        Ok(Some(artifact))
    }

    /// Single-shot for one chunk; sequential reduction otherwise.  The
    /// accumulator is replaced by each reduction call's result.
    async fn reduce(&self, model: &dyn ChatModel, chunks: &[String]) -> Result<String> {
        let total = chunks.len();
        if total == 1 {
            return model.chat(prompt::SINGLE, &chunks[0]).await;
        }

        let mut accumulator = model.chat(prompt::SINGLE, &chunks[0]).await?;
        for (idx, chunk) in chunks[1..].iter().enumerate() {
            debug!(chunk = idx + 2, total, "reducing chunk");
            accumulator = model
                .chat(prompt::MANY, &format!("{accumulator}\n\n{chunk}"))
                .await?;
        }
        Ok(accumulator)
    }
}

/// Small synthetic exchange proving the provider, model, and credentials
/// are wired up.  Used by `recap check`.
pub async fn check_provider(model: &dyn ChatModel) -> Result<()> {
    let sample = r#"[{"event_type":"command_completed","timestamp":0,"pane":"check:0.0","command":"cargo --version","output":["cargo 1.80.0"]}]"#;
    let reply = model.chat(prompt::SINGLE, sample).await?;
    if reply.trim().is_empty() {
        bail!("provider returned an empty response");
    }
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use recap_event::{Event, append_events, read_events};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Scripted model: records (system prompt, user content) per call and
    /// replies `reply-N`, failing at `fail_at` when set.
    struct FakeModel {
        calls: Mutex<Vec<(String, String)>>,
        fail_at: Option<usize>,
    }

    impl FakeModel {
        fn new() -> Self {
            Self {
                calls: Mutex::new(vec![]),
                fail_at: None,
            }
        }

        fn failing_at(call: usize) -> Self {
            Self {
                calls: Mutex::new(vec![]),
                fail_at: Some(call),
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for FakeModel {
        async fn chat(&self, system_prompt: &str, user_content: &str) -> Result<String> {
            let mut calls = self.calls.lock().unwrap();
            calls.push((system_prompt.to_string(), user_content.to_string()));
            let n = calls.len();
            if self.fail_at == Some(n) {
                bail!("provider unavailable");
            }
            Ok(format!("reply-{n}"))
        }
    }

    fn command_event(timestamp: i64, command: &str) -> Event {
        Event::CommandCompleted {
            timestamp,
            pane: "main:0.0".to_string(),
            command: command.to_string(),
            output: vec!["done".to_string()],
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn pipeline_in(dir: &TempDir, token_limit: usize) -> SummaryPipeline {
        SummaryPipeline::new(
            dir.path().join("commands.json"),
            dir.path().join("changes.json"),
            dir.path().join("reports"),
            token_limit,
        )
    }

    #[tokio::test]
    async fn empty_logs_produce_no_artifact() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_in(&dir, 1000);
        let model = FakeModel::new();

        let result = pipeline.run_once(&model, today()).await.unwrap();
        assert!(result.is_none());
        assert!(model.calls().is_empty());
        assert!(!dir.path().join("reports/2025-06-02.md").exists());
    }

    #[tokio::test]
    async fn single_chunk_uses_the_single_prompt() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_in(&dir, 1_000_000);
        append_events(
            &dir.path().join("commands.json"),
            vec![command_event(1, "cargo test")],
        )
        .unwrap();

        let model = FakeModel::new();
        let artifact = pipeline.run_once(&model, today()).await.unwrap().unwrap();

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, prompt::SINGLE);
        assert!(calls[0].1.contains("cargo test"));

        assert_eq!(artifact, dir.path().join("reports/2025-06-02.md"));
        assert_eq!(fs::read_to_string(&artifact).unwrap(), "reply-1");
    }

    #[tokio::test]
    async fn multiple_chunks_reduce_through_the_accumulator() {
        let dir = TempDir::new().unwrap();
        // A tiny budget forces one event per chunk.
        let pipeline = pipeline_in(&dir, 1);
        append_events(
            &dir.path().join("commands.json"),
            vec![
                command_event(1, "step-one"),
                command_event(2, "step-two"),
                command_event(3, "step-three"),
            ],
        )
        .unwrap();

        let model = FakeModel::new();
        let artifact = pipeline.run_once(&model, today()).await.unwrap().unwrap();

        let calls = model.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].0, prompt::SINGLE);
        assert!(calls[0].1.contains("step-one"));
        // Each reduction call carries the previous reply plus the next chunk.
        assert_eq!(calls[1].0, prompt::MANY);
        assert!(calls[1].1.starts_with("reply-1\n\n"));
        assert!(calls[1].1.contains("step-two"));
        assert_eq!(calls[2].0, prompt::MANY);
        assert!(calls[2].1.starts_with("reply-2\n\n"));
        assert!(calls[2].1.contains("step-three"));

        assert_eq!(fs::read_to_string(&artifact).unwrap(), "reply-3");
    }

    #[tokio::test]
    async fn success_truncates_both_logs() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_in(&dir, 1_000_000);
        let commands = dir.path().join("commands.json");
        let changes = dir.path().join("changes.json");
        append_events(&commands, vec![command_event(1, "make")]).unwrap();
        append_events(
            &changes,
            vec![Event::ChangesDetected {
                timestamp: 2,
                changes: vec![],
            }],
        )
        .unwrap();

        let model = FakeModel::new();
        pipeline.run_once(&model, today()).await.unwrap().unwrap();

        assert!(read_events(&commands).is_empty());
        assert!(read_events(&changes).is_empty());
    }

    #[tokio::test]
    async fn mid_run_failure_aborts_and_preserves_logs() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_in(&dir, 1);
        let commands = dir.path().join("commands.json");
        append_events(
            &commands,
            vec![command_event(1, "one"), command_event(2, "two")],
        )
        .unwrap();

        let model = FakeModel::failing_at(2);
        let result = pipeline.run_once(&model, today()).await;

        assert!(result.is_err());
        assert_eq!(read_events(&commands).len(), 2);
        assert!(!dir.path().join("reports/2025-06-02.md").exists());
    }

    #[tokio::test]
    async fn check_provider_surfaces_failures() {
        let ok = FakeModel::new();
        assert!(check_provider(&ok).await.is_ok());

        let broken = FakeModel::failing_at(1);
        assert!(check_provider(&broken).await.is_err());
    }
}
