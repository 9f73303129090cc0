//! Daemon orchestration: one tokio task per observation loop plus the
//! summarization scheduler.
//!
//! The loops share no in-memory state; the two log files on disk are the
//! only coupling, and writers are not locked against the daily truncation
//! (last writer wins).  Each task checks the shutdown channel between
//! units of work, never mid-scan.

use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use recap_config::AppConfig;
use recap_fswatch::FsWatcher;
use recap_llm::client_from_config;
use recap_summarize::SummaryPipeline;
use recap_tmux::{TmuxCapture, TmuxScraper};

use crate::schedule::DailySchedule;

/// Run the three loops until the shutdown channel flips to `true`.
pub async fn run_daemon(config: AppConfig, shutdown_rx: watch::Receiver<bool>) -> Result<()> {
    // Resolve everything that can fail before any loop starts.
    let run_at = config.summarizer.parse_run_at()?;
    let model = client_from_config(&config.llm)?;

    let mut handles: Vec<JoinHandle<()>> = Vec::new();

    if config.watcher.enable && !config.watcher.dirs.is_empty() {
        let watcher = FsWatcher::from_config(&config);
        handles.push(tokio::spawn(watcher.run(shutdown_rx.clone())));
    } else {
        warn!("file watcher disabled or no directories configured — skipping");
    }

    if config.tmux.enable {
        let scraper = TmuxScraper::from_config(&config);
        let capture = TmuxCapture::new(config.tmux.scrollback_lines);
        handles.push(tokio::spawn(scraper.run(capture, shutdown_rx.clone())));
    } else {
        info!("tmux scraper disabled");
    }

    let pipeline = SummaryPipeline::from_config(&config);
    let poll_interval = Duration::from_secs(config.summarizer.poll_interval_secs.max(1));
    let mut scheduler_rx = shutdown_rx.clone();
    handles.push(tokio::spawn(async move {
        let mut schedule = DailySchedule::new(run_at);
        info!(run_at = %run_at, "summarizer scheduler starting");

        loop {
            let now = Local::now().naive_local();
            if schedule.is_due(now) {
                let today = now.date();
                match pipeline.run_once(model.as_ref(), today).await {
                    Ok(Some(path)) => {
                        info!(path = %path.display(), "summarization run complete");
                        schedule.mark_ran(today);
                    }
                    // Nothing to summarize: leave the gate open and retry.
                    Ok(None) => {}
                    Err(err) => {
                        warn!(%err, "summarization run failed — logs preserved for retry");
                    }
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(poll_interval) => {}
                changed = scheduler_rx.changed() => {
                    if changed.is_err() || *scheduler_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("summarizer scheduler stopped");
    }));

    for handle in handles {
        if let Err(err) = handle.await {
            warn!(%err, "daemon task panicked");
        }
    }

    info!("daemon stopped");
    Ok(())
}
