use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use recap_config::AppConfig;
use recap_llm::client_from_config;
use recap_runtime::run_daemon;
use recap_summarize::{SummaryPipeline, check_provider};

#[derive(Debug, Parser)]
#[command(
    name = "recap",
    version,
    about = "Passive activity watcher with daily LLM summaries"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config/recap.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the watchers and the daily summarizer (default).
    Start,
    /// Merge, chunk, and summarize the accumulated logs right now,
    /// bypassing the daily schedule.
    Summarize,
    /// Verify the configured LLM provider, model, and credentials answer.
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;

    // RUST_LOG wins; otherwise [telemetry] log_level seeds the filter.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command.unwrap_or(Commands::Start) {
        Commands::Start => {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("shutdown requested");
                    let _ = shutdown_tx.send(true);
                }
            });

            run_daemon(config, shutdown_rx).await?;
        }
        Commands::Summarize => {
            let model = client_from_config(&config.llm)?;
            let pipeline = SummaryPipeline::from_config(&config);
            let today = Local::now().date_naive();

            match pipeline.run_once(model.as_ref(), today).await? {
                Some(path) => println!("summary written to {}", path.display()),
                None => println!("no recorded activity to summarize"),
            }
        }
        Commands::Check => {
            let model = client_from_config(&config.llm)?;
            println!(
                "checking {} via {}...",
                config.active_model(),
                config.llm.provider
            );
            match check_provider(model.as_ref()).await {
                Ok(()) => println!("provider check passed"),
                Err(err) => {
                    eprintln!("provider check failed: {err}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
