mod config;
mod db;
mod errors;
mod evidence;
mod jobs;
mod llm_client;
mod models;
mod refinement;
mod repository;
mod scoring;
mod state;

#[cfg(test)]
mod test_utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::Config;
use crate::db::create_pool;
use crate::state::AppState;

/// Command-line arguments for the content refiner
#[derive(Parser, Debug)]
#[command(name = "refiner")]
#[command(about = "Scores content and refines it through bulk jobs")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Claim and run queued bulk jobs until Ctrl-C (the default).
    Worker,
    /// Queue a bulk job over the given content items and print its id.
    Submit {
        #[arg(required = true)]
        content_ids: Vec<Uuid>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting content refiner v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (migrations run here)
    let db = create_pool(&config.database_url, config.db_max_connections).await?;

    let state = AppState::new(config, db)?;

    match args.command.unwrap_or(Command::Worker) {
        Command::Worker => run_worker(&state).await,
        Command::Submit { content_ids } => {
            let job_id = state.orchestrator()?.submit(&content_ids).await?;
            println!("{job_id}");
            Ok(())
        }
    }
}

async fn run_worker(state: &AppState) -> Result<()> {
    info!(
        target_overall = state.config.refinement.target_overall,
        max_iterations = state.config.refinement.max_iterations,
        cost_budget_usd = state.config.refinement.cost_budget_usd,
        regression_policy = ?state.config.refinement.regression_policy,
        "refinement limits"
    );

    let worker = state.worker()?;

    // Finish the current item, then requeue the job and stop on Ctrl-C
    let cancel = worker.cancel_flag();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested; stopping after the current item");
                cancel.cancel();
            }
            Err(e) => warn!(error = %e, "could not listen for shutdown signal"),
        }
    });

    worker.run().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_is_the_default_command() {
        let args = Args::try_parse_from(["refiner"]).unwrap();
        assert!(args.command.is_none());
    }

    #[test]
    fn test_submit_parses_content_ids() {
        let id = Uuid::new_v4();
        let args = Args::try_parse_from(["refiner", "submit", &id.to_string()]).unwrap();
        match args.command {
            Some(Command::Submit { content_ids }) => assert_eq!(content_ids, vec![id]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_submit_rejects_missing_or_bad_ids() {
        assert!(Args::try_parse_from(["refiner", "submit"]).is_err());
        assert!(Args::try_parse_from(["refiner", "submit", "not-a-uuid"]).is_err());
    }
}
