//! LeadScout command-line entry point.
//!
//! Loads configuration (file, then environment, then flags), builds the
//! selected source and the optional email extractor, and runs one resumable
//! collection. Ctrl-C stops the run after the in-flight request and saves
//! progress.

mod args;

use anyhow::{Context, Result};
use args::Cli;
use clap::Parser;
use leadscout_core::AppConfig;
use leadscout_email::HttpEmailExtractor;
use leadscout_pipeline::{export_contactable, Orchestrator, StopReason};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Exit status after an interrupted run, as shells report SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.list_options {
        println!("{:#}", args::options_json());
        return ExitCode::SUCCESS;
    }

    init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: &Cli) -> Result<ExitCode> {
    let mut config =
        AppConfig::load_with_env(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply(&mut config)?;
    config.validate().context("invalid configuration")?;

    let run_config = cli.run_config(&config);
    let api = run_config.api_throttle();
    let provider = leadscout_sources::build_provider(&config, api.clone())
        .context("failed to set up source provider")?;

    let cancel = CancellationToken::new();
    let mut orchestrator = Orchestrator::new(provider, config.backoff.policy())
        .with_api_throttle(api)
        .with_cancellation(cancel.clone());

    if run_config.extract_emails {
        let extractor = HttpEmailExtractor::new(
            &config.email.user_agent,
            Duration::from_secs(config.email.timeout_secs),
        )?;
        orchestrator = orchestrator.with_extractor(Arc::new(extractor));
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing current request and saving progress");
            cancel.cancel();
        }
    });

    let summary = orchestrator.run(&run_config).await?;
    tracing::info!(output = %run_config.output_path.display(), "{summary}");
    for pair in &summary.failed_pairs {
        tracing::warn!(%pair, "pair abandoned after retries, rerun to try again");
    }

    if let Some(dest) = &cli.export_contactable {
        let rows = export_contactable(&run_config.output_path, dest)
            .with_context(|| format!("failed to export to {}", dest.display()))?;
        tracing::info!(rows, path = %dest.display(), "contactable leads exported");
    }

    Ok(match summary.stop_reason {
        StopReason::Interrupted => ExitCode::from(EXIT_INTERRUPTED),
        StopReason::Completed | StopReason::BudgetReached => ExitCode::SUCCESS,
    })
}
