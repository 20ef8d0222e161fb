use anyhow::{Context, Result};
use deploy::cli::output::{format_event, format_json};
use deploy::cli::Cli;
use deploy::core::{DeployConfig, Verbosity};
use deploy::execution::PipelineRunner;
use deploy::git::GitReferenceUpdater;
use deploy::process::{CommandExecutor, ProcessExecutor};
use deploy::prompt::{ConfirmationGate, PromptStream, TerminalPrompter};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let default_level = if cli.verbose > 1 { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Failed to set logging subscriber")?;

    let request = cli.to_request()?;
    let config = DeployConfig::discover(cli.config.as_deref(), request.path())
        .context("Failed to load deployment config")?;
    debug!("Using config: {:?}", config);

    let executor: Arc<dyn CommandExecutor> =
        Arc::new(ProcessExecutor::new().with_timeout(config.command_timeout()));
    let git = GitReferenceUpdater::new(executor.clone(), config.remote.clone());
    // stdout carries only the JSON summary
    let stream = if cli.json { PromptStream::Stderr } else { PromptStream::Stdout };
    let gate = ConfirmationGate::new(Arc::new(TerminalPrompter::on(stream)));
    let mut runner = PipelineRunner::new(executor, git, gate, config);

    if !cli.json {
        runner.add_event_handler(|event| println!("{}", format_event(event)));
    }

    let outcome = runner.run(&request).await;

    if cli.json {
        println!("{}", format_json(&outcome)?);
    } else if request.verbosity() == Verbosity::Verbose {
        if let Some(finished) = outcome.finished_at {
            if let Ok(duration) = finished.signed_duration_since(outcome.started_at).to_std() {
                println!("Finished in {:.1}s", duration.as_secs_f64());
            }
        }
    }

    std::process::exit(outcome.exit_code());
}
