use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pymirror::cli::Cli;
use pymirror::report::{ProgressTracker, summary_table};
use pymirror::{IndexBuilder, Settings, Synchronizer, any_failed, requirements_text, write_url_list};
use pymirror_fetch::{ReqwestClient, SyncProgress};
use pymirror_index::parse_requirements;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref(), &cli.overrides())?;
    let _log_guard = pymirror::logging::init(cli.verbose, settings.log_file_config().as_ref())
        .context("failed to set up logging")?;

    let specs = parse_requirements(&requirements_text(&settings).await?);
    tracing::info!(
        packages = specs.len(),
        dir = %settings.download_dir.display(),
        dry_run = settings.dry_run,
        "requirements loaded"
    );

    let client = ReqwestClient::new().context("failed to build HTTP client")?;
    let tracker = ProgressTracker::new("Syncing");
    let progress = Arc::new(SyncProgress::with_observer(tracker.observer()));
    let synchronizer = Synchronizer::new(client, settings.clone())?.with_progress(progress);

    let report = synchronizer.run(&specs).await;
    tracker.finish();
    println!("{}", summary_table(&report.packages, &report.progress));

    if let Some(path) = settings.url_list_path() {
        write_url_list(&path, &report.urls).await?;
    }

    let mut failed = any_failed(&report.packages);
    if settings.build_index && settings.dry_run {
        tracing::info!("dry run, index not built");
    } else if settings.build_index
        && let Err(e) = IndexBuilder::from_settings(&settings)?.build(&settings.download_dir).await
    {
        tracing::error!(error = %e, "index build failed");
        failed = true;
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
